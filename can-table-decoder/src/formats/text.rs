//! Textual CAN log-line parser
//!
//! Normalizes the three textual frame encodings found in the field into
//! one [`Frame`] representation:
//!
//! ```text
//! (1699999999.123456) can0 4D1#0102030405060708   candump
//! 4D1#0102030405060708                            bare id#data
//! 1699999999.123,1233,01,02,03,04,05,06,07,08     comma-delimited
//! ```
//!
//! Blank lines and `#` comments are ignored; anything else that matches
//! neither grammar is reported as unrecognized so the caller can tally it.

use crate::types::Frame;
use regex::Regex;

/// Outcome of parsing one log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// A frame, normalized to 8 data bytes
    Frame(Frame),
    /// Blank line or comment; not an error
    Ignored,
    /// Line matched neither grammar; counted by the caller, never fatal
    Unrecognized,
}

/// Parser for textual CAN log lines
pub struct LogLineParser {
    comma_re: Regex,
    candump_re: Regex,
}

impl LogLineParser {
    pub fn new() -> Self {
        Self {
            // timestamp , id , rest  (timestamp and id are comma-free)
            comma_re: Regex::new(r"^\s*(?P<ts>[^,]+?)\s*,\s*(?P<id>[^,]+?)\s*,\s*(?P<rest>.+?)\s*$")
                .expect("comma grammar"),
            // optional (timestamp), optional interface, hexid#hexdata
            candump_re: Regex::new(
                r"^\s*(?:\((?P<ts>[0-9]+\.[0-9]+)\)\s+)?(?:(?P<iface>[A-Za-z0-9_]+)\s+)?(?P<id>[0-9A-Fa-f]+)#(?P<data>[0-9A-Fa-f]*)\s*$",
            )
            .expect("candump grammar"),
        }
    }

    /// Parse one line of log text
    pub fn parse_line(&self, line: &str) -> ParsedLine {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return ParsedLine::Ignored;
        }

        // Comma-delimited form first; a candump line never contains commas
        if let Some(caps) = self.comma_re.captures(trimmed) {
            let id = parse_log_can_id(&caps["id"]);
            let bytes = parse_comma_bytes(&caps["rest"]);
            if let (Some(id), Some(bytes)) = (id, bytes) {
                let ts = caps["ts"].to_string();
                return ParsedLine::Frame(Frame::from_payload(Some(ts), id, &bytes));
            }
            // Malformed id or data bytes: fall through to the candump
            // grammar rather than aborting the run
        }

        if let Some(caps) = self.candump_re.captures(trimmed) {
            // candump IDs are hex, no 0x prefix
            if let Ok(id) = u32::from_str_radix(&caps["id"], 16) {
                if let Some(bytes) = parse_hex_payload(&caps["data"]) {
                    let ts = caps.name("ts").map(|m| m.as_str().to_string());
                    return ParsedLine::Frame(Frame::from_payload(ts, id, &bytes));
                }
            }
        }

        ParsedLine::Unrecognized
    }
}

impl Default for LogLineParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a CAN ID token from a log line
///
/// `0x` prefix means hex; a token made only of hex digits that contains
/// at least one letter (e.g. `4D1`) is also hex; anything else is read
/// as decimal, fractional literals truncated.
fn parse_log_can_id(token: &str) -> Option<u32> {
    let token = token.trim();
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).ok();
    }
    let all_hex = !token.is_empty() && token.chars().all(|c| c.is_ascii_hexdigit());
    if all_hex && token.chars().any(|c| c.is_ascii_alphabetic()) {
        return u32::from_str_radix(token, 16).ok();
    }
    token.parse::<f64>().ok().map(|v| v.trunc() as u32)
}

/// Parse the data-byte tail of a comma-delimited line
///
/// Splits on commas; when that yields a single space-separated token,
/// re-splits on whitespace. At least 8 hex byte tokens are required and
/// only the first 8 are kept.
fn parse_comma_bytes(rest: &str) -> Option<Vec<u8>> {
    let mut parts: Vec<&str> = rest.split(',').map(str::trim).collect();
    if parts.len() == 1 && parts[0].contains(' ') {
        parts = parts[0].split_whitespace().collect();
    }
    if parts.len() < 8 {
        return None;
    }
    parts[..8]
        .iter()
        .map(|p| u8::from_str_radix(p, 16).ok())
        .collect()
}

/// Parse a contiguous hex payload (candump form)
///
/// Odd-length data is right-padded with one zero nibble before pairing.
fn parse_hex_payload(hexdata: &str) -> Option<Vec<u8>> {
    let mut hexdata = hexdata.trim().to_string();
    if hexdata.len() % 2 != 0 {
        hexdata.push('0');
    }
    (0..hexdata.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hexdata[i..i + 2], 16).ok())
        .collect()
}
