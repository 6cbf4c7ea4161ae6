//! Signal database
//!
//! Holds signal definitions loaded from a tabular signal file, keyed by
//! CAN ID. The database is built once by the table loader and then only
//! read by the codec and the DBC writer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

impl ByteOrder {
    /// Classify an endianness cell from the signal table
    ///
    /// Recognized big-endian tokens (case-insensitive, trimmed):
    /// `motorola`, `big`, `be`, `msb`, `true`, `yes`. Bare digits follow
    /// the DBC numeric convention: `0` is Motorola, `1` is Intel.
    /// Everything else, including blank text, is little-endian.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "motorola" | "big" | "be" | "msb" | "true" | "yes" | "0" => ByteOrder::BigEndian,
            _ => ByteOrder::LittleEndian,
        }
    }
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    /// Signed integer
    Signed,
    /// Unsigned integer
    Unsigned,
}

impl ValueType {
    /// Classify a signedness cell from the signal table
    ///
    /// Recognized signed tokens (case-insensitive, trimmed): `signed`,
    /// `s`, `1`, `true`, `yes`. Everything else is unsigned.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "signed" | "s" | "1" | "true" | "yes" => ValueType::Signed,
            _ => ValueType::Unsigned,
        }
    }
}

/// A CAN signal definition from the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDefinition {
    /// Signal name, sanitized to `[A-Za-z0-9_]`
    pub name: String,
    /// CAN ID of the owning message
    pub can_id: u32,
    /// Engineering unit text (may be empty)
    pub units: String,
    /// Start bit in the CAN frame
    pub start_bit: u16,
    /// Length in bits
    pub bit_length: u16,
    /// Offset added after scaling
    pub offset: f64,
    /// Scale factor from raw to physical value
    pub scale: f64,
    /// Minimum physical value (advisory, never enforced)
    pub min: f64,
    /// Maximum physical value (advisory, never enforced)
    pub max: f64,
    /// Value type (signed/unsigned)
    pub value_type: ValueType,
    /// Byte order for bit extraction
    pub byte_order: ByteOrder,
    /// Declared frame length of the owning message; `None` when the
    /// table cell was blank (treated as 8)
    pub dlc: Option<u8>,
}

/// Sanitize free text into a DBC-safe identifier
///
/// Characters outside `[A-Za-z0-9_]` become `_`; an empty result becomes
/// `SIG`; a leading digit is prefixed with `_`.
pub fn sanitize_name(raw: &str) -> String {
    let mut name: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() {
        name = "SIG".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// The signal database: one CAN message per ID, many signals per message
///
/// Signals keep their input row order within a message; messages iterate
/// in ascending numeric ID order.
#[derive(Debug, Default)]
pub struct SignalDatabase {
    messages: BTreeMap<u32, Vec<SignalDefinition>>,
}

impl SignalDatabase {
    /// Create a new empty database
    pub fn new() -> Self {
        Self {
            messages: BTreeMap::new(),
        }
    }

    /// Append a signal definition to its message, preserving row order
    pub fn add_signal(&mut self, signal: SignalDefinition) {
        self.messages.entry(signal.can_id).or_default().push(signal);
    }

    /// Get all signals of a message, in input row order
    pub fn signals_for(&self, can_id: u32) -> Option<&[SignalDefinition]> {
        self.messages.get(&can_id).map(|v| v.as_slice())
    }

    /// Iterate over messages in ascending CAN ID order
    pub fn iter_messages(&self) -> impl Iterator<Item = (u32, &[SignalDefinition])> {
        self.messages.iter().map(|(id, sigs)| (*id, sigs.as_slice()))
    }

    /// True when no signals have been loaded
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get database statistics
    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            num_messages: self.messages.len(),
            num_signals: self.messages.values().map(|v| v.len()).sum(),
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Number of distinct CAN messages
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signal(name: &str, can_id: u32) -> SignalDefinition {
        SignalDefinition {
            name: name.to_string(),
            can_id,
            units: String::new(),
            start_bit: 0,
            bit_length: 8,
            offset: 0.0,
            scale: 1.0,
            min: 0.0,
            max: 0.0,
            value_type: ValueType::Unsigned,
            byte_order: ByteOrder::LittleEndian,
            dlc: None,
        }
    }

    #[test]
    fn test_empty_database() {
        let db = SignalDatabase::new();
        assert!(db.is_empty());
        assert_eq!(db.stats().num_messages, 0);
        assert_eq!(db.stats().num_signals, 0);
    }

    #[test]
    fn test_row_order_preserved_within_message() {
        let mut db = SignalDatabase::new();
        db.add_signal(test_signal("Second_First", 0x200));
        db.add_signal(test_signal("First_A", 0x100));
        db.add_signal(test_signal("Second_Second", 0x200));

        let sigs = db.signals_for(0x200).unwrap();
        assert_eq!(sigs[0].name, "Second_First");
        assert_eq!(sigs[1].name, "Second_Second");

        // Messages iterate in ascending ID order regardless of insertion
        let ids: Vec<u32> = db.iter_messages().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0x100, 0x200]);

        let stats = db.stats();
        assert_eq!(stats.num_messages, 2);
        assert_eq!(stats.num_signals, 3);
    }

    #[test]
    fn test_value_type_tokens() {
        for tok in ["signed", "S", " s ", "1", "TRUE", "yes"] {
            assert_eq!(ValueType::from_token(tok), ValueType::Signed, "{tok}");
        }
        for tok in ["", "unsigned", "u", "0", "no", "garbage"] {
            assert_eq!(ValueType::from_token(tok), ValueType::Unsigned, "{tok}");
        }
    }

    #[test]
    fn test_byte_order_tokens() {
        for tok in ["motorola", "Big", " BE ", "msb", "true", "yes", "0"] {
            assert_eq!(ByteOrder::from_token(tok), ByteOrder::BigEndian, "{tok}");
        }
        for tok in ["", "intel", "little", "le", "lsb", "1", "garbage"] {
            assert_eq!(ByteOrder::from_token(tok), ByteOrder::LittleEndian, "{tok}");
        }
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("3-Phase V"), "_3_Phase_V");
        assert_eq!(sanitize_name("EngineSpeed"), "EngineSpeed");
        assert_eq!(sanitize_name("  Batt. Volt (V)  "), "Batt__Volt__V_");
        assert_eq!(sanitize_name(""), "SIG");
        assert_eq!(sanitize_name("***"), "___");
    }
}
