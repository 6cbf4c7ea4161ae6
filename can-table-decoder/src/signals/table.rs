//! Signal-table file parser
//!
//! Parses the tabular signal-definition export (CSV with a header row)
//! and converts it into the internal signal database. Numeric cells use a
//! parse-with-default rule: blank text takes a fixed default, while
//! non-blank text that is not a valid number fails the whole file.

use crate::signals::database::{
    sanitize_name, ByteOrder, SignalDatabase, SignalDefinition, ValueType,
};
use crate::types::{CodecError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Expected header columns. Order in the file does not matter; columns
/// are located by name, case-insensitively.
const COLUMNS: [&str; 12] = [
    "name",
    "can_id",
    "units",
    "start_bit",
    "bit_length",
    "offset",
    "scale",
    "max",
    "min",
    "signedness",
    "endian",
    "dlc",
];

/// Load a signal table from a file path
pub fn load_signal_table(path: &Path) -> Result<SignalDatabase> {
    log::info!("Loading signal table: {:?}", path);

    let file = File::open(path).map_err(|e| {
        CodecError::TableParse(format!("Failed to open {:?}: {}", path, e))
    })?;
    let db = parse_signal_table(BufReader::new(file))?;

    let stats = db.stats();
    log::info!(
        "Signal table loaded: {} messages, {} signals",
        stats.num_messages,
        stats.num_signals
    );
    Ok(db)
}

/// Parse a signal table from any buffered reader
///
/// The first line must be the header row. A UTF-8 BOM on the header is
/// stripped. Rows with a blank `name` or `can_id` are silently skipped.
pub fn parse_signal_table<R: BufRead>(reader: R) -> Result<SignalDatabase> {
    let mut lines = reader.lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) => line?,
        None => return Err(CodecError::TableParse("empty signal table".to_string())),
    };
    let columns = column_indices(header.trim_start_matches('\u{feff}'));

    let mut db = SignalDatabase::new();
    let mut skipped = 0usize;

    for (idx, line) in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let cells = split_row(&line);
        let cell = |name: &str| cell_text(&columns, &cells, name);

        // Rows without name or CAN ID carry no usable definition
        if cell("name").trim().is_empty() || cell("can_id").trim().is_empty() {
            skipped += 1;
            continue;
        }

        let line_no = idx + 1;
        let signal = SignalDefinition {
            name: sanitize_name(cell("name")),
            can_id: parse_can_id(cell("can_id"), line_no)?,
            units: cell("units").trim().to_string(),
            start_bit: parse_int(cell("start_bit"), 0, "start_bit", line_no)? as u16,
            bit_length: parse_int(cell("bit_length"), 1, "bit_length", line_no)? as u16,
            offset: parse_float(cell("offset"), 0.0, "offset", line_no)?,
            scale: parse_float(cell("scale"), 1.0, "scale", line_no)?,
            min: parse_float(cell("min"), 0.0, "min", line_no)?,
            max: parse_float(cell("max"), 0.0, "max", line_no)?,
            value_type: ValueType::from_token(cell("signedness")),
            byte_order: ByteOrder::from_token(cell("endian")),
            dlc: parse_dlc(cell("dlc"), line_no)?,
        };
        db.add_signal(signal);
    }

    if skipped > 0 {
        log::debug!("Skipped {} rows without name or can_id", skipped);
    }
    Ok(db)
}

/// Look up a cell by column name; absent columns and cells read as blank
fn cell_text<'a>(columns: &HashMap<String, usize>, cells: &'a [String], name: &str) -> &'a str {
    columns
        .get(name)
        .and_then(|&i| cells.get(i))
        .map(|s| s.as_str())
        .unwrap_or("")
}

/// Map header names to cell positions
fn column_indices(header: &str) -> HashMap<String, usize> {
    let mut indices = HashMap::new();
    for (i, cell) in split_row(header).iter().enumerate() {
        let name = cell.trim().to_ascii_lowercase();
        if COLUMNS.contains(&name.as_str()) {
            indices.entry(name).or_insert(i);
        }
    }
    indices
}

/// Split one CSV row into cells, honoring double-quoted fields
///
/// Kept deliberately small: the signal export never nests quotes beyond
/// the doubled-quote escape.
fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut cell));
            }
            _ => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}

/// Parse a CAN ID cell: `0x` prefix means hex, otherwise decimal with
/// fractional literals truncated
fn parse_can_id(text: &str, line_no: usize) -> Result<u32> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        text.parse::<f64>().ok().map(|v| v.trunc() as u32)
    };
    parsed.ok_or_else(|| {
        CodecError::TableParse(format!("line {}: invalid can_id {:?}", line_no, text))
    })
}

/// Integer cell with parse-with-default semantics
fn parse_int(text: &str, default: i64, field: &str, line_no: usize) -> Result<i64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(default);
    }
    text.parse::<f64>().map(|v| v.trunc() as i64).map_err(|_| {
        CodecError::TableParse(format!("line {}: invalid {} {:?}", line_no, field, text))
    })
}

/// Float cell with parse-with-default semantics
fn parse_float(text: &str, default: f64, field: &str, line_no: usize) -> Result<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(default);
    }
    text.parse::<f64>().map_err(|_| {
        CodecError::TableParse(format!("line {}: invalid {} {:?}", line_no, field, text))
    })
}

/// DLC cell: blank stays `None` so the DBC writer can distinguish an
/// explicit value from the default
fn parse_dlc(text: &str, line_no: usize) -> Result<Option<u8>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    parse_int(text, 8, "dlc", line_no).map(|v| Some(v as u8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str =
        "name,can_id,units,start_bit,bit_length,offset,scale,max,min,signedness,endian,dlc";

    fn parse(rows: &str) -> Result<SignalDatabase> {
        parse_signal_table(Cursor::new(format!("{HEADER}\n{rows}")))
    }

    #[test]
    fn test_parse_full_row() {
        let db = parse("Engine Speed,0x4D1,rpm,0,16,0,0.25,8000,0,unsigned,intel,8").unwrap();
        let sigs = db.signals_for(0x4D1).unwrap();
        assert_eq!(sigs.len(), 1);

        let sig = &sigs[0];
        assert_eq!(sig.name, "Engine_Speed");
        assert_eq!(sig.units, "rpm");
        assert_eq!(sig.start_bit, 0);
        assert_eq!(sig.bit_length, 16);
        assert_eq!(sig.scale, 0.25);
        assert_eq!(sig.max, 8000.0);
        assert_eq!(sig.value_type, ValueType::Unsigned);
        assert_eq!(sig.byte_order, ByteOrder::LittleEndian);
        assert_eq!(sig.dlc, Some(8));
    }

    #[test]
    fn test_blank_cells_take_defaults() {
        let db = parse("Sig,291,,,,,,,,,,").unwrap();
        let sig = &db.signals_for(291).unwrap()[0];
        assert_eq!(sig.start_bit, 0);
        assert_eq!(sig.bit_length, 1);
        assert_eq!(sig.offset, 0.0);
        assert_eq!(sig.scale, 1.0);
        assert_eq!(sig.min, 0.0);
        assert_eq!(sig.max, 0.0);
        assert_eq!(sig.value_type, ValueType::Unsigned);
        assert_eq!(sig.byte_order, ByteOrder::LittleEndian);
        assert_eq!(sig.dlc, None);
    }

    #[test]
    fn test_rows_without_name_or_id_are_skipped() {
        let db = parse(",0x100,,,8,,,,,,,\nSig,,,,8,,,,,,,\nKept,0x100,,,8,,,,,,,").unwrap();
        assert_eq!(db.stats().num_signals, 1);
        assert_eq!(db.signals_for(0x100).unwrap()[0].name, "Kept");
    }

    #[test]
    fn test_bad_numeric_cell_is_fatal() {
        let err = parse("Sig,0x100,,abc,8,,,,,,,").unwrap_err();
        assert!(matches!(err, CodecError::TableParse(_)));
        assert!(err.to_string().contains("start_bit"));
    }

    #[test]
    fn test_can_id_decimal_and_fractional() {
        let db = parse("A,1233,,,8,,,,,,,\nB,20.0,,,8,,,,,,,").unwrap();
        assert!(db.signals_for(0x4D1).is_some());
        assert!(db.signals_for(20).is_some());
    }

    #[test]
    fn test_bom_on_header_is_stripped() {
        let input = format!("\u{feff}{HEADER}\nSig,0x10,,,8,,,,,,,");
        let db = parse_signal_table(Cursor::new(input)).unwrap();
        assert_eq!(db.stats().num_signals, 1);
    }

    #[test]
    fn test_quoted_units_with_comma() {
        let db = parse("Pos,0x10,\"deg,min\",0,16,,,,,,,").unwrap();
        assert_eq!(db.signals_for(0x10).unwrap()[0].units, "deg,min");
    }

    #[test]
    fn test_empty_table_is_error() {
        let result = parse_signal_table(Cursor::new(""));
        assert!(result.is_err());
    }
}
