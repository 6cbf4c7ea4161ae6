//! Minimal DBC writer
//!
//! Renders a loaded signal database as a minimal but tool-readable
//! Vector DBC document: one synthetic message per CAN ID, signals in
//! input row order, fixed sender and receiver nodes.

use crate::signals::database::{ByteOrder, SignalDatabase, SignalDefinition, ValueType};
use crate::types::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Node emitting every synthetic message
pub const DEFAULT_SENDER: &str = "VOSP";
/// Receiver placeholder used by Vector tooling
pub const DEFAULT_RECEIVER: &str = "Vector__XXX";
/// DLC used when no signal of a message declares one
pub const DEFAULT_DLC: u8 = 8;

/// The fixed `NS_` block tokens, in the order Vector tools emit them
const NS_TOKENS: [&str; 28] = [
    "NS_DESC_",
    "CM_",
    "BA_DEF_",
    "BA_",
    "VAL_",
    "CAT_DEF_",
    "CAT_",
    "FILTER",
    "BA_DEF_DEF_",
    "EV_DATA_",
    "ENVVAR_DATA_",
    "SGTYPE_",
    "SGTYPE_VAL_",
    "BA_DEF_SGTYPE_",
    "BA_SGTYPE_",
    "SIG_TYPE_REF_",
    "VAL_TABLE_",
    "SIG_GROUP_",
    "SIG_VALTYPE_",
    "SIGTYPE_VALTYPE_",
    "BO_TX_BU_",
    "BA_DEF_REL_",
    "BA_REL_",
    "BA_DEF_DEF_REL_",
    "BU_SG_REL_",
    "BU_EV_REL_",
    "BU_BO_REL_",
    "SG_MUL_VAL_",
];

/// Write the database as DBC text to a file path
pub fn write_dbc_file(db: &SignalDatabase, path: &Path) -> Result<()> {
    log::info!("Writing DBC file: {:?}", path);
    let mut writer = BufWriter::new(File::create(path)?);
    write_dbc(db, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write the database as DBC text
///
/// Messages are emitted in ascending CAN ID order, each as one `BO_`
/// block with its signals in input row order. The document ends with
/// exactly one trailing newline.
pub fn write_dbc<W: Write>(db: &SignalDatabase, out: &mut W) -> Result<()> {
    let mut lines: Vec<String> = Vec::new();

    lines.push("VERSION \"\"".to_string());
    lines.push(String::new());
    lines.push("NS_ :".to_string());
    for token in NS_TOKENS {
        lines.push(format!("\t{}", token));
    }
    lines.push(String::new());
    lines.push("BS_:".to_string());
    lines.push(String::new());
    lines.push(format!("BU_: {}", DEFAULT_SENDER));
    lines.push(String::new());

    for (can_id, signals) in db.iter_messages() {
        lines.push(format!(
            "BO_ {} MSG_{}: {} {}",
            can_id,
            can_id,
            message_dlc(signals),
            DEFAULT_SENDER
        ));
        for signal in signals {
            lines.push(signal_line(signal));
        }
        lines.push(String::new());
    }

    // Exactly one trailing newline, no trailing blank line
    let mut text = lines.join("\n");
    text.truncate(text.trim_end_matches('\n').len());
    text.push('\n');
    out.write_all(text.as_bytes())?;
    Ok(())
}

/// DLC of a message: the last declared value among its signals in row
/// order, else the default
fn message_dlc(signals: &[SignalDefinition]) -> u8 {
    signals
        .iter()
        .rev()
        .find_map(|s| s.dlc)
        .unwrap_or(DEFAULT_DLC)
}

/// Render one `SG_` line
///
/// Byte-order flag: `0` = Motorola/big, `1` = Intel/little, immediately
/// followed by the sign flag (`-` signed, `+` unsigned).
fn signal_line(signal: &SignalDefinition) -> String {
    let endian_flag = match signal.byte_order {
        ByteOrder::BigEndian => '0',
        ByteOrder::LittleEndian => '1',
    };
    let sign_flag = match signal.value_type {
        ValueType::Signed => '-',
        ValueType::Unsigned => '+',
    };
    format!(
        " SG_ {} : {}|{}@{}{} ({},{}) [{}|{}] \"{}\" {}",
        signal.name,
        signal.start_bit,
        signal.bit_length,
        endian_flag,
        sign_flag,
        signal.scale,
        signal.offset,
        signal.min,
        signal.max,
        signal.units,
        DEFAULT_RECEIVER
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::database::SignalDatabase;

    fn signal(name: &str, can_id: u32, dlc: Option<u8>) -> SignalDefinition {
        SignalDefinition {
            name: name.to_string(),
            can_id,
            units: "rpm".to_string(),
            start_bit: 0,
            bit_length: 16,
            offset: 0.0,
            scale: 1.0,
            min: 0.0,
            max: 8000.0,
            value_type: ValueType::Unsigned,
            byte_order: ByteOrder::LittleEndian,
            dlc,
        }
    }

    fn render(db: &SignalDatabase) -> String {
        let mut buf = Vec::new();
        write_dbc(db, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_preamble_and_trailing_newline() {
        let db = SignalDatabase::new();
        let text = render(&db);

        assert!(text.starts_with("VERSION \"\"\n\nNS_ :\n\tNS_DESC_\n"));
        assert!(text.contains("\n\tSG_MUL_VAL_\n"));
        assert!(text.contains("\nBS_:\n"));
        assert!(text.contains("\nBU_: VOSP\n"));
        assert!(text.ends_with('\n'));
        assert!(!text.ends_with("\n\n"));
    }

    #[test]
    fn test_one_block_per_id_ascending_signals_in_row_order() {
        let mut db = SignalDatabase::new();
        db.add_signal(signal("B_First", 0x200, None));
        db.add_signal(signal("A_Only", 0x100, None));
        db.add_signal(signal("B_Second", 0x200, None));
        let text = render(&db);

        let pos_a = text.find("BO_ 256 MSG_256: 8 VOSP").unwrap();
        let pos_b = text.find("BO_ 512 MSG_512: 8 VOSP").unwrap();
        assert!(pos_a < pos_b);
        assert_eq!(text.matches("BO_ 512").count(), 1);

        let pos_first = text.find(" SG_ B_First ").unwrap();
        let pos_second = text.find(" SG_ B_Second ").unwrap();
        assert!(pos_first < pos_second);
    }

    #[test]
    fn test_signal_line_layout() {
        let mut def = signal("EngineSpeed", 0x123, None);
        def.scale = 0.25;
        def.value_type = ValueType::Signed;
        def.byte_order = ByteOrder::BigEndian;
        assert_eq!(
            signal_line(&def),
            " SG_ EngineSpeed : 0|16@0- (0.25,0) [0|8000] \"rpm\" Vector__XXX"
        );
    }

    #[test]
    fn test_dlc_is_last_declared_value() {
        let mut db = SignalDatabase::new();
        db.add_signal(signal("A", 0x10, Some(4)));
        db.add_signal(signal("B", 0x10, None));
        let text = render(&db);
        assert!(text.contains("BO_ 16 MSG_16: 4 VOSP"));

        let mut db = SignalDatabase::new();
        db.add_signal(signal("A", 0x10, Some(4)));
        db.add_signal(signal("B", 0x10, Some(6)));
        assert!(render(&db).contains("BO_ 16 MSG_16: 6 VOSP"));

        let mut db = SignalDatabase::new();
        db.add_signal(signal("A", 0x10, None));
        assert!(render(&db).contains("BO_ 16 MSG_16: 8 VOSP"));
    }

    #[test]
    fn test_blank_line_between_message_blocks() {
        let mut db = SignalDatabase::new();
        db.add_signal(signal("A", 1, None));
        db.add_signal(signal("B", 2, None));
        let text = render(&db);
        assert!(text.contains("\"rpm\" Vector__XXX\n\nBO_ 2 "));
    }
}
