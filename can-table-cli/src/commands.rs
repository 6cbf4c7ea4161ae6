//! Subcommand implementations
//!
//! Each command is a one-shot batch run: open inputs, process to
//! completion, report counts. Per-line problems are tallied and the run
//! continues; table parse failures and IO failures abort.

use anyhow::{bail, Context, Result};
use can_table_decoder::{
    decode_frame as decode_frame_signals, decode_signal, load_signal_table, write_dbc_file,
    Frame, LogLineParser, ParsedLine,
};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// `to-dbc`: signal table -> minimal DBC file
pub fn to_dbc(signals: &Path, output: &Path) -> Result<()> {
    let db = load_signal_table(signals)?;
    write_dbc_file(&db, output)?;

    let stats = db.stats();
    println!(
        "DBC written: {} (messages: {}, signals: {})",
        output.display(),
        stats.num_messages,
        stats.num_signals
    );
    Ok(())
}

/// `decode-log`: textual CAN log -> CSV of decoded signal rows
pub fn decode_log(signals: &Path, log: &Path, output: &Path) -> Result<()> {
    let db = load_signal_table(signals)?;
    let parser = LogLineParser::new();

    let reader = BufReader::new(
        File::open(log).with_context(|| format!("Failed to open log file {}", log.display()))?,
    );
    let mut writer = BufWriter::new(
        File::create(output)
            .with_context(|| format!("Failed to create output file {}", output.display()))?,
    );
    writeln!(writer, "timestamp,can_id,signal,value,units,raw")?;

    let mut frames_read = 0usize;
    let mut frames_matched = 0usize;
    let mut rows_written = 0usize;
    let mut unrecognized = 0usize;

    for line in reader.lines() {
        let line = line?;
        let frame = match parser.parse_line(&line) {
            ParsedLine::Frame(frame) => frame,
            ParsedLine::Ignored => continue,
            ParsedLine::Unrecognized => {
                log::debug!("Unrecognized log line: {:?}", line);
                unrecognized += 1;
                continue;
            }
        };
        frames_read += 1;

        let Some(decoded) = decode_frame_signals(&frame, &db) else {
            log::trace!("No signals for CAN ID 0x{:X}", frame.can_id);
            continue;
        };
        frames_matched += 1;

        let timestamp = frame.timestamp.as_deref().unwrap_or("");
        for sig in decoded {
            writeln!(
                writer,
                "{},0x{:X},{},{},{},{}",
                csv_field(timestamp),
                frame.can_id,
                csv_field(&sig.name),
                sig.value,
                csv_field(&sig.units),
                sig.raw
            )?;
            rows_written += 1;
        }
    }
    writer.flush()?;

    println!("Frames read: {}", frames_read);
    println!("Frames with matching CAN IDs: {}", frames_matched);
    println!("Decoded signal rows written: {}", rows_written);
    println!("Unrecognized lines: {}", unrecognized);
    println!("Output: {}", output.display());
    Ok(())
}

/// `decode-frame`: one frame from the command line -> stdout table
pub fn decode_frame(signals: &Path, can_id: &str, data: &str) -> Result<()> {
    let db = load_signal_table(signals)?;
    let can_id = parse_can_id(can_id)?;
    let data = parse_data_bytes(data)?;

    let Some(defs) = db.signals_for(can_id) else {
        println!("No signals for that CAN ID.");
        return Ok(());
    };

    let frame = Frame::from_payload(None, can_id, &data);
    println!("{}", frame);
    println!("{}", "-".repeat(60));

    for def in defs {
        match decode_signal(&frame.data, def) {
            Ok(sig) => println!("{}: {} {} (raw={})", sig.name, sig.value, sig.units, sig.raw),
            Err(e) => log::warn!("Skipping signal '{}': {}", def.name, e),
        }
    }
    Ok(())
}

/// Parse a command-line CAN ID: `0x` prefix means hex, otherwise decimal
fn parse_can_id(text: &str) -> Result<u32> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        text.parse::<f64>().ok().map(|v| v.trunc() as u32)
    };
    match parsed {
        Some(id) => Ok(id),
        None => bail!("Invalid CAN ID: {:?}", text),
    }
}

/// Parse exactly 8 hex bytes, space- or comma-separated
fn parse_data_bytes(text: &str) -> Result<[u8; 8]> {
    let normalized = text.replace(',', " ");
    let parts: Vec<&str> = normalized.split_whitespace().collect();
    if parts.len() != 8 {
        bail!("Expected exactly 8 data bytes, got {}", parts.len());
    }
    let mut data = [0u8; 8];
    for (i, part) in parts.iter().enumerate() {
        data[i] = u8::from_str_radix(part, 16)
            .map_err(|_| anyhow::anyhow!("Invalid data byte: {:?}", part))?;
    }
    Ok(data)
}

/// Quote a CSV field when it contains a delimiter, quote, or newline
fn csv_field(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
