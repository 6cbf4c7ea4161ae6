//! CAN Table CLI Application
//!
//! Command-line front end for the can-table-decoder library:
//! - `to-dbc`: render a signal table as a minimal DBC file
//! - `decode-log`: decode a textual CAN log against a signal table
//! - `decode-frame`: decode a single 8-byte frame from the command line
//!
//! Wrong arguments print the usage text and exit with status 2 (clap's
//! usage-error behavior); data-level problems are tallied and reported,
//! never fatal.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// CAN Table Codec - convert signal tables and decode CAN logs
#[derive(Parser, Debug)]
#[command(name = "can-table")]
#[command(about = "Convert CAN signal tables to DBC and decode CAN logs", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a signal table as a minimal DBC file
    ToDbc {
        /// Signal table (CSV with header row)
        #[arg(value_name = "SIGNALS_CSV")]
        signals: PathBuf,
        /// Output DBC file
        #[arg(value_name = "OUT_DBC")]
        output: PathBuf,
    },

    /// Decode a textual CAN log into a CSV of signal rows
    DecodeLog {
        /// Signal table (CSV with header row)
        #[arg(value_name = "SIGNALS_CSV")]
        signals: PathBuf,
        /// Log file (candump, bare id#data, or comma-delimited lines)
        #[arg(value_name = "LOG_FILE")]
        log: PathBuf,
        /// Output CSV file
        #[arg(value_name = "OUT_CSV")]
        output: PathBuf,
    },

    /// Decode one 8-byte frame given on the command line
    DecodeFrame {
        /// Signal table (CSV with header row)
        #[arg(value_name = "SIGNALS_CSV")]
        signals: PathBuf,
        /// CAN ID (decimal or 0x-prefixed hex)
        #[arg(value_name = "CAN_ID")]
        can_id: String,
        /// Exactly 8 data bytes in hex, space- or comma-separated
        #[arg(value_name = "DATA_HEX")]
        data: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);
    log::debug!(
        "can-table v{} (decoder v{})",
        env!("CARGO_PKG_VERSION"),
        can_table_decoder::VERSION
    );

    match &args.command {
        Command::ToDbc { signals, output } => commands::to_dbc(signals, output),
        Command::DecodeLog {
            signals,
            log,
            output,
        } => commands::decode_log(signals, log, output),
        Command::DecodeFrame {
            signals,
            can_id,
            data,
        } => commands::decode_frame(signals, can_id, data),
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
