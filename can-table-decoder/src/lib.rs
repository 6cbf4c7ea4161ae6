//! CAN Signal-Table Decoder Library
//!
//! Converts between a tabular signal-definition export and raw CAN
//! frames:
//!
//! - loads the signal table into an immutable per-ID database,
//! - extracts bit-packed engineering values out of 8-byte frames
//!   (Intel and Motorola bit numbering, sign extension, scaling),
//! - normalizes candump-style and comma-delimited log lines into one
//!   frame representation,
//! - renders the database as a minimal DBC document.
//!
//! The library is a synchronous batch pipeline: no global state, no
//! live bus I/O, no multiplexing support. Binary container extraction
//! is left to external tooling that feeds the table loader.
//!
//! # Example Usage
//!
//! ```no_run
//! use can_table_decoder::{decode_frame, load_signal_table, LogLineParser, ParsedLine};
//! use std::path::Path;
//!
//! let db = load_signal_table(Path::new("signals.csv")).unwrap();
//! let parser = LogLineParser::new();
//!
//! if let ParsedLine::Frame(frame) = parser.parse_line("4D1#0102030405060708") {
//!     if let Some(signals) = decode_frame(&frame, &db) {
//!         for sig in signals {
//!             println!("{}: {} {} (raw={})", sig.name, sig.value, sig.units, sig.raw);
//!         }
//!     }
//! }
//! ```

// Public modules
pub mod codec;
pub mod dbc;
pub mod formats;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use codec::{decode_frame, decode_signal, extract_raw, sign_extend};
pub use dbc::{write_dbc, write_dbc_file};
pub use formats::{LogLineParser, ParsedLine};
pub use signals::{
    load_signal_table, parse_signal_table, ByteOrder, DatabaseStats, SignalDatabase,
    SignalDefinition, ValueType,
};
pub use types::{CodecError, DecodedSignal, Frame, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
