//! Signal definitions and their tabular loader

pub mod database;
pub mod table;

pub use database::{
    sanitize_name, ByteOrder, DatabaseStats, SignalDatabase, SignalDefinition, ValueType,
};
pub use table::{load_signal_table, parse_signal_table};
