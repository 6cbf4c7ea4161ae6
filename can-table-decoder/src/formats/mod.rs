//! Log file format parsers
//!
//! This module contains the textual log-line parser. Binary container
//! extraction stays outside the library; everything here starts from one
//! line of text.

pub mod text;

pub use text::{LogLineParser, ParsedLine};
