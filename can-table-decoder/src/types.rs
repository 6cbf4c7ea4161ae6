//! Core types for the CAN signal-table decoder library
//!
//! This module defines the frame and decoded-signal types the rest of the
//! library works with, along with the shared error type. All entities are
//! immutable once constructed; the library holds no process-wide state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// A normalized CAN frame as produced by the log-line parser
///
/// The data payload is always exactly 8 bytes: shorter inputs are
/// zero-padded on the right, longer inputs truncated. The timestamp is
/// kept as the opaque text from the log line and never interpreted
/// numerically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Timestamp text from the source line, if the format carried one
    pub timestamp: Option<String>,
    /// CAN message ID (11-bit or 29-bit)
    pub can_id: u32,
    /// Frame data, normalized to 8 bytes
    pub data: [u8; 8],
}

impl Frame {
    /// Build a frame from a raw payload of any length
    ///
    /// Payloads shorter than 8 bytes are zero-padded on the right;
    /// longer payloads keep only their first 8 bytes.
    pub fn from_payload(timestamp: Option<String>, can_id: u32, payload: &[u8]) -> Self {
        let mut data = [0u8; 8];
        let n = payload.len().min(8);
        data[..n].copy_from_slice(&payload[..n]);
        Self {
            timestamp,
            can_id,
            data,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X} [", self.can_id)?;
        for (i, b) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        write!(f, "]")
    }
}

/// A decoded signal with its engineering value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedSignal {
    /// Signal name from the table (sanitized at load)
    pub name: String,
    /// Engineering value: `raw * scale + offset`
    pub value: f64,
    /// Engineering unit text (may be empty)
    pub units: String,
    /// Raw value before scaling, sign-extended when the signal is signed
    pub raw: i64,
}

/// Errors that can occur while loading tables or decoding frames
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to parse signal table: {0}")]
    TableParse(String),

    #[error("Failed to parse frame data: {0}")]
    FrameParse(String),

    #[error("Bit field {start_bit}+{bit_length} does not fit an 8-byte frame")]
    BitRange { start_bit: u16, bit_length: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
