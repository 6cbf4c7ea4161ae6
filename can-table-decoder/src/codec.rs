//! Bit-field codec
//!
//! Extracts raw integer values from 8-byte CAN frames and converts them
//! to engineering values. Handles both Intel (little-endian) and
//! Motorola (big-endian) bit numbering, sign extension, and scaling.

use crate::signals::database::{ByteOrder, SignalDefinition, ValueType};
use crate::signals::SignalDatabase;
use crate::types::{CodecError, DecodedSignal, Frame, Result};
use byteorder::{ByteOrder as _, LittleEndian};

/// Extract the raw unsigned value of a bit field from an 8-byte frame
///
/// Unlike the tooling this replaces, out-of-range fields are rejected
/// instead of read past the frame: `bit_length` must be at least 1 and
/// `start_bit + bit_length` must stay within the 64 frame bits.
pub fn extract_raw(
    data: &[u8; 8],
    start_bit: u16,
    bit_length: u16,
    byte_order: ByteOrder,
) -> Result<u64> {
    if bit_length == 0 || start_bit as u32 + bit_length as u32 > 64 {
        return Err(CodecError::BitRange {
            start_bit,
            bit_length,
        });
    }

    let raw = match byte_order {
        ByteOrder::LittleEndian => extract_little_endian(data, start_bit, bit_length),
        ByteOrder::BigEndian => extract_big_endian(data, start_bit, bit_length),
    };
    Ok(raw)
}

/// Extract with little-endian (Intel) bit numbering
///
/// The frame is one little-endian u64; the field is the `bit_length`
/// bits starting `start_bit` up from the least significant end.
fn extract_little_endian(data: &[u8; 8], start_bit: u16, bit_length: u16) -> u64 {
    let word = LittleEndian::read_u64(data);
    let shifted = word >> start_bit;
    if bit_length == 64 {
        shifted
    } else {
        shifted & ((1u64 << bit_length) - 1)
    }
}

/// Extract with big-endian (Motorola) bit numbering
///
/// Bit index 0 is the MSB of byte 0. Bits are read at increasing
/// absolute index from `start_bit`; the first bit read becomes the MSB
/// of the result.
fn extract_big_endian(data: &[u8; 8], start_bit: u16, bit_length: u16) -> u64 {
    let mut result: u64 = 0;
    for i in 0..bit_length {
        let bit_index = (start_bit + i) as usize;
        let byte_index = bit_index / 8;
        let bit_in_byte = 7 - (bit_index % 8);
        let bit = (data[byte_index] >> bit_in_byte) & 1;
        result = (result << 1) | bit as u64;
    }
    result
}

/// Sign-extend a `bit_length`-wide raw value to i64
///
/// Two's-complement at field width: when the top bit is set, the value
/// is `raw - 2^bit_length`.
pub fn sign_extend(raw: u64, bit_length: u16) -> i64 {
    if bit_length >= 64 {
        return raw as i64;
    }
    let sign_bit = 1u64 << (bit_length - 1);
    if raw & sign_bit != 0 {
        (raw | (!0u64 << bit_length)) as i64
    } else {
        raw as i64
    }
}

/// Decode one signal out of an 8-byte frame
///
/// Extracts the raw bit field, sign-extends when the definition is
/// signed, then applies `value = raw * scale + offset`. The advisory
/// min/max bounds are never enforced.
pub fn decode_signal(data: &[u8; 8], signal: &SignalDefinition) -> Result<DecodedSignal> {
    let unsigned = extract_raw(data, signal.start_bit, signal.bit_length, signal.byte_order)?;

    let raw = match signal.value_type {
        ValueType::Signed => sign_extend(unsigned, signal.bit_length),
        ValueType::Unsigned => unsigned as i64,
    };
    let value = raw as f64 * signal.scale + signal.offset;

    Ok(DecodedSignal {
        name: signal.name.clone(),
        value,
        units: signal.units.clone(),
        raw,
    })
}

/// Decode every signal of the message matching the frame's CAN ID
///
/// Returns `None` when the database knows nothing about the ID. Signals
/// whose bit field does not fit the frame are warned about and skipped;
/// the rest of the message still decodes.
pub fn decode_frame(frame: &Frame, db: &SignalDatabase) -> Option<Vec<DecodedSignal>> {
    let signals = db.signals_for(frame.can_id)?;
    let decoded = signals
        .iter()
        .filter_map(|signal| match decode_signal(&frame.data, signal) {
            Ok(d) => Some(d),
            Err(e) => {
                log::warn!("Skipping signal '{}' on 0x{:X}: {}", signal.name, frame.can_id, e);
                None
            }
        })
        .collect();
    Some(decoded)
}
