//! Byte order detection from the calibration record that opens every binary
//! body.
//!
//! The record layout is fixed:
//!
//! ```text
//! ['s'][ 'a' ][ 0x1234 (u16) ][ 123.456 (f32) ][ 123456789.12345 (f64) ][tag]
//!   1     1          2               4                     8              1
//! ```
//!
//! Only the 16-bit integer is inspected. The trailing tag byte belongs to the
//! first data cycle, so the whole 17 bytes are skipped before decoding.

use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, warn};

use crate::error::read_full;
use crate::DbdError;

/// Total width of the calibration record including the first cycle tag.
pub const CALIBRATION_RECORD_LEN: u64 = 17;
/// Value of the 16-bit calibration integer in file order.
pub const CALIBRATION_U16: u16 = 0x1234;

/// Order in which multi-byte values are stored in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// File order; values are read without swapping.
    Native,
    /// Values must be byte-swapped.
    Swapped,
}

impl ByteOrder {
    pub fn needs_swap(self) -> bool {
        self == ByteOrder::Swapped
    }
}

/// Read the calibration record at the current stream position and decide
/// whether multi-byte values must be swapped. On return the stream sits on
/// the first decodable cycle.
pub fn detect_byte_order<R: Read + Seek>(stream: &mut R) -> Result<ByteOrder, DbdError> {
    let start = stream.stream_position()?;
    let mut head = [0u8; 4];
    read_full(stream, &mut head, start)?;

    let probe = u16::from_be_bytes([head[2], head[3]]);
    let order = if probe == CALIBRATION_U16 {
        ByteOrder::Native
    } else {
        if probe.swap_bytes() != CALIBRATION_U16 {
            warn!(
                offset = start,
                value = probe,
                "calibration integer matches neither byte order, assuming swapped"
            );
        }
        ByteOrder::Swapped
    };

    stream.seek(SeekFrom::Start(start + CALIBRATION_RECORD_LEN))?;
    debug!(?order, offset = start, "detected byte order");
    Ok(order)
}
