//! Binary body layout established by the ASCII header of a glider file.

use crate::DbdError;

/// Byte widths a sensor value may occupy in a cycle chunk.
pub const SUPPORTED_WIDTHS: [usize; 4] = [1, 2, 4, 8];

/// Where the binary body starts and how each cycle is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorLayout {
    bin_offset: u64,
    n_state_bytes: usize,
    byte_widths: Vec<usize>,
}

impl SensorLayout {
    /// Build a layout, rejecting any width other than 1, 2, 4 or 8.
    pub fn new(
        bin_offset: u64,
        n_state_bytes: usize,
        byte_widths: Vec<usize>,
    ) -> Result<Self, DbdError> {
        if let Some((sensor, &width)) = byte_widths
            .iter()
            .enumerate()
            .find(|(_, w)| !SUPPORTED_WIDTHS.contains(w))
        {
            return Err(DbdError::UnsupportedByteWidth { sensor, width });
        }
        Ok(Self {
            bin_offset,
            n_state_bytes,
            byte_widths,
        })
    }

    pub fn bin_offset(&self) -> u64 {
        self.bin_offset
    }

    pub fn n_state_bytes(&self) -> usize {
        self.n_state_bytes
    }

    pub fn n_sensors(&self) -> usize {
        self.byte_widths.len()
    }

    /// Width of the sensor at `index` in the global sensor table.
    pub fn width(&self, index: usize) -> Result<usize, DbdError> {
        self.byte_widths
            .get(index)
            .copied()
            .ok_or(DbdError::SensorIndexOutOfRange {
                index,
                n_sensors: self.byte_widths.len(),
                offset: None,
            })
    }
}

/// An open binary stream together with its layout. Owned by the caller and
/// borrowed mutably for the duration of one decode.
#[derive(Debug)]
pub struct FileDescriptor<R> {
    pub stream: R,
    pub layout: SensorLayout,
}

impl<R> FileDescriptor<R> {
    pub fn new(stream: R, layout: SensorLayout) -> Self {
        Self { stream, layout }
    }

    pub fn into_inner(self) -> R {
        self.stream
    }
}
