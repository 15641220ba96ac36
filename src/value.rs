use std::io::Read;

use crate::byte_order::ByteOrder;
use crate::error::read_full;
use crate::DbdError;

/// Reads fixed-width sensor values in the byte order detected for one file.
#[derive(Debug, Clone, Copy)]
pub struct SensorValueReader {
    order: ByteOrder,
}

impl SensorValueReader {
    pub fn new(order: ByteOrder) -> Self {
        Self { order }
    }

    /// Read one value of `width` bytes for `sensor` and widen it to `f64`.
    ///
    /// Widths map to `i8`, `i16`, `f32` and `f64`. `offset` only labels a
    /// truncation error.
    pub fn read<R: Read>(
        &self,
        src: &mut R,
        sensor: usize,
        width: usize,
        offset: u64,
    ) -> Result<f64, DbdError> {
        let mut buf = [0u8; 8];
        let bytes = buf
            .get_mut(..width)
            .filter(|_| matches!(width, 1 | 2 | 4 | 8))
            .ok_or(DbdError::UnsupportedByteWidth { sensor, width })?;
        read_full(src, bytes, offset)?;
        Ok(self.convert(bytes))
    }

    /// Interpret an exactly sized byte slice. Width must already be checked.
    fn convert(&self, bytes: &[u8]) -> f64 {
        let swap = self.order.needs_swap();
        match bytes {
            &[b] => b as i8 as f64,
            &[a, b] => {
                let v = i16::from_be_bytes([a, b]);
                (if swap { v.swap_bytes() } else { v }) as f64
            }
            &[a, b, c, d] => {
                let raw = u32::from_be_bytes([a, b, c, d]);
                f32::from_bits(if swap { raw.swap_bytes() } else { raw }) as f64
            }
            _ => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(bytes);
                let raw = u64::from_be_bytes(arr);
                f64::from_bits(if swap { raw.swap_bytes() } else { raw })
            }
        }
    }
}
