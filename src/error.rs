use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbdError {
    /// Source file missing or unreadable, or the decompressed sibling could
    /// not be created.
    #[error("cannot open '{}': {source}", path.display())]
    OpenFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Fewer bytes were available than a read required.
    #[error("truncated stream at offset {offset}: expected {expected} bytes, {available} available")]
    TruncatedStream {
        offset: u64,
        expected: usize,
        available: usize,
    },

    /// A sensor table entry is not 1, 2, 4 or 8 bytes wide.
    #[error("unsupported byte width {width} for sensor {sensor}")]
    UnsupportedByteWidth { sensor: usize, width: usize },

    /// A sensor index refers past the end of the sensor table. `offset` is
    /// the start of the cycle whose state vector named it, if any.
    #[error("sensor index {index} out of range ({n_sensors} sensors){}", at_offset(.offset))]
    SensorIndexOutOfRange {
        index: usize,
        n_sensors: usize,
        offset: Option<u64>,
    },

    /// The LZ4 block primitive rejected a compressed block.
    #[error("decompression of block {block} at offset {offset} failed: {reason}")]
    DecompressionFailure {
        block: usize,
        offset: u64,
        reason: String,
    },

    /// Propagated I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn at_offset(offset: &Option<u64>) -> String {
    offset
        .map(|o| format!(" in cycle at offset {o}"))
        .unwrap_or_default()
}

impl DbdError {
    /// True for errors the scan loop tolerates by returning partial results.
    pub fn is_truncation(&self) -> bool {
        matches!(self, DbdError::TruncatedStream { .. })
    }
}

/// Fill `buf` completely from `reader`, reporting a short read as
/// [`DbdError::TruncatedStream`] rather than a bare `UnexpectedEof`.
pub(crate) fn read_full<R: io::Read>(
    reader: &mut R,
    buf: &mut [u8],
    offset: u64,
) -> Result<(), DbdError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(DbdError::TruncatedStream {
                    offset,
                    expected: buf.len(),
                    available: filled,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(DbdError::Io(e)),
        }
    }
    Ok(())
}
