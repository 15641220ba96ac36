//! Decoder for the sparse binary telemetry logs written by Slocum gliders
//! (`.dbd`, `.ebd`, `.mbd`, ... and their LZ4 compressed `.?c?` forms).
//!
//! The ASCII header of a file is parsed elsewhere; it yields the
//! [`SensorLayout`] this crate needs. A typical read is:
//!
//! ```no_run
//! use dbdreader::{decode, open_possibly_compressed, DecodeOptions, FileDescriptor, SensorLayout};
//!
//! # fn main() -> Result<(), dbdreader::DbdError> {
//! let stream = open_possibly_compressed("01600000.dcd")?;
//! let layout = SensorLayout::new(1234, 2, vec![8, 4, 4, 2, 1, 8])?;
//! let mut fd = FileDescriptor::new(stream, layout);
//! let series = decode(&mut fd, &[2, 3], 0, &DecodeOptions::default())?;
//! for s in series.iter() {
//!     println!("sensor {}: {} values", s.sensor, s.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod byte_order;
pub mod cache;
pub mod config;
pub mod decompress;
mod error;
pub mod io_utils;
pub mod layout;
pub mod scan;
pub mod series;
pub mod state;
pub mod value;

pub use byte_order::{detect_byte_order, ByteOrder, CALIBRATION_RECORD_LEN, CALIBRATION_U16};
pub use cache::{
    decompress_file, decompressed_output_name, decompressed_sibling, is_compressed,
    open_possibly_compressed, CompressedFileCache, LogicalStream, OpenedSource, SourceOrigin,
};
pub use config::{CacheMode, DecodeOptions, ViabilityPolicy, MAX_IN_MEMORY_FILE_SIZE};
pub use decompress::{BlockDecompressor, CHUNK_SIZE};
pub use error::DbdError;
pub use layout::{FileDescriptor, SensorLayout};
pub use scan::decode;
pub use series::{PerSensorSeries, SensorSeries, SeriesAccumulator, SeriesBuffer};
pub use state::{decode_state_bytes, CycleState, FieldOffset, RequestedIndexSet, StateCycleDecoder};
pub use value::SensorValueReader;

/// Value substituted for sensors that are not set in a cycle.
pub const FILL_VALUE: f64 = 1e9;
