//! State vector decoding.
//!
//! Every cycle opens with `n_state_bytes` bytes of 2-bit fields, four per
//! byte, MSB first, one field per sensor in ascending global index:
//!
//! ```text
//! byte:  [f0 f0][f1 f1][f2 f2][f3 f3]   f = 0 not set, 1 same, 2 updated
//! ```
//!
//! The fresh values of all updated sensors follow the state bytes in the same
//! order, so the byte offset of a requested value inside that chunk is the sum
//! of the widths of every updated sensor before it.

use std::io::Read;

use crate::error::read_full;
use crate::layout::SensorLayout;
use crate::DbdError;

const BITS_PER_FIELD: u32 = 2;
const FIELDS_PER_BYTE: u32 = 8 / BITS_PER_FIELD;
const FIELD_MASK: u8 = 0b11;

const NOTSET: u8 = 0;
const SAME: u8 = 1;
const UPDATED: u8 = 2;

/// Requested sensor indices merged with the time index, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedIndexSet {
    indices: Vec<usize>,
    time_position: usize,
}

impl RequestedIndexSet {
    /// Merge `sensors` and `time_index` into one ascending sequence. The time
    /// index is placed after any explicit request for the same index.
    pub fn new(sensors: &[usize], time_index: usize) -> Self {
        let mut indices = sensors.to_vec();
        indices.sort_unstable();
        let time_position = indices.partition_point(|&i| i <= time_index);
        indices.insert(time_position, time_index);
        Self {
            indices,
            time_position,
        }
    }

    /// Fail if any index lies past the sensor table.
    pub fn validate(&self, layout: &SensorLayout) -> Result<(), DbdError> {
        let n_sensors = layout.n_sensors();
        match self.indices.last() {
            Some(&index) if index >= n_sensors => Err(DbdError::SensorIndexOutOfRange {
                index,
                n_sensors,
                offset: None,
            }),
            _ => Ok(()),
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn time_position(&self) -> usize {
        self.time_position
    }

    /// `(position, global index)` of every requested sensor other than time.
    pub fn sensor_positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let time = self.time_position;
        self.indices
            .iter()
            .copied()
            .enumerate()
            .filter(move |&(p, _)| p != time)
    }
}

/// Where a requested sensor's value comes from in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOffset {
    /// Fresh value at this byte offset within the cycle chunk.
    Updated(usize),
    /// Unchanged; reuse the last value read.
    Same,
    /// Never set, or not described by the state vector.
    NotSet,
}

impl FieldOffset {
    /// Whether the value is emitted under the given not-set policy.
    pub fn is_included(self, include_not_set: bool) -> bool {
        match self {
            FieldOffset::Updated(_) | FieldOffset::Same => true,
            FieldOffset::NotSet => include_not_set,
        }
    }
}

/// Decoded state of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleState {
    pub offsets: Vec<FieldOffset>,
    /// Bytes of fresh values for every updated sensor, requested or not.
    pub chunk_size: usize,
    /// Requested positions matched by a field during the scan.
    pub resolved: usize,
}

impl CycleState {
    pub fn new(n_requested: usize) -> Self {
        Self {
            offsets: vec![FieldOffset::NotSet; n_requested],
            chunk_size: 0,
            resolved: 0,
        }
    }

    fn reset(&mut self) {
        self.offsets.fill(FieldOffset::NotSet);
        self.chunk_size = 0;
        self.resolved = 0;
    }
}

/// Reads and decodes state vectors, reusing one buffer across cycles.
#[derive(Debug)]
pub struct StateCycleDecoder {
    state_bytes: Vec<u8>,
}

impl StateCycleDecoder {
    pub fn new(n_state_bytes: usize) -> Self {
        Self {
            state_bytes: vec![0; n_state_bytes],
        }
    }

    /// Read the state vector at the current stream position (`offset`) and
    /// decode it into `state`. The stream is left on the first chunk byte.
    pub fn read_cycle<R: Read>(
        &mut self,
        stream: &mut R,
        offset: u64,
        requested: &RequestedIndexSet,
        layout: &SensorLayout,
        state: &mut CycleState,
    ) -> Result<(), DbdError> {
        read_full(stream, &mut self.state_bytes, offset)?;
        decode_state_bytes(&self.state_bytes, requested, layout, state).map_err(|e| match e {
            DbdError::SensorIndexOutOfRange {
                index, n_sensors, ..
            } => DbdError::SensorIndexOutOfRange {
                index,
                n_sensors,
                offset: Some(offset),
            },
            e => e,
        })
    }
}

/// Decode packed state bytes into per-request offsets and the chunk size.
pub fn decode_state_bytes(
    state_bytes: &[u8],
    requested: &RequestedIndexSet,
    layout: &SensorLayout,
    state: &mut CycleState,
) -> Result<(), DbdError> {
    let wanted = requested.indices();
    debug_assert_eq!(state.offsets.len(), wanted.len());
    state.reset();

    let mut global_index = 0usize;
    let mut p = 0usize;
    for &byte in state_bytes {
        for fld in 0..FIELDS_PER_BYTE {
            let shift = 8 - BITS_PER_FIELD * (fld + 1);
            let field = (byte >> shift) & FIELD_MASK;

            while p < wanted.len() && wanted[p] < global_index {
                p += 1;
            }
            let hit = (p < wanted.len() && wanted[p] == global_index).then_some(p);

            match field {
                UPDATED => {
                    if let Some(p) = hit {
                        state.offsets[p] = FieldOffset::Updated(state.chunk_size);
                        state.resolved += 1;
                    }
                    state.chunk_size += layout.width(global_index)?;
                }
                SAME => {
                    if let Some(p) = hit {
                        state.offsets[p] = FieldOffset::Same;
                        state.resolved += 1;
                    }
                }
                NOTSET => {
                    if let Some(p) = hit {
                        state.offsets[p] = FieldOffset::NotSet;
                        state.resolved += 1;
                    }
                }
                _ => {}
            }
            global_index += 1;
        }
    }

    // only the first of a run of equal indices was written above
    for p in 1..wanted.len() {
        if wanted[p] == wanted[p - 1] {
            state.offsets[p] = state.offsets[p - 1];
        }
    }
    Ok(())
}
