//! Cycle-by-cycle scan of a binary body.

use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, warn};

use crate::byte_order::detect_byte_order;
use crate::config::DecodeOptions;
use crate::error::read_full;
use crate::layout::{FileDescriptor, SensorLayout};
use crate::series::{PerSensorSeries, SeriesAccumulator};
use crate::state::{CycleState, FieldOffset, RequestedIndexSet, StateCycleDecoder};
use crate::value::SensorValueReader;
use crate::{DbdError, FILL_VALUE};

/// Decode the series of `sensors` against `time_index` from the body of `fd`.
///
/// A body that ends in the middle of a cycle yields the series accumulated up
/// to the last complete cycle. The stream position is unspecified afterwards.
pub fn decode<R: Read + Seek>(
    fd: &mut FileDescriptor<R>,
    sensors: &[usize],
    time_index: usize,
    opts: &DecodeOptions,
) -> Result<PerSensorSeries, DbdError> {
    let requested = RequestedIndexSet::new(sensors, time_index);
    requested.validate(&fd.layout)?;
    ScanLoop::new(&fd.layout, requested, opts).run(&mut fd.stream)
}

enum Step {
    Continue(u64),
    Done,
}

/// Per-decode state: last known values, cycle scratch space and output.
struct ScanLoop<'a> {
    layout: &'a SensorLayout,
    requested: RequestedIndexSet,
    opts: &'a DecodeOptions,
    decoder: StateCycleDecoder,
    cycle: CycleState,
    last_known: Vec<Option<f64>>,
    resolved: Vec<f64>,
    chunk: Vec<u8>,
    acc: SeriesAccumulator,
    seen_viable: bool,
    cycles: u64,
}

impl<'a> ScanLoop<'a> {
    fn new(layout: &'a SensorLayout, requested: RequestedIndexSet, opts: &'a DecodeOptions) -> Self {
        let n = requested.len();
        let acc = SeriesAccumulator::new(requested.sensor_positions().map(|(_, s)| s).collect());
        Self {
            layout,
            decoder: StateCycleDecoder::new(layout.n_state_bytes()),
            cycle: CycleState::new(n),
            last_known: vec![None; n],
            resolved: vec![FILL_VALUE; n],
            chunk: Vec::new(),
            acc,
            requested,
            opts,
            seen_viable: false,
            cycles: 0,
        }
    }

    fn run<R: Read + Seek>(mut self, stream: &mut R) -> Result<PerSensorSeries, DbdError> {
        let end = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(self.layout.bin_offset()))?;

        let reader = match detect_byte_order(stream) {
            Ok(order) => SensorValueReader::new(order),
            Err(e) if e.is_truncation() => {
                warn!(%e, "binary body too short for the calibration record");
                return Ok(self.acc.finalize());
            }
            Err(e) => return Err(e),
        };

        let mut pos = stream.stream_position()?;
        while pos < end {
            if self.limit_reached() {
                break;
            }
            match self.step(stream, &reader, pos, end) {
                Ok(Step::Continue(next)) => pos = next,
                Ok(Step::Done) => break,
                Err(e) if e.is_truncation() => {
                    warn!(%e, cycles = self.cycles, "truncated body, returning partial series");
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        debug!(cycles = self.cycles, "scan complete");
        Ok(self.acc.finalize())
    }

    fn limit_reached(&self) -> bool {
        self.opts
            .max_values_per_sensor
            .is_some_and(|max| self.acc.all_reached(max))
    }

    /// Decode the cycle whose state vector starts at `pos`.
    fn step<R: Read + Seek>(
        &mut self,
        stream: &mut R,
        reader: &SensorValueReader,
        pos: u64,
        end: u64,
    ) -> Result<Step, DbdError> {
        stream.seek(SeekFrom::Start(pos))?;
        self.decoder
            .read_cycle(stream, pos, &self.requested, self.layout, &mut self.cycle)?;
        let values_start = pos + self.layout.n_state_bytes() as u64;

        if self.opts.viability.is_viable(self.cycle.resolved) {
            self.resolve_values(stream, reader, values_start)?;
            if self.seen_viable || !self.opts.skip_first_cycle {
                self.emit();
            }
            self.seen_viable = true;
        }
        self.cycles += 1;

        let next = values_start + self.cycle.chunk_size as u64 + 1;
        Ok(if next >= end {
            Step::Done
        } else {
            Step::Continue(next)
        })
    }

    /// Fill `resolved` for every requested position of the current cycle.
    fn resolve_values<R: Read>(
        &mut self,
        stream: &mut R,
        reader: &SensorValueReader,
        values_start: u64,
    ) -> Result<(), DbdError> {
        let indices = self.requested.indices();

        let mut needed = 0usize;
        for (p, offset) in self.cycle.offsets.iter().enumerate() {
            if let FieldOffset::Updated(off) = *offset {
                needed = needed.max(off + self.layout.width(indices[p])?);
            }
        }
        self.chunk.resize(needed, 0);
        read_full(stream, &mut self.chunk, values_start)?;

        for (p, offset) in self.cycle.offsets.iter().enumerate() {
            self.resolved[p] = match *offset {
                FieldOffset::Updated(off) => {
                    let sensor = indices[p];
                    let mut src = &self.chunk[off..];
                    let v = reader.read(
                        &mut src,
                        sensor,
                        self.layout.width(sensor)?,
                        values_start + off as u64,
                    )?;
                    self.last_known[p] = Some(v);
                    v
                }
                FieldOffset::Same => self.last_known[p].unwrap_or(FILL_VALUE),
                FieldOffset::NotSet => FILL_VALUE,
            };
        }
        Ok(())
    }

    fn emit(&mut self) {
        let t = self.resolved[self.requested.time_position()];
        let limit = self.opts.max_values_per_sensor;
        for (slot, (p, _)) in self.requested.sensor_positions().enumerate() {
            if !self.cycle.offsets[p].is_included(self.opts.include_not_set) {
                continue;
            }
            if limit.is_some_and(|max| self.acc.len(slot) >= max) {
                continue;
            }
            self.acc.append(slot, t, self.resolved[p]);
        }
    }
}
