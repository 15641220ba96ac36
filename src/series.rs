use std::collections::BTreeMap;

use serde::Serialize;

/// Elements added to a series buffer each time it fills up.
pub const SERIES_BLOCK_SIZE: usize = 1000;

/// Parallel timestamp/value sequences for one sensor, grown one block at a
/// time.
#[derive(Debug, Clone, Default)]
pub struct SeriesBuffer {
    timestamps: Vec<f64>,
    values: Vec<f64>,
}

impl SeriesBuffer {
    pub fn push(&mut self, t: f64, x: f64) {
        if self.timestamps.len() % SERIES_BLOCK_SIZE == 0 {
            self.timestamps.reserve_exact(SERIES_BLOCK_SIZE);
            self.values.reserve_exact(SERIES_BLOCK_SIZE);
        }
        self.timestamps.push(t);
        self.values.push(x);
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.timestamps.capacity().min(self.values.capacity())
    }
}

/// Decoded series of one requested sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSeries {
    pub sensor: usize,
    pub timestamps: Vec<f64>,
    pub values: Vec<f64>,
}

impl SensorSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Result of a decode: one series per requested sensor, ascending by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerSensorSeries {
    series: Vec<SensorSeries>,
}

impl PerSensorSeries {
    /// Series of `sensor`, the first one if it was requested twice.
    pub fn get(&self, sensor: usize) -> Option<&SensorSeries> {
        self.series.iter().find(|s| s.sensor == sensor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorSeries> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Map sensor index to `(timestamps, values)`. Duplicate requests collapse
    /// into one entry; they always hold identical data.
    pub fn into_map(self) -> BTreeMap<usize, (Vec<f64>, Vec<f64>)> {
        self.series
            .into_iter()
            .map(|s| (s.sensor, (s.timestamps, s.values)))
            .collect()
    }
}

impl IntoIterator for PerSensorSeries {
    type Item = SensorSeries;
    type IntoIter = std::vec::IntoIter<SensorSeries>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.into_iter()
    }
}

/// Collects `(time, value)` pairs per output slot during a scan.
#[derive(Debug)]
pub struct SeriesAccumulator {
    sensors: Vec<usize>,
    buffers: Vec<SeriesBuffer>,
}

impl SeriesAccumulator {
    /// One slot per entry of `sensors`, in the same order.
    pub fn new(sensors: Vec<usize>) -> Self {
        let buffers = vec![SeriesBuffer::default(); sensors.len()];
        Self { sensors, buffers }
    }

    pub fn append(&mut self, slot: usize, t: f64, x: f64) {
        self.buffers[slot].push(t, x);
    }

    pub fn len(&self, slot: usize) -> usize {
        self.buffers[slot].len()
    }

    /// True once every slot holds at least `limit` values.
    pub fn all_reached(&self, limit: usize) -> bool {
        self.buffers.iter().all(|b| b.len() >= limit)
    }

    pub fn finalize(self) -> PerSensorSeries {
        let series = self
            .sensors
            .into_iter()
            .zip(self.buffers)
            .map(|(sensor, buf)| {
                let SeriesBuffer {
                    mut timestamps,
                    mut values,
                } = buf;
                timestamps.shrink_to_fit();
                values.shrink_to_fit();
                SensorSeries {
                    sensor,
                    timestamps,
                    values,
                }
            })
            .collect();
        PerSensorSeries { series }
    }
}
