#![allow(dead_code)]

use std::io::Cursor;

use dbdreader::{FileDescriptor, SensorLayout};

/// State of one sensor in a synthetic cycle.
#[derive(Clone, Copy, Debug)]
pub enum Field {
    NotSet,
    Same,
    Updated(f64),
}

/// Builds a glider file: a short ASCII header, the calibration record and
/// any number of cycles.
pub struct GliderFile {
    widths: Vec<usize>,
    n_state_bytes: usize,
    swapped: bool,
    bin_offset: u64,
    data: Vec<u8>,
}

impl GliderFile {
    pub fn new(widths: &[usize]) -> Self {
        Self::with_order(widths, false)
    }

    pub fn with_order(widths: &[usize], swapped: bool) -> Self {
        let header = format!(
            "dbd_label:    DBD(dinkum_binary_data)file\nsensors_per_cycle: {}\nstate_bytes_per_cycle: {}\n",
            widths.len(),
            widths.len().div_ceil(4)
        );
        let mut data = header.into_bytes();
        let bin_offset = data.len() as u64;
        data.push(b's');
        data.push(b'a');
        data.extend(encode_u16(0x1234, swapped));
        data.extend(encode(4, 123.456, swapped));
        data.extend(encode(8, 123456789.12345, swapped));
        data.push(b'd');
        Self {
            widths: widths.to_vec(),
            n_state_bytes: widths.len().div_ceil(4),
            swapped,
            bin_offset,
            data,
        }
    }

    /// Append a cycle; sensors past `fields.len()` are not set.
    pub fn cycle(mut self, fields: &[Field]) -> Self {
        let mut state = vec![0u8; self.n_state_bytes];
        let mut chunk = Vec::new();
        for (i, f) in fields.iter().enumerate() {
            let code: u8 = match f {
                Field::NotSet => 0,
                Field::Same => 1,
                Field::Updated(v) => {
                    chunk.extend(encode(self.widths[i], *v, self.swapped));
                    2
                }
            };
            state[i / 4] |= code << (6 - 2 * (i % 4));
        }
        self.data.extend(state);
        self.data.extend(chunk);
        self.data.push(b'd');
        self
    }

    pub fn layout(&self) -> SensorLayout {
        SensorLayout::new(self.bin_offset, self.n_state_bytes, self.widths.clone()).unwrap()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    pub fn descriptor(&self) -> FileDescriptor<Cursor<Vec<u8>>> {
        FileDescriptor::new(Cursor::new(self.bytes()), self.layout())
    }
}

fn encode_u16(v: u16, swapped: bool) -> Vec<u8> {
    if swapped {
        v.to_le_bytes().to_vec()
    } else {
        v.to_be_bytes().to_vec()
    }
}

/// Encode `v` the way a sensor of `width` bytes stores it.
pub fn encode(width: usize, v: f64, swapped: bool) -> Vec<u8> {
    let (be, le) = match width {
        1 => (vec![v as i8 as u8], vec![v as i8 as u8]),
        2 => ((v as i16).to_be_bytes().to_vec(), (v as i16).to_le_bytes().to_vec()),
        4 => ((v as f32).to_be_bytes().to_vec(), (v as f32).to_le_bytes().to_vec()),
        8 => (v.to_be_bytes().to_vec(), v.to_le_bytes().to_vec()),
        _ => panic!("bad width {width}"),
    };
    if swapped {
        le
    } else {
        be
    }
}

/// Frame `blocks` as a compressed glider container.
pub fn frame(blocks: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for b in blocks {
        let c = lz4_flex::block::compress(b);
        out.extend_from_slice(&(c.len() as u16).to_be_bytes());
        out.extend_from_slice(&c);
    }
    out
}

/// Split `data` into container blocks of at most 32 KiB each.
pub fn compress_container(data: &[u8]) -> Vec<u8> {
    let blocks: Vec<&[u8]> = data.chunks(dbdreader::CHUNK_SIZE).collect();
    frame(&blocks)
}
