use std::io::Cursor;

use dbdreader::{decode, DecodeOptions, FileDescriptor, SensorLayout, ViabilityPolicy};
use honggfuzz::fuzz;

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            if data.len() < 4 {
                return;
            }
            // first bytes pick the sensor table, the rest is the body
            let widths: Vec<usize> = data[..4]
                .iter()
                .map(|b| [1, 2, 4, 8][(*b & 3) as usize])
                .collect();
            let Ok(layout) = SensorLayout::new(4, 1, widths) else {
                return;
            };
            let opts = DecodeOptions {
                include_not_set: data[0] & 0x80 != 0,
                skip_first_cycle: data[1] & 0x80 != 0,
                max_values_per_sensor: None,
                viability: if data[2] & 0x80 != 0 {
                    ViabilityPolicy::Legacy
                } else {
                    ViabilityPolicy::AnyResolved
                },
            };
            let mut fd = FileDescriptor::new(Cursor::new(data.to_vec()), layout);
            let _ = decode(&mut fd, &[1, 2, 3], 0, &opts);
        });
    }
}
