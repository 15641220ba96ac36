use dbdreader::BlockDecompressor;
use honggfuzz::fuzz;

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let mut out = Vec::new();
            let _ = BlockDecompressor::new(data, data.len() as u64).decompress_to(&mut out);
        });
    }
}
