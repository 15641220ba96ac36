//! LZ4 block framing used by compressed glider files.
//!
//! A compressed file is a plain sequence of blocks without header, trailer or
//! checksum:
//!
//! ```text
//! [len: u16 BE][len bytes of LZ4 block data] [len: u16 BE][...] ...
//! ```
//!
//! Every block decompresses independently into at most [`CHUNK_SIZE`] bytes.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::read_full;
use crate::DbdError;

/// Upper bound of the decompressed size of one block.
pub const CHUNK_SIZE: usize = 32 * 1024;
/// Width of the big-endian length prefix of each block.
pub const LENGTH_FIELD_SIZE: u64 = 2;

/// Decodes framed blocks from a reader of known total length.
#[derive(Debug)]
pub struct BlockDecompressor<R> {
    reader: R,
    position: u64,
    total_len: u64,
    blocks: usize,
    payload: Vec<u8>,
    chunk: Vec<u8>,
    failed: bool,
}

impl BlockDecompressor<BufReader<File>> {
    /// Open a compressed file for block-wise decompression.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbdError> {
        let path = path.as_ref();
        let open_failure = |source| DbdError::OpenFailure {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(open_failure)?;
        let total_len = file.metadata().map_err(open_failure)?.len();
        Ok(Self::new(BufReader::new(file), total_len))
    }
}

impl<R: Read> BlockDecompressor<R> {
    /// `total_len` is the number of compressed bytes `reader` will yield.
    pub fn new(reader: R, total_len: u64) -> Self {
        Self {
            reader,
            position: 0,
            total_len,
            blocks: 0,
            payload: Vec::new(),
            chunk: vec![0; CHUNK_SIZE],
            failed: false,
        }
    }

    /// Compressed bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Blocks decoded so far.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Decode the next block, or `None` once the input is exhausted.
    pub fn next_block(&mut self) -> Result<Option<&[u8]>, DbdError> {
        if self.failed || self.position >= self.total_len {
            return Ok(None);
        }
        let offset = self.position;
        let block = self.blocks;
        let result = self.decode_block(offset, block);
        match result {
            Ok(n) => {
                self.blocks += 1;
                Ok(Some(&self.chunk[..n]))
            }
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    fn decode_block(&mut self, offset: u64, block: usize) -> Result<usize, DbdError> {
        let mut len = [0u8; LENGTH_FIELD_SIZE as usize];
        read_full(&mut self.reader, &mut len, offset)?;
        let len = u16::from_be_bytes(len) as usize;

        self.payload.resize(len, 0);
        read_full(&mut self.reader, &mut self.payload, offset + LENGTH_FIELD_SIZE)?;
        self.position = offset + LENGTH_FIELD_SIZE + len as u64;

        if len == 0 {
            return Ok(0);
        }
        lz4_flex::block::decompress_into(&self.payload, &mut self.chunk).map_err(|e| {
            DbdError::DecompressionFailure {
                block,
                offset,
                reason: e.to_string(),
            }
        })
    }

    /// Decompress all remaining blocks into `out`, returning the number of
    /// bytes written.
    pub fn decompress_to<W: Write>(&mut self, out: &mut W) -> Result<u64, DbdError> {
        let mut written = 0u64;
        while let Some(block) = self.next_block()? {
            out.write_all(block)?;
            written += block.len() as u64;
        }
        debug!(blocks = self.blocks, bytes = written, "decompressed container");
        Ok(written)
    }
}

impl<R: Read> Iterator for BlockDecompressor<R> {
    type Item = Result<Vec<u8>, DbdError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_block()
            .map(|block| block.map(<[u8]>::to_vec))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(blocks: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for b in blocks {
            let c = lz4_flex::block::compress(b);
            out.extend_from_slice(&(c.len() as u16).to_be_bytes());
            out.extend_from_slice(&c);
        }
        out
    }

    #[test]
    fn decodes_blocks_in_order() {
        let data = frame(&[b"dbd_label: DBD", b"(dinkum_binary_data)file\n"]);
        let blocks: Vec<_> = BlockDecompressor::new(&data[..], data.len() as u64)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], b"dbd_label: DBD");
        assert_eq!(blocks[1], b"(dinkum_binary_data)file\n");
    }

    #[test]
    fn take_limits_blocks() {
        let data = frame(&[b"one", b"two", b"three"]);
        let d = BlockDecompressor::new(&data[..], data.len() as u64);
        assert_eq!(d.take(1).count(), 1);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let mut d = BlockDecompressor::new(&b""[..], 0);
        let mut out = Vec::new();
        assert_eq!(d.decompress_to(&mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn zero_length_block_is_empty() {
        let data = [0u8, 0];
        let mut d = BlockDecompressor::new(&data[..], 2);
        assert_eq!(d.next_block().unwrap(), Some(&b""[..]));
        assert_eq!(d.next_block().unwrap(), None);
    }

    #[test]
    fn dangling_length_byte_is_truncated() {
        let mut data = frame(&[b"abc"]);
        data.push(0x01);
        let mut d = BlockDecompressor::new(&data[..], data.len() as u64);
        let mut out = Vec::new();
        assert!(d.decompress_to(&mut out).unwrap_err().is_truncation());
    }

    #[test]
    fn corrupt_payload_reports_block() {
        let mut data = frame(&[b"first block", b"second block"]);
        let second = 2 + lz4_flex::block::compress(b"first block").len();
        // a literal run longer than the payload is an LZ4 error
        data[second + 2] = 0xF0;
        let mut d = BlockDecompressor::new(&data[..], data.len() as u64);
        assert!(d.next_block().is_ok());
        match d.next_block() {
            Err(DbdError::DecompressionFailure { block, offset, .. }) => {
                assert_eq!(block, 1);
                assert_eq!(offset, second as u64);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(d.next().is_none());
    }
}
