//! Transparent access to compressed glider files.
//!
//! A file is compressed when its extension has three characters and the
//! second is `c` (`.dcd`, `.ecd`, `.tcd`, ...). The cache keeps its
//! decompressed form next to it under the same name with that character
//! replaced by `b` (`.dbd`, `.ebd`, `.tbd`).
//!
//! [`decompress_file`] instead writes the name glider tools expect for each
//! kind of compressed file: data `.?cd` becomes `.?bd`, logs `.?cg` become
//! `.?lg` and cache files `.?cc` become `.?ac`.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::CacheMode;
use crate::decompress::BlockDecompressor;
use crate::DbdError;

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// True if the extension of `path` has three characters, the second a `c`.
pub fn is_compressed<P: AsRef<Path>>(path: P) -> bool {
    extension(path.as_ref())
        .filter(|ext| ext.chars().count() == 3)
        .and_then(|ext| ext.chars().nth(1))
        .is_some_and(|c| c.eq_ignore_ascii_case(&'c'))
}

/// Path of the decompressed sibling of a compressed file, or `None` if `path`
/// is not compressed.
pub fn decompressed_sibling<P: AsRef<Path>>(path: P) -> Option<PathBuf> {
    let path = path.as_ref();
    if !is_compressed(path) {
        return None;
    }
    let ext: String = extension(path)?
        .chars()
        .enumerate()
        .map(|(i, c)| match (i, c) {
            (1, 'c') => 'b',
            (1, 'C') => 'B',
            (_, c) => c,
        })
        .collect();
    Some(path.with_extension(ext))
}

/// Path [`decompress_file`] writes for `path`, or `None` if the extension is
/// not one of `.?cd`, `.?cg` or `.?cc`. The case of each letter is kept.
pub fn decompressed_output_name<P: AsRef<Path>>(path: P) -> Option<PathBuf> {
    let path = path.as_ref();
    let ext = extension(path).filter(|ext| ext.len() == 3 && ext.is_ascii())?;
    let (kind, suffix) = ext.split_at(1);
    let replacement = match suffix.to_ascii_lowercase().as_str() {
        "cd" => "bd",
        "cg" => "lg",
        "cc" => "ac",
        _ => return None,
    };
    let suffix: String = suffix
        .chars()
        .zip(replacement.chars())
        .map(|(old, new)| {
            if old.is_ascii_uppercase() {
                new.to_ascii_uppercase()
            } else {
                new
            }
        })
        .collect();
    Some(path.with_extension(format!("{kind}{suffix}")))
}

/// Readable stream over the logical (decompressed) content of a file.
#[derive(Debug)]
pub enum LogicalStream {
    File(BufReader<File>),
    Memory(Cursor<Vec<u8>>),
}

impl Read for LogicalStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            LogicalStream::File(f) => f.read(buf),
            LogicalStream::Memory(m) => m.read(buf),
        }
    }
}

impl Seek for LogicalStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            LogicalStream::File(f) => f.seek(pos),
            LogicalStream::Memory(m) => m.seek(pos),
        }
    }
}

/// How the stream returned by [`CompressedFileCache::open`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    /// The file was not compressed and is read as is.
    Plain,
    /// The sibling file was written by this call.
    Decompressed,
    /// An existing sibling file was reused.
    Cached,
    /// The content was decompressed into memory.
    InMemory,
}

#[derive(Debug)]
pub struct OpenedSource {
    pub stream: LogicalStream,
    pub origin: SourceOrigin,
}

/// Opens glider files, decompressing them first when needed.
#[derive(Debug, Clone, Default)]
pub struct CompressedFileCache {
    mode: CacheMode,
}

impl CompressedFileCache {
    pub fn new(mode: CacheMode) -> Self {
        Self { mode }
    }

    /// Open `path` positioned at offset 0 of its logical content.
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<OpenedSource, DbdError> {
        let path = path.as_ref();
        let Some(sibling) = decompressed_sibling(path) else {
            return Ok(OpenedSource {
                stream: LogicalStream::File(open_reader(path)?),
                origin: SourceOrigin::Plain,
            });
        };

        match self.mode {
            CacheMode::SiblingFile => {
                match File::open(&sibling) {
                    Ok(file) => {
                        let is_file = file
                            .metadata()
                            .map_err(|source| open_failure(&sibling, source))?
                            .is_file();
                        if !is_file {
                            return Err(open_failure(
                                &sibling,
                                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
                            ));
                        }
                        debug!(path = %sibling.display(), "reusing decompressed sibling");
                        return Ok(OpenedSource {
                            stream: LogicalStream::File(BufReader::new(file)),
                            origin: SourceOrigin::Cached,
                        });
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(source) => return Err(open_failure(&sibling, source)),
                }
                write_sibling(path, &sibling)?;
                Ok(OpenedSource {
                    stream: LogicalStream::File(open_reader(&sibling)?),
                    origin: SourceOrigin::Decompressed,
                })
            }
            CacheMode::InMemory { max_bytes } => {
                let data = decompress_in_memory(path, max_bytes)?;
                Ok(OpenedSource {
                    stream: LogicalStream::Memory(Cursor::new(data)),
                    origin: SourceOrigin::InMemory,
                })
            }
        }
    }

    /// Decompress `path` to [`decompressed_output_name`], replacing any
    /// existing file.
    pub fn materialize<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, DbdError> {
        let path = path.as_ref();
        let output = decompressed_output_name(path).ok_or_else(|| {
            open_failure(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "unhandled file extension"),
            )
        })?;
        write_sibling(path, &output)?;
        Ok(output)
    }
}

/// Open `path` with the default sibling-file cache and return its logical
/// content.
pub fn open_possibly_compressed<P: AsRef<Path>>(path: P) -> Result<LogicalStream, DbdError> {
    CompressedFileCache::default()
        .open(path)
        .map(|opened| opened.stream)
}

/// Decompress `path` next to itself and return the written path.
pub fn decompress_file<P: AsRef<Path>>(path: P) -> Result<PathBuf, DbdError> {
    CompressedFileCache::default().materialize(path)
}

fn open_failure(path: &Path, source: io::Error) -> DbdError {
    DbdError::OpenFailure {
        path: path.to_path_buf(),
        source,
    }
}

fn open_reader(path: &Path) -> Result<BufReader<File>, DbdError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| open_failure(path, source))
}

/// Decompress into a temporary file beside `sibling` and move it into place
/// only once every block decoded.
fn write_sibling(path: &Path, sibling: &Path) -> Result<(), DbdError> {
    let mut blocks = BlockDecompressor::open(path)?;
    let dir = match sibling.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let create_failure = |source| open_failure(sibling, source);

    let mut tmp = NamedTempFile::new_in(dir).map_err(create_failure)?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        blocks.decompress_to(&mut out)?;
        out.flush()?;
    }
    tmp.persist(sibling)
        .map_err(|e| create_failure(e.error))?;
    debug!(
        source = %path.display(),
        sibling = %sibling.display(),
        blocks = blocks.blocks(),
        "wrote decompressed sibling"
    );
    Ok(())
}

fn decompress_in_memory(path: &Path, max_bytes: usize) -> Result<Vec<u8>, DbdError> {
    let mut blocks = BlockDecompressor::open(path)?;
    let mut data = Vec::new();
    loop {
        let offset = blocks.position();
        let index = blocks.blocks();
        let Some(block) = blocks.next_block()? else {
            break;
        };
        if data.len() + block.len() > max_bytes {
            return Err(DbdError::DecompressionFailure {
                block: index,
                offset,
                reason: format!("decompressed content exceeds {max_bytes} bytes"),
            });
        }
        data.extend_from_slice(block);
    }
    debug!(path = %path.display(), bytes = data.len(), "decompressed into memory");
    Ok(data)
}
