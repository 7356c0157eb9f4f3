//! Archive codecs
//!
//! Provides a trait abstraction for pluggable archive encoders. Each codec
//! wraps a file and provides buffered, compressed writing; `finish()` closes
//! the compressed stream and hands the file back so it can be synced.
//!
//! # Available Codecs
//!
//! - `GzipCodec` - gzip (`.gz`), widely readable
//! - `Lz4Codec` - LZ4 frame format (`.lz4`), fast
//!
//! # Example
//!
//! ```ignore
//! use logroll_writer::codec::{compress_file, GzipCodec};
//!
//! compress_file(&GzipCodec::default(), "app.log.0000000001".as_ref(), "app.log.0000000001.gz".as_ref())?;
//! ```

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use lz4_flex::frame::FrameEncoder;

/// Buffer size between the encoder and the archive file
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Suffix of a compressed archive that is still being written
pub const TEMP_SUFFIX: &str = ".tmp";

/// Compression applied to archives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Archives stay plain files
    #[default]
    None,
    /// gzip
    Gzip,
    /// LZ4 frame format
    Lz4,
}

impl Compression {
    const COMPRESSED: [Compression; 2] = [Compression::Gzip, Compression::Lz4];

    /// File name suffix added to compressed archives ("" for none)
    pub fn extension(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Gzip => ".gz",
            Self::Lz4 => ".lz4",
        }
    }

    /// Codec that produces this compression, if any
    pub fn codec(&self) -> Option<Box<dyn ArchiveCodec>> {
        match self {
            Self::None => None,
            Self::Gzip => Some(Box::new(GzipCodec::default())),
            Self::Lz4 => Some(Box::new(Lz4Codec::default())),
        }
    }

    /// Split a known compression suffix off a file name
    pub fn strip_extension(name: &str) -> (&str, Compression) {
        for compression in Self::COMPRESSED {
            if let Some(stem) = name.strip_suffix(compression.extension()) {
                return (stem, compression);
            }
        }
        (name, Compression::None)
    }
}

/// Trait for pluggable archive codecs
pub trait ArchiveCodec: Send + Sync {
    /// Wrap a file with this codec's buffering/compression strategy
    fn wrap(&self, file: File) -> io::Result<Box<dyn ArchiveWrite>>;

    /// File extension appended to archives written by this codec
    fn file_extension(&self) -> &'static str;
}

/// Write side of an archive codec
///
/// This is object-safe and can be used with `Box<dyn ArchiveWrite>`.
pub trait ArchiveWrite: Write + Send {
    /// Finish the compressed stream and return the underlying file
    fn finish(self: Box<Self>) -> io::Result<File>;

    /// Uncompressed bytes accepted so far
    fn bytes_written(&self) -> u64;
}

// ============================================================================
// GzipCodec
// ============================================================================

/// gzip archive codec
#[derive(Debug, Clone)]
pub struct GzipCodec {
    level: flate2::Compression,
    buffer_size: usize,
}

impl GzipCodec {
    /// Create a gzip codec with an explicit level (0-9)
    pub fn new(level: u32, buffer_size: usize) -> Self {
        Self {
            level: flate2::Compression::new(level.min(9)),
            buffer_size,
        }
    }
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self {
            level: flate2::Compression::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ArchiveCodec for GzipCodec {
    fn wrap(&self, file: File) -> io::Result<Box<dyn ArchiveWrite>> {
        let buf_writer = BufWriter::with_capacity(self.buffer_size, file);
        Ok(Box::new(GzipArchive {
            encoder: GzEncoder::new(buf_writer, self.level),
            bytes_written: 0,
        }))
    }

    fn file_extension(&self) -> &'static str {
        Compression::Gzip.extension()
    }
}

struct GzipArchive {
    encoder: GzEncoder<BufWriter<File>>,
    bytes_written: u64,
}

impl Write for GzipArchive {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.encoder.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

impl ArchiveWrite for GzipArchive {
    fn finish(self: Box<Self>) -> io::Result<File> {
        let buf_writer = self.encoder.finish()?;
        buf_writer.into_inner().map_err(|e| e.into_error())
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

// ============================================================================
// Lz4Codec
// ============================================================================

/// LZ4 frame archive codec
#[derive(Debug, Clone)]
pub struct Lz4Codec {
    buffer_size: usize,
}

impl Lz4Codec {
    pub fn new(buffer_size: usize) -> Self {
        Self { buffer_size }
    }
}

impl Default for Lz4Codec {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl ArchiveCodec for Lz4Codec {
    fn wrap(&self, file: File) -> io::Result<Box<dyn ArchiveWrite>> {
        let buf_writer = BufWriter::with_capacity(self.buffer_size, file);
        Ok(Box::new(Lz4Archive {
            encoder: FrameEncoder::new(buf_writer),
            bytes_written: 0,
        }))
    }

    fn file_extension(&self) -> &'static str {
        Compression::Lz4.extension()
    }
}

struct Lz4Archive {
    encoder: FrameEncoder<BufWriter<File>>,
    bytes_written: u64,
}

impl Write for Lz4Archive {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.encoder.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

impl ArchiveWrite for Lz4Archive {
    fn finish(self: Box<Self>) -> io::Result<File> {
        let buf_writer = self.encoder.finish()?;
        buf_writer.into_inner().map_err(|e| e.into_error())
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

// ============================================================================
// File compression
// ============================================================================

/// Path an in-progress compression writes to
pub fn temp_path(dst: &Path) -> PathBuf {
    let mut name = dst.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Compress `src` into `dst` and remove `src`
///
/// Output goes to a temporary file that is synced and renamed over `dst`
/// only once the stream is complete, so `dst` is never observed half
/// written. On failure the temporary file is removed and `src` is left
/// untouched. Returns the number of uncompressed bytes.
pub fn compress_file(codec: &dyn ArchiveCodec, src: &Path, dst: &Path) -> io::Result<u64> {
    let tmp = temp_path(dst);

    let bytes = match encode(codec, src, &tmp) {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
    };

    if let Err(e) = fs::rename(&tmp, dst) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::remove_file(src)?;

    Ok(bytes)
}

fn encode(codec: &dyn ArchiveCodec, src: &Path, tmp: &Path) -> io::Result<u64> {
    let mut input = File::open(src)?;
    let output = File::create(tmp)?;

    let mut archive = codec.wrap(output)?;
    io::copy(&mut input, &mut archive)?;
    let bytes = archive.bytes_written();

    let file = archive.finish()?;
    file.sync_all()?;
    Ok(bytes)
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;
