//! Rotating writer
//!
//! Appends buffers to one active file. When the next buffer would push the
//! file past `max_size`, the file is renamed to a fresh archive name, a new
//! file is opened at the same path, and the archive is handed to the
//! compressor for compression and retention.
//!
//! # Rotation
//!
//! ```text
//! write(buf) ─► size + len > max_size? ─yes─► flush + fsync
//!                     │                          │
//!                     no                   rename app.log → app.log.<key>
//!                     │                          │
//!                     ▼                    open new app.log
//!               append buf ◄─────────────── compress + prune archive
//! ```
//!
//! The writer always holds exactly one open handle until `close()`. Every
//! failure path during rotation leaves the old handle in place.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::Utc;
use crossbeam::channel::Receiver;
use tracing::{debug, info, warn};

use crate::archive::{Archive, list_archives, pending_compression, remove_stale_temp_files};
use crate::compressor::{Compressor, Housekeeping, join_worker};
use crate::config::{OpenMode, RotationConfig};
use crate::error::{Result, WriterError};
use crate::metrics::{MetricsSnapshot, WriterMetrics};
use crate::naming::{archive_dir, archive_path};

/// Size-bounded writer that rotates its file into archives
///
/// Not internally synchronized; wrap it in a
/// [`SharedWriter`](crate::SharedWriter) to write from several threads.
pub struct RotatingWriter {
    config: RotationConfig,
    file: Option<File>,
    size: u64,
    /// Sequence number of the next archive
    sequence: u64,
    compressor: Compressor,
    metrics: Arc<WriterMetrics>,
}

impl RotatingWriter {
    /// Open the active file described by `config`
    ///
    /// Creates missing parent directories, removes compression output left
    /// by an interrupted run, and resumes archive numbering after the
    /// highest existing sequence number.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a rejected config and `Open` if the
    /// directory cannot be prepared or the file cannot be opened.
    pub fn open(config: RotationConfig) -> Result<Self> {
        config.validate()?;
        let path = config.path.clone();

        fs::create_dir_all(archive_dir(&path)).map_err(|e| WriterError::open(&path, e))?;

        for stale in remove_stale_temp_files(&path).map_err(|e| WriterError::open(&path, e))? {
            debug!(path = %stale.display(), "removed stale compression output");
        }

        let archives =
            list_archives(&path, config.naming).map_err(|e| WriterError::open(&path, e))?;
        let sequence = archives
            .iter()
            .map(|archive| archive.sequence)
            .max()
            .map_or(1, |last| last + 1);

        let (file, size) =
            open_file(&path, config.open_mode).map_err(|e| WriterError::open(&path, e))?;

        let metrics = Arc::new(WriterMetrics::new());
        let housekeeping = Housekeeping::new(&config, Arc::clone(&metrics));
        let compressor = Compressor::start(housekeeping, config.compress_mode)?;
        compressor.recover(pending_compression(&archives));

        info!(
            path = %path.display(),
            size,
            max_size = config.max_size,
            next_sequence = sequence,
            archives = archives.len(),
            "opened rotating file"
        );

        Ok(Self {
            config,
            file: Some(file),
            size,
            sequence,
            compressor,
            metrics,
        })
    }

    /// Append `buf` to the active file, rotating first if it would not fit
    ///
    /// Returns `buf.len()` on success. If appending fails, any bytes that
    /// did reach the file are truncated away so the byte count is unchanged.
    ///
    /// # Errors
    ///
    /// - `Closed` after `close()`
    /// - `WriteTooLarge` if `buf` is longer than `max_size`
    /// - `Rotate` or `Compress` if the rotation before the write failed
    /// - `Write` if appending failed
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if self.file.is_none() {
            return Err(WriterError::Closed);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let len = buf.len() as u64;
        if len > self.config.max_size {
            self.metrics.record_write_error();
            return Err(WriterError::WriteTooLarge {
                len: buf.len(),
                max: self.config.max_size,
            });
        }

        if self.size > 0 && self.size + len > self.config.max_size {
            self.rotate()?;
        }

        let file = self.file.as_mut().ok_or(WriterError::Closed)?;
        if let Err(e) = file.write_all(buf) {
            self.size = discard_partial_write(file, &self.config.path, self.size);
            self.metrics.record_write_error();
            warn!(path = %self.config.path.display(), error = %e, "write failed");
            return Err(WriterError::Write(e));
        }

        self.size += len;
        self.metrics.record_write(len);
        Ok(buf.len())
    }

    /// Archive the active file and start a new one
    ///
    /// In sync compression mode the archive is compressed and retention is
    /// applied before this returns. In background mode both are queued.
    ///
    /// # Errors
    ///
    /// Returns `Rotate` if flushing, renaming, or reopening failed; the
    /// writer keeps its previous file in that case. Returns `Compress` if
    /// inline compression failed; the new file is already open and the
    /// plain archive is kept.
    pub fn rotate(&mut self) -> Result<()> {
        let path = self.config.path.clone();

        {
            let file = self.file.as_mut().ok_or(WriterError::Closed)?;
            if let Err(e) = file.flush().and_then(|()| file.sync_all()) {
                return Err(self.rotation_failed(&path, e));
            }
        }

        let key = self.config.naming.key(self.sequence, Utc::now());
        let archive = archive_path(&path, &key);

        let archived = match fs::rename(&path, &archive) {
            Ok(()) => {
                self.sequence += 1;
                Some(archive)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    path = %path.display(),
                    "active file disappeared, reopening without archiving"
                );
                None
            }
            Err(e) => return Err(self.rotation_failed(&path, e)),
        };

        let (file, size) = match open_file(&path, OpenMode::Append) {
            Ok(opened) => opened,
            Err(e) => {
                if let Some(archive) = &archived {
                    restore_archive(archive, &path);
                }
                return Err(self.rotation_failed(&path, e));
            }
        };

        self.file = Some(file);
        self.size = size;
        self.metrics.record_rotation();

        match archived {
            Some(archive) => {
                info!(path = %path.display(), archive = %archive.display(), "rotated file");
                self.compressor.after_rotation(archive)
            }
            None => {
                self.compressor.prune();
                Ok(())
            }
        }
    }

    fn rotation_failed(&self, path: &Path, source: io::Error) -> WriterError {
        self.metrics.record_rotation_error();
        warn!(path = %path.display(), error = %source, "rotation failed");
        WriterError::rotate(path, source)
    }

    /// Flush and close the active file and stop background compression
    ///
    /// Queued compression and pruning finish before this returns. Calling
    /// it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let (result, worker) = self.close_detached();
        join_worker(worker);
        result
    }

    /// Close the file but leave joining the worker to the caller
    pub(crate) fn close_detached(&mut self) -> (Result<()>, Option<JoinHandle<()>>) {
        let result = match self.file.take() {
            Some(mut file) => {
                let synced = file.flush().and_then(|()| file.sync_all());
                info!(
                    path = %self.config.path.display(),
                    size = self.size,
                    "closed rotating file"
                );
                synced.map_err(WriterError::Io)
            }
            None => Ok(()),
        };
        (result, self.compressor.shutdown())
    }

    /// fsync the active file
    pub fn sync(&mut self) -> Result<()> {
        let file = self.file.as_mut().ok_or(WriterError::Closed)?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    /// Block until queued background compression and pruning have run
    ///
    /// Returns immediately in sync mode.
    pub fn wait_for_archives(&self) {
        if let Some(done) = self.archive_barrier() {
            let _ = done.recv();
        }
    }

    pub(crate) fn archive_barrier(&self) -> Option<Receiver<()>> {
        self.compressor.barrier()
    }

    /// Archives of the active file, oldest first
    pub fn archives(&self) -> Result<Vec<Archive>> {
        Ok(list_archives(&self.config.path, self.config.naming)?)
    }

    /// Path of the active file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Bytes written to the active file since it was opened
    pub fn current_size(&self) -> u64 {
        self.size
    }

    pub fn max_size(&self) -> u64 {
        self.config.max_size
    }

    /// Sequence number the next archive will get
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RotatingWriter::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for RotatingWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(
                path = %self.config.path.display(),
                error = %e,
                "failed to close rotating file"
            );
        }
    }
}

impl std::fmt::Debug for RotatingWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingWriter")
            .field("path", &self.config.path)
            .field("size", &self.size)
            .field("max_size", &self.config.max_size)
            .field("sequence", &self.sequence)
            .field("closed", &self.file.is_none())
            .finish_non_exhaustive()
    }
}

/// Truncate whatever a failed append left past `size`
///
/// Returns the byte count to keep: `size` after a successful truncate,
/// otherwise the file's actual length.
fn discard_partial_write(file: &File, path: &Path, size: u64) -> u64 {
    match file.set_len(size) {
        Ok(()) => size,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to discard partial write");
            file.metadata().map_or(size, |metadata| metadata.len())
        }
    }
}

/// Move a just-renamed archive back to the active path
fn restore_archive(archive: &Path, path: &Path) {
    if let Err(e) = fs::rename(archive, path) {
        warn!(
            archive = %archive.display(),
            error = %e,
            "failed to move archive back after reopen failure"
        );
    }
}

/// Open the active file and report its current length
fn open_file(path: &Path, mode: OpenMode) -> io::Result<(File, u64)> {
    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        OpenMode::Append => options.append(true),
        OpenMode::Truncate => options.write(true).truncate(true),
    };

    let file = options.open(path)?;
    let size = file.metadata()?.len();
    Ok((file, size))
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;
