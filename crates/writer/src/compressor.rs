//! Archive compression and pruning
//!
//! After a rotation the archive is compressed (if a codec is configured) and
//! retention is applied. Both run either inline or on one worker thread fed
//! by a FIFO queue:
//!
//! ```text
//! rotate() ──rename──► Compress(archive N) ─► Prune ─► Compress(archive N+1) ─► Prune
//!                      └──────────────── worker thread, in order ───────────────┘
//! ```
//!
//! The rename to a fresh archive name always happens in `rotate()`, so the
//! worker only ever sees files nobody else writes to.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::Utc;
use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, warn};

use crate::archive::PendingArchives;
use crate::codec::ArchiveCodec;
use crate::config::{CompressMode, RotationConfig};
use crate::error::{Result, WriterError};
use crate::metrics::WriterMetrics;
use crate::naming::{ArchiveNaming, with_suffix};
use crate::rate_limited_logger::RateLimitedLogger;
use crate::retention::{RetentionPolicy, prune};

/// Name of the background compression thread
pub const WORKER_THREAD_NAME: &str = "logroll-compress";

/// Archive work shared by the writer and the worker thread
pub(crate) struct Housekeeping {
    base: PathBuf,
    naming: ArchiveNaming,
    retention: RetentionPolicy,
    codec: Option<Arc<dyn ArchiveCodec>>,
    metrics: Arc<WriterMetrics>,
    compress_logger: RateLimitedLogger,
    prune_logger: RateLimitedLogger,
}

impl Housekeeping {
    pub(crate) fn new(config: &RotationConfig, metrics: Arc<WriterMetrics>) -> Self {
        Self {
            base: config.path.clone(),
            naming: config.naming,
            retention: config.retention,
            codec: config.compression.codec().map(Arc::from),
            metrics,
            compress_logger: RateLimitedLogger::default(),
            prune_logger: RateLimitedLogger::default(),
        }
    }

    /// Compress one archive in place of the plain file
    ///
    /// Returns the compressed path, or None when no codec is configured or
    /// the archive was pruned before its turn came.
    fn compress(&self, archive: &Path) -> io::Result<Option<PathBuf>> {
        let Some(codec) = &self.codec else {
            return Ok(None);
        };

        let dst = with_suffix(archive, codec.file_extension());
        match crate::codec::compress_file(codec.as_ref(), archive, &dst) {
            Ok(bytes) => {
                self.metrics.record_compressed();
                debug!(
                    archive = %archive.display(),
                    compressed = %dst.display(),
                    bytes,
                    "compressed archive"
                );
                Ok(Some(dst))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && !archive.exists() => {
                debug!(archive = %archive.display(), "archive removed before compression");
                Ok(None)
            }
            Err(e) => {
                self.metrics.record_compression_error();
                Err(e)
            }
        }
    }

    /// Apply retention; failures are logged and counted, never returned
    fn prune(&self) {
        if self.retention.is_unbounded() {
            return;
        }

        let outcome = match prune(&self.base, self.naming, &self.retention, Utc::now()) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.metrics.record_prune_error();
                self.prune_logger.warn("failed to scan archives", &self.base, &e);
                return;
            }
        };

        if !outcome.removed.is_empty() {
            self.metrics.record_pruned(outcome.removed.len() as u64);
            for path in &outcome.removed {
                debug!(archive = %path.display(), "removed archive");
            }
        }

        for (path, e) in &outcome.failed {
            self.metrics.record_prune_error();
            self.prune_logger.warn("failed to remove archive", path, e);
        }
    }

    fn compress_then_prune(&self, archive: PathBuf) -> Result<()> {
        let compressed = self.compress(&archive);
        self.prune();
        compressed
            .map(|_| ())
            .map_err(|source| WriterError::Compress {
                path: archive,
                source,
            })
    }

    /// Finish work an interrupted run left behind
    fn recover(&self, pending: &PendingArchives) {
        if self.codec.is_some() {
            for duplicate in &pending.duplicates {
                match fs::remove_file(duplicate) {
                    Ok(()) => {
                        debug!(archive = %duplicate.display(), "removed already compressed archive");
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        self.compress_logger.warn(
                            "failed to remove already compressed archive",
                            duplicate,
                            &e,
                        );
                    }
                }
            }

            for archive in &pending.uncompressed {
                if let Err(e) = self.compress(archive) {
                    self.compress_logger
                        .warn("failed to compress leftover archive", archive, &e);
                }
            }
        }

        self.prune();
    }
}

enum Job {
    Compress(PathBuf),
    Recover(PendingArchives),
    Prune,
    Barrier(Sender<()>),
}

/// Runs archive housekeeping inline or on a worker thread
pub(crate) enum Compressor {
    Inline(Arc<Housekeeping>),
    Background(Worker),
}

pub(crate) struct Worker {
    sender: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
    housekeeping: Arc<Housekeeping>,
}

impl Compressor {
    pub(crate) fn start(housekeeping: Housekeeping, mode: CompressMode) -> Result<Self> {
        let housekeeping = Arc::new(housekeeping);
        match mode {
            CompressMode::Sync => Ok(Self::Inline(housekeeping)),
            CompressMode::Background => {
                let (sender, receiver) = channel::unbounded();
                let worker_housekeeping = Arc::clone(&housekeeping);
                let handle = thread::Builder::new()
                    .name(WORKER_THREAD_NAME.into())
                    .spawn(move || run(receiver, worker_housekeeping))
                    .map_err(WriterError::Io)?;

                Ok(Self::Background(Worker {
                    sender: Some(sender),
                    handle: Some(handle),
                    housekeeping,
                }))
            }
        }
    }

    /// Compress and prune after `archive` was renamed into place
    ///
    /// Inline compression failure is returned after pruning has run; the
    /// plain archive stays behind.
    pub(crate) fn after_rotation(&self, archive: PathBuf) -> Result<()> {
        match self {
            Self::Inline(housekeeping) => housekeeping.compress_then_prune(archive),
            Self::Background(worker) => match worker.send(Job::Compress(archive)) {
                Ok(()) => {
                    // Same queue, so this runs after the compression above
                    if worker.send(Job::Prune).is_err() {
                        worker.housekeeping.prune();
                    }
                    Ok(())
                }
                Err(Job::Compress(archive)) => {
                    warn!(
                        archive = %archive.display(),
                        "compression worker is not running, compressing inline"
                    );
                    worker.housekeeping.compress_then_prune(archive)
                }
                Err(_) => Ok(()),
            },
        }
    }

    /// Prune without a new archive (the active file vanished before rotation)
    pub(crate) fn prune(&self) {
        match self {
            Self::Inline(housekeeping) => housekeeping.prune(),
            Self::Background(worker) => {
                if worker.send(Job::Prune).is_err() {
                    worker.housekeeping.prune();
                }
            }
        }
    }

    /// Finish compression an interrupted run left behind
    pub(crate) fn recover(&self, pending: PendingArchives) {
        match self {
            Self::Inline(housekeeping) => housekeeping.recover(&pending),
            Self::Background(worker) => {
                if let Err(Job::Recover(pending)) = worker.send(Job::Recover(pending)) {
                    worker.housekeeping.recover(&pending);
                }
            }
        }
    }

    /// Receiver that fires once every job queued so far has run
    ///
    /// None when there is nothing to wait for.
    pub(crate) fn barrier(&self) -> Option<Receiver<()>> {
        match self {
            Self::Inline(_) => None,
            Self::Background(worker) => {
                let (done, wait) = channel::bounded(1);
                worker.send(Job::Barrier(done)).ok()?;
                Some(wait)
            }
        }
    }

    /// Stop accepting jobs; the worker drains its queue and exits
    ///
    /// Returns the worker handle so the caller decides where to join it.
    pub(crate) fn shutdown(&mut self) -> Option<JoinHandle<()>> {
        match self {
            Self::Inline(_) => None,
            Self::Background(worker) => {
                worker.sender.take();
                worker.handle.take()
            }
        }
    }
}

impl Worker {
    /// Queue a job, handing it back if the worker is gone
    fn send(&self, job: Job) -> std::result::Result<(), Job> {
        match &self.sender {
            Some(sender) => sender.send(job).map_err(|e| e.into_inner()),
            None => Err(job),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.sender.take();
        join_worker(self.handle.take());
    }
}

/// Wait for a worker handed out by `Compressor::shutdown`
pub(crate) fn join_worker(handle: Option<JoinHandle<()>>) {
    if let Some(handle) = handle
        && handle.join().is_err()
    {
        warn!("compression worker panicked");
    }
}

fn run(receiver: Receiver<Job>, housekeeping: Arc<Housekeeping>) {
    debug!("compression worker started");

    while let Ok(job) = receiver.recv() {
        match job {
            Job::Compress(archive) => {
                if let Err(e) = housekeeping.compress(&archive) {
                    housekeeping
                        .compress_logger
                        .error("failed to compress archive", &archive, &e);
                }
            }
            Job::Recover(pending) => housekeeping.recover(&pending),
            Job::Prune => housekeeping.prune(),
            Job::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!("compression worker stopped");
}

#[cfg(test)]
#[path = "compressor_test.rs"]
mod compressor_test;
