//! Thread-safe rotating writer handle
//!
//! `SharedWriter` serializes callers through one mutex around the whole
//! check-rotate-write sequence, so a buffer is never split across files and
//! never interleaved with another caller's buffer.
//!
//! It also implements [`MakeWriter`], so a `tracing_subscriber::fmt` layer
//! can log straight into a rotating file:
//!
//! ```ignore
//! let writer = SharedWriter::open(RotationConfig::new("logs/app.log"))?;
//! tracing_subscriber::fmt().with_writer(writer.clone()).init();
//! ```
//!
//! Events emitted by the writer itself while it holds the lock (rotation,
//! failures) go to stderr instead of re-entering the lock.

use std::cell::Cell;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;

use crate::compressor::join_worker;
use crate::config::RotationConfig;
use crate::error::Result;
use crate::metrics::MetricsSnapshot;
use crate::writer::RotatingWriter;

thread_local! {
    static HOLDING_LOCK: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as holding a writer lock until dropped
struct LockMarker {
    previous: bool,
}

impl LockMarker {
    fn set() -> Self {
        Self {
            previous: HOLDING_LOCK.with(|held| held.replace(true)),
        }
    }
}

impl Drop for LockMarker {
    fn drop(&mut self) {
        HOLDING_LOCK.with(|held| held.set(self.previous));
    }
}

/// Cloneable, thread-safe handle to a [`RotatingWriter`]
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<RotatingWriter>>,
}

impl SharedWriter {
    pub fn new(writer: RotatingWriter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Open a rotating writer and wrap it
    pub fn open(config: RotationConfig) -> Result<Self> {
        RotatingWriter::open(config).map(Self::new)
    }

    fn with_writer<T>(&self, f: impl FnOnce(&mut RotatingWriter) -> T) -> T {
        let mut writer = self.inner.lock();
        let _marker = LockMarker::set();
        f(&mut writer)
    }

    /// Append `buf`, rotating first if it would not fit
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        self.with_writer(|w| w.write(buf))
    }

    pub fn rotate(&self) -> Result<()> {
        self.with_writer(RotatingWriter::rotate)
    }

    pub fn sync(&self) -> Result<()> {
        self.with_writer(RotatingWriter::sync)
    }

    /// Close the file and stop background compression
    ///
    /// The worker is joined after the lock is released, since it may log
    /// through this same writer while draining.
    pub fn close(&self) -> Result<()> {
        let (result, worker) = self.with_writer(RotatingWriter::close_detached);
        join_worker(worker);
        result
    }

    /// Block until queued background compression and pruning have run
    pub fn wait_for_archives(&self) {
        if let Some(done) = self.with_writer(|w| w.archive_barrier()) {
            let _ = done.recv();
        }
    }

    pub fn current_size(&self) -> u64 {
        self.with_writer(|w| w.current_size())
    }

    pub fn is_closed(&self) -> bool {
        self.with_writer(|w| w.is_closed())
    }

    pub fn path(&self) -> PathBuf {
        self.with_writer(|w| w.path().to_path_buf())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.with_writer(|w| w.metrics())
    }
}

impl std::fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedWriter").finish_non_exhaustive()
    }
}

impl Write for &SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        SharedWriter::write(*self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_writer(|w| Write::flush(w))
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut &*self)
    }
}

/// Writer handed to `tracing_subscriber` for one event
pub enum EventWriter<'a> {
    /// The rotating file
    Shared(&'a SharedWriter),
    /// Fallback for events emitted while this thread holds the writer lock
    Stderr(io::Stderr),
}

impl Write for EventWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Shared(writer) => Write::write(writer, buf),
            Self::Stderr(stderr) => stderr.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Shared(writer) => Write::flush(writer),
            Self::Stderr(stderr) => stderr.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = EventWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        if HOLDING_LOCK.with(Cell::get) {
            EventWriter::Stderr(io::stderr())
        } else {
            EventWriter::Shared(self)
        }
    }
}

#[cfg(test)]
#[path = "shared_test.rs"]
mod shared_test;
