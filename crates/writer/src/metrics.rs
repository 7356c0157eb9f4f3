//! Writer metrics
//!
//! Lock-free counters shared between the writer and its compression worker.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one rotating writer
#[derive(Debug, Default)]
pub struct WriterMetrics {
    /// Successful writes
    pub writes: AtomicU64,

    /// Bytes appended to active files
    pub bytes_written: AtomicU64,

    /// Failed or rejected writes
    pub write_errors: AtomicU64,

    /// Completed rotations
    pub rotations: AtomicU64,

    /// Rotations that failed before a new file was opened
    pub rotation_errors: AtomicU64,

    /// Archives successfully compressed
    pub archives_compressed: AtomicU64,

    /// Archives left uncompressed after a failure
    pub compression_errors: AtomicU64,

    /// Archives deleted by retention
    pub archives_pruned: AtomicU64,

    /// Archive scans or deletions that failed
    pub prune_errors: AtomicU64,
}

impl WriterMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            writes: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
            rotation_errors: AtomicU64::new(0),
            archives_compressed: AtomicU64::new(0),
            compression_errors: AtomicU64::new(0),
            archives_pruned: AtomicU64::new(0),
            prune_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_write(&self, bytes: u64) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rotation_error(&self) {
        self.rotation_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_compressed(&self) {
        self.archives_compressed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_compression_error(&self) {
        self.compression_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_pruned(&self, count: u64) {
        self.archives_pruned.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_prune_error(&self) {
        self.prune_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            writes: self.writes.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            rotation_errors: self.rotation_errors.load(Ordering::Relaxed),
            archives_compressed: self.archives_compressed.load(Ordering::Relaxed),
            compression_errors: self.compression_errors.load(Ordering::Relaxed),
            archives_pruned: self.archives_pruned.load(Ordering::Relaxed),
            prune_errors: self.prune_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of writer metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub writes: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
    pub rotations: u64,
    pub rotation_errors: u64,
    pub archives_compressed: u64,
    pub compression_errors: u64,
    pub archives_pruned: u64,
    pub prune_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        assert_eq!(WriterMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_record_write_accumulates() {
        let metrics = WriterMetrics::new();
        metrics.record_write(60);
        metrics.record_write(40);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.writes, 2);
        assert_eq!(snapshot.bytes_written, 100);
    }

    #[test]
    fn test_housekeeping_counters() {
        let metrics = WriterMetrics::new();
        metrics.record_rotation();
        metrics.record_compressed();
        metrics.record_pruned(3);
        metrics.record_prune_error();
        metrics.record_compression_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rotations, 1);
        assert_eq!(snapshot.archives_compressed, 1);
        assert_eq!(snapshot.archives_pruned, 3);
        assert_eq!(snapshot.prune_errors, 1);
        assert_eq!(snapshot.compression_errors, 1);
    }
}
