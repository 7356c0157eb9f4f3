//! Rate-limited logging for archive housekeeping
//!
//! Compression and retention failures tend to repeat on every rotation
//! (a read-only directory, a full disk). This logs at most once per interval
//! and reports how many failures were suppressed in between.
//!
//! # Example
//!
//! ```ignore
//! let logger = RateLimitedLogger::new(Duration::from_secs(10));
//!
//! // Only logs once per 10 seconds, even if called on every rotation
//! logger.warn("failed to delete archive", &path, &io_error);
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval between housekeeping log lines
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Logger that emits at most one line per interval
///
/// Thread-safe: the writer and the compression worker share one instance.
pub struct RateLimitedLogger {
    /// Minimum interval between log messages
    min_interval: Duration,

    /// Last time we logged
    last_log_time: Mutex<Option<Instant>>,

    /// Failures since last log
    failure_count: AtomicU64,

    /// Failures ever recorded
    total_failures: AtomicU64,
}

impl RateLimitedLogger {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_log_time: Mutex::new(None),
            failure_count: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
        }
    }

    /// Record a non-fatal failure at warn level
    ///
    /// Returns true if a line was emitted, false if it was suppressed.
    pub fn warn(&self, message: &str, path: &Path, error: &dyn std::fmt::Display) -> bool {
        let Some((suppressed, total)) = self.admit() else {
            return false;
        };

        tracing::warn!(
            path = %path.display(),
            error = %error,
            suppressed_count = suppressed,
            total_failures = total,
            "{message}"
        );
        true
    }

    /// Record a failure at error level
    ///
    /// Returns true if a line was emitted, false if it was suppressed.
    pub fn error(&self, message: &str, path: &Path, error: &dyn std::fmt::Display) -> bool {
        let Some((suppressed, total)) = self.admit() else {
            return false;
        };

        tracing::error!(
            path = %path.display(),
            error = %error,
            suppressed_count = suppressed,
            total_failures = total,
            "{message}"
        );
        true
    }

    /// Count a failure and decide whether it may be logged now
    ///
    /// Returns (suppressed since last line, total) when logging is allowed.
    fn admit(&self) -> Option<(u64, u64)> {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.total_failures.fetch_add(1, Ordering::Relaxed);

        {
            let mut last_time = self.last_log_time.lock();
            let now = Instant::now();

            match *last_time {
                Some(last) if now.duration_since(last) < self.min_interval => return None,
                _ => *last_time = Some(now),
            }
        }

        let count = self.failure_count.swap(0, Ordering::Relaxed);
        let total = self.total_failures.load(Ordering::Relaxed);
        Some((count.saturating_sub(1), total))
    }

    /// Failures recorded since the last emitted line
    pub fn pending_failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Failures ever recorded
    pub fn total_failure_count(&self) -> u64 {
        self.total_failures.load(Ordering::Relaxed)
    }
}

impl Default for RateLimitedLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_INTERVAL)
    }
}
