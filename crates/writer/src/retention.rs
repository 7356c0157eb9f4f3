//! Archive retention
//!
//! Pruning rescans the archive directory every time it runs. Archives are
//! removed oldest first: first until the count fits `max_backups`, then any
//! remaining archive older than `max_age`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::archive::list_archives;
use crate::naming::ArchiveNaming;

/// How many archives to keep, and for how long
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Maximum archives kept; `Some(0)` keeps none, `None` keeps all
    pub max_backups: Option<usize>,
    /// Archives older than this are removed
    pub max_age: Option<Duration>,
}

impl RetentionPolicy {
    /// Keep at most `count` archives
    #[must_use]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = Some(count);
        self
    }

    /// Remove archives older than `age`
    #[must_use]
    pub fn with_max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }

    /// True if pruning would never remove anything
    pub fn is_unbounded(&self) -> bool {
        self.max_backups.is_none() && self.max_age.is_none()
    }
}

/// Result of one pruning pass
#[derive(Debug, Default)]
pub struct PruneOutcome {
    /// Archives deleted
    pub removed: Vec<PathBuf>,
    /// Archives that could not be deleted
    pub failed: Vec<(PathBuf, io::Error)>,
}

/// Delete archives of `base` that fall outside `policy`
///
/// Only a failed directory scan is an error. Individual deletion failures
/// are collected in the outcome and the pass moves on to the next archive.
pub fn prune(
    base: &Path,
    naming: ArchiveNaming,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> io::Result<PruneOutcome> {
    let mut outcome = PruneOutcome::default();
    if policy.is_unbounded() {
        return Ok(outcome);
    }

    let archives = list_archives(base, naming)?;

    let excess = policy
        .max_backups
        .map_or(0, |max| archives.len().saturating_sub(max));
    let (expired, kept) = archives.split_at(excess);

    let mut doomed: Vec<&Path> = expired.iter().map(|a| a.path.as_path()).collect();
    if let Some(max_age) = policy.max_age {
        doomed.extend(
            kept.iter()
                .filter(|a| a.age(now).is_some_and(|age| age > max_age))
                .map(|a| a.path.as_path()),
        );
    }

    for path in doomed {
        match fs::remove_file(path) {
            Ok(()) => outcome.removed.push(path.to_path_buf()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => outcome.failed.push((path.to_path_buf(), e)),
        }
    }

    Ok(outcome)
}

#[cfg(test)]
#[path = "retention_test.rs"]
mod retention_test;
