//! Archive discovery
//!
//! Archives are tracked only by naming convention: every listing rescans the
//! directory of the active file. There is no in-memory index to drift out of
//! sync with what is on disk.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::codec::{Compression, TEMP_SUFFIX};
use crate::naming::{ArchiveName, ArchiveNaming, archive_dir};

/// An archived file found next to the active file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    /// Full path of the archive
    pub path: PathBuf,
    /// Name-encoded key (sequence or timestamp + sequence)
    pub key: String,
    /// Rotation sequence number
    pub sequence: u64,
    /// Rotation time encoded in the name (timestamp naming only)
    pub timestamp: Option<DateTime<Utc>>,
    /// Compression applied to the archive
    pub compression: Compression,
}

impl Archive {
    /// When the archive was created
    ///
    /// Uses the name-encoded time when present, otherwise the file's
    /// modification time.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.timestamp.or_else(|| {
            fs::metadata(&self.path)
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from)
        })
    }

    /// Age relative to `now`; None if unknown or in the future
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        let created = self.created()?;
        (now - created).to_std().ok()
    }

    fn order(&self) -> (Option<DateTime<Utc>>, u64) {
        (self.timestamp, self.sequence)
    }
}

fn base_name(base: &Path) -> io::Result<&str> {
    base.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' has no UTF-8 file name", base.display()),
            )
        })
}

/// List archives of `base`, oldest first
pub fn list_archives(base: &Path, naming: ArchiveNaming) -> io::Result<Vec<Archive>> {
    let base_name = base_name(base)?;
    let dir = archive_dir(base);

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut archives = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else {
            continue;
        };

        if !entry.file_type().is_ok_and(|t| t.is_file()) {
            continue;
        }

        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };

        let Some(name) = ArchiveName::parse(base_name, file_name, naming) else {
            continue;
        };

        archives.push(Archive {
            path: entry.path(),
            key: name.key,
            sequence: name.sequence,
            timestamp: name.timestamp,
            compression: name.compression,
        });
    }

    archives.sort_by(|a, b| a.order().cmp(&b.order()));
    Ok(archives)
}

/// Delete compression output abandoned by an interrupted run
///
/// Only regular files named `<base>.<key><ext>.tmp` are touched. A file that
/// cannot be removed is logged and skipped. Returns the paths that were
/// removed.
pub fn remove_stale_temp_files(base: &Path) -> io::Result<Vec<PathBuf>> {
    let prefix = format!("{}.", base_name(base)?);
    let dir = archive_dir(base);

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut removed = Vec::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(rest) = file_name.to_str().and_then(|name| name.strip_prefix(&prefix)) else {
            continue;
        };
        if !is_compression_output(rest) || !entry.file_type().is_ok_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        match fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to remove stale compression output"
                );
            }
        }
    }

    Ok(removed)
}

/// Whether `rest` (the file name after `<base>.`) is `<key><ext>.tmp`
fn is_compression_output(rest: &str) -> bool {
    let Some(stem) = rest.strip_suffix(TEMP_SUFFIX) else {
        return false;
    };
    let (key, compression) = Compression::strip_extension(stem);
    compression != Compression::None
        && [ArchiveNaming::Sequence, ArchiveNaming::Timestamp]
            .iter()
            .any(|naming| naming.parse_key(key).is_some())
}

/// Uncompressed archives left behind by an interrupted run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PendingArchives {
    /// Plain archives whose compressed copy already exists
    pub duplicates: Vec<PathBuf>,
    /// Plain archives that still need compressing
    pub uncompressed: Vec<PathBuf>,
}

/// Sort plain archives into leftovers of a finished compression and
/// archives that were never compressed
pub fn pending_compression(archives: &[Archive]) -> PendingArchives {
    let compressed: HashSet<&str> = archives
        .iter()
        .filter(|a| a.compression != Compression::None)
        .map(|a| a.key.as_str())
        .collect();

    let mut pending = PendingArchives::default();
    for archive in archives.iter().filter(|a| a.compression == Compression::None) {
        if compressed.contains(archive.key.as_str()) {
            pending.duplicates.push(archive.path.clone());
        } else {
            pending.uncompressed.push(archive.path.clone());
        }
    }
    pending
}

#[cfg(test)]
#[path = "archive_test.rs"]
mod archive_test;
