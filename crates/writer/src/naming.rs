//! Archive naming
//!
//! Archives sit next to the active file as `<file name>.<key>[.gz|.lz4]`.
//! Keys are fixed width, so sorting names sorts archives by creation:
//!
//! ```text
//! app.log.0000000007                        # Sequence
//! app.log.20261016T101500.123Z-0000000007   # Timestamp
//! ```
//!
//! The timestamp form keeps the sequence number as a suffix so two
//! rotations in the same millisecond still get distinct names.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::codec::{Compression, TEMP_SUFFIX};

/// Digits in a zero-padded sequence number
pub const SEQUENCE_WIDTH: usize = 10;

/// chrono format of the timestamp part of a key (always UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.3fZ";

const TIMESTAMP_WIDTH: usize = "20260101T000000.000Z".len();

/// Archive naming scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ArchiveNaming {
    /// Zero-padded rotation sequence number
    #[default]
    Sequence,
    /// UTC rotation time followed by the sequence number
    Timestamp,
}

impl ArchiveNaming {
    /// Key for the archive produced by rotation number `sequence`
    pub fn key(&self, sequence: u64, now: DateTime<Utc>) -> String {
        match self {
            Self::Sequence => format!("{:0width$}", sequence, width = SEQUENCE_WIDTH),
            Self::Timestamp => format!(
                "{}-{:0width$}",
                now.format(TIMESTAMP_FORMAT),
                sequence,
                width = SEQUENCE_WIDTH
            ),
        }
    }

    /// Parse a key back into (sequence, encoded time)
    pub fn parse_key(&self, key: &str) -> Option<(u64, Option<DateTime<Utc>>)> {
        match self {
            Self::Sequence => parse_sequence(key).map(|seq| (seq, None)),
            Self::Timestamp => {
                let (timestamp, sequence) = key.rsplit_once('-')?;
                if timestamp.len() != TIMESTAMP_WIDTH {
                    return None;
                }
                let sequence = parse_sequence(sequence)?;
                let time = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
                Some((sequence, Some(time.and_utc())))
            }
        }
    }
}

fn parse_sequence(digits: &str) -> Option<u64> {
    if digits.len() < SEQUENCE_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Components of a parsed archive file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    pub key: String,
    pub sequence: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub compression: Compression,
}

impl ArchiveName {
    /// Parse `file_name` as an archive of the active file `base_name`
    ///
    /// Returns None for the active file itself, unrelated files, keys of the
    /// other naming scheme, and in-progress compression output.
    pub fn parse(base_name: &str, file_name: &str, naming: ArchiveNaming) -> Option<Self> {
        let rest = file_name.strip_prefix(base_name)?.strip_prefix('.')?;
        if rest.ends_with(TEMP_SUFFIX) {
            return None;
        }

        let (key, compression) = Compression::strip_extension(rest);
        let (sequence, timestamp) = naming.parse_key(key)?;

        Some(Self {
            key: key.to_string(),
            sequence,
            timestamp,
            compression,
        })
    }
}

/// Path of the uncompressed archive with `key`
pub fn archive_path(base: &Path, key: &str) -> PathBuf {
    with_suffix(base, &format!(".{key}"))
}

/// `path` with `suffix` appended to its file name
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Directory holding the active file and its archives
pub fn archive_dir(base: &Path) -> &Path {
    match base.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
#[path = "naming_test.rs"]
mod naming_test;
