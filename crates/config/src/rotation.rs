//! Rotating file configuration
//!
//! Describes the file logroll writes, when it rotates, how archives are
//! named and compressed, and how many are kept.

use std::time::Duration;

use bytesize::ByteSize;
use serde::Deserialize;

/// Default rotation threshold (100MB)
pub const DEFAULT_MAX_SIZE: ByteSize = ByteSize(100 * 1000 * 1000);

/// Compression applied to archives
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Keep archives as plain files (default)
    #[default]
    None,
    /// gzip (`.gz`)
    Gzip,
    /// LZ4 frame format (`.lz4`)
    Lz4,
}

/// Where archive compression runs
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompressMode {
    /// Inside the rotating write call (default)
    #[default]
    Sync,
    /// On a dedicated worker thread
    Background,
}

/// Archive naming scheme
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveNaming {
    /// `app.log.0000000001` (default)
    #[default]
    Sequence,
    /// `app.log.20260101T000000.000Z-0000000001`
    Timestamp,
}

/// How an existing file at the base path is treated on open
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OpenMode {
    /// Keep existing content and continue appending (default)
    #[default]
    Append,
    /// Discard existing content
    Truncate,
}

/// Rotating file settings
///
/// # Example
///
/// ```toml
/// [rotation]
/// path = "logs/app.log"
/// max_size = "100MB"
/// max_backups = 5
/// max_age = "7days"
/// compression = "gzip"
/// compress_mode = "background"
/// naming = "timestamp"
/// open_mode = "append"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    /// Path of the active file
    /// Required
    pub path: String,

    /// Rotate before a write would push the file past this size
    /// Default: 100MB
    pub max_size: ByteSize,

    /// Archives to keep (0 keeps none)
    /// Default: unlimited
    pub max_backups: Option<usize>,

    /// Delete archives older than this
    /// Default: never
    #[serde(with = "humantime_serde")]
    pub max_age: Option<Duration>,

    /// Archive compression
    /// Default: none
    pub compression: Compression,

    /// Where compression runs
    /// Default: sync
    pub compress_mode: CompressMode,

    /// Archive naming scheme
    /// Default: sequence
    pub naming: ArchiveNaming,

    /// Treatment of an existing file on open
    /// Default: append
    pub open_mode: OpenMode,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            path: String::new(),
            max_size: DEFAULT_MAX_SIZE,
            max_backups: None,
            max_age: None,
            compression: Compression::None,
            compress_mode: CompressMode::Sync,
            naming: ArchiveNaming::Sequence,
            open_mode: OpenMode::Append,
        }
    }
}
