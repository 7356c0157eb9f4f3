//! Rotating writer configuration
//!
//! `RotationConfig` is the plain struct the writer is built from. It can be
//! assembled with builders or converted from the parsed TOML settings in
//! `logroll-config`.

use std::path::{Path, PathBuf};

use logroll_config::RotationSettings;

use crate::codec::Compression;
use crate::error::{Result, WriterError};
use crate::naming::ArchiveNaming;
use crate::retention::RetentionPolicy;

/// Where archive compression and pruning run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompressMode {
    /// Inline, before `rotate()` returns
    #[default]
    Sync,
    /// On a single worker thread, in rotation order
    Background,
}

/// Treatment of an existing file at the base path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenMode {
    /// Continue after existing content; size is seeded from its length
    #[default]
    Append,
    /// Discard existing content
    Truncate,
}

/// Configuration for a rotating writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    /// Path of the active file
    pub path: PathBuf,

    /// Rotate before a write would push the file past this many bytes
    pub max_size: u64,

    /// Archive retention
    pub retention: RetentionPolicy,

    /// Archive compression
    pub compression: Compression,

    /// Where compression runs
    pub compress_mode: CompressMode,

    /// Archive naming scheme
    pub naming: ArchiveNaming,

    /// Treatment of an existing file on open
    pub open_mode: OpenMode,
}

/// Default rotation threshold (100MB)
pub const DEFAULT_MAX_SIZE: u64 = 100 * 1000 * 1000;

impl RotationConfig {
    /// Config with defaults for everything but the path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size: DEFAULT_MAX_SIZE,
            retention: RetentionPolicy::default(),
            compression: Compression::None,
            compress_mode: CompressMode::Sync,
            naming: ArchiveNaming::Sequence,
            open_mode: OpenMode::Append,
        }
    }

    /// Set the rotation threshold in bytes
    #[must_use]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    /// Keep at most `count` archives
    #[must_use]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.retention = self.retention.with_max_backups(count);
        self
    }

    /// Remove archives older than `age`
    #[must_use]
    pub fn with_max_age(mut self, age: std::time::Duration) -> Self {
        self.retention = self.retention.with_max_age(age);
        self
    }

    /// Compress archives
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Compress and prune on a worker thread
    #[must_use]
    pub fn with_background_compression(mut self) -> Self {
        self.compress_mode = CompressMode::Background;
        self
    }

    /// Use timestamped archive names
    #[must_use]
    pub fn with_naming(mut self, naming: ArchiveNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Set how an existing file is treated on open
    #[must_use]
    pub fn with_open_mode(mut self, open_mode: OpenMode) -> Self {
        self.open_mode = open_mode;
        self
    }

    /// Check the config before any file is touched
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(WriterError::invalid_config("path must not be empty"));
        }

        let trailing_separator = self
            .path
            .as_os_str()
            .as_encoded_bytes()
            .last()
            .is_some_and(|&b| std::path::is_separator(char::from(b)));
        if trailing_separator {
            return Err(WriterError::invalid_config(format!(
                "'{}' ends with a path separator",
                self.path.display()
            )));
        }

        match self.path.file_name() {
            Some(name) if name.to_str().is_some() => {}
            Some(_) => {
                return Err(WriterError::invalid_config(format!(
                    "file name of '{}' is not valid UTF-8",
                    self.path.display()
                )));
            }
            None => {
                return Err(WriterError::invalid_config(format!(
                    "'{}' does not name a file",
                    self.path.display()
                )));
            }
        }

        if self.path.is_dir() {
            return Err(WriterError::invalid_config(format!(
                "'{}' is a directory",
                self.path.display()
            )));
        }

        if self.max_size == 0 {
            return Err(WriterError::invalid_config("max_size must be greater than 0"));
        }

        Ok(())
    }

    /// Path of the active file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TryFrom<&RotationSettings> for RotationConfig {
    type Error = WriterError;

    fn try_from(settings: &RotationSettings) -> Result<Self> {
        let retention = RetentionPolicy {
            max_backups: settings.max_backups,
            max_age: settings.max_age,
        };

        let config = Self {
            path: PathBuf::from(&settings.path),
            max_size: settings.max_size.as_u64(),
            retention,
            compression: match settings.compression {
                logroll_config::Compression::None => Compression::None,
                logroll_config::Compression::Gzip => Compression::Gzip,
                logroll_config::Compression::Lz4 => Compression::Lz4,
            },
            compress_mode: match settings.compress_mode {
                logroll_config::CompressMode::Sync => CompressMode::Sync,
                logroll_config::CompressMode::Background => CompressMode::Background,
            },
            naming: match settings.naming {
                logroll_config::ArchiveNaming::Sequence => ArchiveNaming::Sequence,
                logroll_config::ArchiveNaming::Timestamp => ArchiveNaming::Timestamp,
            },
            open_mode: match settings.open_mode {
                logroll_config::OpenMode::Append => OpenMode::Append,
                logroll_config::OpenMode::Truncate => OpenMode::Truncate,
            },
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
