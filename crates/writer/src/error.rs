//! Writer error types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for rotating writer operations
pub type Result<T> = std::result::Result<T, WriterError>;

/// Errors that can occur while writing, rotating, or archiving
#[derive(Debug, Error)]
pub enum WriterError {
    /// Configuration rejected before any file was touched
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The active file could not be opened or created
    #[error("failed to open '{}': {source}", path.display())]
    Open {
        /// Path of the active file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Appending to the active file failed
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// A single buffer can never fit in one file
    #[error("write of {len} bytes exceeds max file size of {max} bytes")]
    WriteTooLarge {
        /// Length of the rejected buffer
        len: usize,
        /// Configured rotation threshold
        max: u64,
    },

    /// The writer has been closed
    #[error("writer is closed")]
    Closed,

    /// Flushing, archiving, or reopening the active file failed
    #[error("rotation of '{}' failed: {source}", path.display())]
    Rotate {
        /// Path of the active file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Compressing an archive failed; the uncompressed archive is kept
    #[error("failed to compress '{}': {source}", path.display())]
    Compress {
        /// Path of the archive that stayed uncompressed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Tracing subscriber setup failed
    #[error("failed to initialize logging: {0}")]
    Logging(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl WriterError {
    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an open error
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Create a rotation error
    pub fn rotate(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Rotate {
            path: path.into(),
            source,
        }
    }
}

impl From<WriterError> for io::Error {
    fn from(err: WriterError) -> Self {
        match err {
            WriterError::Write(e) | WriterError::Io(e) => e,
            other => {
                let kind = match other {
                    WriterError::Closed => io::ErrorKind::BrokenPipe,
                    WriterError::WriteTooLarge { .. } | WriterError::InvalidConfig(_) => {
                        io::ErrorKind::InvalidInput
                    }
                    _ => io::ErrorKind::Other,
                };
                io::Error::new(kind, other)
            }
        }
    }
}
