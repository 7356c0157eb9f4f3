//! logroll Writer - size-bounded rotating file writer
//!
//! Appends byte buffers to a file and, when the next buffer would push the
//! file past a size threshold, archives it, optionally compresses the
//! archive, opens a fresh file, and prunes old archives.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌────────────────┐    ┌──────────────────────────┐
//! │ SharedWriter │───►│ RotatingWriter │───►│ app.log                  │
//! │ (Mutex)      │    │ write/rotate   │    └──────────────────────────┘
//! └──────────────┘    └───────┬────────┘
//!                             │ rename to app.log.<key>
//!                             ▼
//!                     ┌────────────────┐    ┌──────────────────────────┐
//!                     │   Compressor   │───►│ app.log.<key>.gz / .lz4  │
//!                     │ inline/worker  │    │ pruned by RetentionPolicy│
//!                     └────────────────┘    └──────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use logroll_writer::{Compression, RotatingWriter, RotationConfig};
//!
//! let config = RotationConfig::new("logs/app.log")
//!     .with_max_size(10 * 1024 * 1024)
//!     .with_max_backups(5)
//!     .with_compression(Compression::Gzip);
//!
//! let mut writer = RotatingWriter::open(config)?;
//! writer.write(b"service started\n")?;
//! writer.close()?;
//! # Ok::<(), logroll_writer::WriterError>(())
//! ```

pub mod archive;
pub mod codec;
mod compressor;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod naming;
pub mod rate_limited_logger;
pub mod retention;
mod shared;
mod writer;

pub use archive::Archive;
pub use codec::{ArchiveCodec, ArchiveWrite, Compression, GzipCodec, Lz4Codec};
pub use compressor::WORKER_THREAD_NAME;
pub use config::{CompressMode, OpenMode, RotationConfig};
pub use error::{Result, WriterError};
pub use logging::{LoggingGuard, build_subscriber, init_logging};
pub use metrics::{MetricsSnapshot, WriterMetrics};
pub use naming::ArchiveNaming;
pub use retention::RetentionPolicy;
pub use shared::{EventWriter, SharedWriter};
pub use writer::RotatingWriter;
