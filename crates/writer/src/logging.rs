//! Tracing subscriber setup
//!
//! Builds the `tracing` subscriber described by `[log]`. With
//! `output = "rotating"` events are written through a [`SharedWriter`] to
//! the file described by `[rotation]`.
//!
//! # Example
//!
//! ```ignore
//! let config = logroll_config::Config::from_file("logroll.toml")?;
//! let _guard = logroll_writer::logging::init_logging(&config)?;
//! tracing::info!("logging to a rotating file");
//! ```

use std::io;

use logroll_config::{LogConfig, LogFormat, LogOutput, RotationSettings};
use tracing::Subscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::config::RotationConfig;
use crate::error::{Result, WriterError};
use crate::shared::SharedWriter;

/// Keeps the rotating log file flushed
///
/// Dropping the guard waits for queued archive work and fsyncs the file.
/// The file itself stays open for as long as the subscriber holds it.
#[must_use = "dropping the guard stops syncing the log file"]
#[derive(Debug, Default)]
pub struct LoggingGuard {
    writer: Option<SharedWriter>,
}

impl LoggingGuard {
    /// Rotating writer behind the subscriber, if logging to a file
    pub fn writer(&self) -> Option<&SharedWriter> {
        self.writer.as_ref()
    }
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        if let Some(writer) = &self.writer {
            writer.wait_for_archives();
            if let Err(e) = writer.sync()
                && !matches!(e, WriterError::Closed)
            {
                eprintln!("logroll: failed to sync log file: {e}");
            }
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build a subscriber for `config` without installing it
///
/// # Errors
///
/// Returns `Logging` if the output is rotating but `rotation` is None, and
/// the writer's open errors if the rotating file cannot be opened.
pub fn build_subscriber(
    config: &LogConfig,
    rotation: Option<&RotationSettings>,
) -> Result<(Box<dyn Subscriber + Send + Sync>, LoggingGuard)> {
    let filter = EnvFilter::try_new(config.level.as_str())
        .map_err(|e| WriterError::Logging(format!("invalid log level: {e}")))?;

    let (make_writer, guard, ansi) = match config.output {
        LogOutput::Stdout => (BoxMakeWriter::new(io::stdout), LoggingGuard::default(), true),
        LogOutput::Stderr => (BoxMakeWriter::new(io::stderr), LoggingGuard::default(), true),
        LogOutput::Rotating => {
            let settings = rotation.ok_or_else(|| {
                WriterError::Logging("log output is rotating but no [rotation] section".into())
            })?;
            let writer = SharedWriter::open(RotationConfig::try_from(settings)?)?;
            let guard = LoggingGuard {
                writer: Some(writer.clone()),
            };
            (BoxMakeWriter::new(writer), guard, false)
        }
    };

    let layer: BoxedLayer = match config.format {
        LogFormat::Console => fmt::layer()
            .with_target(config.with_target)
            .with_ansi(ansi)
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(config.with_target)
            .with_writer(make_writer)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(layer).with(filter);
    Ok((Box::new(subscriber), guard))
}

/// Build the subscriber for `config` and install it globally
///
/// # Errors
///
/// Returns `Logging` if a global subscriber is already set.
pub fn init_logging(config: &logroll_config::Config) -> Result<LoggingGuard> {
    let (subscriber, guard) = build_subscriber(&config.log, config.rotation.as_ref())?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| WriterError::Logging(e.to_string()))?;
    Ok(guard)
}

#[cfg(test)]
#[path = "logging_test.rs"]
mod logging_test;
