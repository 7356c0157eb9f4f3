//! logroll Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use logroll_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[rotation]\npath = \"logs/app.log\"").unwrap();
//! assert_eq!(config.rotation.unwrap().path, "logs/app.log");
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//! output = "rotating"
//!
//! [rotation]
//! path = "logs/app.log"
//! max_size = "100MB"
//! max_backups = 5
//! max_age = "7days"
//! compression = "gzip"
//! ```

mod error;
mod logging;
mod rotation;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use rotation::{
    ArchiveNaming, CompressMode, Compression, DEFAULT_MAX_SIZE, OpenMode, RotationSettings,
};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional. A `[rotation]` section is required only when
/// `log.output = "rotating"`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Rotating file settings
    pub rotation: Option<RotationSettings>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Whether internal logs are routed into the rotating file
    pub fn logs_to_rotating_file(&self) -> bool {
        self.log.output == LogOutput::Rotating
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
