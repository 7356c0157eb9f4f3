//! Configuration validation
//!
//! Validates config consistency:
//! - A rotating log output has a `[rotation]` section to write to
//! - The rotation path is present and names a file
//! - The rotation threshold is non-zero

use std::path::Path;

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::logging::LogOutput;
use crate::rotation::RotationSettings;

const ROTATION: &str = "[rotation]";

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.log.output == LogOutput::Rotating && config.rotation.is_none() {
        return Err(ConfigError::missing_field("[log] output = \"rotating\"", "rotation"));
    }

    if let Some(ref rotation) = config.rotation {
        validate_rotation(rotation)?;
    }

    Ok(())
}

fn validate_rotation(rotation: &RotationSettings) -> Result<()> {
    if rotation.path.trim().is_empty() {
        return Err(ConfigError::missing_field(ROTATION, "path"));
    }

    if rotation.path.ends_with('/') || Path::new(&rotation.path).file_name().is_none() {
        return Err(ConfigError::invalid_value(
            ROTATION,
            "path",
            format!("'{}' does not name a file", rotation.path),
        ));
    }

    if rotation.max_size.as_u64() == 0 {
        return Err(ConfigError::invalid_value(
            ROTATION,
            "max_size",
            "must be greater than zero",
        ));
    }

    Ok(())
}
