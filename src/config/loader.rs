//! Configuration loading and saving (std only).

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Error, Result};

use super::SystemConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
///
/// # Example
///
/// ```rust,ignore
/// use servo_motion::load_config;
///
/// let config = load_config("servos.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SystemConfig> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| io_error(&e.to_string()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or fails validation.
pub fn parse_config(content: &str) -> Result<SystemConfig> {
    let config: SystemConfig = toml::from_str(content).map_err(|e| {
        Error::Config(ConfigError::ParseError(truncated(e.message())))
    })?;

    // Same validation as live updates
    super::validation::validate_config(&config)?;

    Ok(config)
}

/// Render a configuration as TOML.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn to_toml_string(config: &SystemConfig) -> Result<String> {
    super::validation::validate_config(config)?;

    toml::to_string_pretty(config)
        .map_err(|e| Error::Config(ConfigError::ParseError(truncated(&e.to_string()))))
}

/// Write a configuration to a TOML file.
///
/// The configuration is validated first and nothing is written if it is invalid.
pub fn save_config<P: AsRef<Path>>(path: P, config: &SystemConfig) -> Result<()> {
    let content = to_toml_string(config)?;
    fs::write(path.as_ref(), content).map_err(|e| io_error(&e.to_string()))?;

    tracing::debug!(path = %path.as_ref().display(), "configuration saved");
    Ok(())
}

fn io_error(msg: &str) -> Error {
    Error::Config(ConfigError::IoError(truncated(msg)))
}

fn truncated(msg: &str) -> heapless::String<128> {
    let mut out = heapless::String::new();
    for c in msg.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
