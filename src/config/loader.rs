//! Configuration file loading.
//!
//! ## Responsibility
//! Read a TOML file from disk, parse it into a [`ScorerConfig`], and run
//! validation before returning.
//!
//! ## Guarantees
//! - A successfully loaded config is always validated
//! - I/O errors and parse errors are distinguished in the error type
//! - File path is included in every error message

use std::path::Path;

use super::validation::{self, ConfigError};
use super::ScorerConfig;

/// Load a [`ScorerConfig`] from a TOML file.
///
/// # Errors
///
/// - [`ConfigError::Io`] if the file cannot be read.
/// - [`ConfigError::Parse`] if the TOML is malformed.
/// - [`ConfigError::Validation`] if semantic constraints are violated.
pub fn load_from_file(path: &Path) -> Result<ScorerConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        file: path.display().to_string(),
        source: e,
    })?;

    load_from_str(&content, &path.display().to_string())
}

/// Load a [`ScorerConfig`] from a TOML string.
///
/// `source_name` identifies the source in error messages.
///
/// # Errors
///
/// - [`ConfigError::Parse`] if the TOML is malformed.
/// - [`ConfigError::Validation`] if semantic constraints are violated.
pub fn load_from_str(content: &str, source_name: &str) -> Result<ScorerConfig, ConfigError> {
    let config: ScorerConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
        file: source_name.to_string(),
        source: e,
    })?;

    validate_joined(&config)?;
    Ok(config)
}

/// Load from `path` when given, defaults otherwise; then apply environment
/// overrides and re-validate.
///
/// # Errors
///
/// Any error from [`load_from_file`], or [`ConfigError::Validation`] if an
/// environment override produced an invalid value.
pub fn load(path: Option<&Path>) -> Result<ScorerConfig, ConfigError> {
    let config = match path {
        Some(p) => load_from_file(p)?,
        None => ScorerConfig::default(),
    }
    .with_env_overrides();

    validate_joined(&config)?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

fn validate_joined(config: &ScorerConfig) -> Result<(), ConfigError> {
    validation::validate(config).map_err(|errors| {
        ConfigError::Validation(
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    })
}
