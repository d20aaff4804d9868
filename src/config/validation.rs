//! Configuration validation engine.
//!
//! ## Responsibility
//! Validate semantic constraints on a parsed [`ScorerConfig`] that cannot
//! be expressed through the type system alone.
//!
//! ## Guarantees
//! - Validation collects *all* errors before returning (no short-circuit)
//! - Error messages include the field path and the invalid value

use super::ScorerConfig;

/// Errors arising from configuration parsing, validation, or I/O.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parsing failed.
    #[error("Parse error in {file}: {source}")]
    Parse {
        /// Path of the file that failed to parse.
        file: String,
        /// Underlying TOML deserialization error.
        #[source]
        source: toml::de::Error,
    },

    /// One or more semantic validation rules failed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A specific field has an out-of-range or contradictory value.
    #[error("Field '{field}' has invalid value {value:?}: {reason}")]
    InvalidField {
        /// Dot-separated field path (e.g., "cloud.timeout_ms").
        field: String,
        /// String representation of the invalid value.
        value: String,
        /// Human-readable explanation of the constraint.
        reason: String,
    },

    /// File I/O error.
    #[error("IO error reading {file}: {source}")]
    Io {
        /// Path of the file that could not be read.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Validate all semantic constraints on a [`ScorerConfig`].
///
/// # Errors
///
/// Returns every violation found.
pub fn validate(config: &ScorerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // ── Local backend ────────────────────────────────────────────────
    check_url("local.url", &config.local.url, &mut errors);
    check_non_empty("local.model", &config.local.model, &mut errors);
    check_timeout("local.timeout_ms", config.local.timeout_ms, &mut errors);

    // ── Cloud backend ────────────────────────────────────────────────
    check_url("cloud.base_url", &config.cloud.base_url, &mut errors);
    check_non_empty("cloud.model", &config.cloud.model, &mut errors);
    check_timeout("cloud.timeout_ms", config.cloud.timeout_ms, &mut errors);
    check_non_empty(
        "cloud.credential_env",
        &config.cloud.credential_env,
        &mut errors,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &str, value: &str, errors: &mut Vec<ConfigError>) {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(ConfigError::InvalidField {
            field: field.into(),
            value: value.into(),
            reason: "must start with http:// or https://".into(),
        });
    }
}

fn check_non_empty(field: &str, value: &str, errors: &mut Vec<ConfigError>) {
    if value.trim().is_empty() {
        errors.push(ConfigError::InvalidField {
            field: field.into(),
            value: value.into(),
            reason: "must not be empty".into(),
        });
    }
}

fn check_timeout(field: &str, value: u64, errors: &mut Vec<ConfigError>) {
    if value == 0 {
        errors.push(ConfigError::InvalidField {
            field: field.into(),
            value: "0".into(),
            reason: "timeout must be at least 1ms".into(),
        });
    }
}
