//! # essay-scorer
//!
//! Essay feedback over local or cloud LLM backends with ordered provider
//! fallback.
//!
//! ## Architecture
//!
//! One submission flows through a single resolver that walks an ordered list
//! of provider strategies:
//! ```text
//! FeedbackRequest → validate → prompt → Resolver [Local → Cloud] → FeedbackResult
//!                                        └─ or Simulated (no network)
//! ```
//!
//! The provider list is fixed once at startup by [`ProviderRegistry::probe`],
//! from compiled-in features plus configuration.

// ── Lint policy ───────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(missing_docs)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod feedback;
pub mod metrics;
pub mod prompt;
pub mod provider;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod scorer;
pub mod scores;

#[cfg(feature = "web-api")]
pub mod web_api;

// Re-exports for convenience
pub use config::{LocalFailurePolicy, LogFormat, ScorerConfig, ScoringMode};
pub use feedback::{
    AcademicLevel, FeedbackRequest, FeedbackResult, FeedbackSource, Notice, NoticeLevel,
    SubScores,
};
pub use provider::{FeedbackProvider, ProviderError, ProviderKind, SimulatedProvider};
pub use registry::ProviderRegistry;
pub use resolver::Resolver;
pub use scorer::EssayScorer;

#[cfg(feature = "cloud-backend")]
pub use provider::openai::OpenAiProvider;

#[cfg(feature = "local-backend")]
pub use provider::ollama::OllamaProvider;

/// Initialise the global tracing subscriber.
///
/// Reads the `LOG_FORMAT` environment variable to choose output format:
/// - `"json"` — structured JSON output for log aggregators
/// - anything else (including unset) — human-readable pretty output
///
/// Filter level is controlled by `RUST_LOG` (e.g. `RUST_LOG=info`).
///
/// # Errors
///
/// Returns [`ScorerError::Other`] if the global subscriber has already
/// been set (e.g. by a previous call or a test harness).
///
/// # Panics
///
/// This function never panics.
pub fn init_tracing() -> Result<(), ScorerError> {
    let format = match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    };
    init_tracing_with(&format)
}

/// Initialise the global tracing subscriber with an explicit output format.
///
/// Used when the format comes from `[observability].log_format` rather
/// than the environment.
///
/// # Errors
///
/// Returns [`ScorerError::Other`] if a global subscriber is already set.
pub fn init_tracing_with(format: &LogFormat) -> Result<(), ScorerError> {
    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| ScorerError::Other(format!("tracing init failed: {e}")))
}

/// Top-level scorer errors.
///
/// [`EssayScorer::submit`] only returns `InputInvalid`: backend failures
/// there come back as an unavailable [`FeedbackResult`] with notices. The
/// `Backend*` and `NoBackendConfigured` variants are produced from
/// [`ProviderError`] for callers that drive a [`FeedbackProvider`] directly.
#[derive(Error, Debug)]
pub enum ScorerError {
    /// A backend could not be reached at the connection level
    /// (connection refused, DNS failure, timeout).
    #[error("backend unreachable: {0}")]
    BackendUnreachable(String),

    /// A backend answered with an application-level error
    /// (authentication, malformed request, quota, unparseable body).
    #[error("backend rejected request: {0}")]
    BackendRejected(String),

    /// The submission itself is invalid (e.g. empty essay text).
    ///
    /// Checked before any backend is contacted.
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// No backend is usable for this request.
    #[error("no backend configured: {0}")]
    NoBackendConfigured(String),

    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] config::validation::ConfigError),

    /// Catch-all for errors that do not fit a specific variant.
    #[error("{0}")]
    Other(String),
}
