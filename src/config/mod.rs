//! # Scorer Configuration
//!
//! ## Responsibility
//! Parse and validate the TOML file that decides which backends exist, how
//! they are reached, and how the resolver falls back between them:
//! ```text
//! essay-scorer --config scorer.toml score essay.txt
//! ```
//!
//! ## Guarantees
//! - Every section and field has a documented default, so an empty file is valid
//! - Validated: semantic constraints are checked before a config is accepted
//! - Schema-exportable: JSON Schema output enables IDE autocomplete
//!
//! ## NOT Responsible For
//! - Building providers from config (that belongs to `registry`)
//! - Reading credentials (the credential variable is only *named* here)

pub mod loader;
pub mod validation;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Default value functions ──────────────────────────────────────────────

/// Default local server url (Ollama's standard port).
fn default_local_url() -> String {
    "http://localhost:11434".to_string()
}

/// Default local model tag.
fn default_local_model() -> String {
    "llama3.1:8b".to_string()
}

/// Local generation on CPU can be slow: 120 s.
fn default_local_timeout_ms() -> u64 {
    120_000
}

/// Default cloud API base url.
fn default_cloud_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Default cloud model.
fn default_cloud_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Default cloud request timeout: 60 s.
fn default_cloud_timeout_ms() -> u64 {
    60_000
}

/// Environment variable consulted when the credential field is blank.
fn default_credential_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Default enabled state: true.
fn default_true() -> bool {
    true
}

// ── Top-level config ─────────────────────────────────────────────────────

/// Root configuration for the scorer.
///
/// # Example
///
/// ```toml
/// [resolver]
/// mode = "live"
/// prefer_local = true
/// local_failure = "abort"
///
/// [local]
/// model = "llama3.1:8b"
///
/// [cloud]
/// model = "gpt-4o-mini"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ScorerConfig {
    /// How the resolver picks and falls back between backends.
    pub resolver: ResolverConfig,
    /// On-device model server.
    pub local: LocalBackendConfig,
    /// Hosted model API.
    pub cloud: CloudBackendConfig,
    /// Logging.
    pub observability: ObservabilityConfig,
}

impl ScorerConfig {
    /// Apply environment overrides on top of file values.
    ///
    /// `OLLAMA_HOST` replaces `[local].url`; a bare `host:port` gets an
    /// `http://` scheme.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            let host = host.trim();
            if !host.is_empty() {
                self.local.url = if host.starts_with("http://") || host.starts_with("https://") {
                    host.to_string()
                } else {
                    format!("http://{host}")
                };
            }
        }
        self
    }
}

// ── Resolver ─────────────────────────────────────────────────────────────

/// Resolver behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Live backends, or randomly generated placeholder scores.
    pub mode: ScoringMode,
    /// Try the local backend before the cloud backend.
    pub prefer_local: bool,
    /// What to do when the local backend answers with an error that is not
    /// a connection failure.
    pub local_failure: LocalFailurePolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            mode: ScoringMode::Live,
            prefer_local: true,
            local_failure: LocalFailurePolicy::Abort,
        }
    }
}

/// Where feedback comes from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Ask the configured model backends.
    Live,
    /// Never touch the network; draw bounded random scores.
    Simulated,
}

/// Policy for a local-backend failure that is *not* "unreachable".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LocalFailurePolicy {
    /// Stop and return an unavailable result carrying the error.
    Abort,
    /// Record an error notice and try the next backend.
    FallThrough,
}

// ── Backends ─────────────────────────────────────────────────────────────

/// Local (Ollama-compatible) chat server.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct LocalBackendConfig {
    /// Register the local provider at startup.
    pub enabled: bool,
    /// Server base url, e.g. `http://localhost:11434`.
    pub url: String,
    /// Model tag to run.
    pub model: String,
    /// Request a streamed (newline-delimited JSON) response.
    pub stream: bool,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            url: default_local_url(),
            model: default_local_model(),
            stream: default_true(),
            timeout_ms: default_local_timeout_ms(),
        }
    }
}

/// Cloud (OpenAI-compatible) chat completions API.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct CloudBackendConfig {
    /// Register the cloud provider at startup.
    pub enabled: bool,
    /// API base url, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Request a streamed (server-sent events) response.
    pub stream: bool,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
    /// Environment variable that supplies the credential when none is typed.
    pub credential_env: String,
}

impl Default for CloudBackendConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_cloud_base_url(),
            model: default_cloud_model(),
            stream: default_true(),
            timeout_ms: default_cloud_timeout_ms(),
            credential_env: default_credential_env(),
        }
    }
}

// ── Observability ────────────────────────────────────────────────────────

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable, colorized log output.
    #[default]
    Pretty,
    /// Structured JSON log output for machine consumption.
    Json,
}

/// Export the JSON Schema for [`ScorerConfig`].
///
/// # Errors
///
/// Returns `serde_json::Error` if schema serialization fails.
pub fn export_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(ScorerConfig);
    serde_json::to_string_pretty(&schema)
}
