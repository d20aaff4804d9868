//! Feedback provider abstraction and implementations
//!
//! Provides the [`FeedbackProvider`] trait and the backends behind it:
//! - [`ollama::OllamaProvider`]: local Ollama-compatible chat server
//!   (feature `local-backend`)
//! - [`openai::OpenAiProvider`]: OpenAI-compatible chat completions API
//!   (feature `cloud-backend`)
//! - [`SimulatedProvider`]: bounded random scores, no network
//!
//! ## Environment Variables
//!
//! - `OLLAMA_HOST`: local server address (default: http://localhost:11434)
//! - `OPENAI_API_KEY`: cloud credential when none is typed (name configurable)

use async_trait::async_trait;
use thiserror::Error;

use crate::feedback::FeedbackResult;
use crate::ScorerError;

#[cfg(feature = "local-backend")]
pub mod ollama;
#[cfg(feature = "cloud-backend")]
pub mod openai;
pub mod simulated;
pub(crate) mod stream;

pub use simulated::SimulatedProvider;

/// Callback receiving each text fragment as it arrives.
///
/// Optional: results are always fully accumulated before they are returned.
pub type FragmentSink<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Where a provider runs. The resolver branches on this, never on names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// On-device model server, no credential.
    Local,
    /// Hosted API, needs a credential.
    Cloud,
}

/// Why a provider produced no feedback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Connection-level failure: refused, DNS, or timed out.
    #[error("could not connect to {backend}: {message}")]
    Unreachable {
        /// Provider name.
        backend: String,
        /// Underlying error text.
        message: String,
    },

    /// The backend answered, but with an error or an unusable body.
    #[error("{backend} error: {message}")]
    Rejected {
        /// Provider name.
        backend: String,
        /// Underlying error text, including HTTP status when there is one.
        message: String,
    },

    /// A cloud provider was asked to run without a credential.
    #[error("{backend} needs an API key")]
    MissingCredential {
        /// Provider name.
        backend: String,
    },
}

impl ProviderError {
    /// Whether the backend could not be reached at all.
    ///
    /// Only this class of failure triggers fallback by default.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ProviderError::Unreachable { .. })
    }

    /// Classify a transport error from `reqwest`.
    ///
    /// Connect failures and timeouts mean the backend never answered;
    /// everything else (body decode, redirect loops, ...) counts as a
    /// rejection.
    pub(crate) fn from_reqwest(backend: &str, err: &reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ProviderError::Unreachable {
                backend: backend.to_string(),
                message: err.to_string(),
            }
        } else {
            ProviderError::Rejected {
                backend: backend.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub(crate) fn rejected(backend: &str, message: impl Into<String>) -> Self {
        ProviderError::Rejected {
            backend: backend.to_string(),
            message: message.into(),
        }
    }
}

/// Lets callers that drive a provider directly, without the resolver,
/// propagate its failure with `?`:
///
/// ```no_run
/// use essay_scorer::{FeedbackProvider, FeedbackResult, ScorerError};
///
/// async fn ask(
///     provider: &dyn FeedbackProvider,
///     prompt: &str,
/// ) -> Result<FeedbackResult, ScorerError> {
///     Ok(provider.attempt(prompt, None).await?)
/// }
/// ```
impl From<ProviderError> for ScorerError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unreachable { .. } => ScorerError::BackendUnreachable(err.to_string()),
            ProviderError::Rejected { .. } => ScorerError::BackendRejected(err.to_string()),
            ProviderError::MissingCredential { .. } => {
                ScorerError::NoBackendConfigured(err.to_string())
            }
        }
    }
}

/// Trait for feedback backends
///
/// Implementations must be thread-safe (Send + Sync) and object-safe so the
/// resolver can hold an ordered `Vec<Arc<dyn FeedbackProvider>>`.
#[async_trait]
pub trait FeedbackProvider: Send + Sync {
    /// Display name used in notices and logs (e.g. "Ollama (local)").
    fn name(&self) -> &str;

    /// Local or cloud.
    fn kind(&self) -> ProviderKind;

    /// Produce feedback for `prompt`, passing each fragment to `on_fragment`
    /// as it arrives.
    ///
    /// On success the result text is the concatenation of every fragment in
    /// emission order and is never empty.
    async fn attempt_with(
        &self,
        prompt: &str,
        credential: Option<&str>,
        on_fragment: FragmentSink<'_>,
    ) -> Result<FeedbackResult, ProviderError>;

    /// Produce feedback for `prompt` without incremental delivery.
    async fn attempt(
        &self,
        prompt: &str,
        credential: Option<&str>,
    ) -> Result<FeedbackResult, ProviderError> {
        self.attempt_with(prompt, credential, &|_: &str| {}).await
    }
}
