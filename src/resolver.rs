//! # Response Resolver
//!
//! ## Responsibility
//! Given a prompt and an optional credential, walk the ordered provider list
//! and return the first feedback produced, or an unavailable result that
//! says why.
//!
//! ## Guarantees
//! - Providers are tried strictly in list order; the first success wins
//! - Local providers are skipped when `prefer_local` is false; cloud
//!   providers are skipped when no non-blank credential is supplied
//! - An unreachable local provider falls through to the next one; an
//!   unreachable cloud provider is terminal and its error is shown
//! - Any other provider error is terminal, except a local error under
//!   [`LocalFailurePolicy::FallThrough`]
//! - Every failure leaves a [`Notice`] on the returned result
//!
//! ## NOT Responsible For
//! - Input validation (that belongs to `scorer`)
//! - Deciding which providers exist (that belongs to `registry`)

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::LocalFailurePolicy;
use crate::feedback::{FeedbackResult, Notice};
use crate::metrics;
use crate::provider::{FeedbackProvider, FragmentSink, ProviderError, ProviderKind};

/// Shown when no provider could be used at all, or only unreachable
/// local ones were tried.
pub const REMEDIATION: &str =
    "No model available. Please run Ollama locally or enter a valid OpenAI API key.";

/// Ordered provider fallback.
pub struct Resolver {
    providers: Vec<Arc<dyn FeedbackProvider>>,
    local_failure: LocalFailurePolicy,
}

impl Resolver {
    /// Create a resolver over `providers`, tried in the given order.
    ///
    /// Non-connection local failures abort by default.
    pub fn new(providers: Vec<Arc<dyn FeedbackProvider>>) -> Self {
        Self {
            providers,
            local_failure: LocalFailurePolicy::Abort,
        }
    }

    /// Set the policy for local failures that are not "unreachable".
    pub fn with_local_failure(mut self, policy: LocalFailurePolicy) -> Self {
        self.local_failure = policy;
        self
    }

    /// Providers in the order they are tried.
    pub fn providers(&self) -> &[Arc<dyn FeedbackProvider>] {
        &self.providers
    }

    /// Resolve `prompt` to feedback without incremental delivery.
    pub async fn resolve(
        &self,
        prompt: &str,
        credential: Option<&str>,
        prefer_local: bool,
    ) -> FeedbackResult {
        self.resolve_with(prompt, credential, prefer_local, &|_: &str| {})
            .await
    }

    /// Resolve `prompt`, passing fragments of the eventually-successful
    /// provider to `on_fragment` as they arrive.
    ///
    /// A provider that fails mid-stream may already have emitted fragments;
    /// the returned result never contains them.
    pub async fn resolve_with(
        &self,
        prompt: &str,
        credential: Option<&str>,
        prefer_local: bool,
        on_fragment: FragmentSink<'_>,
    ) -> FeedbackResult {
        let credential = credential.map(str::trim).filter(|c| !c.is_empty());
        let mut notices = Vec::new();

        for provider in &self.providers {
            let name = provider.name();
            match provider.kind() {
                ProviderKind::Local if !prefer_local => {
                    debug!(provider = name, "local backend not preferred, skipping");
                    continue;
                }
                ProviderKind::Cloud if credential.is_none() => {
                    debug!(provider = name, "no credential supplied, skipping");
                    continue;
                }
                _ => {}
            }

            metrics::record_attempt(name);
            let err = match provider.attempt_with(prompt, credential, on_fragment).await {
                Ok(mut result) => {
                    info!(provider = name, chars = result.text().len(), "feedback produced");
                    result.push_notice(Notice::success(format!(
                        "Response generated using {name}."
                    )));
                    result.prepend_notices(notices);
                    metrics::record_outcome(result.source());
                    return result;
                }
                Err(err) => err,
            };

            match (&err, provider.kind()) {
                (ProviderError::Unreachable { .. }, ProviderKind::Cloud) => {
                    warn!(provider = name, error = %err, "cloud backend unreachable");
                    return unavailable(notices, Notice::error(err.to_string()));
                }
                (ProviderError::Unreachable { .. }, ProviderKind::Local) => {
                    warn!(provider = name, error = %err, "backend unreachable");
                    metrics::record_fallback(name, "unreachable");
                    notices.push(Notice::warning(format!(
                        "Could not connect to {name}. Trying the next backend if one is available."
                    )));
                }
                (ProviderError::MissingCredential { .. }, _) => {
                    debug!(provider = name, "provider reported missing credential, skipping");
                }
                (ProviderError::Rejected { .. }, ProviderKind::Local)
                    if self.local_failure == LocalFailurePolicy::FallThrough =>
                {
                    warn!(provider = name, error = %err, "local backend failed, falling through");
                    metrics::record_fallback(name, "rejected");
                    notices.push(Notice::error(err.to_string()));
                }
                (ProviderError::Rejected { .. }, _) => {
                    warn!(provider = name, error = %err, "backend rejected request");
                    return unavailable(notices, Notice::error(err.to_string()));
                }
            }
        }

        warn!("no backend produced feedback");
        unavailable(notices, Notice::error(REMEDIATION))
    }
}

fn unavailable(earlier: Vec<Notice>, last: Notice) -> FeedbackResult {
    let mut result = FeedbackResult::unavailable(last);
    result.prepend_notices(earlier);
    metrics::record_outcome(result.source());
    result
}
