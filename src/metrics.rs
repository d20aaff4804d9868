//! Metrics recording hooks
//!
//! Implemented as structured `tracing` events: every hook emits a `metric`
//! field so a log pipeline can aggregate them without a metrics registry.

use std::time::Duration;

use crate::feedback::FeedbackSource;

/// Record that a provider is about to be tried
pub fn record_attempt(provider: &str) {
    tracing::debug!(
        metric = "provider_attempts",
        provider = provider,
        "provider attempt started"
    );
}

/// Record a fallback from one provider to the next
pub fn record_fallback(from: &str, reason: &str) {
    tracing::warn!(
        metric = "provider_fallbacks",
        provider = from,
        reason = reason,
        "falling back to next provider"
    );
}

/// Record the final source of a submission
pub fn record_outcome(source: FeedbackSource) {
    let source = source.to_string();
    tracing::info!(
        metric = "submissions_resolved",
        source = %source,
        "submission resolved"
    );
}

/// Record wall-clock time of a successful provider call
pub fn record_latency(provider: &str, dur: Duration) {
    tracing::info!(
        metric = "provider_latency_ms",
        provider = provider,
        latency_ms = dur.as_millis() as u64,
        "provider call completed"
    );
}
