//! Scorer facade: one call per form submission.
//!
//! ## Responsibility
//! Validate the request, pick the credential, build the prompt, run the
//! resolver (or the simulator), and attach whatever scores can be read from
//! the feedback.
//!
//! ## Guarantees
//! - An invalid request returns `Err(InputInvalid)` before any provider is
//!   contacted
//! - Every valid request returns `Ok`, possibly with an unavailable result

use tracing::{info, instrument};

use crate::config::{ScorerConfig, ScoringMode};
use crate::feedback::{FeedbackRequest, FeedbackResult};
use crate::prompt::build_prompt;
use crate::provider::{FragmentSink, SimulatedProvider};
use crate::registry::ProviderRegistry;
use crate::resolver::Resolver;
use crate::scores::parse_scores;
use crate::ScorerError;

/// Entry point used by the CLI and the HTTP API.
pub struct EssayScorer {
    mode: ScoringMode,
    resolver: Resolver,
    simulator: SimulatedProvider,
    credential_env: Option<String>,
}

impl EssayScorer {
    /// Live scorer over `resolver`, reading no credential from the
    /// environment.
    pub fn new(resolver: Resolver) -> Self {
        Self {
            mode: ScoringMode::Live,
            resolver,
            simulator: SimulatedProvider::new(),
            credential_env: None,
        }
    }

    /// Scorer that never touches the network.
    pub fn simulated() -> Self {
        Self {
            mode: ScoringMode::Simulated,
            resolver: Resolver::new(Vec::new()),
            simulator: SimulatedProvider::new(),
            credential_env: None,
        }
    }

    /// Probe providers for `config` and build the scorer around them.
    pub fn from_config(config: &ScorerConfig) -> Self {
        let registry = ProviderRegistry::probe(config);
        let mode = registry.mode();
        let resolver = registry
            .into_resolver()
            .with_local_failure(config.resolver.local_failure);

        Self {
            mode,
            resolver,
            simulator: SimulatedProvider::new(),
            credential_env: Some(config.cloud.credential_env.clone()),
        }
    }

    /// Fall back to this environment variable when the request carries no
    /// credential.
    pub fn with_credential_env(mut self, name: impl Into<String>) -> Self {
        self.credential_env = Some(name.into());
        self
    }

    /// Live or simulated.
    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    /// Names of the network providers, in fallback order.
    pub fn provider_names(&self) -> Vec<String> {
        self.resolver
            .providers()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Score one submission.
    ///
    /// # Errors
    ///
    /// Returns [`ScorerError::InputInvalid`] for an empty essay. Backend
    /// failures are not errors here: they come back as an unavailable
    /// result with notices.
    pub async fn submit(
        &self,
        request: &FeedbackRequest,
        prefer_local: bool,
    ) -> Result<FeedbackResult, ScorerError> {
        self.submit_with(request, prefer_local, &|_: &str| {}).await
    }

    /// [`EssayScorer::submit`], streaming fragments to `on_fragment`.
    ///
    /// # Errors
    ///
    /// Same as [`EssayScorer::submit`].
    #[instrument(skip_all, fields(level = %request.academic_level, mode = ?self.mode))]
    pub async fn submit_with(
        &self,
        request: &FeedbackRequest,
        prefer_local: bool,
        on_fragment: FragmentSink<'_>,
    ) -> Result<FeedbackResult, ScorerError> {
        request.validate()?;

        if self.mode == ScoringMode::Simulated {
            let result = self.simulator.generate(request.academic_level);
            on_fragment(result.text());
            return Ok(result);
        }

        let credential = self.credential_for(request);
        let prompt = build_prompt(request);
        info!(
            chars = request.essay_text.len(),
            has_credential = credential.is_some(),
            "submitting essay"
        );

        let mut result = self
            .resolver
            .resolve_with(&prompt, credential.as_deref(), prefer_local, on_fragment)
            .await;

        if result.is_available() && result.scores().is_none() {
            let parsed = parse_scores(result.text());
            if let Some(overall) = parsed.overall {
                result = result.with_overall(overall);
            }
            if let Some(scores) = parsed.scores {
                result = result.with_scores(scores);
            }
        }

        Ok(result)
    }

    fn credential_for(&self, request: &FeedbackRequest) -> Option<String> {
        if let Some(typed) = request.credential() {
            return Some(typed.to_string());
        }
        let var = self.credential_env.as_deref()?;
        std::env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{AcademicLevel, FeedbackSource};
    use crate::provider::simulated::{
        COHERENCE_RANGE, CONTENT_RELEVANCE_RANGE, GRAMMAR_RANGE, ORGANIZATION_RANGE,
        OVERALL_RANGE,
    };

    #[tokio::test]
    async fn test_empty_essay_is_rejected() {
        let scorer = EssayScorer::simulated();
        for text in ["", "   ", "\n\t"] {
            let req = FeedbackRequest::new(text, AcademicLevel::HighSchool);
            let err = scorer.submit(&req, true).await.unwrap_err();
            assert!(matches!(err, ScorerError::InputInvalid(_)));
        }
    }

    #[tokio::test]
    async fn test_simulated_scores_stay_in_range() {
        let scorer = EssayScorer::simulated();
        let req = FeedbackRequest::new("An essay.", AcademicLevel::Undergraduate);
        for _ in 0..1000 {
            let result = scorer.submit(&req, true).await.expect("test: simulated never fails");
            assert_eq!(result.source(), FeedbackSource::Simulated);
            let overall = result.overall().expect("test: overall present");
            let s = result.scores().copied().expect("test: scores present");
            assert!(OVERALL_RANGE.contains(&overall), "overall {overall}");
            assert!(GRAMMAR_RANGE.contains(&s.grammar), "grammar {}", s.grammar);
            assert!(COHERENCE_RANGE.contains(&s.coherence), "coherence {}", s.coherence);
            assert!(
                ORGANIZATION_RANGE.contains(&s.organization),
                "organization {}",
                s.organization
            );
            assert!(
                CONTENT_RELEVANCE_RANGE.contains(&s.content_relevance),
                "content relevance {}",
                s.content_relevance
            );
        }
    }

    #[tokio::test]
    async fn test_no_providers_yields_unavailable() {
        let scorer = EssayScorer::new(Resolver::new(Vec::new()));
        let req = FeedbackRequest::new("An essay.", AcademicLevel::Graduate);
        let result = scorer.submit(&req, true).await.expect("test: valid request");
        assert_eq!(result.source(), FeedbackSource::Unavailable);
        assert!(result.text().is_empty());
    }

    #[test]
    fn test_typed_credential_wins_over_environment() {
        let scorer = EssayScorer::new(Resolver::new(Vec::new()))
            .with_credential_env("ESSAY_SCORER_TEST_UNSET_VAR");
        let req = FeedbackRequest::new("x", AcademicLevel::Graduate).with_credential("sk-typed");
        assert_eq!(scorer.credential_for(&req).as_deref(), Some("sk-typed"));
    }

    #[test]
    fn test_unset_environment_gives_no_credential() {
        let scorer = EssayScorer::new(Resolver::new(Vec::new()))
            .with_credential_env("ESSAY_SCORER_TEST_UNSET_VAR");
        let req = FeedbackRequest::new("x", AcademicLevel::Graduate).with_credential("  ");
        assert_eq!(scorer.credential_for(&req), None);
    }

    #[test]
    fn test_simulated_config_builds_simulated_scorer() {
        let mut config = ScorerConfig::default();
        config.resolver.mode = ScoringMode::Simulated;
        let scorer = EssayScorer::from_config(&config);
        assert_eq!(scorer.mode(), ScoringMode::Simulated);
        assert!(scorer.provider_names().is_empty());
    }
}
