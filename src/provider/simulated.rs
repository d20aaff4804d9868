//! Simulated feedback: placeholder scores drawn at random.
//!
//! No model is contacted and nothing about the essay is analysed. Each
//! number is an independent uniform draw from a fixed inclusive range, and
//! the feedback is a fixed template. Never fails.

use std::ops::RangeInclusive;

use rand::Rng;

use crate::feedback::{AcademicLevel, FeedbackResult, Notice, SubScores};

/// Range of the overall score.
pub const OVERALL_RANGE: RangeInclusive<u8> = 65..=95;
/// Range of the grammar rating.
pub const GRAMMAR_RANGE: RangeInclusive<u8> = 70..=95;
/// Range of the coherence rating.
pub const COHERENCE_RANGE: RangeInclusive<u8> = 60..=95;
/// Range of the organization rating.
pub const ORGANIZATION_RANGE: RangeInclusive<u8> = 65..=90;
/// Range of the content relevance rating.
pub const CONTENT_RELEVANCE_RANGE: RangeInclusive<u8> = 60..=95;

/// Offline generator of plausible-looking bounded scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedProvider;

impl SimulatedProvider {
    /// Create the generator.
    pub fn new() -> Self {
        Self
    }

    /// Generate a fresh result using the thread-local RNG.
    pub fn generate(&self, level: AcademicLevel) -> FeedbackResult {
        self.generate_with(level, &mut rand::thread_rng())
    }

    /// Generate a result from an explicit RNG (seedable in tests).
    pub fn generate_with<R: Rng>(&self, level: AcademicLevel, rng: &mut R) -> FeedbackResult {
        let overall = rng.gen_range(OVERALL_RANGE);
        let scores = SubScores {
            grammar: rng.gen_range(GRAMMAR_RANGE),
            coherence: rng.gen_range(COHERENCE_RANGE),
            organization: rng.gen_range(ORGANIZATION_RANGE),
            content_relevance: rng.gen_range(CONTENT_RELEVANCE_RANGE),
        };

        tracing::debug!(%level, overall, ?scores, "simulated scores drawn");

        let text = render_template(level, overall, &scores);
        let mut result = FeedbackResult::simulated(text, overall, scores);
        result.push_notice(Notice::success(
            "Simulated scores generated; no language model was used.",
        ));
        result
    }
}

fn render_template(level: AcademicLevel, overall: u8, s: &SubScores) -> String {
    format!(
        "Overall Score: {overall}/100\n\
         \n\
         This essay was reviewed against expectations for the {level} level. \
         The writing communicates its main idea and generally stays on topic. \
         Sentence structure is mostly sound, though a careful proofread would catch remaining slips. \
         Transitions between paragraphs could be strengthened so each point builds on the last. \
         Supporting the central argument with more specific evidence would raise the overall quality.\n\
         \n\
         Grammar: {grammar}/100\n\
         Coherence: {coherence}/100\n\
         Organization: {organization}/100\n\
         Content Relevance: {content_relevance}/100\n",
        grammar = s.grammar,
        coherence = s.coherence,
        organization = s.organization,
        content_relevance = s.content_relevance,
    )
}
