//! Request and result types for a single essay submission.
//!
//! ## Responsibility
//! Define the transient, request-scoped entities that flow between the UI
//! collaborator, the scorer facade, and the providers.
//!
//! ## Guarantees
//! - [`FeedbackResult::text`] is empty only when the source is
//!   [`FeedbackSource::Unavailable`]; the public constructors enforce this.
//! - [`FeedbackRequest::validate`] rejects whitespace-only essays before any
//!   backend is contacted.
//!
//! ## NOT Responsible For
//! - Choosing a backend (that belongs to `resolver`)
//! - Building the prompt (that belongs to `prompt`)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ScorerError;

/// Academic level the essay is written at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcademicLevel {
    /// Secondary school.
    HighSchool,
    /// Bachelor-level university work.
    Undergraduate,
    /// Master's or doctoral work.
    Graduate,
}

impl AcademicLevel {
    /// All levels in selector order.
    pub const ALL: [AcademicLevel; 3] = [
        AcademicLevel::HighSchool,
        AcademicLevel::Undergraduate,
        AcademicLevel::Graduate,
    ];

    /// Human-readable label, as shown in the level selector and the prompt.
    pub fn label(&self) -> &'static str {
        match self {
            AcademicLevel::HighSchool => "High School",
            AcademicLevel::Undergraduate => "Undergraduate",
            AcademicLevel::Graduate => "Graduate",
        }
    }
}

impl fmt::Display for AcademicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AcademicLevel {
    type Err = ScorerError;

    /// Accepts labels ("High School") and identifiers ("high_school",
    /// "high-school"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "highschool" => Ok(AcademicLevel::HighSchool),
            "undergraduate" => Ok(AcademicLevel::Undergraduate),
            "graduate" => Ok(AcademicLevel::Graduate),
            _ => Err(ScorerError::InputInvalid(format!(
                "unknown academic level '{}' (expected one of: High School, Undergraduate, Graduate)",
                s.trim()
            ))),
        }
    }
}

/// One essay submission, as collected from the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    /// Raw essay text.
    pub essay_text: String,
    /// Level the essay should be judged at.
    pub academic_level: AcademicLevel,
    /// Optional cloud credential typed by the user. Blank means "not given".
    #[serde(default, skip_serializing)]
    pub credential: Option<String>,
}

impl FeedbackRequest {
    /// Create a request without a credential.
    pub fn new(essay_text: impl Into<String>, academic_level: AcademicLevel) -> Self {
        Self {
            essay_text: essay_text.into(),
            academic_level,
            credential: None,
        }
    }

    /// Attach a user-supplied credential.
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Check the request before any backend is contacted.
    ///
    /// # Errors
    ///
    /// Returns [`ScorerError::InputInvalid`] when the essay text is empty or
    /// whitespace-only.
    pub fn validate(&self) -> Result<(), ScorerError> {
        if self.essay_text.trim().is_empty() {
            return Err(ScorerError::InputInvalid(
                "Please enter your essay before submitting.".to_string(),
            ));
        }
        Ok(())
    }

    /// The credential if one was typed and is not blank.
    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Which backend produced a [`FeedbackResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSource {
    /// On-device model server.
    LocalModel,
    /// Hosted model API.
    CloudModel,
    /// Random placeholder scores; no model was contacted.
    Simulated,
    /// No backend produced feedback.
    Unavailable,
}

impl fmt::Display for FeedbackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeedbackSource::LocalModel => "local model",
            FeedbackSource::CloudModel => "cloud model",
            FeedbackSource::Simulated => "simulated",
            FeedbackSource::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// The four 0-100 ratings shown in the strength chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    /// Grammar rating.
    pub grammar: u8,
    /// Coherence rating.
    pub coherence: u8,
    /// Organization rating.
    pub organization: u8,
    /// Content relevance rating.
    pub content_relevance: u8,
}

impl SubScores {
    /// Chart rows in display order: `(label, value)`.
    pub fn entries(&self) -> [(&'static str, u8); 4] {
        [
            ("Grammar", self.grammar),
            ("Coherence", self.coherence),
            ("Organization", self.organization),
            ("Content Relevance", self.content_relevance),
        ]
    }
}

/// Severity of a transient status notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Progress information.
    Info,
    /// A backend produced feedback.
    Success,
    /// Non-fatal problem, e.g. falling back to another backend.
    Warning,
    /// The request failed or a backend errored.
    Error,
}

/// A transient status message for the UI to show alongside the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// User-facing text.
    pub message: String,
}

impl Notice {
    /// Info notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// Warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// Error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Outcome of one submission.
///
/// Fields are read-only outside the crate so the empty-text invariant
/// cannot be broken after construction. Deserialization checks it too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFeedbackResult")]
pub struct FeedbackResult {
    text: String,
    source: FeedbackSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    overall: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scores: Option<SubScores>,
    #[serde(default)]
    notices: Vec<Notice>,
}

#[derive(Deserialize)]
struct RawFeedbackResult {
    text: String,
    source: FeedbackSource,
    #[serde(default)]
    overall: Option<u8>,
    #[serde(default)]
    scores: Option<SubScores>,
    #[serde(default)]
    notices: Vec<Notice>,
}

impl TryFrom<RawFeedbackResult> for FeedbackResult {
    type Error = String;

    fn try_from(raw: RawFeedbackResult) -> Result<Self, Self::Error> {
        let blank = raw.text.trim().is_empty();
        match (raw.source, blank) {
            (FeedbackSource::Unavailable, false) => {
                return Err("unavailable result must not carry text".to_string())
            }
            (source, true) if source != FeedbackSource::Unavailable => {
                return Err(format!("{source} result must carry text"))
            }
            _ => {}
        }
        Ok(Self {
            text: raw.text,
            source: raw.source,
            overall: raw.overall,
            scores: raw.scores,
            notices: raw.notices,
        })
    }
}

impl FeedbackResult {
    /// Feedback produced by a model or the simulator.
    ///
    /// Returns `None` when `text` is blank or `source` is
    /// [`FeedbackSource::Unavailable`]: only [`FeedbackResult::unavailable`]
    /// may produce an empty result.
    pub fn produced(text: impl Into<String>, source: FeedbackSource) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() || source == FeedbackSource::Unavailable {
            return None;
        }
        Some(Self {
            text,
            source,
            overall: None,
            scores: None,
            notices: Vec::new(),
        })
    }

    /// Empty result carrying the notice that explains why.
    pub fn unavailable(notice: Notice) -> Self {
        Self {
            text: String::new(),
            source: FeedbackSource::Unavailable,
            overall: None,
            scores: None,
            notices: vec![notice],
        }
    }

    /// Simulated result. The template always renders text, so the
    /// empty-text invariant holds.
    pub(crate) fn simulated(text: String, overall: u8, scores: SubScores) -> Self {
        Self {
            text,
            source: FeedbackSource::Simulated,
            overall: Some(overall),
            scores: Some(scores),
            notices: Vec::new(),
        }
    }

    /// Attach the overall score.
    pub fn with_overall(mut self, overall: u8) -> Self {
        self.overall = Some(overall);
        self
    }

    /// Attach the four sub-scores.
    pub fn with_scores(mut self, scores: SubScores) -> Self {
        self.scores = Some(scores);
        self
    }

    /// Append a notice.
    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Prepend notices collected before this result existed
    /// (e.g. fallback warnings), keeping their order.
    pub fn prepend_notices(&mut self, mut earlier: Vec<Notice>) {
        earlier.append(&mut self.notices);
        self.notices = earlier;
    }

    /// Feedback text; empty only when unavailable.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Which backend produced the result.
    pub fn source(&self) -> FeedbackSource {
        self.source
    }

    /// Overall score out of 100, if known.
    pub fn overall(&self) -> Option<u8> {
        self.overall
    }

    /// Sub-scores, if known.
    pub fn scores(&self) -> Option<&SubScores> {
        self.scores.as_ref()
    }

    /// Status notices in the order they were raised.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Whether any backend produced feedback.
    pub fn is_available(&self) -> bool {
        self.source != FeedbackSource::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_deserialize_rejects_blank_produced_text() {
        let json = r#"{"text":"","source":"local_model"}"#;
        assert!(serde_json::from_str::<FeedbackResult>(json).is_err());
        let json = r#"{"text":"stray","source":"unavailable"}"#;
        assert!(serde_json::from_str::<FeedbackResult>(json).is_err());
    }

    #[test]
    fn test_result_json_round_trips_when_valid() {
        let mut result = FeedbackResult::produced("Good.", FeedbackSource::CloudModel)
            .expect("test: non-empty")
            .with_overall(80);
        result.push_notice(Notice::info("note"));
        let json = serde_json::to_string(&result).expect("test: serialize");
        let back: FeedbackResult = serde_json::from_str(&json).expect("test: deserialize");
        assert_eq!(back, result);
    }

    #[test]
    fn test_level_parses_labels_and_identifiers() {
        for input in ["High School", "high_school", "HIGH-SCHOOL", " highschool "] {
            assert_eq!(
                input.parse::<AcademicLevel>().ok(),
                Some(AcademicLevel::HighSchool),
                "input {input:?}"
            );
        }
        assert_eq!(
            "Undergraduate".parse::<AcademicLevel>().ok(),
            Some(AcademicLevel::Undergraduate)
        );
        assert_eq!(
            "graduate".parse::<AcademicLevel>().ok(),
            Some(AcademicLevel::Graduate)
        );
    }

    #[test]
    fn test_level_rejects_unknown_value() {
        let err = "kindergarten".parse::<AcademicLevel>().unwrap_err();
        assert!(matches!(err, ScorerError::InputInvalid(_)));
        assert!(err.to_string().contains("kindergarten"));
    }

    #[test]
    fn test_level_display_uses_label() {
        assert_eq!(AcademicLevel::HighSchool.to_string(), "High School");
    }

    #[test]
    fn test_level_serializes_to_snake_case() {
        let json = serde_json::to_string(&AcademicLevel::HighSchool).expect("test: serialize");
        assert_eq!(json, "\"high_school\"");
    }

    #[test]
    fn test_validate_rejects_whitespace_only_essay() {
        for text in ["", "   ", "\n\t  \n"] {
            let req = FeedbackRequest::new(text, AcademicLevel::Graduate);
            assert!(matches!(req.validate(), Err(ScorerError::InputInvalid(_))));
        }
    }

    #[test]
    fn test_validate_accepts_text() {
        let req = FeedbackRequest::new("  An essay.  ", AcademicLevel::Graduate);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_blank_credential_reads_as_none() {
        let req = FeedbackRequest::new("x", AcademicLevel::Graduate).with_credential("   ");
        assert_eq!(req.credential(), None);

        let req = FeedbackRequest::new("x", AcademicLevel::Graduate).with_credential(" sk-1 ");
        assert_eq!(req.credential(), Some("sk-1"));
    }

    #[test]
    fn test_produced_refuses_empty_text() {
        assert!(FeedbackResult::produced("", FeedbackSource::LocalModel).is_none());
        assert!(FeedbackResult::produced("  \n", FeedbackSource::CloudModel).is_none());
    }

    #[test]
    fn test_produced_refuses_unavailable_source() {
        assert!(FeedbackResult::produced("text", FeedbackSource::Unavailable).is_none());
    }

    #[test]
    fn test_unavailable_has_empty_text_and_notice() {
        let r = FeedbackResult::unavailable(Notice::error("nothing worked"));
        assert_eq!(r.text(), "");
        assert_eq!(r.source(), FeedbackSource::Unavailable);
        assert!(!r.is_available());
        assert_eq!(r.notices().len(), 1);
    }

    #[test]
    fn test_prepend_notices_keeps_order() {
        let mut r = FeedbackResult::produced("ok", FeedbackSource::CloudModel)
            .expect("test: non-empty");
        r.push_notice(Notice::success("done"));
        r.prepend_notices(vec![Notice::warning("fell back")]);
        let levels: Vec<_> = r.notices().iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![NoticeLevel::Warning, NoticeLevel::Success]);
    }

    #[test]
    fn test_sub_score_entries_in_chart_order() {
        let s = SubScores {
            grammar: 1,
            coherence: 2,
            organization: 3,
            content_relevance: 4,
        };
        let labels: Vec<_> = s.entries().iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            vec!["Grammar", "Coherence", "Organization", "Content Relevance"]
        );
    }
}
