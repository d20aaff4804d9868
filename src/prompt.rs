//! Scoring prompt construction.

use serde::{Deserialize, Serialize};

use crate::feedback::FeedbackRequest;

/// One chat message sent to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `"system"`, `"user"` or `"assistant"`.
    pub role: String,
    /// Message body.
    pub content: String,
}

impl ChatMessage {
    /// A user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Build the scoring prompt for a request.
///
/// The essay is embedded as typed; leading and trailing whitespace is
/// trimmed.
///
/// # Example
///
/// ```rust
/// use essay_scorer::{prompt::build_prompt, AcademicLevel, FeedbackRequest};
///
/// let req = FeedbackRequest::new("Cats are great.", AcademicLevel::HighSchool);
/// let prompt = build_prompt(&req);
/// assert!(prompt.contains("Essay Level: High School"));
/// ```
pub fn build_prompt(request: &FeedbackRequest) -> String {
    format!(
        "You are an automated essay scoring assistant.\n\
         Essay Level: {level}\n\
         Essay Text: {essay}\n\
         \n\
         Please:\n\
         1. Provide an overall score (out of 100).\n\
         2. Give 4-5 sentences of detailed feedback.\n\
         3. Rate these aspects (0-100): Grammar, Coherence, Organization, Content Relevance.\n",
        level = request.academic_level,
        essay = request.essay_text.trim(),
    )
}

/// Wrap a prompt as the single-message conversation both backends expect.
pub fn messages_for(prompt: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(prompt)]
}
