//! Cloud OpenAI chat completions provider.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::stream::{for_each_line, Flow};
use super::{FeedbackProvider, FragmentSink, ProviderError, ProviderKind};
use crate::config::CloudBackendConfig;
use crate::feedback::{FeedbackResult, FeedbackSource};
use crate::metrics;
use crate::prompt::{messages_for, ChatMessage};

const NAME: &str = "OpenAI (cloud)";

/// OpenAI chat completions request payload
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

/// Non-streamed response
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

/// One server-sent `data:` event of a streamed response
#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: OpenAiDelta,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI API provider (gpt-4o-mini by default)
///
/// The credential is passed per attempt rather than read at construction,
/// so one provider serves every submission whatever key the user typed.
///
/// ## Example
///
/// ```no_run
/// use essay_scorer::{FeedbackProvider, OpenAiProvider};
///
/// # async fn example() -> Result<(), essay_scorer::ProviderError> {
/// let provider = OpenAiProvider::new("gpt-4o-mini").with_stream(false);
/// let result = provider.attempt("Score this essay ...", Some("sk-...")).await?;
/// println!("{}", result.text());
/// # Ok(()) }
/// ```
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    stream: bool,
    timeout: Duration,
}

impl OpenAiProvider {
    /// Create a provider for `model` against the public OpenAI API.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            stream: true,
            timeout: Duration::from_secs(60),
        }
    }

    /// Build from the `[cloud]` config section.
    pub fn from_config(config: &CloudBackendConfig) -> Self {
        Self::new(config.model.clone())
            .with_base_url(config.base_url.clone())
            .with_stream(config.stream)
            .with_timeout(Duration::from_millis(config.timeout_ms))
    }

    /// Point at an OpenAI-compatible server (proxy, mock, ...)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Stream deltas over server-sent events (`true`) or fetch one message
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Payload of a `data:` line; `None` for comments and other SSE fields.
    fn sse_data(line: &str) -> Option<&str> {
        line.strip_prefix("data:").map(str::trim)
    }

    async fn read_streamed(
        &self,
        response: reqwest::Response,
        on_fragment: FragmentSink<'_>,
    ) -> Result<String, ProviderError> {
        let mut text = String::new();
        for_each_line(NAME, response, |line| {
            let Some(data) = Self::sse_data(line) else {
                return Ok(Flow::Continue);
            };
            if data == "[DONE]" {
                return Ok(Flow::Stop);
            }
            let chunk: OpenAiStreamChunk = serde_json::from_str(data).map_err(|e| {
                ProviderError::rejected(NAME, format!("Failed to parse stream chunk: {e}"))
            })?;
            if let Some(fragment) = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta.content)
                .filter(|c| !c.is_empty())
            {
                on_fragment(&fragment);
                text.push_str(&fragment);
            }
            Ok(Flow::Continue)
        })
        .await?;
        Ok(text)
    }

    async fn read_single(
        &self,
        response: reqwest::Response,
        on_fragment: FragmentSink<'_>,
    ) -> Result<String, ProviderError> {
        let api_response: OpenAiResponse = response.json().await.map_err(|e| {
            ProviderError::rejected(NAME, format!("Failed to parse response: {e}"))
        })?;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::rejected(NAME, "No choices in OpenAI response"))?
            .message
            .content
            .unwrap_or_default();
        if !text.is_empty() {
            on_fragment(&text);
        }
        Ok(text)
    }
}

#[async_trait]
impl FeedbackProvider for OpenAiProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Cloud
    }

    async fn attempt_with(
        &self,
        prompt: &str,
        credential: Option<&str>,
        on_fragment: FragmentSink<'_>,
    ) -> Result<FeedbackResult, ProviderError> {
        let Some(api_key) = credential.map(str::trim).filter(|c| !c.is_empty()) else {
            return Err(ProviderError::MissingCredential {
                backend: NAME.to_string(),
            });
        };

        let started = Instant::now();
        let request = OpenAiRequest {
            model: &self.model,
            messages: messages_for(prompt),
            stream: self.stream,
        };

        tracing::debug!(model = %self.model, base_url = %self.base_url, stream = self.stream, "calling cloud model");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(NAME, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::rejected(
                NAME,
                format!("OpenAI API error {}: {}", status, error_text),
            ));
        }

        let text = if self.stream {
            self.read_streamed(response, on_fragment).await?
        } else {
            self.read_single(response, on_fragment).await?
        };

        metrics::record_latency(NAME, started.elapsed());

        FeedbackResult::produced(text, FeedbackSource::CloudModel)
            .ok_or_else(|| ProviderError::rejected(NAME, "empty response from model"))
    }
}
