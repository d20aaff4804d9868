//! Local Ollama chat provider.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::stream::{for_each_line, Flow};
use super::{FeedbackProvider, FragmentSink, ProviderError, ProviderKind};
use crate::config::LocalBackendConfig;
use crate::feedback::{FeedbackResult, FeedbackSource};
use crate::metrics;
use crate::prompt::{messages_for, ChatMessage};

const NAME: &str = "Ollama (local)";

/// Ollama `/api/chat` request payload
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

/// One `/api/chat` response object; a streamed body is a sequence of these,
/// one per line.
#[derive(Debug, Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

/// Ollama chat server provider
///
/// Server URL defaults to http://localhost:11434; `OLLAMA_HOST` is applied
/// by the config loader.
///
/// ## Example
///
/// ```no_run
/// use essay_scorer::OllamaProvider;
/// use std::sync::Arc;
///
/// let provider = Arc::new(
///     OllamaProvider::new("llama3.1:8b")
///         .with_url("http://localhost:11434")
///         .with_stream(true)
/// );
/// ```
pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    stream: bool,
    timeout: Duration,
}

impl OllamaProvider {
    /// Create a provider for `model` on the default local address.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: "http://localhost:11434".to_string(),
            model: model.into(),
            stream: true,
            timeout: Duration::from_secs(120),
        }
    }

    /// Build from the `[local]` config section.
    pub fn from_config(config: &LocalBackendConfig) -> Self {
        Self::new(config.model.clone())
            .with_url(config.url.clone())
            .with_stream(config.stream)
            .with_timeout(Duration::from_millis(config.timeout_ms))
    }

    /// Set server URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Stream fragments (`true`) or request one complete message
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn chunk_text(chunk: OllamaChunk) -> Result<(String, bool), ProviderError> {
        if let Some(error) = chunk.error {
            return Err(ProviderError::rejected(NAME, error));
        }
        let text = chunk.message.map(|m| m.content).unwrap_or_default();
        Ok((text, chunk.done))
    }

    async fn read_streamed(
        &self,
        response: reqwest::Response,
        on_fragment: FragmentSink<'_>,
    ) -> Result<String, ProviderError> {
        let mut text = String::new();
        let mut finished = false;
        for_each_line(NAME, response, |line| {
            let chunk: OllamaChunk = serde_json::from_str(line).map_err(|e| {
                ProviderError::rejected(NAME, format!("Failed to parse stream chunk: {e}"))
            })?;
            let (fragment, done) = Self::chunk_text(chunk)?;
            if !fragment.is_empty() {
                on_fragment(&fragment);
                text.push_str(&fragment);
            }
            finished = done;
            Ok(if done { Flow::Stop } else { Flow::Continue })
        })
        .await?;
        if !finished {
            return Err(ProviderError::rejected(NAME, "stream ended before done"));
        }
        Ok(text)
    }

    async fn read_single(
        &self,
        response: reqwest::Response,
        on_fragment: FragmentSink<'_>,
    ) -> Result<String, ProviderError> {
        let chunk: OllamaChunk = response.json().await.map_err(|e| {
            ProviderError::rejected(NAME, format!("Failed to parse response: {e}"))
        })?;
        let (text, _) = Self::chunk_text(chunk)?;
        if !text.is_empty() {
            on_fragment(&text);
        }
        Ok(text)
    }
}

#[async_trait]
impl FeedbackProvider for OllamaProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    async fn attempt_with(
        &self,
        prompt: &str,
        _credential: Option<&str>,
        on_fragment: FragmentSink<'_>,
    ) -> Result<FeedbackResult, ProviderError> {
        let started = Instant::now();
        let request = OllamaRequest {
            model: &self.model,
            messages: messages_for(prompt),
            stream: self.stream,
        };

        tracing::debug!(model = %self.model, url = %self.url, stream = self.stream, "calling local model");

        let response = self
            .client
            .post(format!("{}/api/chat", self.url))
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
                format!("Ollama error {}: {}", status, error_text),
            ));
        }

        let text = if self.stream {
            self.read_streamed(response, on_fragment).await?
        } else {
            self.read_single(response, on_fragment).await?
        };

        metrics::record_latency(NAME, started.elapsed());

        FeedbackResult::produced(text, FeedbackSource::LocalModel)
            .ok_or_else(|| ProviderError::rejected(NAME, "empty response from model"))
    }
}
