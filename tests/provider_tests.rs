//! Integration tests for `src/provider/`
//!
//! Drives the HTTP-backed providers against wiremock servers:
//! - Streamed and single-shot bodies for both backends
//! - Error classification (unreachable vs rejected vs missing credential)
//! - Request shape (path, model, bearer token)

#![cfg(all(feature = "local-backend", feature = "cloud-backend"))]

use std::sync::Mutex;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use essay_scorer::{
    FeedbackProvider, FeedbackSource, OllamaProvider, OpenAiProvider, ProviderError, ScorerError,
};

// ============================================================================
// Helpers
// ============================================================================

fn ndjson(lines: &[serde_json::Value]) -> String {
    lines.iter().map(|l| format!("{l}\n")).collect()
}

fn sse(fragments: &[&str]) -> String {
    let mut body = String::new();
    for f in fragments {
        let event = json!({"choices": [{"delta": {"content": f}}]});
        body.push_str(&format!("data: {event}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn ollama(server: &MockServer) -> OllamaProvider {
    OllamaProvider::new("llama3.1:8b").with_url(server.uri())
}

fn openai(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::new("gpt-4o-mini").with_base_url(server.uri())
}

// ============================================================================
// Ollama
// ============================================================================

#[tokio::test]
async fn test_ollama_streamed_fragments_are_concatenated_in_order() {
    let server = MockServer::start().await;
    let body = ndjson(&[
        json!({"message": {"role": "assistant", "content": "Overall "}, "done": false}),
        json!({"message": {"role": "assistant", "content": "Score: 82"}, "done": false}),
        json!({"message": {"role": "assistant", "content": ""}, "done": true}),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": "llama3.1:8b", "stream": true})))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let seen = Mutex::new(Vec::new());
    let sink = |f: &str| seen.lock().unwrap().push(f.to_string());
    let result = ollama(&server)
        .attempt_with("prompt", None, &sink)
        .await
        .expect("streamed body must succeed");

    assert_eq!(result.text(), "Overall Score: 82");
    assert_eq!(result.source(), FeedbackSource::LocalModel);
    assert_eq!(*seen.lock().unwrap(), vec!["Overall ", "Score: 82"]);
}

#[tokio::test]
async fn test_ollama_single_shot_reads_one_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"message": {"role": "assistant", "content": "Solid work."}, "done": true}),
        ))
        .mount(&server)
        .await;

    let result = ollama(&server)
        .with_stream(false)
        .attempt("prompt", None)
        .await
        .expect("single body must succeed");
    assert_eq!(result.text(), "Solid work.");
}

#[tokio::test]
async fn test_ollama_http_404_is_rejected_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": "model 'llama3.1:8b' not found"})),
        )
        .mount(&server)
        .await;

    let err = ollama(&server).attempt("prompt", None).await.unwrap_err();
    match err {
        ProviderError::Rejected { message, .. } => {
            assert!(message.contains("404"), "got: {message}");
            assert!(message.contains("not found"), "got: {message}");
        }
        other => panic!("Expected Rejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_ollama_error_line_mid_stream_is_rejected() {
    let server = MockServer::start().await;
    let body = ndjson(&[
        json!({"message": {"content": "Partial"}, "done": false}),
        json!({"error": "out of memory"}),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&server)
        .await;

    let err = ollama(&server).attempt("prompt", None).await.unwrap_err();
    assert!(matches!(err, ProviderError::Rejected { ref message, .. } if message.contains("out of memory")));
}

#[tokio::test]
async fn test_ollama_stream_cut_before_done_is_rejected() {
    let server = MockServer::start().await;
    let body = ndjson(&[
        json!({"message": {"content": "Overall Score: 7"}, "done": false}),
        json!({"message": {"content": "0/100. The essay"}, "done": false}),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&server)
        .await;

    let err = ollama(&server).attempt("prompt", None).await.unwrap_err();
    match err {
        ProviderError::Rejected { message, .. } => {
            assert!(message.contains("stream ended before done"), "got: {message}");
        }
        other => panic!("Expected Rejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_ollama_empty_stream_is_rejected() {
    let server = MockServer::start().await;
    let body = ndjson(&[json!({"message": {"content": ""}, "done": true})]);
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&server)
        .await;

    let err = ollama(&server).attempt("prompt", None).await.unwrap_err();
    assert!(matches!(err, ProviderError::Rejected { .. }));
}

#[tokio::test]
async fn test_ollama_refused_connection_is_unreachable() {
    let provider = OllamaProvider::new("llama3.1:8b").with_url("http://127.0.0.1:1");
    let err = provider.attempt("prompt", None).await.unwrap_err();
    assert!(err.is_unreachable(), "got: {err:?}");
}

#[tokio::test]
async fn test_ollama_timeout_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": {"content": "late"}, "done": true}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let err = ollama(&server)
        .with_timeout(Duration::from_millis(200))
        .attempt("prompt", None)
        .await
        .unwrap_err();
    assert!(err.is_unreachable(), "got: {err:?}");
}

// ============================================================================
// OpenAI
// ============================================================================

#[tokio::test]
async fn test_openai_streamed_events_are_concatenated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini", "stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse(&["Clear ", "thesis."]), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = openai(&server)
        .attempt("prompt", Some("sk-test"))
        .await
        .expect("streamed body must succeed");
    assert_eq!(result.text(), "Clear thesis.");
    assert_eq!(result.source(), FeedbackSource::CloudModel);
}

#[tokio::test]
async fn test_openai_single_shot_reads_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Well argued."}}]
        })))
        .mount(&server)
        .await;

    let result = openai(&server)
        .with_stream(false)
        .attempt("prompt", Some("sk-test"))
        .await
        .expect("single body must succeed");
    assert_eq!(result.text(), "Well argued.");
}

#[tokio::test]
async fn test_openai_no_choices_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = openai(&server)
        .with_stream(false)
        .attempt("prompt", Some("sk-test"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Rejected { ref message, .. } if message.contains("No choices")));
}

#[tokio::test]
async fn test_openai_http_401_is_rejected_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}),
        ))
        .mount(&server)
        .await;

    let err = openai(&server).attempt("prompt", Some("sk-bad")).await.unwrap_err();
    match err {
        ProviderError::Rejected { message, .. } => {
            assert!(message.contains("401"), "got: {message}");
        }
        other => panic!("Expected Rejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_missing_credential_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for credential in [None, Some(""), Some("   ")] {
        let err = openai(&server).attempt("prompt", credential).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential { .. }));
    }
}

#[tokio::test]
async fn test_openai_timeout_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse(&["late"]), "text/event-stream")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let err = openai(&server)
        .with_timeout(Duration::from_millis(200))
        .attempt("prompt", Some("sk-test"))
        .await
        .unwrap_err();
    assert!(err.is_unreachable(), "got: {err:?}");
}

// ============================================================================
// Direct use without the resolver
// ============================================================================

async fn ask(provider: &dyn FeedbackProvider, credential: Option<&str>) -> Result<String, ScorerError> {
    let result = provider.attempt("prompt", credential).await?;
    Ok(result.text().to_string())
}

#[tokio::test]
async fn test_direct_provider_failures_map_onto_scorer_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = ask(&openai(&server), Some("sk-test")).await.unwrap_err();
    assert!(matches!(err, ScorerError::BackendRejected(ref m) if m.contains("429")));

    let err = ask(&openai(&server), None).await.unwrap_err();
    assert!(matches!(err, ScorerError::NoBackendConfigured(_)));

    let local = OllamaProvider::new("llama3.1:8b").with_url("http://127.0.0.1:1");
    let err = ask(&local, None).await.unwrap_err();
    assert!(matches!(err, ScorerError::BackendUnreachable(_)));
}
