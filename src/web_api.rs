//! Web API Server
//!
//! HTTP front end for the scorer; the form collaborator posts here.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/score` — Score an essay (JSON in, [`FeedbackResult`] out)
//! - `GET  /api/v1/levels` — Academic level labels for the selector
//! - `GET  /health` — Health check with the registered providers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::feedback::{AcademicLevel, FeedbackRequest, FeedbackResult};
use crate::scorer::EssayScorer;
use crate::ScorerError;

// ============================================================================
// Types & Configuration
// ============================================================================

/// Configuration for the web API HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IP address or hostname to bind to (e.g. `"0.0.0.0"` for all interfaces).
    pub host: String,
    /// TCP port the server listens on.
    pub port: u16,
    /// Maximum allowed request body size in bytes.
    pub max_request_size: usize,
    /// Default for requests that do not say whether to try the local model.
    pub prefer_local: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_request_size: 1024 * 1024, // 1MB
            prefer_local: true,
        }
    }
}

/// JSON body for `POST /api/v1/score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// Essay text.
    pub essay: String,
    /// Level label or identifier ("High School", "high_school", ...).
    pub level: String,
    /// Optional cloud credential; blank falls back to the environment.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Override the server's local-first default.
    #[serde(default)]
    pub prefer_local: Option<bool>,
}

struct AppState {
    scorer: Arc<EssayScorer>,
    prefer_local: bool,
}

/// Build the router around `scorer`.
///
/// Exposed separately from [`start_server`] so callers can embed the routes
/// or bind their own listener.
pub fn router(scorer: Arc<EssayScorer>, config: &ServerConfig) -> Router {
    let state = Arc::new(AppState {
        scorer,
        prefer_local: config.prefer_local,
    });

    Router::new()
        .route("/api/v1/score", post(score_handler))
        .route("/api/v1/levels", get(levels_handler))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn_with_state(
            config.max_request_size,
            body_size_middleware,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web API server.
///
/// Binds to `config.host:config.port` and serves until the process exits.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn start_server(
    config: ServerConfig,
    scorer: Arc<EssayScorer>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = format!("{}:{}", config.host, config.port);
    info!(providers = ?scorer.provider_names(), "Starting web API server on http://{}", addr);

    let app = router(scorer, &config);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Web API ready on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Middleware
// ============================================================================

/// Adds an `X-Request-ID` header to every response, preserving the client's
/// if one was sent.
async fn request_id_middleware(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// Rejects requests whose `Content-Length` exceeds `max_size` with 413.
async fn body_size_middleware(
    State(max_size): State<usize>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(content_length) = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
    {
        if content_length > max_size {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(serde_json::json!({"error": "Request body too large"})),
            )
                .into_response();
        }
    }

    next.run(req).await
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /api/v1/score`
async fn score_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<FeedbackResult>, AppError> {
    let level: AcademicLevel = req.level.parse()?;
    let mut request = FeedbackRequest::new(req.essay, level);
    if let Some(key) = req.api_key {
        request = request.with_credential(key);
    }
    let prefer_local = req.prefer_local.unwrap_or(state.prefer_local);

    let result = state.scorer.submit(&request, prefer_local).await?;
    Ok(Json(result))
}

/// `GET /api/v1/levels`
async fn levels_handler() -> Json<Vec<&'static str>> {
    Json(AcademicLevel::ALL.iter().map(|l| l.label()).collect())
}

/// `GET /health`
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "mode": state.scorer.mode(),
        "providers": state.scorer.provider_names(),
    }))
}

// ============================================================================
// Errors
// ============================================================================

struct AppError(ScorerError);

impl From<ScorerError> for AppError {
    fn from(err: ScorerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ScorerError::InputInvalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self.0, "score request failed");
        }

        (status, Json(serde_json::json!({"error": self.0.to_string()}))).into_response()
    }
}
