//! HTTP surface for Daily Light.
//!
//! - `POST /generateDevotional` – Turn `{ "journalEntry": "..." }` into a plain-text devotional.
//! - `GET /health` – Liveness probe; never consults the generation client.
//! - `GET /metrics` – Request outcome counters.
//!
//! Every failure on the generation route is rendered as `{ "error": "..." }` with a status code
//! by [`ApiError`]. Downstream causes are logged and never returned to the caller.

use crate::devotional::{DevotionalError, DevotionalService};
use crate::metrics::MetricsSnapshot;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

/// Content type of a successful devotional response.
pub const PLAIN_TEXT_UTF8: &str = "text/plain; charset=utf-8";

const PREVIEW_CHARS: usize = 50;

/// Build the HTTP router around a shared devotional service.
pub fn create_router(service: Arc<DevotionalService>) -> Router {
    Router::new()
        .route("/generateDevotional", post(generate_devotional))
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .with_state(service)
}

/// Request body for `POST /generateDevotional`.
#[derive(Deserialize)]
struct GenerateRequest {
    #[serde(rename = "journalEntry", default)]
    journal_entry: Option<String>,
}

/// Generate a devotional for the posted journal entry.
///
/// Checks run in a fixed order: client availability, JSON content type, JSON body, then the
/// `journalEntry` field. The first failing check decides the response.
async fn generate_devotional(
    State(service): State<Arc<DevotionalService>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    tracing::info!("Received request for /generateDevotional");
    let metrics = service.metrics();
    metrics.record_request();

    let outcome = produce_devotional(&service, &headers, &body).await;
    match &outcome {
        Ok(_) => metrics.record_success(),
        Err(ApiError::GenerationFailed) => metrics.record_failure(),
        Err(error) => {
            tracing::error!(status = %error.status(), "{error}");
            metrics.record_rejection();
        }
    }

    let devotional = outcome?;
    Ok(([(header::CONTENT_TYPE, PLAIN_TEXT_UTF8)], devotional).into_response())
}

async fn produce_devotional(
    service: &DevotionalService,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<String, ApiError> {
    if !service.is_available() {
        return Err(ApiError::ClientUnavailable);
    }
    if !is_json_request(headers) {
        return Err(ApiError::UnsupportedMediaType);
    }
    let journal_entry = parse_journal_entry(body)?;

    tracing::info!(
        chars = journal_entry.chars().count(),
        "Received journal entry"
    );
    tracing::debug!(
        preview = %journal_entry.chars().take(PREVIEW_CHARS).collect::<String>(),
        "Journal entry preview"
    );

    service
        .generate(&journal_entry)
        .await
        .map_err(|error| match error {
            DevotionalError::ClientUnavailable => ApiError::ClientUnavailable,
            DevotionalError::Generation(cause) => {
                tracing::error!(error = %cause, "Error calling OpenAI API");
                ApiError::GenerationFailed
            }
        })
}

/// Accept `application/json` and `application/*+json`, with or without parameters.
fn is_json_request(headers: &HeaderMap) -> bool {
    let Some(value) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

fn parse_journal_entry(body: &[u8]) -> Result<String, ApiError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| ApiError::InvalidJson)?;
    serde_json::from_value::<GenerateRequest>(value)
        .ok()
        .and_then(|request| request.journal_entry)
        .filter(|entry| !entry.is_empty())
        .ok_or(ApiError::MissingJournalEntry)
}

/// Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Return a snapshot of request outcome counters.
async fn get_metrics(State(service): State<Arc<DevotionalService>>) -> Json<MetricsSnapshot> {
    Json(service.metrics_snapshot())
}

/// Caller-visible failures of the generation route.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// No generation client was configured at startup.
    #[error("Server configuration error: OpenAI client not available")]
    ClientUnavailable,
    /// Request was not declared as JSON.
    #[error("Request must be JSON")]
    UnsupportedMediaType,
    /// Request was declared as JSON but did not parse.
    #[error("Request body must be valid JSON")]
    InvalidJson,
    /// Parsed body lacked a usable `journalEntry`.
    #[error("Missing 'journalEntry' in request body")]
    MissingJournalEntry,
    /// The downstream call failed for any reason.
    #[error("Failed to generate devotional due to an internal error")]
    GenerationFailed,
}

impl ApiError {
    /// HTTP status associated with the error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::ClientUnavailable | Self::GenerationFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InvalidJson | Self::MissingJournalEntry => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
