//! Generate endpoint handler
//!
//! Handles `POST /generate`: validates the envelope for the configured relay
//! mode, delegates to the model client, and maps the provider outcome onto the
//! `{"generated_text"}` / `{"error"}` envelopes.

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::metrics::Outcome;
use crate::middleware::RequestId;
use crate::models::envelope::{GenerateResponse, NOT_JSON_MESSAGE, RequestEnvelope};
use crate::models::{ModelClient, ModelError, ProviderResponse};
use crate::shared::text::{LOG_SNIPPET_CHARS, snippet};
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;
use std::time::{Duration, Instant};

/// POST /generate handler
///
/// Order of checks, short-circuiting on the first failure:
/// 1. model client available (500 configuration error otherwise)
/// 2. body is JSON
/// 3. envelope valid for the relay mode
///
/// The provider call is bounded by `server.request_timeout_seconds`. Provider
/// failures of any kind are logged with full detail and reported to the caller
/// with a generic message. There are no retries.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<GenerateResponse>> {
    let mode = state.config().relay.mode;
    let result = relay(&state, request_id, body).await;

    // Log-and-continue on metrics recording errors (observability should never break requests)
    if let Err(e) = state.metrics().record_request(mode, Outcome::of(&result)) {
        tracing::error!(
            request_id = %request_id,
            error = %e,
            "Metrics recording failed (non-fatal)"
        );
    }

    result
}

async fn relay(
    state: &AppState,
    request_id: RequestId,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<GenerateResponse>> {
    let client = state.model_client().inspect_err(|e| {
        tracing::error!(
            request_id = %request_id,
            error = %e,
            "Cannot process request: model client is not configured"
        );
    })?;

    let Json(body) = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::warn!(
                request_id = %request_id,
                limit_bytes = state.config().server.max_body_bytes,
                "Request body over size limit"
            );
            return AppError::PayloadTooLarge;
        }
        tracing::warn!(
            request_id = %request_id,
            rejection = %rejection.body_text(),
            "Received non-JSON request"
        );
        AppError::BadRequest(NOT_JSON_MESSAGE.to_string())
    })?;

    let mode = state.config().relay.mode;
    let envelope = RequestEnvelope::from_json(mode, &body).inspect_err(|e| {
        tracing::warn!(
            request_id = %request_id,
            mode = mode.as_str(),
            error = %e,
            "Invalid request envelope"
        );
    })?;

    tracing::info!(
        request_id = %request_id,
        mode = mode.as_str(),
        turns = envelope.turn_count(),
        input_chars = envelope.char_count(),
        model = %client.model_name(),
        "Received generate request"
    );

    let timeout = state.config().request_timeout();
    let started = Instant::now();
    let call = call_model(&**client, &envelope, timeout).await;
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

    let result = match call {
        Ok(response) if response.has_content() => {
            let generated_text = response.generated_text();
            tracing::info!(
                request_id = %request_id,
                duration_ms = %duration_ms,
                response_length = generated_text.len(),
                "Received response from model: {}...",
                snippet(&generated_text, LOG_SNIPPET_CHARS)
            );
            Ok(Json(GenerateResponse { generated_text }))
        }
        Ok(response) => {
            tracing::warn!(
                request_id = %request_id,
                duration_ms = %duration_ms,
                block_reason = ?response.block_reason(),
                "Model response was empty or blocked"
            );
            Err(AppError::GenerationBlocked {
                reason: response.block_reason().map(str::to_string),
            })
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                duration_ms = %duration_ms,
                error = %e,
                "Error calling model or processing the request"
            );
            Err(AppError::GenerationFailed)
        }
    };

    if let Err(e) = state
        .metrics()
        .record_generation_duration(Outcome::of(&result), duration_ms)
    {
        tracing::error!(
            request_id = %request_id,
            error = %e,
            duration_ms = duration_ms,
            "Metrics recording failed (non-fatal)"
        );
    }

    result
}

/// Run one model call, dropping it once `timeout` elapses
async fn call_model(
    client: &dyn ModelClient,
    envelope: &RequestEnvelope,
    timeout: Duration,
) -> Result<ProviderResponse, ModelError> {
    tokio::time::timeout(timeout, client.generate(envelope))
        .await
        .unwrap_or_else(|_elapsed| Err(ModelError::Timeout(timeout)))
}

/// OPTIONS /generate handler
///
/// Answers preflight with an empty 204. When CORS is configured the CORS
/// layer responds first and adds the `Access-Control-*` headers.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}
