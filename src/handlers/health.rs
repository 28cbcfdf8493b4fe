//! Health check endpoint
//!
//! Liveness only: the response does not depend on whether the model client
//! was configured, so load balancers keep routing to an instance that still
//! answers `/generate` with a configuration error.

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
}

/// Health check handler
///
/// Returns 200 OK with `{"status": "ok"}`.
pub async fn handler() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}
