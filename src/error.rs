//! Error types for chat-relay
//!
//! All errors implement `IntoResponse` for Axum handlers. Every response body
//! is the `{"error": "..."}` envelope expected by the survey front-ends.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Message returned to callers when the provider call fails for any reason.
///
/// The underlying error is logged server-side only.
pub const GENERATION_FAILED_MESSAGE: &str = "An error occurred while processing your request.";

/// Prefix of the message returned when the provider produced no content.
pub const GENERATION_BLOCKED_MESSAGE: &str =
    "Failed to generate text. The prompt might have been blocked.";

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    /// Malformed or missing field in the request envelope (400)
    #[error("{0}")]
    BadRequest(String),

    /// Body exceeded `server.max_body_bytes` (413)
    #[error("Request body too large")]
    PayloadTooLarge,

    /// The model client could not be built at startup (500)
    #[error("Server configuration error: {0}")]
    ServerConfig(String),

    /// The provider answered without any content parts (500)
    #[error("{}", blocked_message(.reason.as_deref()))]
    GenerationBlocked { reason: Option<String> },

    /// Any other failure of the provider call (500)
    #[error("An error occurred while processing your request.")]
    GenerationFailed,

    #[error("Internal error: {0}")]
    Internal(String),
}

fn blocked_message(reason: Option<&str>) -> String {
    match reason {
        Some(label) => format!("{GENERATION_BLOCKED_MESSAGE} Reason: {label}"),
        None => GENERATION_BLOCKED_MESSAGE.to_string(),
    }
}

impl AppError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Startup errors never reach a handler, but if one does the
            // file path and parser detail stay in the logs.
            Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Config(_)
            | Self::Internal(_) => GENERATION_FAILED_MESSAGE.to_string(),
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
