//! Model client abstraction
//!
//! The handler only talks to `dyn ModelClient`. Production wires in
//! [`GeminiClient`](crate::models::gemini::GeminiClient); tests substitute stubs.

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::envelope::RequestEnvelope;
use crate::models::gemini::GeminiClient;
use crate::models::prompt::SystemPrompt;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// What the provider returned for one generation call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderResponse {
    parts: Vec<String>,
    block_reason: Option<String>,
}

impl ProviderResponse {
    /// Create a response from content parts and an optional block reason
    pub fn new(parts: Vec<String>, block_reason: Option<String>) -> Self {
        Self {
            parts,
            block_reason,
        }
    }

    /// Response with a single text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![text.into()], None)
    }

    /// Response without content, optionally labelled with the provider's block reason
    pub fn blocked(reason: Option<String>) -> Self {
        Self::new(Vec::new(), reason)
    }

    /// Content parts in provider order
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Block reason label reported by the provider, if any
    pub fn block_reason(&self) -> Option<&str> {
        self.block_reason.as_deref()
    }

    /// Whether the provider produced at least one content part
    pub fn has_content(&self) -> bool {
        !self.parts.is_empty()
    }

    /// Concatenated text of all parts
    pub fn generated_text(&self) -> String {
        self.parts.concat()
    }
}

/// Failure of a model client call
///
/// Never shown to HTTP callers; the handler logs it and answers with a
/// generic message.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error("Invalid provider endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Provider call timed out after {}s", .0.as_secs())]
    Timeout(std::time::Duration),
}

/// Generation backend
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a reply for a validated envelope
    async fn generate(&self, envelope: &RequestEnvelope) -> Result<ProviderResponse, ModelError>;

    /// Model identifier, for logs
    fn model_name(&self) -> &str;
}

/// Why no model client is available
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientUnavailable {
    #[error("API key missing.")]
    MissingApiKey,

    #[error("Model initialization failed.")]
    InitializationFailed,
}

/// Model client as resolved at startup
///
/// A failed construction is kept rather than aborting the process, so that
/// every `/generate` call can report the configuration problem.
#[derive(Clone)]
pub enum ModelHandle {
    Ready(Arc<dyn ModelClient>),
    Unavailable(ClientUnavailable),
}

impl ModelHandle {
    /// Wrap a ready client
    pub fn ready(client: impl ModelClient + 'static) -> Self {
        ModelHandle::Ready(Arc::new(client))
    }

    /// Build the Gemini client from configuration
    ///
    /// Logs the failure detail; the returned handle carries only the
    /// caller-safe reason.
    pub fn from_config(
        config: &Config,
        api_key: Option<String>,
        system_prompt: SystemPrompt,
    ) -> Self {
        let Some(api_key) = api_key.filter(|key| !key.trim().is_empty()) else {
            tracing::error!(
                env = %config.model.api_key_env,
                "API key environment variable not set. Every /generate request will fail \
                until the process is restarted with a key."
            );
            return ModelHandle::Unavailable(ClientUnavailable::MissingApiKey);
        };

        match GeminiClient::new(&config.model, api_key, system_prompt) {
            Ok(client) => {
                tracing::info!(
                    model = %client.model_name(),
                    "Initialized model client with system instruction"
                );
                ModelHandle::ready(client)
            }
            Err(e) => {
                tracing::error!(
                    model = %config.model.name,
                    error = %e,
                    "Failed to initialize model client"
                );
                ModelHandle::Unavailable(ClientUnavailable::InitializationFailed)
            }
        }
    }

    /// The client, or a `ServerConfig` error if it failed to build
    pub fn client(&self) -> AppResult<&Arc<dyn ModelClient>> {
        match self {
            ModelHandle::Ready(client) => Ok(client),
            ModelHandle::Unavailable(reason) => Err(AppError::ServerConfig(reason.to_string())),
        }
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelHandle::Ready(client) => f
                .debug_tuple("Ready")
                .field(&client.model_name())
                .finish(),
            ModelHandle::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    #[async_trait]
    impl ModelClient for Fixed {
        async fn generate(&self, _: &RequestEnvelope) -> Result<ProviderResponse, ModelError> {
            Ok(ProviderResponse::text("ok"))
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn prompt() -> SystemPrompt {
        SystemPrompt::new("Be brief.").unwrap()
    }

    #[test]
    fn test_provider_response_concatenates_parts() {
        let response = ProviderResponse::new(vec!["Hel".into(), "lo".into()], None);
        assert!(response.has_content());
        assert_eq!(response.generated_text(), "Hello");
    }

    #[test]
    fn test_blocked_response_has_no_content() {
        let response = ProviderResponse::blocked(Some("SAFETY".to_string()));
        assert!(!response.has_content());
        assert_eq!(response.block_reason(), Some("SAFETY"));
    }

    #[test]
    fn test_missing_api_key_yields_unavailable() {
        let handle = ModelHandle::from_config(&Config::default(), None, prompt());
        let err = handle.client().err().expect("should be unavailable");
        assert_eq!(err.to_string(), "Server configuration error: API key missing.");
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let handle = ModelHandle::from_config(&Config::default(), Some("  ".into()), prompt());
        assert!(matches!(
            handle,
            ModelHandle::Unavailable(ClientUnavailable::MissingApiKey)
        ));
    }

    #[test]
    fn test_invalid_base_url_yields_initialization_failure() {
        let mut config = Config::default();
        config.model.base_url = "http://[::1".to_string();
        let handle = ModelHandle::from_config(&config, Some("key".into()), prompt());
        let err = handle.client().err().expect("should be unavailable");
        assert_eq!(
            err.to_string(),
            "Server configuration error: Model initialization failed."
        );
    }

    #[test]
    fn test_valid_config_yields_ready_client() {
        let handle = ModelHandle::from_config(&Config::default(), Some("key".into()), prompt());
        let client = handle.client().expect("should be ready");
        assert_eq!(client.model_name(), "gemini-2.5-flash-preview-04-17");
    }

    #[tokio::test]
    async fn test_ready_handle_delegates() {
        let handle = ModelHandle::ready(Fixed);
        let envelope = RequestEnvelope::Prompt("hi".to_string());
        let response = handle.client().unwrap().generate(&envelope).await.unwrap();
        assert_eq!(response.generated_text(), "ok");
        assert_eq!(format!("{:?}", handle), r#"Ready("fixed")"#);
    }
}
