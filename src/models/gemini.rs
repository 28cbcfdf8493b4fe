//! Gemini `generateContent` client
//!
//! Talks to the Generative Language REST API directly with reqwest. The system
//! prompt is sent as `systemInstruction` on every call; conversation turns are
//! forwarded in order with their roles.

use crate::config::ModelConfig;
use crate::models::client::{ModelClient, ModelError, ProviderResponse};
use crate::models::envelope::RequestEnvelope;
use crate::models::prompt::SystemPrompt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-goog-api-key";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate plus the prompt block reason
    fn into_provider_response(self) -> ProviderResponse {
        let parts = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);

        ProviderResponse::new(parts, block_reason)
    }
}

/// Gemini REST client bound to one model and one system prompt
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
    system_prompt: SystemPrompt,
}

impl GeminiClient {
    /// Create a client for `config.name` under `config.base_url`
    pub fn new(
        config: &ModelConfig,
        api_key: String,
        system_prompt: SystemPrompt,
    ) -> Result<Self, ModelError> {
        let base = config.base_url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{}/models/{}:generateContent", base, config.name))
            .map_err(|e| ModelError::InvalidEndpoint(format!("{}: {}", config.base_url, e)))?;

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            api_key,
            model: config.name.clone(),
            system_prompt,
        })
    }

    /// Full `generateContent` URL
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, envelope: &'a RequestEnvelope) -> GenerateContentRequest<'a> {
        let contents = match envelope {
            RequestEnvelope::History(turns) => turns
                .iter()
                .map(|turn| Content {
                    role: Some(turn.role().as_str()),
                    parts: turn.parts().iter().map(|text| Part { text }).collect(),
                })
                .collect(),
            RequestEnvelope::Prompt(text) => vec![Content {
                role: Some("user"),
                parts: vec![Part { text }],
            }],
        };

        GenerateContentRequest {
            contents,
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: self.system_prompt.as_str(),
                }],
            },
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, envelope: &RequestEnvelope) -> Result<ProviderResponse, ModelError> {
        tracing::debug!(
            model = %self.model,
            turns = envelope.turn_count(),
            "Sending generateContent request"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.request_body(envelope))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ModelError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| ModelError::Decode(e.to_string()))?;

        Ok(parsed.into_provider_response())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
