//! Request and response envelopes for `/generate`
//!
//! The relay accepts exactly one request shape, chosen by `RelayMode`.
//! Validation dispatches on the mode and short-circuits on the first failure.

use crate::config::RelayMode;
use crate::error::{AppError, AppResult};
use crate::models::turn::Turn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Returned when the body cannot be read as JSON
pub const NOT_JSON_MESSAGE: &str = "Request must be JSON";
/// Returned when `history` is absent, not a list, or empty
pub const INVALID_HISTORY_MESSAGE: &str = "Invalid or missing 'history' (must be a list)";
/// Returned when `prompt` is absent, null, or blank
pub const MISSING_PROMPT_MESSAGE: &str = "Missing 'prompt'";
/// Returned when `prompt` is present but not a string
pub const PROMPT_NOT_STRING_MESSAGE: &str = "'prompt' must be a string";

/// Validated input for the model client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEnvelope {
    /// Full conversation in chronological order (never empty)
    History(Vec<Turn>),
    /// Single prompt (never blank)
    Prompt(String),
}

impl RequestEnvelope {
    /// Validate a parsed JSON body against the configured relay mode
    pub fn from_json(mode: RelayMode, body: &Value) -> AppResult<Self> {
        match mode {
            RelayMode::History => Self::history_from_json(body),
            RelayMode::Prompt => Self::prompt_from_json(body),
        }
    }

    fn history_from_json(body: &Value) -> AppResult<Self> {
        let items = match body.get("history") {
            Some(Value::Array(items)) if !items.is_empty() => items,
            _ => return Err(AppError::BadRequest(INVALID_HISTORY_MESSAGE.to_string())),
        };

        let turns = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                Turn::deserialize(item).map_err(|e| {
                    AppError::BadRequest(format!("Invalid turn at history[{}]: {}", index, e))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(RequestEnvelope::History(turns))
    }

    fn prompt_from_json(body: &Value) -> AppResult<Self> {
        match body.get("prompt") {
            None | Some(Value::Null) => {
                Err(AppError::BadRequest(MISSING_PROMPT_MESSAGE.to_string()))
            }
            Some(Value::String(text)) if text.trim().is_empty() => {
                Err(AppError::BadRequest(MISSING_PROMPT_MESSAGE.to_string()))
            }
            Some(Value::String(text)) => Ok(RequestEnvelope::Prompt(text.clone())),
            Some(_) => Err(AppError::BadRequest(PROMPT_NOT_STRING_MESSAGE.to_string())),
        }
    }

    /// Mode this envelope belongs to
    pub fn mode(&self) -> RelayMode {
        match self {
            RequestEnvelope::History(_) => RelayMode::History,
            RequestEnvelope::Prompt(_) => RelayMode::Prompt,
        }
    }

    /// Number of turns sent to the model (a prompt counts as one)
    pub fn turn_count(&self) -> usize {
        match self {
            RequestEnvelope::History(turns) => turns.len(),
            RequestEnvelope::Prompt(_) => 1,
        }
    }

    /// Total characters of input text
    pub fn char_count(&self) -> usize {
        match self {
            RequestEnvelope::History(turns) => turns
                .iter()
                .flat_map(|t| t.parts())
                .map(|p| p.chars().count())
                .sum(),
            RequestEnvelope::Prompt(text) => text.chars().count(),
        }
    }
}

/// Successful `/generate` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub generated_text: String,
}
