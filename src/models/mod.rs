//! Request/response model and the model client seam
//!
//! Provides the conversation types accepted by `/generate`, the
//! `ModelClient` trait, and the Gemini implementation used in production.

pub mod client;
pub mod envelope;
pub mod gemini;
pub mod prompt;
pub mod turn;

pub use client::{ClientUnavailable, ModelClient, ModelError, ModelHandle, ProviderResponse};
pub use envelope::{GenerateResponse, RequestEnvelope};
pub use gemini::GeminiClient;
pub use prompt::SystemPrompt;
pub use turn::{Role, Turn};
