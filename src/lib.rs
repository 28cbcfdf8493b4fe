//! chat-relay - HTTP relay between a browser survey widget and Gemini
//!
//! This library validates chat requests, forwards them to a hosted Gemini
//! model with a fixed system prompt, and returns the generated text.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod shared;
pub mod telemetry;
