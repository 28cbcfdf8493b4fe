//! Configuration management for chat-relay
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every section has defaults, so an empty file (or no file at all) yields a
//! working history relay in front of Gemini.

use crate::error::{AppError, AppResult};
use crate::models::prompt::{DEFAULT_SYSTEM_PROMPT, SystemPrompt};
use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// Environment variable that overrides `model.name`
pub const MODEL_NAME_ENV: &str = "GEMINI_MODEL_NAME";

/// Upper bound for `server.request_timeout_seconds`
pub const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 300;

/// Upper bound for `server.max_body_bytes` (64 MiB)
pub const MAX_BODY_BYTES_LIMIT: usize = 64 * 1024 * 1024;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on a single provider call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Largest `/generate` body accepted, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Socket address to bind
    ///
    /// Falls back to all interfaces if `host` does not parse; `validate()`
    /// rejects such hosts before this is reached in normal startup.
    pub fn socket_addr(&self) -> SocketAddr {
        let ip = self
            .host
            .parse::<IpAddr>()
            .unwrap_or_else(|_| IpAddr::from([0, 0, 0, 0]));
        SocketAddr::from((ip, self.port))
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_request_timeout() -> u64 {
    60
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

/// Hosted model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Model identifier, e.g. `gemini-2.5-flash-preview-04-17`
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Base URL of the Generative Language API (without trailing slash)
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the API key
    ///
    /// The key itself is never read from the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            base_url: default_model_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_model_name() -> String {
    "gemini-2.5-flash-preview-04-17".to_string()
}

fn default_model_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

/// Which request envelope `/generate` accepts
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// `{"history": [turn, ...]}`
    #[default]
    History,
    /// `{"prompt": "..."}`
    Prompt,
}

impl RelayMode {
    /// JSON key the envelope must carry
    pub fn key(&self) -> &'static str {
        match self {
            RelayMode::History => "history",
            RelayMode::Prompt => "prompt",
        }
    }

    /// Prometheus label value
    pub fn as_str(&self) -> &'static str {
        self.key()
    }
}

/// Relay behaviour configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub mode: RelayMode,
    /// Answer `OPTIONS /generate` with 204 instead of leaving preflight to CORS
    #[serde(default = "default_explicit_preflight")]
    pub explicit_preflight: bool,
    /// Inline system prompt override
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Path of a file containing the system prompt
    #[serde(default)]
    pub system_prompt_file: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mode: RelayMode::default(),
            explicit_preflight: default_explicit_preflight(),
            system_prompt: None,
            system_prompt_file: None,
        }
    }
}

fn default_explicit_preflight() -> bool {
    true
}

/// Cross-origin policy for `/generate`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Origins allowed to call `/generate`; empty disables CORS entirely
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl CorsConfig {
    /// Origins as header values
    ///
    /// Entries that are not valid header values are skipped; `validate()`
    /// rejects them at load time.
    pub fn origin_values(&self) -> Vec<HeaderValue> {
        self.allowed_origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect()
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec!["https://emlyonbs.eu.qualtrics.com".to_string()]
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file (preserves io::Error context)
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        // Phase 2: Parse TOML (preserves toml::de::Error context)
        let config: Self = toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
            path: path_display.clone(),
            source,
        })?;

        // Phase 3: Validate parsed config
        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Apply environment overrides using the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides from an arbitrary lookup
    ///
    /// Only `GEMINI_MODEL_NAME` is honoured. Blank values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(MODEL_NAME_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(
                model = %name,
                env = MODEL_NAME_ENV,
                "Model name overridden from environment"
            );
            self.model.name = name;
        }
    }

    /// Timeout applied to each provider call
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.server.request_timeout_seconds)
    }

    /// Resolve the system prompt once at startup
    ///
    /// Precedence: inline `relay.system_prompt`, then `relay.system_prompt_file`,
    /// then the built-in travel-planning assistant prompt.
    pub fn system_prompt(&self) -> AppResult<SystemPrompt> {
        if let Some(inline) = &self.relay.system_prompt {
            return SystemPrompt::new(inline.clone());
        }

        if let Some(path) = &self.relay.system_prompt_file {
            let text =
                std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
                    path: path.display().to_string(),
                    source,
                })?;
            return SystemPrompt::new(text);
        }

        SystemPrompt::new(DEFAULT_SYSTEM_PROMPT)
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()` and `from_str()`, but can also be
    /// called explicitly when constructing Config via other means (e.g., in tests).
    pub fn validate(&self) -> AppResult<()> {
        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(AppError::Config(format!(
                "server.host '{}' is not a valid IP address",
                self.server.host
            )));
        }

        if self.server.port == 0 {
            return Err(AppError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "request_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.server.request_timeout_seconds > MAX_REQUEST_TIMEOUT_SECONDS {
            return Err(AppError::Config(format!(
                "request_timeout_seconds cannot exceed {} seconds, got {}",
                MAX_REQUEST_TIMEOUT_SECONDS, self.server.request_timeout_seconds
            )));
        }

        if self.server.max_body_bytes == 0 {
            return Err(AppError::Config(
                "server.max_body_bytes must be greater than 0".to_string(),
            ));
        }
        if self.server.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(AppError::Config(format!(
                "server.max_body_bytes cannot exceed {} bytes, got {}",
                MAX_BODY_BYTES_LIMIT, self.server.max_body_bytes
            )));
        }

        if self.model.name.trim().is_empty() {
            return Err(AppError::Config("model.name cannot be empty".to_string()));
        }

        if !self.model.base_url.starts_with("http://") && !self.model.base_url.starts_with("https://")
        {
            return Err(AppError::Config(format!(
                "model.base_url '{}' must start with 'http://' or 'https://'",
                self.model.base_url
            )));
        }

        if self.model.api_key_env.trim().is_empty() {
            return Err(AppError::Config(
                "model.api_key_env cannot be empty".to_string(),
            ));
        }

        if self.relay.system_prompt.is_some() && self.relay.system_prompt_file.is_some() {
            return Err(AppError::Config(
                "relay.system_prompt and relay.system_prompt_file are mutually exclusive"
                    .to_string(),
            ));
        }

        if let Some(prompt) = &self.relay.system_prompt
            && prompt.trim().is_empty()
        {
            return Err(AppError::Config(
                "relay.system_prompt cannot be empty".to_string(),
            ));
        }

        for origin in &self.cors.allowed_origins {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "cors.allowed_origins entry '{}' must start with 'http://' or 'https://'",
                    origin
                )));
            }
            if HeaderValue::from_str(origin).is_err() {
                return Err(AppError::Config(format!(
                    "cors.allowed_origins entry '{}' is not a valid header value",
                    origin
                )));
            }
            validate_origin(origin)?;
        }

        if !LOG_LEVELS.contains(&self.observability.log_level.as_str()) {
            return Err(AppError::Config(format!(
                "observability.log_level '{}' must be one of {:?}",
                self.observability.log_level, LOG_LEVELS
            )));
        }

        Ok(())
    }
}

/// Browsers send `Origin` as `scheme://host[:port]` with nothing after it,
/// so any other form can never match.
fn validate_origin(origin: &str) -> AppResult<()> {
    let reject = |why: &str| {
        Err(AppError::Config(format!(
            "cors.allowed_origins entry '{}' {}",
            origin, why
        )))
    };

    let url = match Url::parse(origin) {
        Ok(url) => url,
        Err(e) => return reject(&format!("is not a valid URL: {}", e)),
    };
    if url.host_str().is_none() {
        return reject("has no host");
    }
    if origin.ends_with('/') || url.path() != "/" {
        return reject("must not have a path or trailing slash");
    }
    if url.query().is_some() || url.fragment().is_some() || !url.username().is_empty() {
        return reject("must be scheme://host[:port] only");
    }
    Ok(())
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(toml_str).map_err(|source| {
            AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            }
        })?;

        config.validate()?;
        Ok(config)
    }
}
