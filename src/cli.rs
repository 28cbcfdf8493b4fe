//! Command-line interface for chat-relay
//!
//! Provides argument parsing, config file resolution and the `config`
//! template subcommand.

use crate::config::Config;
use crate::error::AppResult;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Config file looked up when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// HTTP relay between a browser chat widget and a hosted Gemini model
#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(version)]
#[command(about = "HTTP relay between a browser chat widget and a hosted Gemini model")]
#[command(
    long_about = "chat-relay accepts a conversation history or a single prompt on POST /generate, \
    forwards it to Gemini with a fixed system prompt, and returns the generated text."
)]
pub struct Cli {
    /// Path to configuration file [default: config.toml]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Where the running configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Load the configuration selected on the command line
///
/// An explicit path must exist. Without one, `config.toml` is used when
/// present and the built-in defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> AppResult<(Config, ConfigSource)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !default.exists() {
                return Ok((Config::default(), ConfigSource::Defaults));
            }
            default
        }
    };

    let config = Config::from_file(&path)?;
    Ok((config, ConfigSource::File(path)))
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# chat-relay Configuration
# =========================
#
# Every key below is optional; the values shown are the built-in defaults.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 5001

# Upper bound on one model call in seconds (1-300)
request_timeout_seconds = 60

# Largest accepted /generate body in bytes (larger bodies get 413)
max_body_bytes = 16777216

# ─────────────────────────────────────────────────────────────────────────────
# MODEL
# ─────────────────────────────────────────────────────────────────────────────

[model]
# Gemini model identifier (GEMINI_MODEL_NAME overrides this)
name = "gemini-2.5-flash-preview-04-17"

# Generative Language API base URL
base_url = "https://generativelanguage.googleapis.com/v1beta"

# Environment variable holding the API key (a .env file is loaded at startup)
api_key_env = "GEMINI_API_KEY"

# ─────────────────────────────────────────────────────────────────────────────
# RELAY
# ─────────────────────────────────────────────────────────────────────────────

[relay]
# Request envelope accepted by POST /generate:
#   - "history": {"history": [{"role": "user", "parts": ["..."]}, ...]}
#   - "prompt":  {"prompt": "..."}
mode = "history"

# Answer OPTIONS /generate with 204 No Content
explicit_preflight = true

# System prompt override; set at most one of these.
# Without either, the built-in travel-planning assistant prompt is used.
# system_prompt = "You are a helpful assistant."
# system_prompt_file = "prompt.txt"

# ─────────────────────────────────────────────────────────────────────────────
# CORS
# ─────────────────────────────────────────────────────────────────────────────

[cors]
# Origins allowed to call /generate from a browser (empty list disables CORS)
allowed_origins = ["https://emlyonbs.eu.qualtrics.com"]

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;
    use std::str::FromStr;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_config_flag_by_default() {
        let cli = Cli::parse_from(["chat-relay"]);
        assert!(cli.config.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["chat-relay", "--config", "custom.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["chat-relay", "config", "-o", "my-config.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == Path::new("my-config.toml")
        ));
    }

    #[test]
    fn template_is_a_valid_config() {
        let config = Config::from_str(generate_config_template())
            .expect("template should parse and validate");
        let defaults = Config::default();
        assert_eq!(config.server.port, defaults.server.port);
        assert_eq!(config.server.max_body_bytes, defaults.server.max_body_bytes);
        assert_eq!(config.model.name, defaults.model.name);
        assert_eq!(config.relay.mode, defaults.relay.mode);
        assert_eq!(config.cors.allowed_origins, defaults.cors.allowed_origins);
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        for section in ["[server]", "[model]", "[relay]", "[cors]", "[observability]"] {
            assert!(template.contains(section), "missing {}", section);
        }
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn explicit_path_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[relay]\nmode = \"prompt\"").unwrap();

        let (config, source) = load_config(Some(file.path())).unwrap();
        assert_eq!(config.relay.mode, crate::config::RelayMode::Prompt);
        assert_eq!(source, ConfigSource::File(file.path().to_path_buf()));
    }

    #[test]
    fn config_source_display() {
        assert_eq!(ConfigSource::Defaults.to_string(), "built-in defaults");
        assert_eq!(
            ConfigSource::File(PathBuf::from("a.toml")).to_string(),
            "a.toml"
        );
    }
}
