//! chat-relay HTTP server
//!
//! Starts an Axum web server that relays chat requests to a hosted Gemini model.

use chat_relay::{
    cli::{self, Cli, Command, ConfigSource},
    handlers::{self, AppState},
    models::ModelHandle,
    telemetry,
};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = cli::generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                println!("Wrote configuration template to {}", path.display());
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    // Load .env before reading any environment-driven setting
    let dotenv = dotenvy::dotenv();

    let (mut config, source) = cli::load_config(cli.config.as_deref())?;
    config.apply_env_overrides();
    config.validate()?;

    telemetry::init(&config.observability.log_level);

    match &dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded environment from .env"),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
    }
    if source == ConfigSource::Defaults {
        tracing::warn!(
            path = cli::DEFAULT_CONFIG_PATH,
            "Config file not found, using built-in defaults"
        );
    }

    tracing::info!(
        config = %source,
        model = %config.model.name,
        mode = config.relay.mode.as_str(),
        "Starting chat-relay server on {}:{}",
        config.server.host,
        config.server.port
    );

    let system_prompt = config.system_prompt()?;
    let api_key = std::env::var(&config.model.api_key_env).ok();
    let model = ModelHandle::from_config(&config, api_key, system_prompt);

    let addr = config.server.socket_addr();
    let state = AppState::new(Arc::new(config), model)?;
    let app = handlers::router(state);

    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
