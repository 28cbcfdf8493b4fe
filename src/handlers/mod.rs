//! HTTP request handlers for chat-relay

use crate::config::{Config, CorsConfig};
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::{preflight_no_content, request_id_middleware};
use crate::models::{ModelClient, ModelHandle};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub mod generate;
pub mod health;
pub mod metrics;

/// Application state shared across all handlers
///
/// Everything is read-only after startup. All fields are Arc'd (or hold Arcs)
/// for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    model: ModelHandle,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a new AppState from configuration and the startup model handle
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the metrics registry cannot be built.
    pub fn new(config: Arc<Config>, model: ModelHandle) -> AppResult<Self> {
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("Failed to create metrics registry: {}", e)))?;

        Ok(Self {
            config,
            model,
            metrics: Arc::new(metrics),
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the model client, or a `ServerConfig` error if it failed to build
    pub fn model_client(&self) -> AppResult<&Arc<dyn ModelClient>> {
        self.model.client()
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// CORS layer for `/generate`, or `None` when no origins are configured
pub fn cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    let origins = cors.origin_values();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

/// Build the full application router
///
/// - `POST /generate` (plus `OPTIONS` when explicit preflight is enabled)
/// - `GET /health`
/// - `GET /metrics`
///
/// CORS and the body size limit apply to `/generate` only.
pub fn router(state: AppState) -> Router {
    let relay = &state.config().relay;

    let mut generate_route = post(generate::handler);
    if relay.explicit_preflight {
        generate_route = generate_route.options(generate::preflight);
    }

    let mut generate_routes = Router::new()
        .route("/generate", generate_route)
        .layer(DefaultBodyLimit::max(state.config().server.max_body_bytes));
    if let Some(cors) = cors_layer(&state.config().cors) {
        generate_routes = generate_routes.layer(cors);
    }
    if relay.explicit_preflight {
        generate_routes = generate_routes.layer(middleware::from_fn(preflight_no_content));
    }

    Router::new()
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .merge(generate_routes)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
