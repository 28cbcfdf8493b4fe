//! Prometheus metrics collection for chat-relay
//!
//! This module provides metrics instrumentation for tracking:
//! - `/generate` outcomes by relay mode
//! - Provider call latency by outcome
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use crate::config::RelayMode;
use crate::error::AppError;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Terminal state of one `/generate` request
///
/// Closed set so label cardinality stays bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    BadRequest,
    ConfigError,
    Blocked,
    Failed,
}

impl Outcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::BadRequest => "bad_request",
            Outcome::ConfigError => "config_error",
            Outcome::Blocked => "blocked",
            Outcome::Failed => "failed",
        }
    }

    /// Classify a handler result
    pub fn of<T>(result: &Result<T, AppError>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(AppError::BadRequest(_) | AppError::PayloadTooLarge) => Outcome::BadRequest,
            Err(AppError::ServerConfig(_)) => Outcome::ConfigError,
            Err(AppError::GenerationBlocked { .. }) => Outcome::Blocked,
            Err(_) => Outcome::Failed,
        }
    }
}

/// Metrics collector for chat-relay
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    generation_duration: HistogramVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 2 modes x 5 outcomes = 10 time series
        let requests_total = IntCounterVec::new(
            Opts::new(
                "chat_relay_requests_total",
                "Total number of /generate requests by relay mode and outcome",
            ),
            &["mode", "outcome"],
        )?;

        // Only calls that reached the provider are observed (success, blocked, failed)
        let generation_duration = HistogramVec::new(
            HistogramOpts::new(
                "chat_relay_generation_duration_ms",
                "Provider call latency in milliseconds",
            )
            .buckets(vec![
                100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0, 60000.0,
            ]),
            &["outcome"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(generation_duration.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            generation_duration,
        })
    }

    /// Record a finished `/generate` request
    ///
    /// # Errors
    ///
    /// Returns an error if the metric is not registered.
    pub fn record_request(&self, mode: RelayMode, outcome: Outcome) -> Result<(), prometheus::Error> {
        self.requests_total
            .get_metric_with_label_values(&[mode.as_str(), outcome.as_str()])?
            .inc();
        Ok(())
    }

    /// Record the latency of one provider call
    ///
    /// # Errors
    ///
    /// Returns an error if the metric is not registered, or if `duration_ms` is
    /// NaN, infinite, or negative (these corrupt histogram percentiles).
    pub fn record_generation_duration(
        &self,
        outcome: Outcome,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite (not NaN or Infinity), got: {}",
                duration_ms
            )));
        }

        if duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be non-negative (duration cannot be negative), got: {}",
                duration_ms
            )));
        }

        self.generation_duration
            .get_metric_with_label_values(&[outcome.as_str()])?
            .observe(duration_ms);
        Ok(())
    }

    /// Current value of the request counter for one label pair
    pub fn request_count(&self, mode: RelayMode, outcome: Outcome) -> u64 {
        self.requests_total
            .get_metric_with_label_values(&[mode.as_str(), outcome.as_str()])
            .map(|counter| counter.get())
            .unwrap_or(0)
    }

    /// Number of provider calls observed for an outcome
    pub fn generation_count(&self, outcome: Outcome) -> u64 {
        self.generation_duration
            .get_metric_with_label_values(&[outcome.as_str()])
            .map(|histogram| histogram.get_sample_count())
            .unwrap_or(0)
    }

    /// Gather all metrics and encode them in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let metric_count = metric_families.len();

        tracing::debug!(
            metric_family_count = metric_count,
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();

        encoder.encode(&metric_families, &mut buffer).map_err(|e| {
            tracing::error!(
                error = %e,
                metric_family_count = metric_count,
                "Prometheus text encoder failed"
            );
            prometheus::Error::Msg(format!(
                "Failed to encode {} metric families: {}",
                metric_count, e
            ))
        })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Metrics output is not valid UTF-8: {}", e))
        })
    }
}
