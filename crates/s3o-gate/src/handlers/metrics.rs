//! Prometheus metrics endpoint handler.
//!
//! # Security
//!
//! This endpoint sits outside the gate so Prometheus can scrape it. Metric
//! labels never contain usernames, tokens or paths.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns 200 OK with the Prometheus text format:
/// ```text
/// # TYPE s3o_gate_decisions_total counter
/// s3o_gate_decisions_total{outcome="redirected"} 3
/// ```
#[tracing::instrument(skip_all, name = "s3o.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
