//! HTTP routes for the S3O gate service.

use crate::handlers;
use crate::middleware::{protect, GateState};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the service routes.
///
/// - `/metrics` - Prometheus metrics endpoint, public
/// - every other path - "hello world", behind the gate
/// - TraceLayer for request logging
pub fn build_routes(gate: Arc<GateState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    metrics_routes
        .merge(protected_routes(gate))
        .layer(TraceLayer::new_for_http())
}

/// Routes behind the gate.
///
/// Split out so tests can exercise the gate without a metrics recorder.
pub fn protected_routes(gate: Arc<GateState>) -> Router {
    protect(Router::new().fallback(handlers::hello_world), gate)
}
