//! Metrics definitions for the S3O gate.
//!
//! All metrics follow Prometheus naming conventions:
//! - `s3o_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded by code:
//! - `outcome`: the variants of `GateOutcome`
//! - `error_type`: the variants of `AuthError` and `KeyFetchError`
//! - `status`: `success` or `error`
//!
//! Usernames, hosts and paths are never used as label values.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Key fetches are a single small GET to the authority
        .set_buckets_for_metric(
            Matcher::Full("s3o_key_refresh_duration_seconds".to_string()),
            &[0.010, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000, 30.000],
        )
        .map_err(|e| format!("Failed to set key refresh buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Terminal outcome of one request passing through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Valid callback; session cookies issued and client redirected to the clean URL.
    CallbackAccepted,
    /// Callback with an invalid assertion; rejected without cookies.
    CallbackRejected,
    /// Valid session cookies; request handed downstream.
    SessionAccepted,
    /// Invalid session cookies; cookies cleared and request rejected.
    SessionRejected,
    /// No credentials; client redirected to the authority.
    RedirectedToAuthority,
    /// The request could not be inspected (e.g. unreadable form body).
    Internal,
}

impl GateOutcome {
    /// Label value for this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            GateOutcome::CallbackAccepted => "callback_accepted",
            GateOutcome::CallbackRejected => "callback_rejected",
            GateOutcome::SessionAccepted => "session_accepted",
            GateOutcome::SessionRejected => "session_rejected",
            GateOutcome::RedirectedToAuthority => "redirected",
            GateOutcome::Internal => "internal",
        }
    }
}

// ============================================================================
// Gate Metrics
// ============================================================================

/// Record the terminal outcome of a gated request.
///
/// Metric: `s3o_gate_decisions_total`
/// Labels: `outcome`
pub fn record_gate_decision(outcome: GateOutcome) {
    counter!("s3o_gate_decisions_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record a failed assertion verification.
///
/// Metric: `s3o_auth_failures_total`
/// Labels: `error_type`
pub fn record_auth_failure(error_type: &'static str) {
    counter!("s3o_auth_failures_total",
        "error_type" => error_type
    )
    .increment(1);
}

// ============================================================================
// Key Refresh Metrics
// ============================================================================

/// Record one attempt to fetch the authority's public key.
///
/// Metric: `s3o_key_refresh_total`, `s3o_key_refresh_duration_seconds`
/// Labels: `status`, plus `error_type` on the counter for failures
pub fn record_key_refresh(error_type: Option<&'static str>, duration: Duration) {
    let status = if error_type.is_some() { "error" } else { "success" };

    histogram!("s3o_key_refresh_duration_seconds",
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("s3o_key_refresh_total",
        "status" => status,
        "error_type" => error_type.unwrap_or("none")
    )
    .increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    // The metrics facade records to a no-op recorder when none is installed,
    // so these only exercise the recording paths.

    #[test]
    fn test_outcome_labels_are_distinct() {
        let outcomes = [
            GateOutcome::CallbackAccepted,
            GateOutcome::CallbackRejected,
            GateOutcome::SessionAccepted,
            GateOutcome::SessionRejected,
            GateOutcome::RedirectedToAuthority,
            GateOutcome::Internal,
        ];
        let mut labels: Vec<_> = outcomes.iter().map(GateOutcome::as_str).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), outcomes.len());
    }

    #[test]
    fn test_record_gate_decision() {
        record_gate_decision(GateOutcome::CallbackAccepted);
        record_gate_decision(GateOutcome::RedirectedToAuthority);
    }

    #[test]
    fn test_record_auth_failure() {
        record_auth_failure("bad_token");
        record_auth_failure("key_unavailable");
        record_auth_failure("verification_failed");
    }

    #[test]
    fn test_record_key_refresh() {
        record_key_refresh(None, Duration::from_millis(40));
        record_key_refresh(Some("status"), Duration::from_millis(900));
    }
}
