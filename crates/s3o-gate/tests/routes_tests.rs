//! Demo service router tests.
//!
//! Installs the Prometheus recorder, which can only happen once per
//! process, so this file holds a single test.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use s3o_gate::auth::{KeyCache, SignatureVerifier};
use s3o_gate::cookies::SessionCookies;
use s3o_gate::credentials::MAX_FORM_BODY_BYTES;
use s3o_gate::middleware::GateState;
use s3o_gate::observability::metrics::init_metrics_recorder;
use s3o_gate::redirect::DEFAULT_AUTHENTICATE_URL;
use s3o_gate::routes::build_routes;
use s3o_test_utils::{body_string, test_keypair, GateResponseAssertions};
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn test_metrics_are_public_and_record_every_gate_outcome() -> Result<(), anyhow::Error> {
    let metrics_handle = init_metrics_recorder().map_err(anyhow::Error::msg)?;
    let keypair = test_keypair(1)?;
    let keys = Arc::new(KeyCache::new());
    keys.store(keypair.public_key().clone()).await;

    let gate = Arc::new(GateState {
        verifier: SignatureVerifier::new(keys),
        cookies: SessionCookies::default(),
        authenticate_url: DEFAULT_AUTHENTICATE_URL.parse()?,
    });
    let app = build_routes(gate, metrics_handle);

    // Any path without credentials goes to the authority
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/some/page")
                .header(header::HOST, "example.com")
                .body(Body::empty())?,
        )
        .await?;
    response.assert_status(StatusCode::FOUND);

    // A valid session reaches the hello world handler
    let token = keypair.sign_assertion("jane.doe", "example.com");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/some/page")
                .header(header::HOST, "example.com")
                .header(
                    header::COOKIE,
                    format!("s3o_username=jane.doe; s3o_token={token}"),
                )
                .body(Body::empty())?,
        )
        .await?;
    response.assert_status(StatusCode::OK);
    assert_eq!(body_string(response).await, "hello world");

    // A form body over the size limit is an internal failure
    let oversized = "a".repeat(MAX_FORM_BODY_BYTES + 1);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/some/page")
                .header(header::HOST, "example.com")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(oversized))?,
        )
        .await?;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    // Metrics need no session and reflect the decisions above
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .header(header::HOST, "example.com")
                .body(Body::empty())?,
        )
        .await?;
    response.assert_status(StatusCode::OK);

    let body = body_string(response).await;
    assert!(
        body.contains("s3o_gate_decisions_total{outcome=\"redirected\"} 1"),
        "unexpected metrics output: {body}"
    );
    assert!(
        body.contains("s3o_gate_decisions_total{outcome=\"session_accepted\"} 1"),
        "unexpected metrics output: {body}"
    );
    assert!(
        body.contains("s3o_gate_decisions_total{outcome=\"internal\"} 1"),
        "unexpected metrics output: {body}"
    );

    Ok(())
}
