//! The S3O gate middleware.
//!
//! Every request ends in exactly one of four ways:
//!
//! 1. Authority callback (`POST` with a non-empty `username`): the assertion
//!    is verified; on success session cookies are issued and the client is
//!    redirected to the clean URL, on failure the request is rejected with
//!    no cookies.
//! 2. Session cookies present: the assertion in the cookies is verified; on
//!    success the request goes downstream untouched, on failure the cookies
//!    are cleared and the request is rejected.
//! 3. Otherwise the client is redirected to the authority to authenticate.
//!
//! Redirects and rejections always carry cache-prevention headers.

use crate::auth::SignatureVerifier;
use crate::cookies::{apply_no_cache_headers, SessionCookies};
use crate::credentials::{extract_callback_params, Callback};
use crate::errors::AuthError;
use crate::observability::metrics::{record_auth_failure, record_gate_decision, GateOutcome};
use crate::redirect::{build_auth_redirect, clean_callback_url, RequestTarget};
use axum::{
    extract::{Request, State},
    http::{header, request::Parts, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use tracing::instrument;
use url::Url;

/// State for the gate middleware.
#[derive(Debug, Clone)]
pub struct GateState {
    /// Verifier reading the shared key cache.
    pub verifier: SignatureVerifier,

    /// Session cookie settings.
    pub cookies: SessionCookies,

    /// The authority's authenticate endpoint.
    pub authenticate_url: Url,
}

/// Wrap every route of `router` in the gate.
pub fn protect<S>(router: Router<S>, gate: Arc<GateState>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(gate, require_s3o))
}

/// S3O authentication middleware.
///
/// # Response
///
/// - 302 to the clean URL with session cookies after a valid callback
/// - 302 to the authority when the request carries no credentials
/// - 403 with a plain-text reason when an assertion is invalid
/// - 500 if the form body cannot be read or exceeds the size limit
/// - Otherwise the downstream response
#[instrument(skip_all, name = "s3o.middleware.gate", fields(method = %req.method()))]
pub async fn require_s3o(
    State(state): State<Arc<GateState>>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (parts, body) = req.into_parts();
    let (params, body) = extract_callback_params(&parts, body)
        .await
        .inspect_err(|_| record_gate_decision(GateOutcome::Internal))?;

    if parts.method == Method::POST {
        if let Some(callback) = params.callback() {
            return handle_callback(&state, &parts, callback).await;
        }
    }

    if let Some(session) = SessionCookies::read(&parts.headers) {
        let host = RequestTarget::from_parts(&parts).host;
        return match state
            .verifier
            .verify(&session.username, &session.token, &host)
            .await
        {
            Ok(()) => {
                tracing::debug!(
                    target: "s3o.middleware.gate",
                    username = %session.username,
                    "Session verified"
                );
                record_gate_decision(GateOutcome::SessionAccepted);
                Ok(next.run(Request::from_parts(parts, body)).await)
            }
            Err(e) => {
                tracing::info!(
                    target: "s3o.middleware.gate",
                    error_type = e.error_type(),
                    "Rejecting request with invalid session cookies"
                );
                record_auth_failure(e.error_type());
                record_gate_decision(GateOutcome::SessionRejected);

                let mut response = rejection(e);
                SessionCookies::invalidate(&parts.headers, response.headers_mut());
                Ok(response)
            }
        };
    }

    let target = RequestTarget::from_parts(&parts);
    let location = build_auth_redirect(&state.authenticate_url, &target);
    tracing::debug!(
        target: "s3o.middleware.gate",
        host = %target.host,
        path = %target.path,
        "No credentials, redirecting to authority"
    );
    record_gate_decision(GateOutcome::RedirectedToAuthority);
    found(location.as_str())
}

/// Verify a callback from the authority and start a session.
///
/// Stops at the first failure: no cookies are issued for an invalid callback.
async fn handle_callback(
    state: &GateState,
    parts: &Parts,
    callback: Callback,
) -> Result<Response, AuthError> {
    let target = RequestTarget::from_parts(parts);

    if let Err(e) = state
        .verifier
        .verify(&callback.username, &callback.token, &target.host)
        .await
    {
        tracing::info!(
            target: "s3o.middleware.gate",
            error_type = e.error_type(),
            "Rejecting authority callback"
        );
        record_auth_failure(e.error_type());
        record_gate_decision(GateOutcome::CallbackRejected);
        return Ok(rejection(e));
    }

    tracing::debug!(
        target: "s3o.middleware.gate",
        username = %callback.username,
        "Callback verified, issuing session cookies"
    );

    let mut response = found(&clean_callback_url(&target, &callback.username))?;
    state
        .cookies
        .issue(response.headers_mut(), &callback.username, &callback.token)?;
    record_gate_decision(GateOutcome::CallbackAccepted);
    Ok(response)
}

/// 302 Found to `location`, uncacheable.
fn found(location: &str) -> Result<Response, AuthError> {
    let location = HeaderValue::from_str(location)
        .map_err(|e| AuthError::Internal(format!("invalid redirect location: {e}")))?;

    let mut response = StatusCode::FOUND.into_response();
    response.headers_mut().insert(header::LOCATION, location);
    apply_no_cache_headers(response.headers_mut());
    Ok(response)
}

/// Status and plain-text body for `err`, uncacheable.
fn rejection(err: AuthError) -> Response {
    let mut response = err.into_response();
    apply_no_cache_headers(response.headers_mut());
    response
}
