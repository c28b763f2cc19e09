//! S3O gate
//!
//! Axum middleware that puts any HTTP service behind S3O single sign-on.
//! Requests are let through only when they carry a session whose identity
//! assertion verifies against the authority's current public key:
//!
//! - the authority's RSA public key is fetched at startup and refreshed in
//!   the background (`tasks::key_refresh`) into a shared `auth::KeyCache`
//! - an assertion is an RSA PKCS#1 v1.5 signature over the SHA-1 digest of
//!   `username + "-" + host` (`auth::verifier`)
//! - the assertion is carried in the `s3o_username` and `s3o_token` cookies
//!   (`cookies`) and re-verified on every request
//! - requests without a session are redirected to the authority, which
//!   posts back to the original URL (`redirect`, `middleware::gate`)
//!
//! # Usage
//!
//! ```no_run
//! use s3o_gate::auth::{KeyCache, PublicKeyFetcher, SignatureVerifier};
//! use s3o_gate::cookies::SessionCookies;
//! use s3o_gate::middleware::{protect, GateState};
//! use s3o_gate::tasks::spawn_key_refresh;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = Arc::new(KeyCache::new());
//! let cancel_token = CancellationToken::new();
//! spawn_key_refresh(
//!     Arc::clone(&keys),
//!     PublicKeyFetcher::new(s3o_gate::auth::DEFAULT_PUBLIC_KEY_URL),
//!     cancel_token.clone(),
//! );
//!
//! let gate = Arc::new(GateState {
//!     verifier: SignatureVerifier::new(keys),
//!     cookies: SessionCookies::default(),
//!     authenticate_url: s3o_gate::redirect::DEFAULT_AUTHENTICATE_URL.parse()?,
//! });
//! let router: axum::Router = axum::Router::new().route("/", axum::routing::get(|| async { "hi" }));
//! let app = protect(router, gate);
//! # let _ = app;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - `auth` - Key cache, key fetch and assertion verification
//! - `config` - Service configuration from environment
//! - `cookies` - Session cookie issue, read and invalidation
//! - `credentials` - Typed extraction of callback parameters
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers of the demo service
//! - `middleware` - The gate middleware
//! - `observability` - Metrics
//! - `redirect` - Authority and clean callback URLs
//! - `routes` - Axum router setup
//! - `tasks` - Background key refresh

pub mod auth;
pub mod config;
pub mod cookies;
pub mod credentials;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod redirect;
pub mod routes;
pub mod tasks;
