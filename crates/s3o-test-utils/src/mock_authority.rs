//! Mock S3O authority for integration tests
//!
//! Serves the public key endpoint the gate polls, backed by `wiremock`.
//! The served key can be swapped mid-test to exercise key rotation, or
//! replaced with failures to exercise soft fetch errors.

use crate::crypto_fixtures::TestKeypair;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of the public key endpoint on the mock authority.
pub const PUBLIC_KEY_PATH: &str = "/publickey";

/// Path of the authenticate endpoint on the mock authority.
pub const AUTHENTICATE_PATH: &str = "/v2/authenticate/";

/// Mock authority server.
///
/// # Example
/// ```rust,ignore
/// let keypair = test_keypair(1)?;
/// let authority = MockAuthority::serving(&keypair).await;
///
/// let fetcher = PublicKeyFetcher::new(authority.public_key_url());
/// let key = fetcher.fetch().await?;
/// ```
pub struct MockAuthority {
    server: MockServer,
}

impl MockAuthority {
    /// Start a mock authority with no endpoints mounted (every request 404s).
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Start a mock authority publishing the given keypair's public key.
    pub async fn serving(keypair: &TestKeypair) -> Self {
        let authority = Self::start().await;
        authority.publish(keypair).await;
        authority
    }

    /// Replace whatever the public key endpoint serves with this keypair's key.
    pub async fn publish(&self, keypair: &TestKeypair) {
        self.publish_body(keypair.public_key_blob()).await;
    }

    /// Replace whatever the public key endpoint serves with a raw body.
    pub async fn publish_body(&self, body: impl Into<String>) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(PUBLIC_KEY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.into()))
            .mount(&self.server)
            .await;
    }

    /// Make the public key endpoint answer with the given status.
    pub async fn fail_with(&self, status: u16) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(PUBLIC_KEY_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Full URL of the public key endpoint.
    pub fn public_key_url(&self) -> String {
        format!("{}{}", self.server.uri(), PUBLIC_KEY_PATH)
    }

    /// Full URL of the authenticate endpoint.
    pub fn authenticate_url(&self) -> String {
        format!("{}{}", self.server.uri(), AUTHENTICATE_PATH)
    }

    /// Number of public key fetches received since the last reset.
    pub async fn key_fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| {
                requests
                    .iter()
                    .filter(|r| r.url.path() == PUBLIC_KEY_PATH)
                    .count()
            })
            .unwrap_or(0)
    }
}
