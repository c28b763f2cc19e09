//! Public key retrieval from the authority.
//!
//! The authority publishes its RSA public key as a base64 encoded, DER
//! encoded SubjectPublicKeyInfo at a well-known URL. Network, status,
//! decode and parse failures are all reported as `KeyFetchError`; callers
//! are expected to treat them uniformly as "key unavailable".

use crate::errors::KeyFetchError;
use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use tracing::instrument;

/// Default public key endpoint of the authority.
pub const DEFAULT_PUBLIC_KEY_URL: &str = "https://s3o.ft.com/publickey";

/// Fetches the authority's public key over HTTP.
#[derive(Clone)]
pub struct PublicKeyFetcher {
    /// URL of the public key endpoint.
    url: String,

    /// HTTP client used for fetching.
    http_client: reqwest::Client,
}

impl PublicKeyFetcher {
    /// Create a fetcher for the given public key URL.
    ///
    /// Uses the HTTP client's default timeouts.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    /// Create a fetcher using an existing HTTP client.
    pub fn with_client(url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            http_client,
        }
    }

    /// URL this fetcher reads from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the current public key.
    ///
    /// # Errors
    ///
    /// Returns `KeyFetchError` if the request fails, the endpoint answers
    /// with a non-200 status, or the body is not a base64 encoded RSA
    /// SubjectPublicKeyInfo.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<RsaPublicKey, KeyFetchError> {
        tracing::debug!(target: "s3o.auth.public_key", "Fetching s3o public key");

        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| KeyFetchError::Request(e.to_string()))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(KeyFetchError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| KeyFetchError::Request(e.to_string()))?;

        parse_public_key(&body)
    }
}

impl std::fmt::Debug for PublicKeyFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKeyFetcher")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Parse the authority's key blob: base64 of a DER encoded SubjectPublicKeyInfo.
///
/// Surrounding whitespace (such as a trailing newline) is ignored.
pub fn parse_public_key(blob: &str) -> Result<RsaPublicKey, KeyFetchError> {
    let der = STANDARD
        .decode(blob.trim())
        .map_err(|e| KeyFetchError::Decode(e.to_string()))?;

    RsaPublicKey::from_public_key_der(&der).map_err(|e| KeyFetchError::Parse(e.to_string()))
}
