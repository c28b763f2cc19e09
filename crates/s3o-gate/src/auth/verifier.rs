//! Identity assertion verification.
//!
//! An assertion is valid when its token is a PKCS#1 v1.5 signature, made
//! with the authority's private key, over the SHA-1 digest of
//! `username + "-" + host`. SHA-1 is what the authority signs; it is kept
//! for wire compatibility.

use crate::auth::key_cache::KeyCache;
use crate::errors::AuthError;
use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::Pkcs1v15Sign;
use sha1::{Digest, Sha1};
use std::sync::Arc;
use tracing::instrument;

/// Verifies assertions against the key currently held by a `KeyCache`.
#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    keys: Arc<KeyCache>,
}

impl SignatureVerifier {
    /// Create a verifier reading from the given key cache.
    pub fn new(keys: Arc<KeyCache>) -> Self {
        Self { keys }
    }

    /// The key cache this verifier reads.
    pub fn key_cache(&self) -> &Arc<KeyCache> {
        &self.keys
    }

    /// Verify that `token` is the authority's signature for `username` on `host`.
    ///
    /// Has no side effects. The outcome depends only on the inputs and the
    /// key cached at the time of the call.
    ///
    /// # Errors
    ///
    /// - `AuthError::BadToken` if the token is not valid base64
    /// - `AuthError::KeyUnavailable` if no key has been fetched yet
    /// - `AuthError::VerificationFailed` if the signature does not match
    #[instrument(skip_all, name = "s3o.auth.verify")]
    pub async fn verify(&self, username: &str, token: &str, host: &str) -> Result<(), AuthError> {
        let signature = STANDARD.decode(token).map_err(|_| {
            tracing::debug!(target: "s3o.auth.verifier", "Token is not valid base64");
            AuthError::BadToken
        })?;

        let digest = assertion_digest(username, host);

        let key = self.keys.get().await.ok_or_else(|| {
            tracing::warn!(target: "s3o.auth.verifier", "No s3o public key available yet");
            AuthError::KeyUnavailable
        })?;

        key.verify(Pkcs1v15Sign::new::<Sha1>(), &digest, &signature)
            .map_err(|_| {
                tracing::debug!(
                    target: "s3o.auth.verifier",
                    username = %username,
                    host = %host,
                    "Assertion signature mismatch"
                );
                AuthError::VerificationFailed
            })
    }
}

/// SHA-1 digest of the signed payload `username + "-" + host`.
pub fn assertion_digest(username: &str, host: &str) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(username.as_bytes());
    hasher.update(b"-");
    hasher.update(host.as_bytes());
    hasher.finalize().into()
}
