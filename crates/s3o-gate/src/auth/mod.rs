//! Authentication module for the S3O gate.
//!
//! Provides the public key cache, the fetch of the authority's key, and
//! verification of identity assertions against the cached key.

pub mod key_cache;
pub mod public_key;
pub mod verifier;

pub use key_cache::{KeyCache, DEFAULT_REFRESH_PERIOD_SECONDS};
pub use public_key::{parse_public_key, PublicKeyFetcher, DEFAULT_PUBLIC_KEY_URL};
pub use verifier::{assertion_digest, SignatureVerifier};
