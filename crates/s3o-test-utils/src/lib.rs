//! # S3O Test Utilities
//!
//! Shared test utilities for the S3O gate.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (fixed RSA keys for reproducible tests)
//! - A mocked authority serving the public key endpoint
//! - Custom assertions (GateResponseAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use s3o_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let keypair = test_keypair(1)?;
//!     let authority = MockAuthority::serving(&keypair).await;
//!
//!     let token = keypair.sign_assertion("jane.doe", "example.com");
//!
//!     response
//!         .assert_status(StatusCode::FOUND)
//!         .assert_sets_cookie("s3o_token", &token);
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod mock_authority;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use mock_authority::*;
