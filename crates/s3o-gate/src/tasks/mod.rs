//! Background tasks for the S3O gate.
//!
//! # Tasks
//!
//! - `key_refresh` - Periodically re-fetches the authority's public key into the `KeyCache`

pub mod key_refresh;

pub use key_refresh::{refresh_once, spawn_key_refresh, start_key_refresh};
