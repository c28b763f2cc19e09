//! Middleware for the S3O gate.

pub mod gate;

pub use gate::{protect, require_s3o, GateState};
