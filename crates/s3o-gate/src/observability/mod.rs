//! Observability for the S3O gate.
//!
//! Provides metrics definitions and the Prometheus recorder setup.

pub mod metrics;
