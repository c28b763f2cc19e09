//! HTTP request handlers for the S3O gate service.

pub mod hello;
pub mod metrics;

pub use hello::hello_world;
pub use metrics::metrics_handler;
