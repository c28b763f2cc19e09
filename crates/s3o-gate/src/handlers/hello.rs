//! The protected demo handler.

use axum::http::Uri;

/// Handler for every path behind the gate.
///
/// Only reached once the gate has verified the session cookies.
pub async fn hello_world(uri: Uri) -> String {
    tracing::debug!(target: "s3o.handlers.hello", path = %uri.path(), "Serving protected content");
    "hello world".to_string()
}
