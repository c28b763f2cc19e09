//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for responses produced by the gate.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;

/// Custom assertions for gate responses
///
/// # Example
/// ```rust,ignore
/// response
///     .assert_status(StatusCode::FOUND)
///     .assert_no_cache_headers()
///     .assert_location(expected);
/// ```
pub trait GateResponseAssertions {
    /// Assert the response status.
    fn assert_status(&self, status: StatusCode) -> &Self;

    /// Assert the cache-prevention headers are all present.
    fn assert_no_cache_headers(&self) -> &Self;

    /// Assert the exact `Location` header.
    fn assert_location(&self, expected: &str) -> &Self;

    /// Assert a `Set-Cookie` header sets `name` to `value`.
    fn assert_sets_cookie(&self, name: &str, value: &str) -> &Self;

    /// Assert a `Set-Cookie` header clears `name` with an expiry in the past.
    fn assert_clears_cookie(&self, name: &str) -> &Self;

    /// Assert no `Set-Cookie` header is present at all.
    fn assert_no_cookies(&self) -> &Self;
}

impl GateResponseAssertions for Response {
    fn assert_status(&self, status: StatusCode) -> &Self {
        assert_eq!(self.status(), status, "Unexpected response status");
        self
    }

    fn assert_no_cache_headers(&self) -> &Self {
        assert_eq!(
            header_str(self, header::CACHE_CONTROL.as_str()),
            Some("private, no-cache, no-store, must-revalidate")
        );
        assert_eq!(header_str(self, header::PRAGMA.as_str()), Some("no-cache"));
        assert_eq!(header_str(self, header::EXPIRES.as_str()), Some("0"));
        self
    }

    fn assert_location(&self, expected: &str) -> &Self {
        assert_eq!(
            header_str(self, header::LOCATION.as_str()),
            Some(expected),
            "Unexpected Location header"
        );
        self
    }

    fn assert_sets_cookie(&self, name: &str, value: &str) -> &Self {
        let prefix = format!("{name}={value};");
        let cookies = set_cookies(self);
        assert!(
            cookies.iter().any(|c| c.starts_with(&prefix)),
            "Expected Set-Cookie starting with {prefix:?}, got {cookies:?}"
        );
        self
    }

    fn assert_clears_cookie(&self, name: &str) -> &Self {
        let prefix = format!("{name}=; Expires=");
        let cookies = set_cookies(self);
        assert!(
            cookies
                .iter()
                .any(|c| c.starts_with(&prefix) && c.contains("Max-Age=0")),
            "Expected Set-Cookie clearing {name:?}, got {cookies:?}"
        );
        self
    }

    fn assert_no_cookies(&self) -> &Self {
        let cookies = set_cookies(self);
        assert!(cookies.is_empty(), "Expected no cookies, got {cookies:?}");
        self
    }
}

/// All `Set-Cookie` header values on a response.
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().expect("Set-Cookie should be ASCII").to_string())
        .collect()
}

/// Consume a response and return its body as a string.
pub async fn body_string(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body should be readable")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("response body should be UTF-8")
}

/// Consume a body and return it as a string.
pub async fn read_body(body: Body) -> String {
    let bytes = body
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

fn header_str<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}
