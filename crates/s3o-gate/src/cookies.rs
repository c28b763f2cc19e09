//! Session cookies.
//!
//! A session is the pair of cookies `s3o_username` and `s3o_token` holding
//! an identity assertion from a previous authority callback. The cookies
//! carry no authority of their own: every request presenting them is
//! verified again.

use crate::errors::AuthError;
use axum::http::{header, HeaderMap, HeaderValue};
use httpdate::fmt_http_date;
use std::time::{Duration, SystemTime};

/// Cookie holding the authenticated username.
pub const USERNAME_COOKIE: &str = "s3o_username";

/// Cookie holding the authority's signature token.
pub const TOKEN_COOKIE: &str = "s3o_token";

/// Default session cookie lifetime in seconds (about 10.4 days).
pub const DEFAULT_COOKIE_MAX_AGE_SECONDS: u64 = 900_000;

/// How far in the past a cleared cookie's expiry is set.
const CLEARED_COOKIE_AGE: Duration = Duration::from_secs(3600);

/// Username and token read back from the session cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub token: String,
}

/// Issues, reads and invalidates the session cookies.
#[derive(Debug, Clone)]
pub struct SessionCookies {
    max_age: Duration,
}

impl SessionCookies {
    /// Create a cookie manager issuing cookies with the given lifetime.
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    /// Lifetime of issued cookies.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Append `Set-Cookie` headers establishing a session.
    ///
    /// Both cookies are `HttpOnly` and scoped to the whole host.
    pub fn issue(
        &self,
        headers: &mut HeaderMap,
        username: &str,
        token: &str,
    ) -> Result<(), AuthError> {
        for (name, value) in [(USERNAME_COOKIE, username), (TOKEN_COOKIE, token)] {
            let cookie = format!(
                "{name}={}; Path=/; Max-Age={}; HttpOnly",
                sanitize_cookie_value(value),
                self.max_age.as_secs()
            );
            headers.append(header::SET_COOKIE, header_value(&cookie)?);
        }
        Ok(())
    }

    /// Read the session from the request's `Cookie` headers.
    ///
    /// Returns `None` unless both cookies are present; a lone username or
    /// token cookie is the same as no session.
    pub fn read(headers: &HeaderMap) -> Option<Session> {
        let username = find_cookie(headers, USERNAME_COOKIE)?;
        let token = find_cookie(headers, TOKEN_COOKIE)?;
        Some(Session { username, token })
    }

    /// Append `Set-Cookie` headers deleting every session cookie the
    /// request carried.
    ///
    /// Each cleared cookie has an empty value and an expiry in the past.
    pub fn invalidate(request_headers: &HeaderMap, response_headers: &mut HeaderMap) {
        let expired = fmt_http_date(
            SystemTime::now()
                .checked_sub(CLEARED_COOKIE_AGE)
                .unwrap_or(SystemTime::UNIX_EPOCH),
        );

        for name in [USERNAME_COOKIE, TOKEN_COOKIE] {
            if find_cookie(request_headers, name).is_none() {
                continue;
            }
            let cookie = format!("{name}=; Expires={expired}; Max-Age=0; Path=/; HttpOnly");
            // Cookie names and HTTP dates are always valid header values
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response_headers.append(header::SET_COOKIE, value);
            }
        }
    }
}

impl Default for SessionCookies {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_COOKIE_MAX_AGE_SECONDS))
    }
}

/// Set headers preventing any cache from storing an authentication decision.
pub fn apply_no_cache_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("private, no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
}

/// First value of the named cookie across all `Cookie` headers.
fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| strip_quotes(value).to_string())
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Drop bytes that are not allowed in a cookie value; quote values that
/// contain a space or comma.
fn sanitize_cookie_value(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| matches!(c, ' '..='~') && !matches!(c, '"' | ';' | '\\'))
        .collect();

    if cleaned.contains(' ') || cleaned.contains(',') {
        format!("\"{cleaned}\"")
    } else {
        cleaned
    }
}

fn header_value(value: &str) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(value)
        .map_err(|e| AuthError::Internal(format!("invalid Set-Cookie header: {e}")))
}
