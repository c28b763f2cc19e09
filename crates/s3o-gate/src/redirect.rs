//! Redirect URLs for the authentication handshake.
//!
//! Requests without credentials are sent to the authority's authenticate
//! endpoint with the original URL as the `redirect` parameter. After the
//! authority posts back, the client is sent to the original URL minus the
//! `username` parameter the authority appended.

use axum::extract::OriginalUri;
use axum::http::{request::Parts, uri::Scheme, HeaderMap, Uri};
use url::{form_urlencoded, Url};

/// Default authenticate endpoint of the authority.
pub const DEFAULT_AUTHENTICATE_URL: &str = "https://s3o.ft.com/v2/authenticate/";

/// Header set by TLS-terminating proxies to report the client's scheme.
const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// The URL the client originally asked for, minus any fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    /// `http` or `https`.
    pub scheme: &'static str,

    /// Host as sent by the client, including any port.
    pub host: String,

    /// Path in its raw, percent-encoded form.
    pub path: String,

    /// Raw query string without the leading `?`.
    pub query: Option<String>,
}

impl RequestTarget {
    /// Reconstruct the target of an incoming request.
    ///
    /// Uses the URI as the client sent it, so a gate mounted under
    /// `Router::nest` still sees the full path including the mount prefix.
    pub fn from_parts(parts: &Parts) -> Self {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| &original.0)
            .unwrap_or(&parts.uri);

        Self {
            scheme: detect_scheme(&parts.headers, uri),
            host: request_host(&parts.headers, uri),
            path: uri.path().to_string(),
            query: uri
                .query()
                .filter(|q| !q.is_empty())
                .map(str::to_string),
        }
    }

    /// `scheme://host path[?query]`.
    pub fn original_url(&self) -> String {
        match &self.query {
            Some(query) => format!("{}://{}{}?{}", self.scheme, self.host, self.path, query),
            None => format!("{}://{}{}", self.scheme, self.host, self.path),
        }
    }
}

/// Scheme the client used, honouring `X-Forwarded-Proto` from a proxy.
///
/// Defaults to `http` when nothing indicates TLS.
pub fn detect_scheme(headers: &HeaderMap, uri: &Uri) -> &'static str {
    let forwarded_https = headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("https"));

    if forwarded_https || uri.scheme() == Some(&Scheme::HTTPS) {
        "https"
    } else {
        "http"
    }
}

/// Host from the `Host` header, falling back to the URI authority.
pub fn request_host(headers: &HeaderMap, uri: &Uri) -> String {
    headers
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
        .unwrap_or_default()
}

/// Build the authority URL that starts authentication for `target`.
///
/// Adds `post=true` so the authority calls back with a form POST, the
/// escaped original URL as `redirect`, and the escaped host as `host`.
///
/// Values are escaped as `application/x-www-form-urlencoded`: `~` becomes
/// `%7E` while `*` is left as is. Go's `url.QueryEscape` does the opposite
/// for both bytes; the decoded values are identical.
pub fn build_auth_redirect(authenticate_url: &Url, target: &RequestTarget) -> Url {
    let mut url = authenticate_url.clone();
    url.query_pairs_mut()
        .append_pair("post", "true")
        .append_pair("redirect", &target.original_url())
        .append_pair("host", &target.host);
    url
}

/// The original URL with the authority's `username` parameter removed.
///
/// A root path is dropped so the result stays a valid URL when a query
/// string follows directly after the host.
pub fn clean_callback_url(target: &RequestTarget, username: &str) -> String {
    let path = if target.path == "/" { "" } else { &target.path };
    let query = target
        .query
        .as_deref()
        .map(|q| strip_username_param(q, username))
        .unwrap_or_default();

    if query.is_empty() {
        format!("{}://{}{}", target.scheme, target.host, path)
    } else {
        format!("{}://{}{}?{}", target.scheme, target.host, path, query)
    }
}

/// Remove every `username=<username>` pair from a raw query string.
///
/// Other pairs are kept verbatim and in order. Empty segments are dropped,
/// so no leading, trailing or doubled `&` remains.
pub fn strip_username_param(query: &str, username: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty() && !is_username_pair(pair, username))
        .collect::<Vec<_>>()
        .join("&")
}

fn is_username_pair(pair: &str, username: &str) -> bool {
    form_urlencoded::parse(pair.as_bytes())
        .next()
        .is_some_and(|(key, value)| key == "username" && value == username)
}
