//! Typed extraction of callback credentials.
//!
//! The authority returns to the application with `username` and `token`
//! parameters, posted as an url-encoded form (`post=true`) and sometimes
//! also present in the query string. They are pulled out once, up front,
//! so the gate works on an explicit optional pair rather than raw lookups.

use crate::errors::AuthError;
use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, request::Parts, Method};
use url::form_urlencoded;

/// Largest form body buffered while looking for callback parameters (10 MiB).
pub const MAX_FORM_BODY_BYTES: usize = 10 * 1024 * 1024;

/// `username` and `token` as submitted by the authority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub username: Option<String>,
    pub token: Option<String>,
}

/// An authority callback: a non-empty username and its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback {
    pub username: String,
    pub token: String,
}

impl CallbackParams {
    /// Collect parameters from a form body and a query string.
    ///
    /// Body values take precedence over query values; the first occurrence
    /// of a name wins. Decoding is lenient: a malformed percent-escape such
    /// as `%zz` is kept literally rather than rejected.
    pub fn from_sources(body: Option<&[u8]>, query: Option<&str>) -> Self {
        let body_pairs = body.into_iter().flat_map(form_urlencoded::parse);
        let query_pairs = query
            .into_iter()
            .flat_map(|q| form_urlencoded::parse(q.as_bytes()));

        let mut params = Self::default();
        for (key, value) in body_pairs.chain(query_pairs) {
            match &*key {
                "username" if params.username.is_none() => {
                    params.username = Some(value.into_owned());
                }
                "token" if params.token.is_none() => params.token = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }

    /// The callback these parameters describe, if any.
    ///
    /// A callback needs a non-empty username; a missing token is treated as
    /// empty and left for verification to reject.
    pub fn callback(self) -> Option<Callback> {
        let username = self.username.filter(|u| !u.is_empty())?;
        Some(Callback {
            username,
            token: self.token.unwrap_or_default(),
        })
    }
}

/// Read callback parameters from a request.
///
/// Only `POST` requests with an url-encoded form body have their body
/// buffered. The returned body replays exactly what was read so the request
/// can still be handed downstream.
///
/// # Errors
///
/// Returns `AuthError::Internal` if the body cannot be read or exceeds
/// `MAX_FORM_BODY_BYTES`.
pub async fn extract_callback_params(
    parts: &Parts,
    body: Body,
) -> Result<(CallbackParams, Body), AuthError> {
    if !is_form_post(parts) {
        let params = CallbackParams::from_sources(None, parts.uri.query());
        return Ok((params, body));
    }

    let bytes: Bytes = to_bytes(body, MAX_FORM_BODY_BYTES)
        .await
        .map_err(|e| AuthError::Internal(format!("failed to read form body: {e}")))?;

    let params = CallbackParams::from_sources(Some(bytes.as_ref()), parts.uri.query());
    Ok((params, Body::from(bytes)))
}

fn is_form_post(parts: &Parts) -> bool {
    parts.method == Method::POST
        && parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .is_some_and(|v| {
                v.trim()
                    .eq_ignore_ascii_case("application/x-www-form-urlencoded")
            })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::Request;
    use http_body_util::BodyExt;

    fn form_post(uri: &str, body: &str) -> (Parts, Body) {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
            .into_parts()
    }

    #[test]
    fn test_from_body() {
        let params = CallbackParams::from_sources(
            Some(b"username=jane.doe&token=dG9r%2BZW4%3D".as_slice()),
            None,
        );
        assert_eq!(params.username.as_deref(), Some("jane.doe"));
        assert_eq!(params.token.as_deref(), Some("dG9r+ZW4="));
    }

    #[test]
    fn test_body_takes_precedence_over_query() {
        let params = CallbackParams::from_sources(
            Some(b"username=from-body".as_slice()),
            Some("username=from-query&token=from-query"),
        );
        assert_eq!(params.username.as_deref(), Some("from-body"));
        assert_eq!(params.token.as_deref(), Some("from-query"));
    }

    #[test]
    fn test_first_value_wins() {
        let params = CallbackParams::from_sources(None, Some("username=first&username=second"));
        assert_eq!(params.username.as_deref(), Some("first"));
    }

    #[test]
    fn test_malformed_escape_is_kept_literally() {
        let params = CallbackParams::from_sources(None, Some("a=%zz&username=jane%zz&token=ab%2"));
        assert_eq!(params.username.as_deref(), Some("jane%zz"));
        assert_eq!(params.token.as_deref(), Some("ab%2"));
    }

    #[test]
    fn test_callback_requires_non_empty_username() {
        let empty = CallbackParams::from_sources(None, Some("username=&token=abc"));
        assert_eq!(empty.callback(), None);

        let missing = CallbackParams::from_sources(None, Some("token=abc"));
        assert_eq!(missing.callback(), None);
    }

    #[test]
    fn test_callback_with_missing_token_is_empty_token() {
        let params = CallbackParams::from_sources(None, Some("username=jane.doe"));
        assert_eq!(
            params.callback(),
            Some(Callback {
                username: "jane.doe".to_string(),
                token: String::new(),
            })
        );
    }

    #[tokio::test]
    async fn test_extract_from_form_post_replays_body() {
        let (parts, body) = form_post("/hello?username=jane.doe", "token=abc&other=1");

        let (params, body) = extract_callback_params(&parts, body).await.unwrap();
        assert_eq!(params.username.as_deref(), Some("jane.doe"));
        assert_eq!(params.token.as_deref(), Some("abc"));

        let replayed = body.collect().await.unwrap().to_bytes();
        assert_eq!(&replayed[..], b"token=abc&other=1");
    }

    #[tokio::test]
    async fn test_extract_ignores_body_of_non_form_post() {
        let (parts, body) = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"username\":\"x\"}"))
            .unwrap()
            .into_parts();

        let (params, body) = extract_callback_params(&parts, body).await.unwrap();
        assert_eq!(params, CallbackParams::default());

        let replayed = body.collect().await.unwrap().to_bytes();
        assert_eq!(&replayed[..], b"{\"username\":\"x\"}");
    }

    #[tokio::test]
    async fn test_extract_from_get_query() {
        let (parts, body) = Request::builder()
            .uri("/hello?username=jane.doe&token=abc")
            .body(Body::empty())
            .unwrap()
            .into_parts();

        let (params, _) = extract_callback_params(&parts, body).await.unwrap();
        assert_eq!(params.username.as_deref(), Some("jane.doe"));
    }

    #[tokio::test]
    async fn test_extract_content_type_with_charset() {
        let (parts, body) = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded; charset=UTF-8",
            )
            .body(Body::from("username=jane.doe"))
            .unwrap()
            .into_parts();

        let (params, _) = extract_callback_params(&parts, body).await.unwrap();
        assert_eq!(params.username.as_deref(), Some("jane.doe"));
    }

    #[tokio::test]
    async fn test_extract_oversized_body_is_internal_error() {
        let oversized = "a".repeat(MAX_FORM_BODY_BYTES + 1);
        let (parts, body) = form_post("/", &oversized);

        let err = extract_callback_params(&parts, body).await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }
}
