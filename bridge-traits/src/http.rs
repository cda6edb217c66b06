//! HTTP Client Abstraction
//!
//! Provides a single-shot async HTTP operation. Retrying is the caller's call:
//! the upstream client only re-issues a request after renewing an expired
//! credential.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Longest error text kept from a response body
const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// The API client only reads (`GET`) and exchanges tokens (`POST`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    /// Overrides the client-wide timeout for this call
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.as_ref()))
    }

    pub fn accept_json(self) -> Self {
        self.header("Accept", "application/json")
    }

    /// Attach an `application/x-www-form-urlencoded` body.
    pub fn form(mut self, encoded: impl Into<String>) -> Self {
        self.body = Some(Bytes::from(encoded.into()));
        self.header("Content-Type", "application/x-www-form-urlencoded")
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Apply `duration` when one is given.
    pub fn maybe_timeout(self, duration: Option<Duration>) -> Self {
        match duration {
            Some(duration) => self.timeout(duration),
            None => self,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercase
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

/// Error bodies of the Web API and of the token endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Api {
        error: ApiErrorDetail,
    },
    OAuth {
        error: String,
        #[serde(default)]
        error_description: Option<String>,
    },
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON deserialization failed: {}", e))
        })
    }

    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e)))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `401 Unauthorized`, the only status the upstream client reacts to.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Readable message for a failed response.
    ///
    /// `{"error": {"message": ..}}` yields the message, `{"error": "code",
    /// "error_description": ..}` yields `code: description`. Other bodies are
    /// returned as lossy text.
    pub fn error_message(&self) -> String {
        let message = match serde_json::from_slice::<ErrorBody>(&self.body) {
            Ok(ErrorBody::Api {
                error: ApiErrorDetail { message: Some(message) },
            }) => message,
            Ok(ErrorBody::OAuth {
                error,
                error_description: Some(description),
            }) => format!("{error}: {description}"),
            Ok(ErrorBody::OAuth { error, .. }) => error,
            _ => String::from_utf8_lossy(&self.body).trim().to_string(),
        };

        if message.is_empty() {
            format!("HTTP {}", self.status)
        } else {
            message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
        }
    }
}

/// Async HTTP client trait
///
/// Implementations execute exactly one attempt per call. A non-2xx status is
/// not an error at this layer: it comes back as an [`HttpResponse`] so the
/// caller can decide (for example, renew a token on `401`). Only failures that
/// produce no response at all are returned as errors.
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest};
///
/// async fn fetch_profile(client: &dyn HttpClient, token: &str) -> Result<String> {
///     let request = HttpRequest::get("https://api.spotify.com/v1/me")
///         .bearer_token(token)
///         .accept_json();
///
///     client.execute(request).await?.text()
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// # Errors
    ///
    /// [`BridgeError::Connectivity`] when the request times out or no
    /// connection can be made, [`BridgeError::OperationFailed`] for any other
    /// transport failure.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_request_builder() {
        let request = HttpRequest::get("https://api.spotify.com/v1/me")
            .bearer_token("secret")
            .accept_json()
            .maybe_timeout(Some(Duration::from_secs(30)));

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(
            request.headers.get("Authorization"),
            Some(&"Bearer secret".to_string())
        );
        assert_eq!(
            request.headers.get("Accept"),
            Some(&"application/json".to_string())
        );
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
        assert!(request.body.is_none());

        assert!(HttpRequest::get("x").maybe_timeout(None).timeout.is_none());
    }

    #[test]
    fn test_form_body_sets_content_type() {
        let request = HttpRequest::post("https://accounts.spotify.com/api/token")
            .form("grant_type=refresh_token");

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.headers.get("Content-Type"),
            Some(&"application/x-www-form-urlencoded".to_string())
        );
        assert_eq!(
            request.body,
            Some(Bytes::from_static(b"grant_type=refresh_token"))
        );
    }

    #[test]
    fn test_status_checks() {
        assert!(HttpResponse::new(204, "").is_success());

        let unauthorized = HttpResponse::new(401, "");
        assert!(unauthorized.is_unauthorized());
        assert!(!unauthorized.is_success());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let response = HttpResponse::new(429, "").with_header("Retry-After", "3");
        assert_eq!(response.header("retry-after"), Some("3"));
        assert_eq!(response.header("RETRY-AFTER"), Some("3"));
        assert_eq!(response.header("etag"), None);
    }

    #[test]
    fn test_json_body() {
        #[derive(serde::Deserialize)]
        struct Body {
            id: String,
        }

        let response = HttpResponse::new(200, r#"{"id":"abc"}"#);
        let body: Body = response.json().unwrap();
        assert_eq!(body.id, "abc");

        let broken = HttpResponse::new(200, "not json");
        assert!(broken.json::<Body>().is_err());
    }

    #[test]
    fn test_error_message_shapes() {
        let api = HttpResponse::new(
            401,
            r#"{"error":{"status":401,"message":"The access token expired"}}"#,
        );
        assert_eq!(api.error_message(), "The access token expired");

        let oauth = HttpResponse::new(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid refresh token"}"#,
        );
        assert_eq!(oauth.error_message(), "invalid_grant: Invalid refresh token");

        let bare = HttpResponse::new(400, r#"{"error":"invalid_client"}"#);
        assert_eq!(bare.error_message(), "invalid_client");

        assert_eq!(HttpResponse::new(502, " Bad Gateway\n").error_message(), "Bad Gateway");
        assert_eq!(HttpResponse::new(500, "").error_message(), "HTTP 500");
        assert_eq!(
            HttpResponse::new(500, "x".repeat(500)).error_message().len(),
            MAX_ERROR_MESSAGE_CHARS
        );
    }
}
