//! OAuth 2.0 Refresh Token Grant
//!
//! Implements the `refresh_token` grant of RFC 6749 section 6 with HTTP Basic
//! client authentication, the form the listening-history API expects.
//!
//! # Security
//!
//! - Client secret and tokens never appear in logs or `Debug` output
//! - Exactly one request per refresh; the caller decides whether to try again
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{OAuthConfig, RefreshTokenGrant};
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let config = OAuthConfig {
//!     client_id: "your-client-id".to_string(),
//!     client_secret: "your-client-secret".to_string(),
//!     token_url: "https://accounts.spotify.com/api/token".to_string(),
//! };
//!
//! let grant = RefreshTokenGrant::new(config, http_client);
//! let refreshed = grant.refresh("long-lived-refresh-token", chrono::Utc::now()).await?;
//! println!("Access token expires at: {}", refreshed.access_token.expires_at());
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::{AccessToken, RefreshedToken};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_traits::error::BridgeError;
use bridge_traits::http::{HttpClient, HttpRequest};
use chrono::{DateTime, Utc};
use core_runtime::WrappedConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Client registration used for the token endpoint.
#[derive(Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Token endpoint URL
    pub token_url: String,
}

impl OAuthConfig {
    pub fn from_config(config: &WrappedConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_url: config.token_url(),
        }
    }

    /// Value of the `Authorization` header: `Basic base64(client_id:client_secret)`.
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .finish()
    }
}

#[derive(Serialize)]
struct RefreshForm<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

/// Performs the refresh-token grant against the token endpoint.
pub struct RefreshTokenGrant {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
}

impl RefreshTokenGrant {
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// `now` anchors the relative `expires_in` of the response.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Connectivity`] when the endpoint cannot be reached
    /// - [`AuthError::TokenRefreshFailed`] on a non-2xx response
    /// - [`AuthError::InvalidResponse`] when the body is not a token response
    #[instrument(skip(self, refresh_token, now), fields(token_url = %self.config.token_url))]
    pub async fn refresh(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<RefreshedToken> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::MissingCredentials(
                "refresh token is empty".to_string(),
            ));
        }

        let body = serde_urlencoded::to_string(RefreshForm {
            grant_type: "refresh_token",
            refresh_token,
        })
        .map_err(|e| AuthError::InvalidResponse(format!("Failed to encode token request: {}", e)))?;

        let request = HttpRequest::post(self.config.token_url.clone())
            .header("Authorization", self.config.basic_auth_header())
            .form(body);

        debug!("Refreshing access token");

        let response = self.http_client.execute(request).await.map_err(|e| match e {
            BridgeError::Connectivity(reason) => AuthError::Connectivity(reason),
            other => AuthError::TokenRefreshFailed {
                status: None,
                reason: other.to_string(),
            },
        })?;

        if !response.is_success() {
            let status = response.status;
            let error_body = response.error_message();

            warn!(status, error = %error_body, "Token refresh rejected");

            return Err(AuthError::TokenRefreshFailed {
                status: Some(status),
                reason: error_body,
            });
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        if token_response.access_token.is_empty() {
            return Err(AuthError::InvalidResponse(
                "token response carried an empty access_token".to_string(),
            ));
        }

        let rotated = token_response
            .refresh_token
            .filter(|token| !token.is_empty());

        info!(
            expires_in = token_response.expires_in,
            rotated = rotated.is_some(),
            "Refreshed access token"
        );

        Ok(RefreshedToken {
            access_token: AccessToken::from_expires_in(
                token_response.access_token,
                token_response.expires_in,
                now,
            ),
            refresh_token: rotated,
        })
    }
}

/// Token response from the OAuth provider.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpMethod, HttpResponse};
    use chrono::TimeZone;
    use mockall::mock;

    mock! {
        pub Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn config() -> OAuthConfig {
        OAuthConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            token_url: "https://accounts.example.com/api/token".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_basic_auth_header() {
        // base64("client:secret")
        assert_eq!(config().basic_auth_header(), "Basic Y2xpZW50OnNlY3JldA==");
    }

    #[test]
    fn test_config_debug_redacts_secret() {
        let debug = format!("{:?}", config());
        assert!(debug.contains("client"));
        assert!(!debug.contains("\"secret\""));
    }

    #[tokio::test]
    async fn test_refresh_sends_form_and_basic_auth() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Post
                    && req.url == "https://accounts.example.com/api/token"
                    && req.headers.get("Authorization").map(String::as_str)
                        == Some("Basic Y2xpZW50OnNlY3JldA==")
                    && req.headers.get("Content-Type").map(String::as_str)
                        == Some("application/x-www-form-urlencoded")
                    && req.body.as_deref()
                        == Some(&b"grant_type=refresh_token&refresh_token=r%2Ftoken"[..])
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"access_token":"fresh","token_type":"Bearer","expires_in":1800}"#,
                ))
            });

        let grant = RefreshTokenGrant::new(config(), Arc::new(http));
        let refreshed = grant.refresh("r/token", now()).await.unwrap();

        assert_eq!(refreshed.access_token.secret(), "fresh");
        assert_eq!(
            refreshed.access_token.expires_at(),
            now() + chrono::Duration::seconds(1800)
        );
        assert!(refreshed.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_refresh_defaults_expiry_and_reports_rotation() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"access_token":"fresh","refresh_token":"rotated"}"#,
            ))
        });

        let grant = RefreshTokenGrant::new(config(), Arc::new(http));
        let refreshed = grant.refresh("old", now()).await.unwrap();

        assert_eq!(
            refreshed.access_token.expires_at(),
            now() + chrono::Duration::seconds(3600)
        );
        assert_eq!(refreshed.refresh_token.as_deref(), Some("rotated"));
    }

    #[tokio::test]
    async fn test_refresh_rejection_is_single_attempt() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(400, r#"{"error":"invalid_grant"}"#)));

        let grant = RefreshTokenGrant::new(config(), Arc::new(http));
        let err = grant.refresh("revoked", now()).await.unwrap_err();

        match err {
            AuthError::TokenRefreshFailed { status, reason } => {
                assert_eq!(status, Some(400));
                assert!(reason.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refresh_connectivity_error() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::Connectivity("timed out".to_string())));

        let grant = RefreshTokenGrant::new(config(), Arc::new(http));
        let err = grant.refresh("token", now()).await.unwrap_err();

        assert!(err.is_connectivity());
    }

    #[tokio::test]
    async fn test_refresh_invalid_body() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "<html>oops</html>")));

        let grant = RefreshTokenGrant::new(config(), Arc::new(http));
        let err = grant.refresh("token", now()).await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_refresh_token_makes_no_request() {
        let http = MockHttp::new();
        let grant = RefreshTokenGrant::new(config(), Arc::new(http));

        let err = grant.refresh("  ", now()).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials(_)));
    }

    #[test]
    fn test_token_response_deserialization_minimal() {
        let response: TokenResponse = serde_json::from_str(r#"{"access_token":"token"}"#).unwrap();
        assert_eq!(response.access_token, "token");
        assert_eq!(response.refresh_token, None);
        assert_eq!(response.expires_in, 3600);
    }

    #[test]
    fn test_token_response_ignores_extra_fields() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"token","token_type":"Bearer","scope":"user-top-read","expires_in":60}"#,
        )
        .unwrap();
        assert_eq!(response.access_token, "token");
        assert_eq!(response.expires_in, 60);
    }
}
