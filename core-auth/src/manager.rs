//! # Token Manager
//!
//! Caches the bearer token and renews it through the refresh grant.
//!
//! ## Overview
//!
//! `TokenManager` is the single owner of the current refresh token and of the
//! cached access token. Callers ask for [`TokenManager::access_token`] before
//! every API call; the manager hands back the cached value until it is within
//! [`TOKEN_REFRESH_BUFFER_SECS`] of expiry. When the API rejects a token with
//! `401`, the caller uses [`TokenManager::force_refresh`] and retries once.
//!
//! The cache sits behind a `tokio::sync::Mutex` held across the refresh, so
//! concurrent callers wait for one refresh instead of issuing several.
//!
//! ## Usage
//!
//! ```no_run
//! use bridge_traits::time::SystemClock;
//! use core_auth::{OAuthConfig, RefreshTokenGrant, TokenManager};
//! use std::sync::Arc;
//! # use bridge_traits::http::HttpClient;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! # let config: OAuthConfig = todo!();
//! let grant = RefreshTokenGrant::new(config, http_client);
//! let tokens = TokenManager::new(grant, "refresh-token", Arc::new(SystemClock))?;
//!
//! let bearer = tokens.access_token().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::oauth::RefreshTokenGrant;
use crate::types::AccessToken;
use bridge_traits::time::Clock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Renew this many seconds before the token actually expires.
pub const TOKEN_REFRESH_BUFFER_SECS: i64 = 60;

struct TokenState {
    refresh_token: String,
    access: Option<AccessToken>,
}

/// Cached access token with renewal.
pub struct TokenManager {
    grant: RefreshTokenGrant,
    clock: Arc<dyn Clock>,
    state: Mutex<TokenState>,
}

impl TokenManager {
    /// Creates a manager that has not fetched any access token yet.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] for an empty refresh token.
    pub fn new(
        grant: RefreshTokenGrant,
        refresh_token: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let refresh_token = refresh_token.into();
        if refresh_token.trim().is_empty() {
            return Err(AuthError::MissingCredentials(
                "refresh token is required".to_string(),
            ));
        }

        Ok(Self {
            grant,
            clock,
            state: Mutex::new(TokenState {
                refresh_token,
                access: None,
            }),
        })
    }

    /// Returns a bearer token valid for at least the renewal buffer.
    ///
    /// Refreshes when no token is cached or the cached one is about to expire.
    #[instrument(skip(self))]
    pub async fn access_token(&self) -> Result<String> {
        let mut state = self.state.lock().await;

        let now = self.clock.now();
        let buffer = chrono::Duration::seconds(TOKEN_REFRESH_BUFFER_SECS);
        if let Some(token) = state.access.as_ref() {
            if !token.is_expired_with_buffer(now, buffer) {
                debug!("Token is valid, no refresh needed");
                return Ok(token.secret().to_string());
            }
            info!(expires_at = %token.expires_at(), "Token expiring soon, refreshing");
        }

        self.refresh_locked(&mut state).await
    }

    /// Discards the cached token and refreshes unconditionally.
    ///
    /// Used after the API answered `401` for a token that looked valid locally.
    #[instrument(skip(self))]
    pub async fn force_refresh(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        state.access = None;
        info!("Forcing token refresh");
        self.refresh_locked(&mut state).await
    }

    /// Expiry of the cached token, if any.
    pub async fn cached_expiry(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.state
            .lock()
            .await
            .access
            .as_ref()
            .map(AccessToken::expires_at)
    }

    async fn refresh_locked(&self, state: &mut TokenState) -> Result<String> {
        let refreshed = self
            .grant
            .refresh(&state.refresh_token, self.clock.now())
            .await?;

        if let Some(rotated) = refreshed.refresh_token {
            debug!("Refresh token rotated");
            state.refresh_token = rotated;
        }

        let secret = refreshed.access_token.secret().to_string();
        state.access = Some(refreshed.access_token);
        Ok(secret)
    }
}
