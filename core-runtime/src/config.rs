//! # Configuration Module
//!
//! Explicit configuration for the listening-history core.
//!
//! ## Overview
//!
//! A [`WrappedConfig`] value is built once at startup and handed to every
//! constructor that needs it (the token manager, the upstream connector, the
//! ingestion jobs). There is no process-wide cached instance.
//!
//! Two ways to build one:
//!
//! - [`WrappedConfig::builder()`] for programmatic construction and tests
//! - [`WrappedConfig::from_env()`] for hosts that configure through environment
//!   variables
//!
//! Both paths run the same [`validate()`](WrappedConfig::validate) step.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::WrappedConfig;
//!
//! let config = WrappedConfig::builder()
//!     .with_client_id("client-id")
//!     .with_client_secret("client-secret")
//!     .with_refresh_token("refresh-token")
//!     .with_database_path("/var/lib/wrapped/history.db")
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Missing credentials are reported together so a misconfigured host sees the
//! whole list at once:
//!
//! ```text
//! Configuration error: Missing environment variables: SPOTIFY_CLIENT_SECRET, SPOTIFY_REFRESH_TOKEN
//! ```

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "SPOTIFY_REFRESH_TOKEN";
pub const ENV_API_BASE: &str = "SPOTIFY_API_BASE";
pub const ENV_AUTH_BASE: &str = "SPOTIFY_AUTH_BASE";
pub const ENV_REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";
pub const ENV_DATABASE_PATH: &str = "DATABASE_PATH";
pub const ENV_RECENT_INGEST_LIMIT: &str = "RECENT_INGEST_LIMIT";
pub const ENV_IMPORT_BATCH_SIZE: &str = "IMPORT_BATCH_SIZE";
pub const ENV_ARTWORK_BATCH_LIMIT: &str = "ARTWORK_BATCH_LIMIT";

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_BASE: &str = "https://accounts.spotify.com/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_RECENT_INGEST_LIMIT: usize = 50;
pub const DEFAULT_IMPORT_BATCH_SIZE: usize = 500;
pub const DEFAULT_ARTWORK_BATCH_LIMIT: usize = 500;

/// Runtime configuration for the upstream client, store and jobs.
#[derive(Clone)]
pub struct WrappedConfig {
    /// OAuth client id
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Long-lived refresh token used for the refresh-token grant
    pub refresh_token: String,

    /// Web API base URL, without trailing slash
    pub api_base: String,

    /// Accounts service base URL; the token endpoint is `{auth_base}/token`
    pub auth_base: String,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    /// SQLite file holding the play history
    pub database_path: Option<PathBuf>,

    /// How many recent plays one live ingestion run fetches
    pub recent_ingest_limit: usize,

    /// Rows per store call during bulk export import
    pub import_batch_size: usize,

    /// Maximum track ids handled by one artwork backfill run
    pub artwork_batch_limit: usize,
}

impl WrappedConfig {
    /// Creates a new builder for constructing a `WrappedConfig`.
    pub fn builder() -> WrappedConfigBuilder {
        WrappedConfigBuilder::default()
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let missing: Vec<&str> = [ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_REFRESH_TOKEN]
            .into_iter()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing environment variables: {}",
                missing.join(", ")
            )));
        }

        let mut builder = WrappedConfig::builder()
            .with_client_id(get(ENV_CLIENT_ID).unwrap_or_default())
            .with_client_secret(get(ENV_CLIENT_SECRET).unwrap_or_default())
            .with_refresh_token(get(ENV_REFRESH_TOKEN).unwrap_or_default());

        if let Some(api_base) = get(ENV_API_BASE) {
            builder = builder.with_api_base(api_base);
        }
        if let Some(auth_base) = get(ENV_AUTH_BASE) {
            builder = builder.with_auth_base(auth_base);
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT) {
            let secs = parse_number::<u64>(ENV_REQUEST_TIMEOUT, &raw)?;
            builder = builder.with_request_timeout(Duration::from_secs(secs));
        }
        if let Some(path) = get(ENV_DATABASE_PATH) {
            builder = builder.with_database_path(path);
        }
        if let Some(raw) = get(ENV_RECENT_INGEST_LIMIT) {
            builder = builder.with_recent_ingest_limit(parse_number(ENV_RECENT_INGEST_LIMIT, &raw)?);
        }
        if let Some(raw) = get(ENV_IMPORT_BATCH_SIZE) {
            builder = builder.with_import_batch_size(parse_number(ENV_IMPORT_BATCH_SIZE, &raw)?);
        }
        if let Some(raw) = get(ENV_ARTWORK_BATCH_LIMIT) {
            builder = builder.with_artwork_batch_limit(parse_number(ENV_ARTWORK_BATCH_LIMIT, &raw)?);
        }

        builder.build()
    }

    /// Token endpoint for the refresh-token grant.
    pub fn token_url(&self) -> String {
        format!("{}/token", self.auth_base)
    }

    /// The store location, or a configuration error when none was given.
    ///
    /// Jobs and period reports call this at startup; live reports never touch
    /// the store and run without it.
    pub fn require_database_path(&self) -> Result<&Path> {
        self.database_path.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "{} is required to use the play history store",
                ENV_DATABASE_PATH
            ))
        })
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config("Client id cannot be empty".to_string()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(Error::Config("Client secret cannot be empty".to_string()));
        }
        if self.refresh_token.trim().is_empty() {
            return Err(Error::Config("Refresh token cannot be empty".to_string()));
        }
        if self.api_base.trim().is_empty() {
            return Err(Error::Config("API base URL cannot be empty".to_string()));
        }
        if self.auth_base.trim().is_empty() {
            return Err(Error::Config("Auth base URL cannot be empty".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than 0 seconds".to_string(),
            ));
        }
        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }
        if self.recent_ingest_limit == 0 {
            return Err(Error::Config(
                "Recent ingest limit must be greater than 0".to_string(),
            ));
        }
        if self.import_batch_size == 0 {
            return Err(Error::Config(
                "Import batch size must be greater than 0".to_string(),
            ));
        }
        if self.artwork_batch_limit == 0 {
            return Err(Error::Config(
                "Artwork batch limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for WrappedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("auth_base", &self.auth_base)
            .field("request_timeout", &self.request_timeout)
            .field("database_path", &self.database_path)
            .field("recent_ingest_limit", &self.recent_ingest_limit)
            .field("import_batch_size", &self.import_batch_size)
            .field("artwork_batch_limit", &self.artwork_batch_limit)
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got '{}'", key, raw)))
}

/// Builder for constructing [`WrappedConfig`] instances.
#[derive(Default)]
pub struct WrappedConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    api_base: Option<String>,
    auth_base: Option<String>,
    request_timeout: Option<Duration>,
    database_path: Option<PathBuf>,
    recent_ingest_limit: Option<usize>,
    import_batch_size: Option<usize>,
    artwork_batch_limit: Option<usize>,
}

impl WrappedConfigBuilder {
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Override the Web API base URL. A trailing slash is stripped.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into().trim_end_matches('/').to_string());
        self
    }

    /// Override the accounts base URL. A trailing slash is stripped.
    pub fn with_auth_base(mut self, auth_base: impl Into<String>) -> Self {
        self.auth_base = Some(auth_base.into().trim_end_matches('/').to_string());
        self
    }

    /// Default: 15 seconds
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Default: 50
    pub fn with_recent_ingest_limit(mut self, limit: usize) -> Self {
        self.recent_ingest_limit = Some(limit);
        self
    }

    /// Default: 500
    pub fn with_import_batch_size(mut self, size: usize) -> Self {
        self.import_batch_size = Some(size);
        self
    }

    /// Default: 500
    pub fn with_artwork_batch_limit(mut self, limit: usize) -> Self {
        self.artwork_batch_limit = Some(limit);
        self
    }

    /// Builds the configuration and validates it.
    pub fn build(self) -> Result<WrappedConfig> {
        let client_id = self.client_id.ok_or_else(|| {
            Error::Config("Client id is required. Use .with_client_id() to set it.".to_string())
        })?;
        let client_secret = self.client_secret.ok_or_else(|| {
            Error::Config(
                "Client secret is required. Use .with_client_secret() to set it.".to_string(),
            )
        })?;
        let refresh_token = self.refresh_token.ok_or_else(|| {
            Error::Config(
                "Refresh token is required. Use .with_refresh_token() to set it.".to_string(),
            )
        })?;

        let config = WrappedConfig {
            client_id,
            client_secret,
            refresh_token,
            api_base: self.api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            auth_base: self.auth_base.unwrap_or_else(|| DEFAULT_AUTH_BASE.to_string()),
            request_timeout: self
                .request_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            database_path: self.database_path,
            recent_ingest_limit: self
                .recent_ingest_limit
                .unwrap_or(DEFAULT_RECENT_INGEST_LIMIT),
            import_batch_size: self.import_batch_size.unwrap_or(DEFAULT_IMPORT_BATCH_SIZE),
            artwork_batch_limit: self
                .artwork_batch_limit
                .unwrap_or(DEFAULT_ARTWORK_BATCH_LIMIT),
        };

        config.validate()?;

        Ok(config)
    }
}
