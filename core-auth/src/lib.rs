//! # Authentication Module
//!
//! Refresh-token credential management for the listening-history API.
//!
//! ## Overview
//!
//! The upstream API is accessed with a short-lived bearer token obtained from a
//! long-lived refresh token. This crate performs the refresh grant, caches the
//! resulting access token and renews it shortly before it expires or on demand
//! after the API rejects it.
//!
//! ## Features
//!
//! - Refresh-token grant with HTTP Basic client authentication
//! - Cached access token with a 60 second renewal buffer
//! - Forced renewal after an authorization failure
//! - Refresh token rotation when the endpoint issues a new one

pub mod error;
pub mod manager;
pub mod oauth;
pub mod types;

pub use error::{AuthError, Result};
pub use manager::{TokenManager, TOKEN_REFRESH_BUFFER_SECS};
pub use oauth::{OAuthConfig, RefreshTokenGrant};
pub use types::{AccessToken, RefreshedToken};
