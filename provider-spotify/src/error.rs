//! Error types for the Spotify provider

use core_auth::AuthError;
use thiserror::Error;

/// Spotify provider errors
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// API request returned a non-2xx status
    #[error("Spotify API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Connectivity(String),

    /// Access token could not be obtained
    #[error("Authentication failed: {0}")]
    Auth(AuthError),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SpotifyError {
    /// HTTP status of an API error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SpotifyError::ApiError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, SpotifyError::Connectivity(_))
    }
}

impl From<AuthError> for SpotifyError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Connectivity(reason) => SpotifyError::Connectivity(reason),
            other => SpotifyError::Auth(other),
        }
    }
}

impl From<bridge_traits::error::BridgeError> for SpotifyError {
    fn from(error: bridge_traits::error::BridgeError) -> Self {
        match error {
            bridge_traits::error::BridgeError::Connectivity(reason) => {
                SpotifyError::Connectivity(reason)
            }
            bridge_traits::error::BridgeError::OperationFailed(reason) => {
                SpotifyError::InvalidRequest(reason)
            }
        }
    }
}

/// Result type for Spotify operations
pub type Result<T> = std::result::Result<T, SpotifyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;

    #[test]
    fn test_error_display() {
        let error = SpotifyError::ApiError {
            status_code: 429,
            message: "rate limited".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Spotify API error (status 429): rate limited"
        );
        assert_eq!(error.status_code(), Some(429));
    }

    #[test]
    fn test_auth_connectivity_stays_connectivity() {
        let error: SpotifyError = AuthError::Connectivity("dns".to_string()).into();
        assert!(error.is_connectivity());

        let error: SpotifyError = AuthError::TokenRefreshFailed {
            status: Some(400),
            reason: "invalid_grant".to_string(),
        }
        .into();
        assert!(matches!(error, SpotifyError::Auth(_)));
    }

    #[test]
    fn test_bridge_error_conversion() {
        let error: SpotifyError = BridgeError::Connectivity("timed out".to_string()).into();
        assert!(error.is_connectivity());

        let error: SpotifyError = BridgeError::OperationFailed("bad url".to_string()).into();
        assert!(matches!(error, SpotifyError::InvalidRequest(_)));
    }
}
