use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("Upstream error: {0}")]
    Spotify(#[from] provider_spotify::SpotifyError),

    #[error("History store error: {0}")]
    History(#[from] core_history::HistoryError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Import of {path} failed: {reason}")]
    Import { path: PathBuf, reason: String },
}

/// Coarse failure class, for hosts that map errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client misconfiguration, fix the settings
    Configuration,
    /// Credentials rejected or token exchange failed
    Authentication,
    /// Upstream answered with an error or an unreadable body
    Upstream,
    /// Upstream could not be reached
    Connectivity,
    /// Bad caller input
    InvalidInput,
    /// Local storage or import failure
    Storage,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        use core_auth::AuthError;
        use provider_spotify::SpotifyError;

        match self {
            CoreError::InitializationFailed(_) | CoreError::Config(_) => ErrorKind::Configuration,
            CoreError::Auth(AuthError::Connectivity(_))
            | CoreError::Spotify(SpotifyError::Connectivity(_)) => ErrorKind::Connectivity,
            CoreError::Auth(AuthError::MissingCredentials(_)) => ErrorKind::Configuration,
            CoreError::Auth(_) | CoreError::Spotify(SpotifyError::Auth(_)) => {
                ErrorKind::Authentication
            }
            CoreError::Spotify(_) => ErrorKind::Upstream,
            CoreError::History(_) | CoreError::Import { .. } => ErrorKind::Storage,
            CoreError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use core_auth::AuthError;
    use provider_spotify::SpotifyError;

    #[test]
    fn test_error_kinds() {
        let upstream = CoreError::from(SpotifyError::ApiError {
            status_code: 503,
            message: "down".to_string(),
        });
        assert_eq!(upstream.kind(), ErrorKind::Upstream);

        let offline = CoreError::from(SpotifyError::Connectivity("timeout".to_string()));
        assert_eq!(offline.kind(), ErrorKind::Connectivity);

        let revoked = CoreError::from(SpotifyError::Auth(AuthError::TokenRefreshFailed {
            status: Some(400),
            reason: "invalid_grant".to_string(),
        }));
        assert_eq!(revoked.kind(), ErrorKind::Authentication);

        let config = CoreError::from(core_runtime::Error::Config("DATABASE_PATH".to_string()));
        assert_eq!(config.kind(), ErrorKind::Configuration);

        assert_eq!(
            CoreError::InvalidInput("month".to_string()).kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_import_error_names_file() {
        let err = CoreError::Import {
            path: PathBuf::from("/exports/Streaming_History_Audio_2023.json"),
            reason: "expected value at line 1".to_string(),
        };
        assert!(err.to_string().contains("Streaming_History_Audio_2023.json"));
    }
}
