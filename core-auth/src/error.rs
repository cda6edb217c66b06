use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token refresh failed (status {status:?}): {reason}")]
    TokenRefreshFailed { status: Option<u16>, reason: String },

    #[error("Token endpoint unreachable: {0}")]
    Connectivity(String),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

impl AuthError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, AuthError::Connectivity(_))
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
