use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The request never produced a response: timeout, refused connection,
    /// DNS failure and similar transport problems.
    #[error("Network connectivity error: {0}")]
    Connectivity(String),
}

impl BridgeError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, BridgeError::Connectivity(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
