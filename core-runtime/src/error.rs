use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed setting
    #[error("Configuration error: {0}")]
    Config(String),

    /// The tracing subscriber could not be installed
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
