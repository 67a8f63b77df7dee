//! Error types for Defra ID sign-in operations

/// Errors from building a sign-in request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid Defra ID configuration: {0}")]
    Config(String),

    #[error("state encoding failed: {0}")]
    StateEncoding(String),

    #[error("state decoding failed: {0}")]
    StateDecoding(String),
}

/// Result alias for sign-in operations.
pub type Result<T> = std::result::Result<T, Error>;
