//! Common error types

use thiserror::Error;

/// Common error type
#[derive(Error, Debug)]
pub enum Error {
    /// Every violation found while validating configuration, in field order.
    #[error("The server config is invalid. {}", .0.join("; "))]
    InvalidConfig(Vec<String>),
}

impl Error {
    /// Violations carried by an `InvalidConfig` error.
    pub fn violations(&self) -> &[String] {
        match self {
            Error::InvalidConfig(violations) => violations,
        }
    }
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;
