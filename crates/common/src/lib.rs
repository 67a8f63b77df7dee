//! Common types for the AHWR frontend

mod secret;
mod error;

pub use secret::{REDACTED, Secret};
pub use error::{Error, Result};
