//! Where generated security values are kept between sign-in and callback.

use std::fmt;

/// Identifies a single-use value produced for one authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKey {
    Nonce,
    State,
    CodeVerifier,
}

impl TokenKey {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKey::Nonce => "nonce",
            TokenKey::State => "state",
            TokenKey::CodeVerifier => "verifier",
        }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-scoped storage for generated values.
///
/// Implementations must overwrite any previous value for the same key: a new
/// sign-in attempt invalidates the values of the previous one.
pub trait TokenStore {
    fn set_token(&self, key: TokenKey, value: &str);
}
