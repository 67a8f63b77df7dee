//! Defra Identity sign-in library
//!
//! Builds the authorization-code request that starts a Defra ID sign-in,
//! together with the single-use values that protect it:
//!
//! 1. `nonce::generate()` binds the ID token to this request (replay)
//! 2. `state::generate()` is round-tripped through the provider (CSRF)
//! 3. `pkce::generate_code_challenge()` binds the later token exchange to
//!    this request (code interception)
//!
//! Each generator writes the value it produced to a caller-supplied
//! [`TokenStore`], normally the user's session, so the callback handler can
//! compare or replay it. Nothing here talks to the network.

pub mod authorize;
pub mod error;
pub mod nonce;
pub mod pkce;
pub mod state;
pub mod tokens;

pub use authorize::{DefraIdConfig, request_authorization_code_url};
pub use error::{Error, Result};
pub use tokens::{TokenKey, TokenStore};
