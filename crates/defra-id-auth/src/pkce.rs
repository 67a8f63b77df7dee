//! PKCE (Proof Key for Code Exchange) implementation per RFC 7636
//!
//! The verifier stays server-side in the token store and is sent during token
//! exchange; the challenge goes in the authorization URL so the provider can
//! check the exchange came from the party that started the flow.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};

use crate::tokens::{TokenKey, TokenStore};

/// Challenge method sent alongside every code challenge.
pub const CODE_CHALLENGE_METHOD: &str = "S256";

/// Generate a cryptographically random PKCE code verifier.
///
/// 32 random bytes encoded as URL-safe base64 without padding, giving 43
/// characters (RFC 7636 allows 43-128).
pub fn generate_verifier() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the S256 code challenge from a verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))`
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate a verifier, store it for the token exchange and return its challenge.
pub fn generate_code_challenge(store: &dyn TokenStore) -> String {
    let verifier = generate_verifier();
    store.set_token(TokenKey::CodeVerifier, &verifier);
    compute_challenge(&verifier)
}
