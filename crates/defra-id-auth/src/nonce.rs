//! OpenID Connect nonce

use uuid::Uuid;

use crate::tokens::{TokenKey, TokenStore};

/// Generate a fresh nonce and remember it for ID token validation.
pub fn generate(store: &dyn TokenStore) -> String {
    let nonce = Uuid::new_v4().to_string();
    store.set_token(TokenKey::Nonce, &nonce);
    nonce
}
