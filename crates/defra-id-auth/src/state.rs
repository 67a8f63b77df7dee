//! OAuth `state` parameter
//!
//! The state is an opaque, single-use value returned unchanged by the
//! provider on callback. It carries a random id plus enough context
//! (namespace, source application) for a shared callback host to route the
//! response back to the right service.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::tokens::{TokenKey, TokenStore};

/// Application that initiated the sign-in.
pub const SOURCE: &str = "dashboard";

/// Decoded form of the state parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePayload {
    pub id: Uuid,
    pub namespace: Option<String>,
    pub source: String,
}

/// Generate a fresh state value and remember it for callback comparison.
pub fn generate(store: &dyn TokenStore, namespace: Option<&str>) -> Result<String> {
    let payload = StatePayload {
        id: Uuid::new_v4(),
        namespace: namespace.map(str::to_owned),
        source: SOURCE.to_owned(),
    };
    let json = serde_json::to_string(&payload).map_err(|e| Error::StateEncoding(e.to_string()))?;
    let state = STANDARD.encode(json);
    store.set_token(TokenKey::State, &state);
    Ok(state)
}

/// Decode a state value received on callback.
pub fn decode(state: &str) -> Result<StatePayload> {
    let bytes = STANDARD
        .decode(state)
        .map_err(|e| Error::StateDecoding(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::StateDecoding(e.to_string()))
}
