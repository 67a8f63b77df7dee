//! Per-user session state
//!
//! Handlers never reach for a global session helper: they take a [`Session`]
//! extractor, which resolves the signed session cookie against the
//! [`SessionStore`] held in application state. A missing or tampered cookie
//! yields a fresh, empty session whose cookie is issued by whichever
//! handler returns [`Session::into_cookie_jar`].

use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, SignedCookieJar};
use defra_id_auth::{TokenKey, TokenStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::AppState;
use crate::config::CookieConfig;

/// Top-level groupings of session values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entry {
    EndemicsClaim,
    Tokens,
    Pkcecodes,
    SignInRedirect,
}

pub const ORGANISATION_KEY: &str = "organisation";
pub const SIGN_IN_REDIRECT_KEY: &str = "signInRedirect";

/// Organisation the signed-in user is acting for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organisation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farmer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Backing storage for session values, keyed by session id.
pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &str, entry: Entry, key: &str) -> Option<Value>;
    fn set(&self, session_id: &str, entry: Entry, key: &str, value: Value);
}

struct SessionRecord {
    entries: HashMap<Entry, serde_json::Map<String, Value>>,
    touched_at: Instant,
}

/// Upper bound on live sessions; the oldest session is evicted beyond it.
pub const DEFAULT_MAX_SESSIONS: usize = 100_000;

/// Minimum time between full sweeps for expired sessions.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

struct Sessions {
    records: HashMap<String, SessionRecord>,
    /// Session ids in creation order. May hold ids already expired or evicted.
    created: VecDeque<String>,
    last_purge: Instant,
}

impl Sessions {
    fn purge_expired(&mut self, ttl: Duration) {
        self.records
            .retain(|_, record| record.touched_at.elapsed() < ttl);
        let records = &self.records;
        self.created.retain(|id| records.contains_key(id));
        self.last_purge = Instant::now();
    }

    fn evict_oldest(&mut self) -> bool {
        while let Some(id) = self.created.pop_front() {
            if self.records.remove(&id).is_some() {
                debug!("session store full, evicted oldest session");
                return true;
            }
        }
        false
    }
}

/// In-process session store with idle expiry and a cap on live sessions.
///
/// Expired sessions are swept at most once per minute, on write.
pub struct MemorySessionStore {
    ttl: Duration,
    max_sessions: usize,
    sessions: Mutex<Sessions>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_max_sessions(ttl, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_max_sessions(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            ttl,
            max_sessions: max_sessions.max(1),
            sessions: Mutex::new(Sessions {
                records: HashMap::new(),
                created: VecDeque::new(),
                last_purge: Instant::now(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().records.len()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str, entry: Entry, key: &str) -> Option<Value> {
        let mut sessions = self.lock();
        let record = sessions.records.get_mut(session_id)?;
        if record.touched_at.elapsed() >= self.ttl {
            sessions.records.remove(session_id);
            return None;
        }
        record.touched_at = Instant::now();
        record.entries.get(&entry)?.get(key).cloned()
    }

    fn set(&self, session_id: &str, entry: Entry, key: &str, value: Value) {
        let mut sessions = self.lock();
        if sessions.last_purge.elapsed() >= PURGE_INTERVAL {
            sessions.purge_expired(self.ttl);
        }

        if !sessions.records.contains_key(session_id) {
            while sessions.records.len() >= self.max_sessions && sessions.evict_oldest() {}
            sessions.created.push_back(session_id.to_owned());
        }

        let record = sessions
            .records
            .entry(session_id.to_owned())
            .or_insert_with(|| SessionRecord {
                entries: HashMap::new(),
                touched_at: Instant::now(),
            });
        if record.touched_at.elapsed() >= self.ttl {
            record.entries.clear();
        }
        record.touched_at = Instant::now();
        record
            .entries
            .entry(entry)
            .or_default()
            .insert(key.to_owned(), value);
    }
}

/// The current request's session.
pub struct Session {
    id: String,
    store: Arc<dyn SessionStore>,
    jar: SignedCookieJar,
}

impl Session {
    /// Resolve the session named by the request's cookie, or start a new one.
    pub fn resolve(
        jar: SignedCookieJar,
        store: Arc<dyn SessionStore>,
        cookie: &CookieConfig,
    ) -> Self {
        if let Some(existing) = jar.get(cookie.cookie_name_session) {
            return Self {
                id: existing.value().to_owned(),
                store,
                jar,
            };
        }

        let id = Uuid::new_v4().to_string();
        debug!("starting new session");
        let jar = jar.add(session_cookie(cookie, id.clone()));
        Self { id, store, jar }
    }

    pub fn get(&self, entry: Entry, key: &str) -> Option<Value> {
        self.store.get(&self.id, entry, key)
    }

    pub fn set(&self, entry: Entry, key: &str, value: Value) {
        self.store.set(&self.id, entry, key, value);
    }

    /// Organisation recorded for the in-progress claim.
    pub fn organisation(&self) -> Option<Organisation> {
        let value = self.get(Entry::EndemicsClaim, ORGANISATION_KEY)?;
        serde_json::from_value(value)
            .inspect_err(|e| warn!(error = %e, "organisation in session is malformed"))
            .ok()
    }

    /// Written by the sign-in callback; tests seed sessions through it.
    #[cfg(test)]
    pub fn set_organisation(&self, organisation: &Organisation) {
        // Organisation holds only strings, so serialization cannot fail.
        if let Ok(value) = serde_json::to_value(organisation) {
            self.set(Entry::EndemicsClaim, ORGANISATION_KEY, value);
        }
    }

    /// Whether sign-in was started from the apply journey. Only an explicit
    /// `true` counts.
    pub fn sign_in_redirect(&self) -> bool {
        self.get(Entry::SignInRedirect, SIGN_IN_REDIRECT_KEY) == Some(Value::Bool(true))
    }

    #[cfg(test)]
    pub fn set_sign_in_redirect(&self, redirect: bool) {
        self.set(
            Entry::SignInRedirect,
            SIGN_IN_REDIRECT_KEY,
            Value::Bool(redirect),
        );
    }

    /// Cookies to send back; carries the session cookie when it is new.
    pub fn into_cookie_jar(self) -> SignedCookieJar {
        self.jar
    }
}

impl TokenStore for Session {
    fn set_token(&self, key: TokenKey, value: &str) {
        let entry = match key {
            TokenKey::Nonce | TokenKey::State => Entry::Tokens,
            TokenKey::CodeVerifier => Entry::Pkcecodes,
        };
        self.set(entry, key.as_str(), Value::String(value.to_owned()));
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_headers(&parts.headers, state.cookie_key.clone());
        Ok(Session::resolve(
            jar,
            state.sessions.clone(),
            &state.config.cookie,
        ))
    }
}

fn session_cookie(config: &CookieConfig, id: String) -> Cookie<'static> {
    let mut cookie = Cookie::build((config.cookie_name_session, id))
        .path("/")
        .http_only(true)
        .secure(config.is_secure);
    if let Some(same_site) = config.same_site {
        cookie = cookie.same_site(same_site);
    }
    cookie.build()
}
