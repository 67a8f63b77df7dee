//! Authorization-code request URL for Defra ID.

use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::pkce::{self, CODE_CHALLENGE_METHOD};
use crate::tokens::TokenStore;
use crate::{nonce, state};

/// Static client registration with the Defra ID tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefraIdConfig {
    /// Scheme and host of the tenant, e.g. `https://tenant.b2clogin.com`
    pub hostname: String,
    /// Appended to `hostname` without a separator
    pub oauth_authorise_path: String,
    /// B2C user-flow policy, sent as `p`
    pub policy: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub service_id: String,
}

impl DefraIdConfig {
    /// `hostname` and `oauth_authorise_path` concatenated as configured.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.hostname, self.oauth_authorise_path)
    }

    /// Parsed authorize endpoint.
    pub fn authorize_endpoint(&self) -> Result<Url> {
        let base = self.base_url();
        Url::parse(&base).map_err(|e| Error::Config(format!("authorize endpoint {base:?}: {e}")))
    }
}

/// Build the URL that sends the browser to Defra ID to sign in.
///
/// Generates a fresh nonce, state and PKCE verifier on every call and writes
/// them to `store`. `relationship_id` preselects an organisation for users
/// with several; an empty value is ignored.
pub fn request_authorization_code_url(
    config: &DefraIdConfig,
    store: &dyn TokenStore,
    namespace: Option<&str>,
    relationship_id: Option<&str>,
) -> Result<Url> {
    let mut url = config.authorize_endpoint()?;
    let nonce = nonce::generate(store);
    let state = state::generate(store, namespace)?;
    let code_challenge = pkce::generate_code_challenge(store);
    let relationship_id = relationship_id.filter(|id| !id.is_empty());

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("p", &config.policy)
            .append_pair("client_id", &config.client_id)
            .append_pair("nonce", &nonce)
            .append_pair("redirect_uri", &config.redirect_uri)
            .append_pair("scope", &config.scope)
            .append_pair("response_type", "code")
            .append_pair("serviceId", &config.service_id)
            .append_pair("state", &state)
            .append_pair("forceReselection", "true");
        if let Some(id) = relationship_id {
            query.append_pair("relationshipId", id);
        }
        query
            .append_pair("code_challenge", &code_challenge)
            .append_pair("code_challenge_method", CODE_CHALLENGE_METHOD);
    }

    debug!(
        endpoint = %config.base_url(),
        relationship = relationship_id.is_some(),
        "built authorization code url"
    );
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenKey;
    use crate::tokens::testing::RecordingStore;

    fn test_config() -> DefraIdConfig {
        DefraIdConfig {
            hostname: "https://tenant.b2clogin.test".into(),
            oauth_authorise_path: "/tenant.onmicrosoft.com/oauth2/v2.0/authorize".into(),
            policy: "b2c_1a_signupsigninsfi".into(),
            client_id: "client-123".into(),
            redirect_uri: "http://localhost:3000/signin-oidc".into(),
            scope: "openid client-123 offline_access".into(),
            service_id: "service-456".into(),
        }
    }

    fn values(url: &Url, key: &str) -> Vec<String> {
        url.query_pairs()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    fn single(url: &Url, key: &str) -> String {
        let found = values(url, key);
        assert_eq!(found.len(), 1, "{key} must appear exactly once in {url}");
        found.into_iter().next().unwrap()
    }

    #[test]
    fn url_contains_every_mandated_parameter_once() {
        let store = RecordingStore::default();
        let url = request_authorization_code_url(&test_config(), &store, None, None).unwrap();

        assert!(url.as_str().starts_with(&test_config().base_url()));
        assert_eq!(single(&url, "p"), "b2c_1a_signupsigninsfi");
        assert_eq!(single(&url, "client_id"), "client-123");
        assert_eq!(single(&url, "redirect_uri"), "http://localhost:3000/signin-oidc");
        assert_eq!(single(&url, "scope"), "openid client-123 offline_access");
        assert_eq!(single(&url, "response_type"), "code");
        assert_eq!(single(&url, "serviceId"), "service-456");
        assert_eq!(single(&url, "forceReselection"), "true");
        assert_eq!(single(&url, "code_challenge_method"), "S256");
        single(&url, "nonce");
        single(&url, "state");
        single(&url, "code_challenge");
        assert!(values(&url, "relationshipId").is_empty());
    }

    #[test]
    fn parameters_keep_request_order() {
        let store = RecordingStore::default();
        let url =
            request_authorization_code_url(&test_config(), &store, None, Some("org-1")).unwrap();
        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(
            keys,
            [
                "p",
                "client_id",
                "nonce",
                "redirect_uri",
                "scope",
                "response_type",
                "serviceId",
                "state",
                "forceReselection",
                "relationshipId",
                "code_challenge",
                "code_challenge_method",
            ]
        );
    }

    #[test]
    fn relationship_id_is_included_once() {
        let store = RecordingStore::default();
        let id = "7f0b3d0e-1c2a-4c4e-9f59-2f0d3a1b5c6d";
        let url = request_authorization_code_url(&test_config(), &store, None, Some(id)).unwrap();
        assert_eq!(single(&url, "relationshipId"), id);
        assert!(url.as_str().contains(id));
    }

    #[test]
    fn empty_relationship_id_is_omitted() {
        let store = RecordingStore::default();
        let url = request_authorization_code_url(&test_config(), &store, None, Some("")).unwrap();
        assert!(values(&url, "relationshipId").is_empty());
    }

    #[test]
    fn generated_values_are_stored_and_fresh() {
        let store = RecordingStore::default();
        let config = test_config();

        let first = request_authorization_code_url(&config, &store, Some("ns"), None).unwrap();
        assert_eq!(store.get(TokenKey::Nonce), Some(single(&first, "nonce")));
        assert_eq!(store.get(TokenKey::State), Some(single(&first, "state")));
        let verifier = store.get(TokenKey::CodeVerifier).unwrap();
        assert_eq!(
            pkce::compute_challenge(&verifier),
            single(&first, "code_challenge")
        );

        let second = request_authorization_code_url(&config, &store, Some("ns"), None).unwrap();
        assert_ne!(single(&first, "nonce"), single(&second, "nonce"));
        assert_ne!(single(&first, "state"), single(&second, "state"));
        assert_ne!(
            single(&first, "code_challenge"),
            single(&second, "code_challenge")
        );
    }

    #[test]
    fn state_carries_namespace() {
        let store = RecordingStore::default();
        let url =
            request_authorization_code_url(&test_config(), &store, Some("pr-42"), None).unwrap();
        let payload = state::decode(&single(&url, "state")).unwrap();
        assert_eq!(payload.namespace.as_deref(), Some("pr-42"));
    }

    #[test]
    fn malformed_base_url_is_a_config_error() {
        let store = RecordingStore::default();
        let config = DefraIdConfig {
            hostname: "not a host".into(),
            ..test_config()
        };
        let err = request_authorization_code_url(&config, &store, None, None).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got: {err}");
        assert!(store.get(TokenKey::Nonce).is_none());
    }
}
