//! Configuration types and loading
//!
//! Everything comes from environment variables, read once at startup. Every
//! field is checked before the loader returns, and all violations are
//! reported together so a broken deployment is fixed in one pass. Empty
//! variables count as unset.

use std::str::FromStr;
use std::time::Duration;

use axum_extra::extract::cookie::SameSite;
use common::Secret;
use defra_id_auth::DefraIdConfig;
use url::Url;

const THREE_DAYS: Duration = Duration::from_secs(60 * 60 * 24 * 3);
const ONE_YEAR: Duration = Duration::from_secs(60 * 60 * 24 * 365);
const DEFAULT_REDIS_PORT: u16 = 6379;
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DISPLAY_PAGE_SIZE: u32 = 20;
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_AUTHORISE_PATH: &str = "/oauth2/v2.0/authorize";
const MIN_COOKIE_PASSWORD_LEN: usize = 32;

pub const SERVICE_NAME: &str = "Get funding to improve animal health and welfare";

/// Deployment environment, from NODE_ENV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" => Ok(Environment::Production),
            _ => Err(()),
        }
    }
}

/// Root configuration
///
/// Shared with the rest of the frontend; not every field is read here.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Config {
    pub namespace: Option<String>,
    pub cache: CacheConfig,
    pub cookie: CookieConfig,
    pub cookie_policy: CookiePolicyConfig,
    pub env: Environment,
    pub display_page_size: u32,
    pub google_tag_manager_key: Option<String>,
    pub is_dev: bool,
    pub application_api_uri: Option<String>,
    pub port: u16,
    pub service_uri: Option<String>,
    pub claim_service_uri: Option<String>,
    pub apply_service_uri: Option<String>,
    pub service_name: &'static str,
    pub use_redis: bool,
    pub customer_survey_uri: Option<String>,
    pub wreck_http_timeout: Duration,
    pub multi_species_release_date: String,
    pub dev_login_enabled: bool,
    pub latest_terms_and_conditions_uri: String,
    pub reapply_time_limit_months: u32,
    pub multi_herds_release_date: String,
    pub privacy_policy_uri: Option<String>,
    pub lfs_update: LfsUpdateConfig,
    pub defra_id: DefraIdConfig,
}

/// Session cache settings
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct CacheConfig {
    pub expires_in: Duration,
    pub host: String,
    pub partition: &'static str,
    pub password: Option<Secret<String>>,
    pub port: u16,
    pub tls: bool,
}

/// Session and auth cookie settings
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct CookieConfig {
    pub cookie_name_cookie_policy: &'static str,
    pub cookie_name_auth: &'static str,
    pub cookie_name_session: &'static str,
    /// `None` when SameSite is disabled for the deployment
    pub same_site: Option<SameSite>,
    pub is_secure: bool,
    pub password: Secret<String>,
    pub ttl: Duration,
}

/// Cookie-consent cookie settings
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct CookiePolicyConfig {
    pub clear_invalid: bool,
    pub encoding: &'static str,
    pub same_site: Option<SameSite>,
    pub is_secure: bool,
    pub password: Secret<String>,
    pub path: &'static str,
    pub ttl: Duration,
}

/// Land and Farm Service "update your details" hand-off
#[derive(Debug, Clone)]
pub struct LfsUpdateConfig {
    pub enabled: bool,
    /// Organisation id is appended to this as-is
    pub uri: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> common::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup, collecting every violation.
    pub fn from_lookup<F>(lookup: F) -> common::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = EnvReader::new(lookup);

        let node_env = env.optional("NODE_ENV");
        let environment = match node_env.as_deref() {
            None => Environment::Development,
            Some(raw) => raw.parse().unwrap_or_else(|()| {
                env.violation(format!(
                    "NODE_ENV must be one of development, test, production, got {raw:?}"
                ));
                Environment::Development
            }),
        };
        let is_production = environment == Environment::Production;

        let same_site = if env.flag("DISABLE_COOKIE_SAME_SITE") {
            None
        } else {
            Some(SameSite::Lax)
        };

        let cookie_password = Secret::from(env.required("COOKIE_PASSWORD"));
        if cookie_password.char_len() > 0 && cookie_password.char_len() < MIN_COOKIE_PASSWORD_LEN {
            env.violation(format!(
                "COOKIE_PASSWORD must be at least {MIN_COOKIE_PASSWORD_LEN} characters long"
            ));
        }

        let cache = CacheConfig {
            expires_in: THREE_DAYS,
            host: env
                .optional("REDIS_HOSTNAME")
                .unwrap_or_else(|| "redis-hostname.default".to_owned()),
            partition: "ffc-ahwr-frontend",
            password: env.optional("REDIS_PASSWORD").map(Secret::from),
            port: env.number("REDIS_PORT", DEFAULT_REDIS_PORT, "a port number"),
            tls: is_production,
        };

        let cookie = CookieConfig {
            cookie_name_cookie_policy: "ffc_ahwr_cookie_policy",
            cookie_name_auth: "ffc_ahwr_auth",
            cookie_name_session: "ffc_ahwr_session",
            same_site,
            is_secure: is_production,
            password: cookie_password.clone(),
            ttl: THREE_DAYS,
        };

        let cookie_policy = CookiePolicyConfig {
            clear_invalid: false,
            encoding: "base64json",
            same_site,
            is_secure: is_production,
            password: cookie_password,
            path: "/",
            ttl: ONE_YEAR,
        };

        let lfs_update = LfsUpdateConfig {
            enabled: env.flag("LFS_UPDATE_ENABLED"),
            uri: env.uri("LFS_UPDATE_URI"),
        };
        if lfs_update.enabled && lfs_update.uri.is_none() {
            env.violation("LFS_UPDATE_URI is required when LFS_UPDATE_ENABLED is true".into());
        }

        let defra_id = env.defra_id();

        let config = Config {
            namespace: env.optional("NAMESPACE"),
            cache,
            cookie,
            cookie_policy,
            env: environment,
            display_page_size: env.number(
                "DISPLAY_PAGE_SIZE",
                DEFAULT_DISPLAY_PAGE_SIZE,
                "a number",
            ),
            google_tag_manager_key: env.optional("GOOGLE_TAG_MANAGER_KEY"),
            // Raw NODE_ENV: an unset variable is not a development deployment.
            is_dev: node_env.as_deref() == Some("development"),
            application_api_uri: env.uri("APPLICATION_API_URI"),
            port: env.number("PORT", DEFAULT_PORT, "a port number"),
            service_uri: env.uri("SERVICE_URI"),
            claim_service_uri: env.uri("CLAIM_SERVICE_URI"),
            apply_service_uri: env.uri("APPLY_SERVICE_URI"),
            service_name: SERVICE_NAME,
            use_redis: environment != Environment::Test,
            customer_survey_uri: env.uri("CUSTOMER_SURVEY_CLAIM_URI"),
            wreck_http_timeout: Duration::from_millis(env.number(
                "WRECK_HTTP_TIMEOUT_MILLISECONDS",
                DEFAULT_HTTP_TIMEOUT_MS,
                "a number of milliseconds",
            )),
            multi_species_release_date: env
                .optional("MULTI_SPECIES_RELEASE_DATE")
                .unwrap_or_else(|| "2024-12-06".to_owned()),
            dev_login_enabled: env.flag("DEV_LOGIN_ENABLED"),
            latest_terms_and_conditions_uri: env.required("TERMS_AND_CONDITIONS_URL"),
            reapply_time_limit_months: 10,
            multi_herds_release_date: env
                .optional("MULTI_HERDS_RELEASE_DATE")
                .unwrap_or_else(|| "2025-05-01".to_owned()),
            privacy_policy_uri: env.uri("PRIVACY_POLICY_URI"),
            lfs_update,
            defra_id,
        };

        env.finish().map(|()| config)
    }
}

/// Reads variables through a lookup and records what is wrong with them.
struct EnvReader<F> {
    lookup: F,
    violations: Vec<String>,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(lookup: F) -> Self {
        Self {
            lookup,
            violations: Vec::new(),
        }
    }

    fn violation(&mut self, message: String) {
        self.violations.push(message);
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.is_empty())
    }

    fn required(&mut self, key: &str) -> String {
        self.optional(key).unwrap_or_else(|| {
            self.violation(format!("{key} is required"));
            String::new()
        })
    }

    fn flag(&self, key: &str) -> bool {
        self.optional(key).as_deref() == Some("true")
    }

    fn number<T: FromStr>(&mut self, key: &str, default: T, expected: &str) -> T {
        match self.optional(key) {
            None => default,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                self.violation(format!("{key} must be {expected}, got {raw:?}"));
                default
            }),
        }
    }

    fn uri(&mut self, key: &str) -> Option<String> {
        let value = self.optional(key)?;
        if let Err(e) = Url::parse(&value) {
            self.violation(format!("{key} must be a valid uri: {e}"));
        }
        Some(value)
    }

    fn defra_id(&mut self) -> DefraIdConfig {
        let client_id = self.required("DEFRA_ID_CLIENT_ID");
        let config = DefraIdConfig {
            hostname: self.required("DEFRA_ID_HOSTNAME"),
            oauth_authorise_path: self
                .optional("DEFRA_ID_OAUTH_AUTHORISE_PATH")
                .unwrap_or_else(|| DEFAULT_AUTHORISE_PATH.to_owned()),
            policy: self.required("DEFRA_ID_POLICY"),
            redirect_uri: self.required("DEFRA_ID_REDIRECT_URI"),
            scope: self
                .optional("DEFRA_ID_SCOPE")
                .unwrap_or_else(|| format!("openid {client_id} offline_access")),
            service_id: self.required("DEFRA_ID_SERVICE_ID"),
            client_id,
        };

        if !config.hostname.is_empty() && config.authorize_endpoint().is_err() {
            self.violation(format!(
                "DEFRA_ID_HOSTNAME and DEFRA_ID_OAUTH_AUTHORISE_PATH must form a valid url, got {:?}",
                config.base_url()
            ));
        }
        if !config.redirect_uri.is_empty() && Url::parse(&config.redirect_uri).is_err() {
            self.violation("DEFRA_ID_REDIRECT_URI must be a valid uri".into());
        }
        config
    }

    fn finish(self) -> common::Result<()> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(common::Error::InvalidConfig(self.violations))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    pub(crate) const REQUIRED: &[(&str, &str)] = &[
        ("COOKIE_PASSWORD", "cookie-password-that-is-at-least-32-chars"),
        ("TERMS_AND_CONDITIONS_URL", "https://example.test/terms"),
        ("DEFRA_ID_HOSTNAME", "https://tenant.b2clogin.test"),
        ("DEFRA_ID_POLICY", "b2c_1a_signupsigninsfi"),
        ("DEFRA_ID_CLIENT_ID", "client-123"),
        ("DEFRA_ID_REDIRECT_URI", "http://localhost:3000/signin-oidc"),
        ("DEFRA_ID_SERVICE_ID", "service-456"),
    ];

    /// Required variables plus `extra`; later entries win.
    pub(crate) fn vars(extra: &[(&str, &str)]) -> HashMap<String, String> {
        REQUIRED
            .iter()
            .chain(extra)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub(crate) fn load(vars: &HashMap<String, String>) -> common::Result<Config> {
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    fn violations(vars: &HashMap<String, String>) -> Vec<String> {
        load(vars).unwrap_err().violations().to_vec()
    }

    #[test]
    fn test_load_minimal_config_applies_defaults() {
        let config = load(&vars(&[])).unwrap();

        assert_eq!(config.env, Environment::Development);
        assert!(!config.is_dev, "is_dev needs NODE_ENV=development explicitly");
        assert!(config.use_redis);
        assert_eq!(config.port, 3000);
        assert_eq!(config.display_page_size, 20);
        assert_eq!(config.cache.port, 6379);
        assert_eq!(config.cache.host, "redis-hostname.default");
        assert_eq!(config.cache.expires_in, THREE_DAYS);
        assert!(!config.cache.tls);
        assert_eq!(config.cookie.cookie_name_session, "ffc_ahwr_session");
        assert_eq!(config.cookie.same_site, Some(SameSite::Lax));
        assert!(!config.cookie.is_secure);
        assert_eq!(config.cookie_policy.ttl, ONE_YEAR);
        assert_eq!(config.cookie_policy.path, "/");
        assert_eq!(config.wreck_http_timeout, Duration::from_millis(10_000));
        assert_eq!(config.multi_species_release_date, "2024-12-06");
        assert_eq!(config.multi_herds_release_date, "2025-05-01");
        assert_eq!(config.reapply_time_limit_months, 10);
        assert!(!config.dev_login_enabled);
        assert!(!config.lfs_update.enabled);
        assert!(config.lfs_update.uri.is_none());
        assert_eq!(config.defra_id.oauth_authorise_path, "/oauth2/v2.0/authorize");
        assert_eq!(config.defra_id.scope, "openid client-123 offline_access");
        assert!(config.cookie.password.char_len() >= MIN_COOKIE_PASSWORD_LEN);
    }

    #[test]
    fn test_each_missing_required_field_is_named() {
        for (key, _) in REQUIRED {
            let mut vars = vars(&[]);
            vars.remove(*key);
            let found = violations(&vars);
            assert!(
                found.iter().any(|v| v.contains(key)),
                "missing {key} must be reported, got: {found:?}"
            );
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let found = violations(&vars(&[("COOKIE_PASSWORD", "")]));
        assert_eq!(found, vec!["COOKIE_PASSWORD is required".to_string()]);
    }

    #[test]
    fn test_short_cookie_password_rejected() {
        let found = violations(&vars(&[("COOKIE_PASSWORD", "too-short")]));
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("at least 32 characters"), "got: {found:?}");
        assert!(!found[0].contains("too-short"), "password must not be echoed");
    }

    #[test]
    fn test_all_violations_reported_together() {
        let mut vars = vars(&[
            ("PORT", "not-a-port"),
            ("NODE_ENV", "staging"),
            ("APPLY_SERVICE_URI", "not a uri"),
        ]);
        vars.remove("COOKIE_PASSWORD");

        let err = load(&vars).unwrap_err();
        let found = err.violations();
        assert_eq!(found.len(), 4, "got: {found:?}");
        let message = err.to_string();
        assert!(message.starts_with("The server config is invalid."));
        for key in ["PORT", "NODE_ENV", "APPLY_SERVICE_URI", "COOKIE_PASSWORD"] {
            assert!(message.contains(key), "{key} missing from: {message}");
        }
    }

    #[test]
    fn test_production_hardens_cookies_and_cache() {
        let config = load(&vars(&[("NODE_ENV", "production")])).unwrap();
        assert!(config.cookie.is_secure);
        assert!(config.cookie_policy.is_secure);
        assert!(config.cache.tls);
        assert!(config.use_redis);
        assert!(!config.is_dev);
    }

    #[test]
    fn test_explicit_development_sets_is_dev() {
        let config = load(&vars(&[("NODE_ENV", "development")])).unwrap();
        assert_eq!(config.env, Environment::Development);
        assert!(config.is_dev);
    }

    #[test]
    fn test_cookie_password_length_boundary() {
        let at_limit = "a".repeat(MIN_COOKIE_PASSWORD_LEN);
        let config = load(&vars(&[("COOKIE_PASSWORD", at_limit.as_str())])).unwrap();
        assert_eq!(config.cookie.password.char_len(), 32);

        let below_limit = "a".repeat(MIN_COOKIE_PASSWORD_LEN - 1);
        let found = violations(&vars(&[("COOKIE_PASSWORD", below_limit.as_str())]));
        assert_eq!(found.len(), 1, "got: {found:?}");
        assert!(found[0].contains("COOKIE_PASSWORD"));
    }

    #[test]
    fn test_test_environment_disables_redis() {
        let config = load(&vars(&[("NODE_ENV", "test")])).unwrap();
        assert!(!config.use_redis);
        assert!(!config.is_dev);
    }

    #[test]
    fn test_same_site_can_be_disabled() {
        let config = load(&vars(&[("DISABLE_COOKIE_SAME_SITE", "true")])).unwrap();
        assert_eq!(config.cookie.same_site, None);
        assert_eq!(config.cookie_policy.same_site, None);

        let config = load(&vars(&[("DISABLE_COOKIE_SAME_SITE", "yes")])).unwrap();
        assert_eq!(config.cookie.same_site, Some(SameSite::Lax));
    }

    #[test]
    fn test_lfs_update_requires_uri_when_enabled() {
        let found = violations(&vars(&[("LFS_UPDATE_ENABLED", "true")]));
        assert!(found[0].contains("LFS_UPDATE_URI"), "got: {found:?}");

        let config = load(&vars(&[
            ("LFS_UPDATE_ENABLED", "true"),
            ("LFS_UPDATE_URI", "http://lfs.test/home?ssoOrgId="),
        ]))
        .unwrap();
        assert!(config.lfs_update.enabled);
        assert_eq!(
            config.lfs_update.uri.as_deref(),
            Some("http://lfs.test/home?ssoOrgId=")
        );
    }

    #[test]
    fn test_numeric_overrides() {
        let config = load(&vars(&[
            ("PORT", "8080"),
            ("REDIS_PORT", "6380"),
            ("DISPLAY_PAGE_SIZE", "50"),
            ("WRECK_HTTP_TIMEOUT_MILLISECONDS", "2500"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache.port, 6380);
        assert_eq!(config.display_page_size, 50);
        assert_eq!(config.wreck_http_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_bad_authorise_endpoint_rejected() {
        let found = violations(&vars(&[("DEFRA_ID_HOSTNAME", "tenant.b2clogin.test")]));
        assert!(
            found.iter().any(|v| v.contains("DEFRA_ID_HOSTNAME")),
            "got: {found:?}"
        );
    }

    #[test]
    fn test_redis_password_is_redacted() {
        let config = load(&vars(&[("REDIS_PASSWORD", "hunter2")])).unwrap();
        let debug = format!("{:?}", config.cache);
        assert!(!debug.contains("hunter2"), "got: {debug}");
        assert_eq!(config.cache.password.as_ref().unwrap().expose(), "hunter2");
    }

    #[test]
    fn test_from_env_reads_process_environment() {
        let _lock = ENV_MUTEX.lock().unwrap();
        // SAFETY: ENV_MUTEX serializes every test that mutates the environment.
        unsafe {
            for (key, value) in REQUIRED {
                std::env::set_var(key, value);
            }
            std::env::set_var("NAMESPACE", "ffc-ahwr-pr7");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.namespace.as_deref(), Some("ffc-ahwr-pr7"));
        assert_eq!(config.defra_id.client_id, "client-123");

        unsafe {
            for (key, _) in REQUIRED {
                std::env::remove_var(key);
            }
            std::env::remove_var("NAMESPACE");
        }
    }
}
