//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server, loaded
//! via the `config` crate from environment variables with `__` as the
//! nesting separator (e.g. `OIDC__CLIENT_ID`, `STORE__BACKEND`,
//! `POLICY__STUDENT_DOMAIN`).

use pathfinder_gate_access::AccessPolicy;
use pathfinder_gate_session_store::StoreConfig;
use serde::Deserialize;

/// Server configuration composed from section configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// OIDC identity provider configuration.
    pub oidc: OidcConfig,

    /// Email allow-list policy.
    pub policy: AccessPolicy,

    /// Session store backend selection.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Sliding session window in minutes. Every request restarts it.
    /// Default is 14 days.
    #[serde(default = "default_session_ttl_minutes")]
    pub ttl_minutes: i64,

    /// Interval between expired-session sweeps, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP
    /// development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_session_ttl_minutes() -> i64 {
    // 14 days
    20_160
}

fn default_cleanup_interval_seconds() -> u64 {
    3_600
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_session_ttl_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl SessionConfig {
    /// Returns the sliding window as a chrono duration.
    #[must_use]
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.ttl_minutes)
    }
}

/// Configuration for the OIDC identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct OidcConfig {
    /// The OIDC issuer URL, used for discovery.
    pub issuer_url: String,
    /// The OAuth2 client ID registered with the provider.
    pub client_id: String,
    /// The OAuth2 client secret.
    pub client_secret: String,
    /// The redirect URI for the OAuth2 callback
    /// (e.g. "https://portal.pathfinder-mm.org/oauth-callback").
    pub redirect_uri: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,email,profile"
    #[serde(default = "default_scopes")]
    pub scopes: String,
}

fn default_scopes() -> String {
    "openid,email,profile".to_string()
}

impl OidcConfig {
    /// Returns the scopes to request, parsed from the comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes.split(',').map(str::trim).collect()
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("policy.exception_emails"),
            )
            .build()?
            .try_deserialize()
    }
}
