//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The OIDC client secret comes from OIDC_CLIENT_SECRET or client_secret_file,
//! never from the TOML itself.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bridge::{
    BridgeSettings, DEFAULT_DEV_TOKEN_PREFIX, DEFAULT_LOGIN_REDIRECT, DEFAULT_TOKEN_COOKIE,
    DEFAULT_USER_COOKIE, DesktopSettings,
};
use common::Secret;
use identity::DEFAULT_PAIRING_TTL;
use oidc_client::{OidcSettings, REQUIRED_SCOPES};
use serde::Deserialize;
use state_store::{DEFAULT_MAX_ENTRIES, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
use url::Url;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub oidc: OidcConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub desktop: DesktopConfig,
    #[serde(default)]
    pub state: StateConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Relying-party registration at the identity provider
#[derive(Debug, Deserialize)]
pub struct OidcConfig {
    pub issuer_url: Url,
    pub client_id: String,
    pub redirect_url: Url,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Path to a file containing the client secret (alternative to OIDC_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Recorded as `auth_service` on sessions
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_lifetime_hours")]
    pub lifetime_hours: u64,
    #[serde(default = "default_token_cookie")]
    pub token_cookie: String,
    #[serde(default = "default_user_cookie")]
    pub user_cookie: String,
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default = "default_login_redirect")]
    pub login_redirect: String,
}

#[derive(Debug, Deserialize)]
pub struct DesktopConfig {
    /// Deep link or https landing page receiving `client_token`/`server_token`
    pub handoff_url: Url,
    #[serde(default = "default_dev_token_prefix")]
    pub dev_token_prefix: String,
    /// How long a minted `server_token` stays redeemable
    #[serde(default = "default_pairing_ttl_secs")]
    pub pairing_ttl_secs: u64,
}

/// Pending-login table bounds
#[derive(Debug, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_max_connections() -> usize {
    1000
}

fn default_scopes() -> Vec<String> {
    REQUIRED_SCOPES.iter().map(|s| s.to_string()).collect()
}

fn default_service_name() -> String {
    "oidc".into()
}

fn default_lifetime_hours() -> u64 {
    720
}

fn default_token_cookie() -> String {
    DEFAULT_TOKEN_COOKIE.into()
}

fn default_user_cookie() -> String {
    DEFAULT_USER_COOKIE.into()
}

fn default_login_redirect() -> String {
    DEFAULT_LOGIN_REDIRECT.into()
}

fn default_dev_token_prefix() -> String {
    DEFAULT_DEV_TOKEN_PREFIX.into()
}

fn default_pairing_ttl_secs() -> u64 {
    DEFAULT_PAIRING_TTL.as_secs()
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL.as_secs()
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL.as_secs()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime_hours: default_lifetime_hours(),
            token_cookie: default_token_cookie(),
            user_cookie: default_user_cookie(),
            secure_cookies: false,
            login_redirect: default_login_redirect(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn require_http(name: &str, url: &Url) -> common::Result<()> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(common::Error::Config(format!(
            "{name} must use http:// or https://, got {other}://"
        ))),
    }
}

/// Any absolute URL except schemes that execute in the browser.
fn require_safe_redirect(name: &str, url: &Url) -> common::Result<()> {
    match url.scheme() {
        "javascript" | "data" | "vbscript" => Err(common::Error::Config(format!(
            "{name} must not use the {}: scheme",
            url.scheme()
        ))),
        _ => Ok(()),
    }
}

fn session_lifetime(hours: u64) -> common::Result<Duration> {
    // Checked in millis: session expiry is stored as unix millis
    hours
        .checked_mul(3_600_000)
        .map(Duration::from_millis)
        .ok_or_else(|| {
            common::Error::Config(format!("session.lifetime_hours is too large: {hours}"))
        })
}

fn require_non_zero(name: &str, value: u64) -> common::Result<()> {
    if value == 0 {
        return Err(common::Error::Config(format!(
            "{name} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Client secret resolution order:
    /// 1. OIDC_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        require_http("oidc.issuer_url", &config.oidc.issuer_url)?;
        require_http("oidc.redirect_url", &config.oidc.redirect_url)?;
        require_safe_redirect("desktop.handoff_url", &config.desktop.handoff_url)?;

        if config.oidc.client_id.trim().is_empty() {
            return Err(common::Error::Config("oidc.client_id must not be empty".into()));
        }

        require_non_zero("server.max_connections", config.server.max_connections as u64)?;
        require_non_zero("session.lifetime_hours", config.session.lifetime_hours)?;
        require_non_zero("state.ttl_secs", config.state.ttl_secs)?;
        require_non_zero("state.max_entries", config.state.max_entries as u64)?;
        require_non_zero("state.sweep_interval_secs", config.state.sweep_interval_secs)?;
        require_non_zero("desktop.pairing_ttl_secs", config.desktop.pairing_ttl_secs)?;
        session_lifetime(config.session.lifetime_hours)?;

        // Env var takes precedence over file
        if let Ok(secret) = std::env::var("OIDC_CLIENT_SECRET") {
            if !secret.trim().is_empty() {
                config.oidc.client_secret = Some(Secret::new(secret));
            }
        }
        if config.oidc.client_secret.is_none() {
            if let Some(ref secret_file) = config.oidc.client_secret_file {
                let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                    common::Error::Config(format!(
                        "failed to read client_secret_file {}: {e}",
                        secret_file.display()
                    ))
                })?;
                let secret = secret.trim().to_owned();
                if !secret.is_empty() {
                    config.oidc.client_secret = Some(Secret::new(secret));
                }
            }
        }
        if config.oidc.client_secret.is_none() {
            return Err(common::Error::Config(
                "no client secret: set OIDC_CLIENT_SECRET or oidc.client_secret_file".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("oidc-bridge.toml")
    }

    /// Provider client settings. `None` only if `load` was bypassed.
    pub fn oidc_settings(&self) -> Option<OidcSettings> {
        Some(OidcSettings {
            service_name: self.oidc.service_name.clone(),
            issuer: self.oidc.issuer_url.clone(),
            client_id: self.oidc.client_id.clone(),
            client_secret: self.oidc.client_secret.clone()?,
            redirect_url: self.oidc.redirect_url.clone(),
            scopes: self.oidc.scopes.clone(),
        })
    }

    pub fn bridge_settings(&self) -> common::Result<BridgeSettings> {
        let mut settings = BridgeSettings::new(self.desktop.handoff_url.clone());
        settings.login_redirect = self.session.login_redirect.clone();
        settings.session_lifetime = session_lifetime(self.session.lifetime_hours)?;
        settings.token_cookie = self.session.token_cookie.clone();
        settings.user_cookie = self.session.user_cookie.clone();
        settings.secure_cookies = self.session.secure_cookies;
        settings.desktop = DesktopSettings {
            handoff_url: self.desktop.handoff_url.clone(),
            dev_token_prefix: self.desktop.dev_token_prefix.clone(),
        };
        Ok(settings)
    }

    pub fn pairing_ttl(&self) -> Duration {
        Duration::from_secs(self.desktop.pairing_ttl_secs)
    }

    pub fn state_ttl(&self) -> Duration {
        Duration::from_secs(self.state.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.state.sweep_interval_secs)
    }
}
