//! Post-login materialization
//!
//! Desktop logins get a pairing credential and a hand-off redirect; standard
//! logins get a session. The caller picks the branch; this module only
//! produces the artifacts.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use identity::{NewSession, PairingIssuer, Session, SessionStore, User, unix_millis};
use tracing::error;
use url::Url;

use crate::error::LoginError;

/// Recorded as `auth_provider` on every session the bridge creates.
pub const AUTH_PROVIDER: &str = "openid";

pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(720 * 3600);
pub const DEFAULT_DEV_TOKEN_PREFIX: &str = "dev-";

#[derive(Debug, Clone)]
pub struct DesktopSettings {
    pub handoff_url: Url,
    /// Pairing tokens starting with this are flagged `isDesktopDev=true`
    pub dev_token_prefix: String,
}

impl DesktopSettings {
    pub fn new(handoff_url: Url) -> Self {
        Self {
            handoff_url,
            dev_token_prefix: DEFAULT_DEV_TOKEN_PREFIX.into(),
        }
    }
}

pub struct Materializer {
    sessions: Arc<dyn SessionStore>,
    pairing: Arc<dyn PairingIssuer>,
    auth_service: String,
    session_lifetime: Duration,
    desktop: DesktopSettings,
}

impl Materializer {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        pairing: Arc<dyn PairingIssuer>,
        auth_service: impl Into<String>,
        session_lifetime: Duration,
        desktop: DesktopSettings,
    ) -> Self {
        Self {
            sessions,
            pairing,
            auth_service: auth_service.into(),
            session_lifetime,
            desktop,
        }
    }

    /// Mint a pairing credential and build
    /// `{handoff_url}?client_token=..&server_token=..[&isDesktopDev=true]`.
    pub async fn desktop(&self, user: &User, pairing_token: &str) -> Result<Url, LoginError> {
        let credential = self
            .pairing
            .mint(user, unix_millis())
            .await
            .map_err(|e| {
                error!(user_id = %user.id, error = %e, "pairing credential minting failed");
                LoginError::Pairing(e.to_string())
            })?;

        let mut url = self.desktop.handoff_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_token", pairing_token)
                .append_pair("server_token", &credential.token);
            if pairing_token.starts_with(&self.desktop.dev_token_prefix) {
                query.append_pair("isDesktopDev", "true");
            }
        }
        Ok(url)
    }

    /// Create one session for `user`, expiring `session_lifetime` from now.
    ///
    /// The `email` prop is the directory's stored address, not the claim.
    pub async fn standard(&self, user: &User) -> Result<Session, LoginError> {
        let now = unix_millis();
        let props = BTreeMap::from([
            ("auth_service".to_string(), self.auth_service.clone()),
            ("auth_provider".to_string(), AUTH_PROVIDER.to_string()),
            ("email".to_string(), user.email.clone()),
        ]);
        let new_session = NewSession {
            user_id: user.id.clone(),
            roles: user.roles.clone(),
            is_oauth: true,
            props,
            expires_at: now + self.session_lifetime.as_millis() as u64,
        };

        self.sessions.create_session(new_session).await.map_err(|e| {
            error!(user_id = %user.id, error = %e, "session creation failed");
            LoginError::Session(e.to_string())
        })
    }
}
