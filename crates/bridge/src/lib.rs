//! OpenID Connect login bridge
//!
//! Two endpoints turn a provider login into either a host browser session or
//! a desktop pairing hand-off:
//!
//! 1. `GET {base}/start[?desktop_token=..]` → `Initiator` mints a state,
//!    records the pairing token if given, 302 to the provider
//! 2. provider authenticates the user, redirects back with `code` + `state`
//! 3. `GET {base}/complete?code=..&state=..` → `CallbackProcessor` takes the
//!    state (deciding the branch), exchanges and verifies, `Resolver` finds or
//!    provisions the user, `Materializer` mints the branch artifacts
//! 4. standard: session cookies + 302 to the app; desktop: 302 to the
//!    hand-off URL with `client_token`/`server_token`

pub mod callback;
pub mod cookies;
pub mod error;
pub mod initiator;
pub mod materialize;
pub mod metrics;
pub mod profile;
pub mod resolution;
pub mod routes;
pub mod username;

#[cfg(test)]
mod test_support;

pub use callback::{CallbackProcessor, LoginBranch, LoginOutcome};
pub use cookies::{CookieSettings, DEFAULT_TOKEN_COOKIE, DEFAULT_USER_COOKIE};
pub use error::LoginError;
pub use initiator::Initiator;
pub use materialize::{DEFAULT_DEV_TOKEN_PREFIX, DEFAULT_SESSION_LIFETIME, DesktopSettings, Materializer};
pub use resolution::Resolver;
pub use routes::routes;

use std::sync::Arc;
use std::time::Duration;

use identity::{IdentityVerifier, PairingIssuer, SessionStore, UserDirectory};
use oidc_client::AuthorizeParams;
use state_store::CorrelationStore;
use url::Url;

pub const DEFAULT_BASE_PATH: &str = "/auth";
pub const DEFAULT_LOGIN_REDIRECT: &str = "/";

/// Host application stores the bridge writes to.
#[derive(Clone)]
pub struct Hosts {
    pub directory: Arc<dyn UserDirectory>,
    pub sessions: Arc<dyn SessionStore>,
    pub pairing: Arc<dyn PairingIssuer>,
}

#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Route prefix, e.g. `/auth`
    pub base_path: String,
    /// Where standard logins land after the cookies are set
    pub login_redirect: String,
    pub session_lifetime: Duration,
    pub token_cookie: String,
    pub user_cookie: String,
    pub secure_cookies: bool,
    pub desktop: DesktopSettings,
}

impl BridgeSettings {
    pub fn new(handoff_url: Url) -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.into(),
            login_redirect: DEFAULT_LOGIN_REDIRECT.into(),
            session_lifetime: DEFAULT_SESSION_LIFETIME,
            token_cookie: DEFAULT_TOKEN_COOKIE.into(),
            user_cookie: DEFAULT_USER_COOKIE.into(),
            secure_cookies: false,
            desktop: DesktopSettings::new(handoff_url),
        }
    }
}

/// Shared handler state. Only constructible once the provider client
/// exists, so routes cannot be mounted before initialization succeeded.
#[derive(Clone)]
pub struct BridgeState {
    pub(crate) initiator: Arc<Initiator>,
    pub(crate) callback: Arc<CallbackProcessor>,
    pub(crate) cookies: Arc<CookieSettings>,
    pub(crate) base_path: Arc<str>,
    pub(crate) login_redirect: Arc<str>,
}

impl BridgeState {
    pub fn new(
        authorize: AuthorizeParams,
        verifier: Arc<dyn IdentityVerifier>,
        store: Arc<CorrelationStore>,
        hosts: Hosts,
        settings: BridgeSettings,
    ) -> Self {
        let auth_service = verifier.id().to_owned();
        let materializer = Materializer::new(
            hosts.sessions,
            hosts.pairing,
            auth_service,
            settings.session_lifetime,
            settings.desktop,
        );
        let callback = CallbackProcessor::new(
            verifier,
            store.clone(),
            Resolver::new(hosts.directory),
            materializer,
        );
        let cookies = CookieSettings {
            token_cookie: settings.token_cookie,
            user_cookie: settings.user_cookie,
            secure: settings.secure_cookies,
            max_age: settings.session_lifetime,
        };
        Self {
            initiator: Arc::new(Initiator::new(authorize, store)),
            callback: Arc::new(callback),
            cookies: Arc::new(cookies),
            base_path: settings.base_path.trim_end_matches('/').into(),
            login_redirect: settings.login_redirect.into(),
        }
    }
}
