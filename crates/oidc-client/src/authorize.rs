//! Authorization request construction
//!
//! Builds the provider authorization URL for the authorization-code flow and
//! mints the opaque `state` value that correlates the callback with the
//! request that started it.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use url::Url;

use crate::constants::REQUIRED_SCOPES;

/// Generate a fresh, unguessable state value.
///
/// 32 random bytes encoded as URL-safe base64 without padding (43 chars).
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Static parts of every authorization request.
#[derive(Debug, Clone)]
pub struct AuthorizeParams {
    authorization_endpoint: Url,
    client_id: String,
    redirect_url: Url,
    scopes: Vec<String>,
}

impl AuthorizeParams {
    /// `scopes` is merged with `REQUIRED_SCOPES`; order is preserved and
    /// duplicates are dropped.
    pub fn new(
        authorization_endpoint: Url,
        client_id: impl Into<String>,
        redirect_url: Url,
        scopes: &[String],
    ) -> Self {
        let mut merged: Vec<String> = REQUIRED_SCOPES.iter().map(|s| s.to_string()).collect();
        for scope in scopes {
            let scope = scope.trim();
            if !scope.is_empty() && !merged.iter().any(|s| s == scope) {
                merged.push(scope.to_owned());
            }
        }
        Self {
            authorization_endpoint,
            client_id: client_id.into(),
            redirect_url,
            scopes: merged,
        }
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Full authorization URL for one login attempt. Pure; no I/O.
    pub fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.authorization_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_url.as_str())
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state);
        url
    }
}
