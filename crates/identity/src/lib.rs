//! Collaborator seams for the login bridge
//!
//! The bridge never talks to the identity provider or the host application
//! directly. It drives four traits:
//!
//! - `IdentityVerifier` exchanges an authorization code and verifies the
//!   returned ID token (implemented by `oidc-client`)
//! - `UserDirectory` finds users by email and provisions new ones
//! - `SessionStore` persists one browser session per standard login
//! - `PairingIssuer` mints the server-side credential handed to desktop clients
//!
//! The `memory` module provides in-process implementations of the host traits
//! for the standalone service and for tests.
//!
//! All trait methods return `Pin<Box<dyn Future>>` so implementations can be
//! shared as `Arc<dyn Trait>`.

pub mod claims;
pub mod host;
pub mod memory;

pub use claims::{ClaimsError, IdentityClaims, TokenSet, VerifiedIdToken};
pub use host::{NewSession, NewUser, PairingCredential, Session, User};
pub use memory::{
    DEFAULT_PAIRING_TTL, InMemoryDirectory, InMemoryPairingIssuer, InMemorySessionStore,
};

use std::future::Future;
use std::pin::Pin;

/// Boxed, sendable future used by every collaborator trait.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors from the identity provider side of the flow.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    /// Code-for-token exchange failed (network, invalid code, provider error)
    #[error("token exchange failed: {0}")]
    Exchange(String),

    /// Signature, issuer, audience or expiry check failed
    #[error("ID token verification failed: {0}")]
    Verification(String),
}

/// Failure reported by a host store (directory, session store, pairing issuer).
#[derive(Debug, thiserror::Error)]
#[error("host store error: {0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Identity provider boundary: authorization-code exchange and ID token
/// verification. The bridge treats this as a black box.
pub trait IdentityVerifier: Send + Sync {
    /// Label recorded as `auth_service` on sessions (e.g. "keycloak").
    fn id(&self) -> &str;

    /// Trade an authorization code for the provider's token set.
    fn exchange<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<TokenSet, VerifierError>>;

    /// Cryptographically verify a raw ID token and return its claim set.
    fn verify<'a>(
        &'a self,
        raw_id_token: &'a str,
    ) -> BoxFuture<'a, Result<VerifiedIdToken, VerifierError>>;
}

/// Host user directory.
///
/// Email case rules belong to the directory; the bridge passes the claim
/// value through unchanged.
pub trait UserDirectory: Send + Sync {
    fn find_by_email<'a>(&'a self, email: &'a str)
    -> BoxFuture<'a, Result<Option<User>, HostError>>;

    fn create_user(&self, user: NewUser) -> BoxFuture<'_, Result<User, HostError>>;
}

/// Host session store.
pub trait SessionStore: Send + Sync {
    /// Persist a new session. The store assigns the session id and token.
    fn create_session(&self, session: NewSession) -> BoxFuture<'_, Result<Session, HostError>>;
}

/// Mints desktop pairing credentials.
pub trait PairingIssuer: Send + Sync {
    fn mint<'a>(
        &'a self,
        user: &'a User,
        issued_at: u64,
    ) -> BoxFuture<'a, Result<PairingCredential, HostError>>;
}

/// Current wall-clock time as unix milliseconds.
pub fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifier_error_messages_keep_cause() {
        let err = VerifierError::Exchange("token endpoint returned 400".into());
        assert_eq!(
            err.to_string(),
            "token exchange failed: token endpoint returned 400"
        );
        let err = VerifierError::Verification("InvalidSignature".into());
        assert!(err.to_string().contains("InvalidSignature"));
    }

    #[test]
    fn unix_millis_is_after_2024() {
        // 2024-01-01T00:00:00Z
        assert!(unix_millis() > 1_704_067_200_000);
    }
}
