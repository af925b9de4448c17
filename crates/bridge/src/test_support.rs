//! Fakes shared by the unit tests in this crate

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use identity::{
    BoxFuture, HostError, IdentityClaims, IdentityVerifier, NewSession, NewUser,
    PairingCredential, PairingIssuer, Session, SessionStore, TokenSet, User, UserDirectory,
    VerifiedIdToken, VerifierError,
};

/// Verifier with scripted codes and ID tokens.
///
/// Unknown codes fail the exchange; unknown ID tokens fail verification.
#[derive(Default)]
pub struct FakeVerifier {
    codes: HashMap<String, Option<String>>,
    tokens: HashMap<String, serde_json::Value>,
    exchange_calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl FakeVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login(mut self, code: &str, id_token: &str, claims: serde_json::Value) -> Self {
        self.codes.insert(code.into(), Some(id_token.into()));
        self.tokens.insert(id_token.into(), claims);
        self
    }

    pub fn with_code_without_id_token(mut self, code: &str) -> Self {
        self.codes.insert(code.into(), None);
        self
    }

    /// Exchange succeeds but the returned token fails verification.
    pub fn with_forged_token(mut self, code: &str, id_token: &str) -> Self {
        self.codes.insert(code.into(), Some(id_token.into()));
        self
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl IdentityVerifier for FakeVerifier {
    fn id(&self) -> &str {
        "fake"
    }

    fn exchange<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<TokenSet, VerifierError>> {
        Box::pin(async move {
            self.exchange_calls.fetch_add(1, Ordering::SeqCst);
            let id_token = self.codes.get(code).cloned().ok_or_else(|| {
                VerifierError::Exchange("token endpoint returned 400: invalid_grant".into())
            })?;
            Ok(TokenSet {
                access_token: "at".into(),
                token_type: "Bearer".into(),
                id_token,
                expires_in: Some(300),
            })
        })
    }

    fn verify<'a>(
        &'a self,
        raw_id_token: &'a str,
    ) -> BoxFuture<'a, Result<VerifiedIdToken, VerifierError>> {
        Box::pin(async move {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            self.tokens
                .get(raw_id_token)
                .cloned()
                .map(VerifiedIdToken::from_verified_claims)
                .ok_or_else(|| VerifierError::Verification("InvalidSignature".into()))
        })
    }
}

/// Lookup finds nobody, creation always fails.
pub struct FailingDirectory;

impl UserDirectory for FailingDirectory {
    fn find_by_email<'a>(&'a self, _: &'a str) -> BoxFuture<'a, Result<Option<User>, HostError>> {
        Box::pin(async { Ok(None) })
    }

    fn create_user(&self, _: NewUser) -> BoxFuture<'_, Result<User, HostError>> {
        Box::pin(async { Err(HostError::new("directory is read-only")) })
    }
}

/// Lookup itself fails.
pub struct BrokenDirectory;

impl UserDirectory for BrokenDirectory {
    fn find_by_email<'a>(&'a self, _: &'a str) -> BoxFuture<'a, Result<Option<User>, HostError>> {
        Box::pin(async { Err(HostError::new("connection refused")) })
    }

    fn create_user(&self, _: NewUser) -> BoxFuture<'_, Result<User, HostError>> {
        Box::pin(async { Err(HostError::new("connection refused")) })
    }
}

pub struct FailingSessionStore;

impl SessionStore for FailingSessionStore {
    fn create_session(&self, _: NewSession) -> BoxFuture<'_, Result<Session, HostError>> {
        Box::pin(async { Err(HostError::new("session table locked")) })
    }
}

pub struct FailingPairingIssuer;

impl PairingIssuer for FailingPairingIssuer {
    fn mint<'a>(
        &'a self,
        _: &'a User,
        _: u64,
    ) -> BoxFuture<'a, Result<PairingCredential, HostError>> {
        Box::pin(async { Err(HostError::new("token store unavailable")) })
    }
}

pub fn claims_for(email: &str) -> IdentityClaims {
    IdentityClaims {
        email: email.into(),
        display_name: None,
        given_name: None,
        family_name: None,
        preferred_username: None,
        position: None,
    }
}

pub fn user(id: &str) -> User {
    User {
        id: id.into(),
        email: format!("{id}@example.com"),
        username: id.into(),
        full_name: None,
        position: None,
        roles: "system_user".into(),
        created_at: 0,
    }
}
