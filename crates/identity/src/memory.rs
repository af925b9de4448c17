//! In-process host stores
//!
//! Used by the standalone service when no host application is attached, and
//! by tests. Everything is lost on restart.

use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;

use crate::host::{NewSession, NewUser, PairingCredential, Session, User};
use crate::{BoxFuture, HostError, PairingIssuer, SessionStore, UserDirectory, unix_millis};

/// Role string assigned to users provisioned through the bridge.
pub const DEFAULT_USER_ROLES: &str = "system_user";

/// User directory keyed by lowercased email.
///
/// A single write lock covers the existence check and the insert, so two
/// concurrent creates for one email cannot both succeed.
pub struct InMemoryDirectory {
    users: RwLock<HashMap<String, User>>,
    default_roles: String,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::with_default_roles(DEFAULT_USER_ROLES)
    }

    pub fn with_default_roles(roles: impl Into<String>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            default_roles: roles.into(),
        }
    }

    /// Number of users in the directory.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl UserDirectory for InMemoryDirectory {
    fn find_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> BoxFuture<'a, Result<Option<User>, HostError>> {
        Box::pin(async move {
            let users = self.users.read().await;
            Ok(users.get(&email.to_lowercase()).cloned())
        })
    }

    fn create_user(&self, new_user: NewUser) -> BoxFuture<'_, Result<User, HostError>> {
        Box::pin(async move {
            let key = new_user.email.to_lowercase();
            let mut users = self.users.write().await;
            if users.contains_key(&key) {
                return Err(HostError::new("a user with this email already exists"));
            }
            let user = User {
                id: uuid::Uuid::new_v4().simple().to_string(),
                email: new_user.email,
                username: new_user.username,
                full_name: new_user.full_name,
                position: new_user.position,
                roles: self.default_roles.clone(),
                created_at: unix_millis(),
            };
            debug!(user_id = %user.id, "user created");
            users.insert(key, user.clone());
            Ok(user)
        })
    }
}

/// Session store keyed by session token.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn find_by_token(&self, token: &str) -> Option<Session> {
        self.sessions.read().await.get(token).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn create_session(&self, new_session: NewSession) -> BoxFuture<'_, Result<Session, HostError>> {
        Box::pin(async move {
            let session = Session {
                id: uuid::Uuid::new_v4().simple().to_string(),
                token: uuid::Uuid::new_v4().simple().to_string(),
                user_id: new_session.user_id,
                roles: new_session.roles,
                is_oauth: new_session.is_oauth,
                props: new_session.props,
                created_at: unix_millis(),
                expires_at: new_session.expires_at,
            };
            debug!(session_id = %session.id, user_id = %session.user_id, "session created");
            self.sessions
                .write()
                .await
                .insert(session.token.clone(), session.clone());
            Ok(session)
        })
    }
}

/// Lifetime of an unredeemed pairing credential.
pub const DEFAULT_PAIRING_TTL: Duration = Duration::from_secs(300);

struct IssuedCredential {
    credential: PairingCredential,
    minted_at: Instant,
}

/// Pairing issuer that keeps minted credentials until redeemed or expired.
///
/// Expired credentials are dropped on every `mint`, so the table only ever
/// holds credentials younger than the TTL.
pub struct InMemoryPairingIssuer {
    issued: Mutex<HashMap<String, IssuedCredential>>,
    ttl: Duration,
}

impl InMemoryPairingIssuer {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_PAIRING_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            issued: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Consume a minted credential. Each token redeems at most once and
    /// only within the TTL.
    pub async fn redeem(&self, token: &str) -> Option<PairingCredential> {
        let entry = self.issued.lock().await.remove(token)?;
        if entry.minted_at.elapsed() >= self.ttl {
            debug!("pairing credential expired before redemption");
            return None;
        }
        Some(entry.credential)
    }

    pub async fn outstanding(&self) -> usize {
        self.issued.lock().await.len()
    }
}

impl Default for InMemoryPairingIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl PairingIssuer for InMemoryPairingIssuer {
    fn mint<'a>(
        &'a self,
        user: &'a User,
        issued_at: u64,
    ) -> BoxFuture<'a, Result<PairingCredential, HostError>> {
        Box::pin(async move {
            let mut bytes = [0u8; 32];
            rand::rng().fill(&mut bytes);
            let credential = PairingCredential {
                token: URL_SAFE_NO_PAD.encode(bytes),
                user_id: user.id.clone(),
                issued_at,
            };

            let mut issued = self.issued.lock().await;
            let before = issued.len();
            issued.retain(|_, entry| entry.minted_at.elapsed() < self.ttl);
            let purged = before - issued.len();
            if purged > 0 {
                debug!(purged, "dropped expired pairing credentials");
            }
            issued.insert(
                credential.token.clone(),
                IssuedCredential {
                    credential: credential.clone(),
                    minted_at: Instant::now(),
                },
            );
            Ok(credential)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Secret;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            username: "jane".into(),
            password: Secret::new("placeholder".into()),
            full_name: Some("Jane Doe".into()),
            position: None,
        }
    }

    #[tokio::test]
    async fn directory_finds_created_user_case_insensitively() {
        let dir = InMemoryDirectory::new();
        let created = dir.create_user(new_user("Jane@Example.com")).await.unwrap();
        assert_eq!(created.roles, DEFAULT_USER_ROLES);

        let found = dir.find_by_email("jane@example.COM").await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn directory_rejects_duplicate_email() {
        let dir = InMemoryDirectory::new();
        dir.create_user(new_user("jane@example.com")).await.unwrap();
        let err = dir.create_user(new_user("JANE@example.com")).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(dir.len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_creates_for_one_email_yield_one_user() {
        let dir = Arc::new(InMemoryDirectory::new());
        let mut handles = vec![];
        for _ in 0..8 {
            let dir = dir.clone();
            handles.push(tokio::spawn(async move {
                dir.create_user(new_user("race@example.com")).await.is_ok()
            }));
        }
        let mut created = 0;
        for h in handles {
            if h.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(dir.len().await, 1);
    }

    #[tokio::test]
    async fn session_store_assigns_id_and_token() {
        let store = InMemorySessionStore::new();
        let session = store
            .create_session(NewSession {
                user_id: "u1".into(),
                roles: "system_user".into(),
                is_oauth: true,
                props: BTreeMap::new(),
                expires_at: 42,
            })
            .await
            .unwrap();
        assert!(!session.id.is_empty());
        assert_ne!(session.id, session.token);
        assert_eq!(store.find_by_token(&session.token).await, Some(session));
    }

    fn pairing_user() -> User {
        User {
            id: "u1".into(),
            email: "a@b.c".into(),
            username: "a".into(),
            full_name: None,
            position: None,
            roles: String::new(),
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn pairing_credentials_are_unique_and_redeem_once() {
        let issuer = InMemoryPairingIssuer::new();
        let user = pairing_user();
        let first = issuer.mint(&user, 1000).await.unwrap();
        let second = issuer.mint(&user, 1000).await.unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(first.user_id, "u1");
        assert_eq!(issuer.outstanding().await, 2);

        assert_eq!(issuer.redeem(&first.token).await, Some(first.clone()));
        assert_eq!(issuer.redeem(&first.token).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_pairing_credential_cannot_be_redeemed() {
        let issuer = InMemoryPairingIssuer::with_ttl(Duration::from_secs(60));
        let credential = issuer.mint(&pairing_user(), 1000).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(issuer.redeem(&credential.token).await, None);
        assert_eq!(issuer.outstanding().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pairing_credential_redeems_within_ttl() {
        let issuer = InMemoryPairingIssuer::with_ttl(Duration::from_secs(60));
        let credential = issuer.mint(&pairing_user(), 1000).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(issuer.redeem(&credential.token).await, Some(credential));
    }

    #[tokio::test(start_paused = true)]
    async fn unredeemed_credentials_do_not_accumulate() {
        let issuer = InMemoryPairingIssuer::with_ttl(Duration::from_secs(60));
        let user = pairing_user();
        for _ in 0..50 {
            issuer.mint(&user, 1000).await.unwrap();
            tokio::time::advance(Duration::from_secs(30)).await;
        }
        // Only credentials minted within the last 60s survive
        assert_eq!(issuer.outstanding().await, 2);
    }
}
