//! Host-owned records the bridge reads and creates

use std::collections::BTreeMap;

use common::Secret;

/// A user in the host directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub position: Option<String>,
    /// Space-separated role names, inherited by new sessions
    pub roles: String,
    /// Unix milliseconds
    pub created_at: u64,
}

/// Provisioning request for a user seen for the first time.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    /// Opaque placeholder. The user never signs in with a local password.
    pub password: Secret<String>,
    pub full_name: Option<String>,
    pub position: Option<String>,
}

/// Session creation request (standard login only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub user_id: String,
    pub roles: String,
    pub is_oauth: bool,
    /// Provenance: `auth_service`, `auth_provider`, `email`
    pub props: BTreeMap<String, String>,
    /// Unix milliseconds
    pub expires_at: u64,
}

/// A persisted session as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub token: String,
    pub user_id: String,
    pub roles: String,
    pub is_oauth: bool,
    pub props: BTreeMap<String, String>,
    pub created_at: u64,
    pub expires_at: u64,
}

/// Server-minted credential handed to a desktop client on the pairing branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingCredential {
    pub token: String,
    pub user_id: String,
    /// Unix milliseconds
    pub issued_at: u64,
}
