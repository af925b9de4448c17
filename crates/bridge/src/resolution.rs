//! Identity resolution
//!
//! Email lookup first; provision only when the directory has no match.
//! Existing users are returned as stored, never updated from claims.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use common::Secret;
use identity::{IdentityClaims, NewUser, User, UserDirectory};
use rand::RngExt;
use tracing::{error, info};

use crate::error::LoginError;
use crate::{profile, username};

pub struct Resolver {
    directory: Arc<dyn UserDirectory>,
}

impl Resolver {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    pub async fn resolve(&self, claims: &IdentityClaims) -> Result<User, LoginError> {
        if let Some(user) = self.lookup(&claims.email).await? {
            return Ok(user);
        }

        let new_user = NewUser {
            email: claims.email.clone(),
            username: username::choose(claims.preferred_username.as_deref(), &claims.email),
            password: placeholder_password(),
            full_name: profile::full_name(claims),
            position: profile::position(claims),
        };

        match self.directory.create_user(new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, username = %user.username, "provisioned user");
                Ok(user)
            }
            Err(create_err) => {
                // A concurrent login for the same identity may have won the create
                if let Some(user) = self.lookup(&claims.email).await? {
                    return Ok(user);
                }
                error!(error = %create_err, "user creation failed");
                Err(LoginError::Provisioning(create_err.to_string()))
            }
        }
    }

    async fn lookup(&self, email: &str) -> Result<Option<User>, LoginError> {
        self.directory.find_by_email(email).await.map_err(|e| {
            error!(error = %e, "user lookup failed");
            LoginError::Provisioning(e.to_string())
        })
    }
}

/// Random credential nobody knows; the account only signs in through the
/// identity provider.
fn placeholder_password() -> Secret<String> {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    Secret::new(URL_SAFE_NO_PAD.encode(bytes))
}
