//! Login completion
//!
//! Strictly sequential, no retries; the first failing step ends the request:
//!
//! ```text
//! take(state) ─► Pending ─► exchange ─► id_token? ─► verify ─► claims ─► resolve ─┬─► Desktop
//!                                                                                 └─► Standard
//! ```
//!
//! The branch is decided by the state store alone, before any provider call,
//! so nothing the caller sends on the completion request can select it and a
//! replayed state can never reach the desktop branch twice.

use std::sync::Arc;

use identity::{IdentityClaims, IdentityVerifier, Session, User};
use state_store::CorrelationStore;
use tracing::{info, warn};
use url::Url;

use crate::error::LoginError;
use crate::materialize::Materializer;
use crate::resolution::Resolver;

/// Which post-login path a completion takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginBranch {
    /// The state was recorded with this (non-blank) pairing token
    Desktop { pairing_token: String },
    Standard,
}

impl LoginBranch {
    pub fn label(&self) -> &'static str {
        match self {
            LoginBranch::Desktop { .. } => "desktop",
            LoginBranch::Standard => "standard",
        }
    }
}

/// Result of a successful completion.
#[derive(Debug)]
pub enum LoginOutcome {
    Desktop { user: User, redirect: Url },
    Standard { user: User, session: Session },
}

impl LoginOutcome {
    pub fn user(&self) -> &User {
        match self {
            LoginOutcome::Desktop { user, .. } | LoginOutcome::Standard { user, .. } => user,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoginOutcome::Desktop { .. } => "desktop",
            LoginOutcome::Standard { .. } => "standard",
        }
    }
}

pub struct CallbackProcessor {
    verifier: Arc<dyn IdentityVerifier>,
    store: Arc<CorrelationStore>,
    resolver: Resolver,
    materializer: Materializer,
}

impl CallbackProcessor {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        store: Arc<CorrelationStore>,
        resolver: Resolver,
        materializer: Materializer,
    ) -> Self {
        Self {
            verifier,
            store,
            resolver,
            materializer,
        }
    }

    /// Consume `state` and decide the branch. Runs exactly once per
    /// completion, before the provider is contacted.
    pub async fn branch_for(&self, state: &str) -> LoginBranch {
        match self.store.take(state).await {
            Some(pairing_token) if !pairing_token.trim().is_empty() => {
                LoginBranch::Desktop { pairing_token }
            }
            _ => LoginBranch::Standard,
        }
    }

    pub async fn complete(&self, code: &str, state: &str) -> Result<LoginOutcome, LoginError> {
        let branch = self.branch_for(state).await;
        let label = branch.label();

        let tokens = self.verifier.exchange(code).await.map_err(|e| {
            warn!(error = %e, branch = label, "authorization code exchange failed");
            LoginError::Exchange(e.to_string())
        })?;

        let raw_id_token = tokens
            .id_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                warn!(branch = label, "token response without ID token");
                LoginError::MalformedResponse
            })?;

        let verified = self.verifier.verify(&raw_id_token).await.map_err(|e| {
            warn!(error = %e, branch = label, "ID token rejected");
            LoginError::Unauthorized(e.to_string())
        })?;

        let claims = IdentityClaims::from_verified(&verified).map_err(|e| {
            warn!(error = %e, "verified ID token has unusable claims");
            LoginError::MalformedClaims(e.to_string())
        })?;

        let user = self.resolver.resolve(&claims).await?;

        let outcome = match branch {
            LoginBranch::Desktop { pairing_token } => {
                let redirect = self.materializer.desktop(&user, &pairing_token).await?;
                LoginOutcome::Desktop { user, redirect }
            }
            LoginBranch::Standard => {
                let session = self.materializer.standard(&user).await?;
                LoginOutcome::Standard { user, session }
            }
        };

        info!(user_id = %outcome.user().id, branch = label, "login completed");
        Ok(outcome)
    }
}
