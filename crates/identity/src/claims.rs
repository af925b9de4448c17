//! Provider token set and verified identity claims

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};

/// Token endpoint response for the authorization-code grant.
///
/// `id_token` is optional at the wire level; its absence is a protocol
/// violation the callback reports separately from an exchange failure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Claim set of an ID token that has passed signature, issuer, audience and
/// expiry checks.
#[derive(Debug, Clone)]
pub struct VerifiedIdToken {
    claims: serde_json::Value,
}

impl VerifiedIdToken {
    /// Wrap a claim set. Only verifiers should call this, after validation.
    pub fn from_verified_claims(claims: serde_json::Value) -> Self {
        Self { claims }
    }

    /// Decode the claim set into a typed structure.
    pub fn claims<T: DeserializeOwned>(&self) -> Result<T, ClaimsError> {
        serde_json::from_value(self.claims.clone()).map_err(|e| ClaimsError(e.to_string()))
    }

    /// The `sub` claim, if present.
    pub fn subject(&self) -> Option<&str> {
        self.claims.get("sub").and_then(|v| v.as_str())
    }
}

/// The verified claim set could not be decoded.
#[derive(Debug, thiserror::Error)]
#[error("invalid claims: {0}")]
pub struct ClaimsError(pub String);

/// Normalized identity attributes taken from a verified ID token.
///
/// Immutable once decoded; consumed only by identity resolution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityClaims {
    #[serde(deserialize_with = "non_blank")]
    pub email: String,
    #[serde(default, rename = "name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl IdentityClaims {
    pub fn from_verified(token: &VerifiedIdToken) -> Result<Self, ClaimsError> {
        token.claims()
    }
}

fn non_blank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = String::deserialize(deserializer)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(de::Error::custom("email claim is empty"));
    }
    Ok(trimmed.to_owned())
}
