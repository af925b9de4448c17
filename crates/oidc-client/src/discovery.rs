//! Provider metadata discovery and key set retrieval

use jsonwebtoken::jwk::JwkSet;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::constants::{DEFAULT_SIGNING_ALGS, WELL_KNOWN_PATH};
use crate::error::{Error, Result};

/// Subset of the OpenID Provider Metadata document the bridge relies on.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: Url,
    pub token_endpoint: Url,
    pub jwks_uri: Url,
    #[serde(default)]
    pub userinfo_endpoint: Option<Url>,
    #[serde(default = "default_signing_algs")]
    pub id_token_signing_alg_values_supported: Vec<String>,
}

fn default_signing_algs() -> Vec<String> {
    DEFAULT_SIGNING_ALGS.iter().map(|s| s.to_string()).collect()
}

/// `{issuer}/.well-known/openid-configuration`, tolerating a trailing slash.
pub fn well_known_url(issuer: &Url) -> Result<Url> {
    let base = issuer.as_str().trim_end_matches('/');
    format!("{base}/{WELL_KNOWN_PATH}")
        .parse()
        .map_err(|e| Error::InvalidConfig(format!("issuer url: {e}")))
}

/// Fetch and validate the provider metadata for `issuer`.
///
/// The document's `issuer` must match the configured issuer (ignoring one
/// trailing slash), otherwise ID tokens could never validate.
pub async fn discover(client: &reqwest::Client, issuer: &Url) -> Result<ProviderMetadata> {
    let url = well_known_url(issuer)?;
    debug!(url = %url, "fetching provider metadata");

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| Error::Http(format!("discovery request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Discovery(format!("{url} returned {status}")));
    }

    let metadata = response
        .json::<ProviderMetadata>()
        .await
        .map_err(|e| Error::Discovery(format!("invalid metadata document: {e}")))?;

    if metadata.issuer.trim_end_matches('/') != issuer.as_str().trim_end_matches('/') {
        return Err(Error::Discovery(format!(
            "issuer mismatch: configured {issuer}, provider reports {}",
            metadata.issuer
        )));
    }

    info!(
        issuer = %metadata.issuer,
        algs = ?metadata.id_token_signing_alg_values_supported,
        "provider metadata discovered"
    );
    Ok(metadata)
}

/// Fetch the provider's JSON Web Key Set.
pub async fn fetch_jwks(client: &reqwest::Client, jwks_uri: &Url) -> Result<JwkSet> {
    let response = client
        .get(jwks_uri.clone())
        .send()
        .await
        .map_err(|e| Error::Http(format!("JWKS request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Discovery(format!("{jwks_uri} returned {status}")));
    }

    let jwks = response
        .json::<JwkSet>()
        .await
        .map_err(|e| Error::Discovery(format!("invalid JWKS document: {e}")))?;
    debug!(keys = jwks.keys.len(), "fetched JWKS");
    Ok(jwks)
}
