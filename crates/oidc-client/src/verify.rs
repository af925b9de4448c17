//! ID token verification
//!
//! Checks the JWS signature against the provider's JWKS, then issuer,
//! audience, expiry and not-before (with `CLOCK_SKEW_LEEWAY_SECS` of
//! leeway). The key set is cached; a token carrying an unknown `kid`
//! triggers one refetch, rate limited to `JWKS_REFRESH_MIN_INTERVAL_SECS`, so
//! provider key rotation is picked up without a restart.

use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::constants::{CLOCK_SKEW_LEEWAY_SECS, JWKS_REFRESH_MIN_INTERVAL_SECS};
use crate::discovery::fetch_jwks;
use crate::error::{Error, Result};

const REQUIRED_CLAIMS: &[&str] = &["exp", "iss", "aud", "sub"];

enum KeySource {
    Remote {
        http: reqwest::Client,
        jwks_uri: Url,
        cache: RwLock<KeyCache>,
        min_refresh: Duration,
    },
    Static(DecodingKey),
}

struct KeyCache {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Verifies ID tokens issued to one client by one provider.
pub struct IdTokenVerifier {
    issuer: String,
    audience: String,
    algorithms: Vec<Algorithm>,
    keys: KeySource,
}

impl IdTokenVerifier {
    /// Verifier backed by the provider's JWKS endpoint. Fetches the key set
    /// immediately so a broken `jwks_uri` fails at startup.
    ///
    /// `algorithms` is the provider's advertised
    /// `id_token_signing_alg_values_supported`; names jsonwebtoken does not
    /// know (e.g. `none`) are ignored.
    pub async fn remote(
        http: reqwest::Client,
        jwks_uri: Url,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        algorithms: &[String],
    ) -> Result<Self> {
        let algorithms = parse_algorithms(algorithms)?;
        let jwks = fetch_jwks(&http, &jwks_uri).await?;
        info!(keys = jwks.keys.len(), "loaded provider signing keys");

        Ok(Self {
            issuer: issuer.into(),
            audience: audience.into(),
            algorithms,
            keys: KeySource::Remote {
                http,
                jwks_uri,
                cache: RwLock::new(KeyCache {
                    jwks,
                    fetched_at: Instant::now(),
                }),
                min_refresh: Duration::from_secs(JWKS_REFRESH_MIN_INTERVAL_SECS),
            },
        })
    }

    /// Verifier with a single fixed key, for providers without a JWKS
    /// endpoint and for tests.
    pub fn with_static_key(
        key: DecodingKey,
        algorithm: Algorithm,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            algorithms: vec![algorithm],
            keys: KeySource::Static(key),
        }
    }

    /// Override the minimum interval between JWKS refetches.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        if let KeySource::Remote { min_refresh, .. } = &mut self.keys {
            *min_refresh = interval;
        }
        self
    }

    /// Verify `raw` and return its claim set.
    pub async fn verify(&self, raw: &str) -> Result<serde_json::Value> {
        let header = jsonwebtoken::decode_header(raw)?;
        if !self.algorithms.contains(&header.alg) {
            return Err(Error::Verification(format!(
                "signing algorithm {:?} not allowed",
                header.alg
            )));
        }

        let key = self.decoding_key(&header).await?;

        let mut validation = Validation::new(header.alg);
        validation.algorithms = vec![header.alg];
        validation.leeway = CLOCK_SKEW_LEEWAY_SECS;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(REQUIRED_CLAIMS);

        let data = jsonwebtoken::decode::<serde_json::Value>(raw, &key, &validation)?;
        Ok(data.claims)
    }

    async fn decoding_key(&self, header: &Header) -> Result<DecodingKey> {
        let (http, jwks_uri, cache, min_refresh) = match &self.keys {
            KeySource::Static(key) => return Ok(key.clone()),
            KeySource::Remote {
                http,
                jwks_uri,
                cache,
                min_refresh,
            } => (http, jwks_uri, cache, *min_refresh),
        };

        {
            let cached = cache.read().await;
            if let Some(key) = select_key(&cached.jwks, header.kid.as_deref())? {
                return Ok(key);
            }
        }

        // Only an unknown kid reaches here; a missing kid is decided above.
        let kid = header.kid.as_deref().unwrap_or_default();
        let mut cached = cache.write().await;

        // Another request may have refreshed while we waited for the lock
        if let Some(key) = select_key(&cached.jwks, Some(kid))? {
            return Ok(key);
        }

        if cached.fetched_at.elapsed() < min_refresh {
            warn!(kid, "unknown signing key, JWKS refresh rate limited");
            return Err(Error::Verification(format!("unknown signing key id {kid}")));
        }

        debug!(kid, "unknown signing key, refetching JWKS");
        let jwks = fetch_jwks(http, jwks_uri).await?;
        cached.jwks = jwks;
        cached.fetched_at = Instant::now();
        info!(keys = cached.jwks.keys.len(), "refreshed provider signing keys");

        select_key(&cached.jwks, Some(kid))?
            .ok_or_else(|| Error::Verification(format!("unknown signing key id {kid}")))
    }
}

/// Pick the key for `kid`. A token without `kid` is only accepted when the
/// set holds exactly one key. `Ok(None)` means the kid is not in the set.
fn select_key(jwks: &JwkSet, kid: Option<&str>) -> Result<Option<DecodingKey>> {
    let jwk = match kid {
        Some(kid) => match jwks.find(kid) {
            Some(jwk) => jwk,
            None => return Ok(None),
        },
        None => match jwks.keys.as_slice() {
            [only] => only,
            keys => {
                return Err(Error::Verification(format!(
                    "token has no kid and key set holds {} keys",
                    keys.len()
                )));
            }
        },
    };
    Ok(Some(DecodingKey::from_jwk(jwk)?))
}

fn parse_algorithms(names: &[String]) -> Result<Vec<Algorithm>> {
    let algorithms: Vec<Algorithm> = names
        .iter()
        .filter_map(|name| Algorithm::from_str(name).ok())
        .collect();
    if algorithms.is_empty() {
        return Err(Error::InvalidConfig(format!(
            "provider advertises no supported signing algorithm: {names:?}"
        )));
    }
    Ok(algorithms)
}
