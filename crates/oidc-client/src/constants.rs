//! Protocol constants

/// Discovery document path, relative to the issuer URL
pub const WELL_KNOWN_PATH: &str = ".well-known/openid-configuration";

/// Scopes every authorization request carries: identity, email and profile.
pub const REQUIRED_SCOPES: &[&str] = &["openid", "email", "profile"];

/// Signing algorithms assumed when discovery omits
/// `id_token_signing_alg_values_supported`. OIDC Core makes RS256 mandatory.
pub const DEFAULT_SIGNING_ALGS: &[&str] = &["RS256"];

/// Clock skew tolerated on `exp`/`nbf`, in seconds
pub const CLOCK_SKEW_LEEWAY_SECS: u64 = 60;

/// Minimum spacing between JWKS re-fetches triggered by unknown key ids
pub const JWKS_REFRESH_MIN_INTERVAL_SECS: u64 = 30;
