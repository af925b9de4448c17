//! OpenID Connect relying-party client
//!
//! Discovery, authorization-URL construction, authorization-code exchange and
//! ID token verification against the provider's JWKS. `OidcClient` bundles
//! these and implements `identity::IdentityVerifier` for the bridge.
//!
//! Flow:
//! 1. `OidcClient::discover()` fetches provider metadata and the JWKS once
//! 2. `AuthorizeParams::authorization_url()` builds the redirect for each login
//! 3. `token::exchange_code()` trades the returned code for a token set
//! 4. `IdTokenVerifier::verify()` checks signature, issuer, audience and expiry

pub mod authorize;
pub mod client;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod token;
pub mod verify;

pub use authorize::{AuthorizeParams, generate_state};
pub use client::{OidcClient, OidcSettings};
pub use constants::*;
pub use discovery::{ProviderMetadata, discover, fetch_jwks};
pub use error::{Error, Result};
pub use token::{ClientCredentials, exchange_code};
pub use verify::IdTokenVerifier;
