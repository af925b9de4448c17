//! Discovered relying-party client
//!
//! `OidcClient` is built once at startup from `OidcSettings` and the
//! provider's discovery document, then shared by every login attempt.

use common::Secret;
use identity::{BoxFuture, IdentityVerifier, TokenSet, VerifiedIdToken, VerifierError};
use url::Url;

use crate::authorize::AuthorizeParams;
use crate::discovery::{self, ProviderMetadata};
use crate::error::Result;
use crate::token::{self, ClientCredentials};
use crate::verify::IdTokenVerifier;

/// Static relying-party registration.
#[derive(Debug, Clone)]
pub struct OidcSettings {
    /// Label recorded on sessions as `auth_service`
    pub service_name: String,
    pub issuer: Url,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_url: Url,
    /// Extra scopes; `REQUIRED_SCOPES` are always added
    pub scopes: Vec<String>,
}

pub struct OidcClient {
    service_name: String,
    http: reqwest::Client,
    metadata: ProviderMetadata,
    authorize: AuthorizeParams,
    credentials: ClientCredentials,
    verifier: IdTokenVerifier,
}

impl OidcClient {
    /// Run discovery against `settings.issuer` and load the signing keys.
    pub async fn discover(http: reqwest::Client, settings: OidcSettings) -> Result<Self> {
        let metadata = discovery::discover(&http, &settings.issuer).await?;
        let verifier = IdTokenVerifier::remote(
            http.clone(),
            metadata.jwks_uri.clone(),
            metadata.issuer.clone(),
            settings.client_id.clone(),
            &metadata.id_token_signing_alg_values_supported,
        )
        .await?;
        Ok(Self::from_parts(http, settings, metadata, verifier))
    }

    /// Assemble a client from already-known metadata and verifier.
    pub fn from_parts(
        http: reqwest::Client,
        settings: OidcSettings,
        metadata: ProviderMetadata,
        verifier: IdTokenVerifier,
    ) -> Self {
        let authorize = AuthorizeParams::new(
            metadata.authorization_endpoint.clone(),
            settings.client_id.clone(),
            settings.redirect_url.clone(),
            &settings.scopes,
        );
        let credentials = ClientCredentials {
            client_id: settings.client_id,
            client_secret: settings.client_secret,
            redirect_url: settings.redirect_url,
        };
        Self {
            service_name: settings.service_name,
            http,
            metadata,
            authorize,
            credentials,
            verifier,
        }
    }

    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    pub fn authorize_params(&self) -> &AuthorizeParams {
        &self.authorize
    }
}

impl IdentityVerifier for OidcClient {
    fn id(&self) -> &str {
        &self.service_name
    }

    fn exchange<'a>(
        &'a self,
        code: &'a str,
    ) -> BoxFuture<'a, std::result::Result<TokenSet, VerifierError>> {
        Box::pin(async move {
            token::exchange_code(
                &self.http,
                &self.metadata.token_endpoint,
                &self.credentials,
                code,
            )
            .await
            .map_err(|e| VerifierError::Exchange(e.to_string()))
        })
    }

    fn verify<'a>(
        &'a self,
        raw_id_token: &'a str,
    ) -> BoxFuture<'a, std::result::Result<VerifiedIdToken, VerifierError>> {
        Box::pin(async move {
            self.verifier
                .verify(raw_id_token)
                .await
                .map(VerifiedIdToken::from_verified_claims)
                .map_err(|e| VerifierError::Verification(e.to_string()))
        })
    }
}
