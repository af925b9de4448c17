//! Authorization code exchange
//!
//! POSTs the code to the provider's token endpoint with the confidential
//! client's credentials (HTTP Basic) and returns the provider's token set.

use common::Secret;
use identity::TokenSet;
use url::Url;

use crate::error::{Error, Result};

/// Confidential client registration at the provider.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Must equal the `redirect_uri` sent on the authorization request.
    pub redirect_url: Url,
}

/// Exchange an authorization code for tokens.
///
/// A non-2xx response surfaces the status and body in the error so the
/// provider's `error_description` reaches the logs.
pub async fn exchange_code(
    client: &reqwest::Client,
    token_endpoint: &Url,
    credentials: &ClientCredentials,
    code: &str,
) -> Result<TokenSet> {
    let response = client
        .post(token_endpoint.clone())
        .basic_auth(
            &credentials.client_id,
            Some(credentials.client_secret.expose()),
        )
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", credentials.redirect_url.as_str()),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::TokenExchange(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<TokenSet>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))
}
