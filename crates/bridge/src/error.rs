//! Login failure taxonomy
//!
//! Every terminal failure of `/auth/start` or `/auth/complete` is one of
//! these. The HTTP body carries only the category and a fixed message; the
//! cause string is for logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// Required query parameter missing or empty
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Provider redirected back with `error=...` instead of a code
    #[error("provider denied the login: {0}")]
    ProviderDenied(String),

    #[error("token exchange failed: {0}")]
    Exchange(String),

    /// Token response had no ID token
    #[error("token response carried no ID token")]
    MalformedResponse,

    #[error("ID token rejected: {0}")]
    Unauthorized(String),

    #[error("claims could not be decoded: {0}")]
    MalformedClaims(String),

    #[error("user provisioning failed: {0}")]
    Provisioning(String),

    #[error("session creation failed: {0}")]
    Session(String),

    #[error("pairing credential minting failed: {0}")]
    Pairing(String),
}

impl LoginError {
    pub fn status(&self) -> StatusCode {
        match self {
            LoginError::InvalidRequest(_)
            | LoginError::ProviderDenied(_)
            | LoginError::MalformedResponse => StatusCode::BAD_REQUEST,
            LoginError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            LoginError::Exchange(_)
            | LoginError::MalformedClaims(_)
            | LoginError::Provisioning(_)
            | LoginError::Session(_)
            | LoginError::Pairing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable label for the response body and the failure metric.
    pub fn kind(&self) -> &'static str {
        match self {
            LoginError::InvalidRequest(_) => "invalid_request",
            LoginError::ProviderDenied(_) => "provider_denied",
            LoginError::Exchange(_) => "exchange_error",
            LoginError::MalformedResponse => "malformed_response",
            LoginError::Unauthorized(_) => "unauthorized",
            LoginError::MalformedClaims(_) => "malformed_claims",
            LoginError::Provisioning(_) => "provisioning_error",
            LoginError::Session(_) => "session_error",
            LoginError::Pairing(_) => "pairing_error",
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            LoginError::InvalidRequest(_) => "The login request is missing required parameters.",
            LoginError::ProviderDenied(_) => "The identity provider did not authorize this login.",
            LoginError::Exchange(_) => "Could not complete sign-in with the identity provider.",
            LoginError::MalformedResponse => "The identity provider returned an incomplete response.",
            LoginError::Unauthorized(_) => "The identity token could not be verified.",
            LoginError::MalformedClaims(_) => "The identity token is missing required information.",
            LoginError::Provisioning(_) => "Could not create your account.",
            LoginError::Session(_) => "Could not start your session.",
            LoginError::Pairing(_) => "Could not complete desktop sign-in.",
        }
    }
}

/// `{"error":{"type":"...","message":"..."}}`
impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "type": self.kind(),
                "message": self.public_message(),
            }
        });
        (
            self.status(),
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
