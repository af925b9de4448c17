//! Error types for OIDC client operations

/// Errors from discovery, token exchange and ID token verification.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("provider discovery failed: {0}")]
    Discovery(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("ID token verification failed: {0}")]
    Verification(String),

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Verification(err.to_string())
    }
}

/// Result alias for OIDC client operations.
pub type Result<T> = std::result::Result<T, Error>;
