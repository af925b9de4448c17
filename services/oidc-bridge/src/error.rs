//! Service-specific error types

use thiserror::Error;

/// Startup errors that disable the bridge without stopping the process.
///
/// Fatal startup errors (config, bind) go through `anyhow` in `main`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("identity provider discovery failed: {0}")]
    Discovery(#[from] oidc_client::Error),
}

/// Result alias using service Error
pub type Result<T> = std::result::Result<T, Error>;
