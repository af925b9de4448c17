//! Common types shared by the login bridge crates

mod secret;
mod error;

pub use secret::Secret;
pub use error::{Error, Result};
