//! Startup errors for the server crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unsupported JWT algorithm: {0}")]
  Algorithm(String),

  #[error("invalid JWT key: {0}")]
  Key(#[source] jsonwebtoken::errors::Error),

  #[error("failed to sign token: {0}")]
  Sign(#[source] jsonwebtoken::errors::Error),

  #[error("invalid configuration: {0}")]
  Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
