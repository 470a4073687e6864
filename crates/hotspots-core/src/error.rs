//! Error types for `hotspots-core`.
//!
//! Every core operation resolves to one of these variants; the boundary layer
//! maps them onto transport status codes.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("spot not found: {0}")]
  SpotNotFound(Uuid),

  #[error("review not found: {0}")]
  ReviewNotFound(Uuid),

  #[error("image not found: {0}")]
  ImageNotFound(Uuid),

  #[error("already exists: {0}")]
  Duplicate(String),

  /// The caller is authenticated but may not mutate the target.
  #[error("forbidden: {0}")]
  Forbidden(String),

  /// The credential was missing, malformed or failed verification.
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("invalid input: {0}")]
  Invalid(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend failure that has no domain meaning.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
