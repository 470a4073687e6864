//! Error type for `hotspots-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value no domain type accepts.
  #[error("undecodable column value: {0}")]
  Decode(String),

  /// A uniqueness constraint rejected the write.
  #[error("{0} already exists")]
  Duplicate(String),
}

impl From<Error> for hotspots_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Duplicate(what) => hotspots_core::Error::Duplicate(what),
      other => hotspots_core::Error::store(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
