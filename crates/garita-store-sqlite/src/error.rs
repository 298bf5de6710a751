//! Error type for `garita-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] garita_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// An enum column held a value this version does not know.
  #[error("undecodable column value: {0}")]
  Decode(String),
}

/// Lift a store failure into the core taxonomy. Core errors pass through so
/// conflict and not-found variants keep their structure; infrastructure
/// failures collapse into [`garita_core::Error::Store`].
impl From<Error> for garita_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => garita_core::Error::Store(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
