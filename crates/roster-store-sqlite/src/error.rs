//! Error type for `roster-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] roster_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A paging value does not fit a SQL integer.
  #[error("{0} out of range: {1}")]
  OutOfRange(&'static str, usize),

  /// A single-record read hit a row that does not decode.
  #[error(transparent)]
  Malformed(#[from] roster_core::MalformedRecord),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
