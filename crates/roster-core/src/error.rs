//! Error types for `roster-core`.

use thiserror::Error;

use crate::person::PersonId;

#[derive(Debug, Error)]
pub enum Error {
  /// The record store could not be queried. Never retried here.
  #[error("record store unavailable: {0}")]
  DataUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("invalid month-day value: {0:?}")]
  InvalidMonthDay(String),

  #[error("unknown person kind: {0:?}")]
  UnknownPersonKind(String),

  #[error("unknown match kind: {0:?}")]
  UnknownMatchKind(String),

  #[error("unknown image role: {0:?}")]
  UnknownImageRole(String),
}

impl Error {
  pub fn data_unavailable<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::DataUnavailable(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A store row that could not be turned into a candidate.
///
/// This is a per-row value rather than an operation failure: the matcher logs
/// and skips it, and the rest of the batch proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed record (id {id:?}): {reason}")]
pub struct MalformedRecord {
  pub id:     Option<PersonId>,
  pub reason: String,
}

impl MalformedRecord {
  pub fn new(id: Option<PersonId>, reason: impl Into<String>) -> Self {
    Self { id, reason: reason.into() }
  }
}
