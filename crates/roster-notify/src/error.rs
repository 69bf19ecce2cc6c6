//! Error type for `roster-notify`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The transport refused or failed to deliver a message.
  #[error("mail error: {0}")]
  Mail(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The message service refused or could not be reached.
  #[error("message error: {0}")]
  Message(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("invalid mail address: {0}")]
  Address(String),
}

impl Error {
  pub fn mail<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Mail(Box::new(err))
  }

  pub fn message<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Message(Box::new(err))
  }

  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
