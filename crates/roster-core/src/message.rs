//! The outgoing phone-message seam.

use std::future::Future;

use serde::Serialize;

use crate::{occasion::OccasionKind, person::PersonId};

/// One templated message to one phone number.
///
/// The message service picks the template from `type` and looks the person
/// up by `id`; only the routing data travels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneMessage {
  pub number:     String,
  #[serde(rename = "id")]
  pub subject_id: PersonId,
  #[serde(rename = "type")]
  pub kind:       OccasionKind,
}

/// Something that can deliver a [`PhoneMessage`].
pub trait MessageSender: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send_message(
    &self,
    message: PhoneMessage,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
