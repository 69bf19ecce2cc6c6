//! The outgoing-mail seam.

use std::future::Future;

use bytes::Bytes;

/// An image embedded in a message and referenced from the HTML body as
/// `cid:<content_id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAttachment {
  pub content_id:   String,
  pub filename:     String,
  pub content_type: String,
  pub bytes:        Bytes,
}

/// One rendered message for one recipient.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
  pub to:          String,
  /// Blind copies in addition to `to`.
  pub bcc:         Vec<String>,
  pub subject:     String,
  pub html_body:   String,
  pub attachments: Vec<InlineAttachment>,
}

/// Something that can deliver an [`OutgoingMail`].
pub trait MailSender: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send(
    &self,
    mail: OutgoingMail,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
