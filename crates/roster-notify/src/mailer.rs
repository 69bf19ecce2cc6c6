//! [`SmtpMailer`]: the SMTP implementation of [`MailSender`].

use lettre::{
  AsyncSmtpTransport, AsyncTransport as _, Message, Tokio1Executor,
  message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
  transport::smtp::authentication::Credentials,
};
use roster_core::mail::{MailSender, OutgoingMail};
use serde::Deserialize;
use tracing::info;

use crate::{DEFAULT_SUBJECT_PREFIX, Error, Result};

fn default_smtp_port() -> u16 { 587 }

fn default_subject_prefix() -> String { DEFAULT_SUBJECT_PREFIX.to_owned() }

/// SMTP settings, the `[mail]` table of the server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
  pub smtp_host:      String,
  #[serde(default = "default_smtp_port")]
  pub smtp_port:      u16,
  pub username:       String,
  pub password:       String,
  /// Sender mailbox, e.g. `"District Office <office@example.org>"`.
  pub from:           String,
  #[serde(default)]
  pub reply_to:       Option<String>,
  /// Blind copy on personal greetings.
  #[serde(default)]
  pub bcc:            Option<String>,
  #[serde(default = "default_subject_prefix")]
  pub subject_prefix: String,
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
  address
    .trim()
    .parse::<Mailbox>()
    .map_err(|e| Error::Address(format!("{address:?}: {e}")))
}

/// Sends mail through a STARTTLS SMTP relay.
pub struct SmtpMailer {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from:      Mailbox,
  reply_to:  Option<Mailbox>,
}

impl SmtpMailer {
  pub fn new(config: &MailConfig) -> Result<Self> {
    let from = parse_mailbox(&config.from)?;
    let reply_to = config.reply_to.as_deref().map(parse_mailbox).transpose()?;

    info!(host = %config.smtp_host, port = config.smtp_port, "configuring SMTP relay");
    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
      .map_err(Error::mail)?
      .port(config.smtp_port)
      .credentials(Credentials::new(config.username.clone(), config.password.clone()))
      .build();

    Ok(Self { transport, from, reply_to })
  }

  fn build_message(&self, mail: OutgoingMail) -> Result<Message> {
    let mut builder = Message::builder()
      .from(self.from.clone())
      .to(parse_mailbox(&mail.to)?)
      .subject(mail.subject);
    if let Some(reply_to) = &self.reply_to {
      builder = builder.reply_to(reply_to.clone());
    }
    for bcc in &mail.bcc {
      builder = builder.bcc(parse_mailbox(bcc)?);
    }

    let mut body = MultiPart::related().singlepart(SinglePart::html(mail.html_body));
    for attachment in mail.attachments {
      let content_type = ContentType::parse(&attachment.content_type).map_err(Error::mail)?;
      body = body.singlepart(
        Attachment::new_inline(attachment.content_id)
          .body(attachment.bytes.to_vec(), content_type),
      );
    }

    builder.multipart(body).map_err(Error::mail)
  }
}

impl MailSender for SmtpMailer {
  type Error = Error;

  async fn send(&self, mail: OutgoingMail) -> Result<()> {
    let message = self.build_message(mail)?;
    self.transport.send(message).await.map_err(Error::mail)?;
    Ok(())
  }
}
