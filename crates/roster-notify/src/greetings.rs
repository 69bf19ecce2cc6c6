//! Personal greetings: one message to each person being celebrated.

use roster_core::{
  blob::{BlobStore, ImageRole},
  date::MonthDay,
  mail::{InlineAttachment, MailSender, OutgoingMail},
  occasion::{Occasion, OccasionKind},
  store::RecordStore,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
  DispatchReport, Notifier, dispatch,
  images::{content_type_for, fetch_all, poster_cid},
  render::DigestRenderer,
};

/// What a renderer needs for one personal greeting.
#[derive(Debug, Clone, Serialize)]
pub struct Greeting {
  pub occasion:   Occasion,
  pub poster_cid: Option<String>,
}

pub fn greeting_subject(occasion: &Occasion) -> String {
  match occasion.kind {
    OccasionKind::Birthday => format!("Happy Birthday, {}!", occasion.name),
    OccasionKind::Anniversary => format!("Happy Anniversary, {}!", occasion.headline()),
  }
}

/// Blob name of the poster for `occasion`, if one is flagged.
///
/// Anniversaries prefer the subject's poster and fall back to the partner's.
pub fn poster_blob(occasion: &Occasion) -> Option<String> {
  match occasion.kind {
    OccasionKind::Birthday => occasion
      .subject_images
      .poster
      .then(|| ImageRole::Poster.blob_name(occasion.subject_id)),
    OccasionKind::Anniversary => {
      if occasion.subject_images.anniversary_poster {
        return Some(ImageRole::AnniversaryPoster.blob_name(occasion.subject_id));
      }
      occasion
        .partner_subject_id
        .zip(occasion.partner_images)
        .filter(|(_, flags)| flags.anniversary_poster)
        .map(|(id, _)| ImageRole::AnniversaryPoster.blob_name(id))
    }
  }
}

impl<S, R> Notifier<S, R>
where
  S: RecordStore + BlobStore + 'static,
  R: DigestRenderer,
{
  /// Build one message per occasion on `date` whose subject has an email.
  pub async fn prepare_greetings(&self, date: MonthDay) -> Vec<OutgoingMail> {
    let occasions: Vec<Occasion> = self
      .occasions_by_kind(date)
      .await
      .into_iter()
      .flat_map(|(_, occasions)| occasions)
      .filter(|o| {
        let has_email = o.email.is_some();
        if !has_email {
          debug!(id = %o.subject_id, "no email; greeting skipped");
        }
        has_email
      })
      .collect();

    let posters = fetch_all(
      &self.store,
      occasions.iter().filter_map(poster_blob),
      self.options.blob_fetch_attempts,
      self.options.blob_retry_delay,
    )
    .await;

    occasions
      .into_iter()
      .filter_map(|occasion| {
        let to = occasion.email.clone()?;
        let poster = poster_blob(&occasion)
          .and_then(|name| posters.get(&name).map(|bytes| (name, bytes.clone())));

        let (poster_cid, attachments) = match poster {
          Some((filename, bytes)) => {
            let cid = poster_cid(occasion.subject_id);
            let attachment = InlineAttachment {
              content_id: cid.clone(),
              content_type: content_type_for(&filename).to_owned(),
              filename,
              bytes,
            };
            (Some(cid), vec![attachment])
          }
          None => (None, Vec::new()),
        };

        let greeting = Greeting { occasion, poster_cid };
        Some(OutgoingMail {
          to,
          bcc: self.options.greeting_bcc.iter().cloned().collect(),
          subject: greeting_subject(&greeting.occasion),
          html_body: self.renderer.render_greeting(&greeting),
          attachments,
        })
      })
      .collect()
  }

  /// Prepare and send the greetings for `date`.
  pub async fn send_greetings<M>(&self, date: MonthDay, mailer: &M) -> DispatchReport
  where
    M: MailSender,
  {
    let mails = self.prepare_greetings(date).await;
    info!(%date, greetings = mails.len(), "sending greetings");
    let report = dispatch(mailer, mails).await;
    info!(sent = report.sent, failed = report.failed, "greetings dispatched");
    report
  }
}
