//! The daily digest: every occasion of the day, grouped by kind, with a
//! picture per person.

use std::collections::HashMap;

use bytes::Bytes;
use roster_core::{
  blob::{BlobStore, ImageRole},
  date::MonthDay,
  mail::{InlineAttachment, MailSender, OutgoingMail},
  occasion::{MatchKind, Occasion},
  person::{ImageFlags, PersonId},
  store::RecordStore,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
  DispatchReport, Error, Notifier, Result, dispatch,
  images::{AttachmentSet, BANNER_CID, FALLBACK_CID, fetch_all, image_cid},
  render::DigestRenderer,
};

/// One person (or couple) in a digest section.
#[derive(Debug, Clone, Serialize)]
pub struct DigestCard {
  pub occasion:          Occasion,
  pub image_cid:         Option<String>,
  pub partner_image_cid: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DigestSection {
  pub kind:  MatchKind,
  pub title: &'static str,
  pub cards: Vec<DigestCard>,
}

/// A fully assembled digest, ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct Digest {
  pub date:        MonthDay,
  pub banner_cid:  Option<String>,
  pub sections:    Vec<DigestSection>,
  #[serde(skip)]
  pub attachments: Vec<InlineAttachment>,
}

impl Digest {
  pub fn occasion_count(&self) -> usize { self.sections.iter().map(|s| s.cards.len()).sum() }

  pub fn is_empty(&self) -> bool { self.occasion_count() == 0 }
}

pub fn section_title(kind: MatchKind) -> &'static str {
  match kind {
    MatchKind::MemberBirthday => "Member's Birthday",
    MatchKind::SpouseBirthday => "Partner's Birthday",
    MatchKind::Anniversary => "Wedding Anniversary",
  }
}

/// People whose picture appears on the card for `occasion`.
fn pictured(occasion: &Occasion) -> impl Iterator<Item = (PersonId, ImageFlags)> {
  let partner = occasion.partner_subject_id.zip(occasion.partner_images);
  std::iter::once((occasion.subject_id, occasion.subject_images)).chain(partner)
}

/// Pick the content id for one person's picture, attaching its bytes.
fn picture(
  id: PersonId,
  flags: ImageFlags,
  fetched: &HashMap<String, Bytes>,
  fallback: Option<(&str, &Bytes)>,
  attachments: &mut AttachmentSet,
) -> Option<String> {
  if flags.profile {
    let name = ImageRole::Profile.blob_name(id);
    if let Some(bytes) = fetched.get(&name) {
      let cid = image_cid(id);
      attachments.attach(&cid, &name, bytes);
      return Some(cid);
    }
    debug!(%id, "profile image unavailable; using fallback");
  }

  let (name, bytes) = fallback?;
  attachments.attach(FALLBACK_CID, name, bytes);
  Some(FALLBACK_CID.to_owned())
}

impl<S, R> Notifier<S, R>
where
  S: RecordStore + BlobStore + 'static,
  R: DigestRenderer,
{
  /// Assemble the digest for `date`. Never fails: unavailable sections are
  /// empty and unavailable images fall back.
  pub async fn assemble_digest(&self, date: MonthDay) -> Digest {
    let by_kind = self.occasions_by_kind(date).await;
    let options = &self.options;

    let mut wanted: Vec<String> = by_kind
      .iter()
      .flat_map(|(_, occasions)| occasions.iter().flat_map(pictured))
      .filter(|(_, flags)| flags.profile)
      .map(|(id, _)| ImageRole::Profile.blob_name(id))
      .collect();
    wanted.push(options.fallback_image.clone());
    wanted.extend(options.banner_image.clone());

    let fetched = fetch_all(
      &self.store,
      wanted,
      options.blob_fetch_attempts,
      options.blob_retry_delay,
    )
    .await;

    let mut attachments = AttachmentSet::default();
    let banner_cid = options
      .banner_image
      .as_deref()
      .and_then(|name| fetched.get(name).map(|bytes| (name, bytes)))
      .map(|(name, bytes)| {
        attachments.attach(BANNER_CID, name, bytes);
        BANNER_CID.to_owned()
      });

    let fallback = fetched
      .get(&options.fallback_image)
      .map(|bytes| (options.fallback_image.as_str(), bytes));

    let sections = by_kind
      .into_iter()
      .map(|(kind, occasions)| {
        let cards = occasions
          .into_iter()
          .map(|occasion| {
            let image_cid = picture(
              occasion.subject_id,
              occasion.subject_images,
              &fetched,
              fallback,
              &mut attachments,
            );
            let partner_image_cid = occasion
              .partner_subject_id
              .zip(occasion.partner_images)
              .and_then(|(id, flags)| picture(id, flags, &fetched, fallback, &mut attachments));
            DigestCard { occasion, image_cid, partner_image_cid }
          })
          .collect();
        DigestSection { kind, title: section_title(kind), cards }
      })
      .collect();

    let digest = Digest { date, banner_cid, sections, attachments: attachments.into_vec() };
    info!(
      %date,
      occasions = digest.occasion_count(),
      attachments = digest.attachments.len(),
      "digest assembled"
    );
    digest
  }

  /// Mail `digest` to every active member. An empty digest is not sent.
  pub async fn send_digest<M>(&self, digest: &Digest, mailer: &M) -> Result<DispatchReport>
  where
    M: MailSender,
  {
    if digest.is_empty() {
      info!(date = %digest.date, "nothing to celebrate; digest not sent");
      return Ok(DispatchReport::default());
    }

    let recipients = self.store.active_emails().await.map_err(Error::store)?;
    let subject = format!("{} {}", self.options.subject_prefix, digest.date.long_form());
    let html_body = self.renderer.render_digest(digest);

    info!(recipients = recipients.len(), %subject, "sending digest");
    let mails = recipients.into_iter().map(|to| OutgoingMail {
      to,
      bcc: Vec::new(),
      subject: subject.clone(),
      html_body: html_body.clone(),
      attachments: digest.attachments.clone(),
    });

    let report = dispatch(mailer, mails).await;
    info!(sent = report.sent, failed = report.failed, "digest dispatched");
    Ok(report)
  }
}
