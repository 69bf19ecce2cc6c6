//! Fetching images from the blob store and tracking inline attachments.

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
  time::Duration,
};

use bytes::Bytes;
use roster_core::{blob::BlobStore, mail::InlineAttachment, person::PersonId};
use tokio::task::JoinSet;
use tracing::{debug, warn};

pub const FALLBACK_CID: &str = "default-image";
pub const BANNER_CID: &str = "banner";

pub fn image_cid(id: PersonId) -> String { format!("image-{id}") }

pub fn poster_cid(id: PersonId) -> String { format!("poster-{id}") }

/// MIME type guessed from a blob name's extension.
pub fn content_type_for(name: &str) -> &'static str {
  let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
  match ext.as_deref() {
    Some("gif") => "image/gif",
    Some("png") => "image/png",
    _ => "image/jpeg",
  }
}

/// Fetch `name`, retrying store errors up to `attempts` times in total.
///
/// A missing blob is not retried. Returns `None` when the blob is missing or
/// every attempt failed.
pub async fn fetch_with_retry<B>(store: &B, name: &str, attempts: u32, delay: Duration) -> Option<Bytes>
where
  B: BlobStore,
{
  let attempts = attempts.max(1);
  for attempt in 1..=attempts {
    match store.get_blob(name).await {
      Ok(Some(bytes)) => return Some(bytes),
      Ok(None) => {
        debug!(blob = %name, "blob not found");
        return None;
      }
      Err(e) if attempt < attempts => {
        debug!(blob = %name, attempt, error = %e, "blob fetch failed; retrying");
        tokio::time::sleep(delay).await;
      }
      Err(e) => {
        warn!(blob = %name, attempts, error = %e, "blob fetch gave up");
      }
    }
  }
  None
}

/// Fetch every distinct name concurrently. Names that could not be fetched
/// are absent from the result.
pub async fn fetch_all<B, I>(
  store: &Arc<B>,
  names: I,
  attempts: u32,
  delay: Duration,
) -> HashMap<String, Bytes>
where
  B: BlobStore + 'static,
  I: IntoIterator<Item = String>,
{
  let mut tasks = JoinSet::new();
  let mut requested = HashSet::new();
  for name in names {
    if !requested.insert(name.clone()) {
      continue;
    }
    let store = Arc::clone(store);
    tasks.spawn(async move {
      let bytes = fetch_with_retry(store.as_ref(), &name, attempts, delay).await;
      (name, bytes)
    });
  }

  let mut fetched = HashMap::new();
  while let Some(joined) = tasks.join_next().await {
    match joined {
      Ok((name, Some(bytes))) => {
        fetched.insert(name, bytes);
      }
      Ok((_, None)) => {}
      Err(e) => warn!(error = %e, "blob fetch task failed"),
    }
  }
  fetched
}

/// Inline attachments keyed by content id; each id is attached once.
#[derive(Debug, Default)]
pub struct AttachmentSet {
  items: Vec<InlineAttachment>,
  seen:  HashSet<String>,
}

impl AttachmentSet {
  pub fn attach(&mut self, content_id: &str, filename: &str, bytes: &Bytes) {
    if !self.seen.insert(content_id.to_owned()) {
      return;
    }
    self.items.push(InlineAttachment {
      content_id:   content_id.to_owned(),
      filename:     filename.to_owned(),
      content_type: content_type_for(filename).to_owned(),
      bytes:        bytes.clone(),
    });
  }

  pub fn into_vec(self) -> Vec<InlineAttachment> { self.items }
}
