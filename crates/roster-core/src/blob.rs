//! Named-blob storage for per-person images.

use std::{fmt, future::Future, str::FromStr};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  person::{ImageFlags, PersonId},
};

/// Extension every image blob is stored under.
pub const IMAGE_EXTENSION: &str = ".jpg";

/// Which of a person's images a blob holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageRole {
  Profile,
  Poster,
  AnniversaryPoster,
}

impl ImageRole {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Profile => "profile",
      Self::Poster => "poster",
      Self::AnniversaryPoster => "anniversary-poster",
    }
  }

  /// Suffix appended to the person id in the blob name.
  pub fn suffix(&self) -> &'static str {
    match self {
      Self::Profile => "",
      Self::Poster => "_poster",
      Self::AnniversaryPoster => "_anniv",
    }
  }

  /// The deterministic blob name for `id`'s image in this role.
  pub fn blob_name(&self, id: PersonId) -> String {
    format!("{id}{}{IMAGE_EXTENSION}", self.suffix())
  }

  pub fn flag(&self, flags: &ImageFlags) -> bool {
    match self {
      Self::Profile => flags.profile,
      Self::Poster => flags.poster,
      Self::AnniversaryPoster => flags.anniversary_poster,
    }
  }

  pub fn set_flag(&self, flags: &mut ImageFlags, present: bool) {
    match self {
      Self::Profile => flags.profile = present,
      Self::Poster => flags.poster = present,
      Self::AnniversaryPoster => flags.anniversary_poster = present,
    }
  }
}

impl fmt::Display for ImageRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ImageRole {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "profile" => Ok(Self::Profile),
      "poster" => Ok(Self::Poster),
      "anniversary-poster" | "anniv" => Ok(Self::AnniversaryPoster),
      _ => Err(Error::UnknownImageRole(s.to_owned())),
    }
  }
}

/// Abstraction over the object store holding images.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch a blob. `None` means not found, which is not an error.
  fn get_blob<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Bytes>, Self::Error>> + Send + 'a;

  /// Store a blob, replacing any previous content under `name`.
  fn put_blob<'a>(
    &'a self,
    name: &'a str,
    bytes: Bytes,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete a blob. Returns whether anything was removed.
  fn delete_blob<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
