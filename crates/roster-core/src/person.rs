//! Person: one human on the roster, and the candidate envelope the record
//! store hands to the matcher.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, MalformedRecord, Result, date::MonthDay};

/// Opaque, stable identifier of a [`Person`]. Never reused.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PersonId(pub i64);

impl fmt::Display for PersonId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl FromStr for PersonId {
  type Err = std::num::ParseIntError;

  fn from_str(s: &str) -> Result<Self, Self::Err> { s.trim().parse().map(Self) }
}

/// Whether a person is on the roster directly or only through a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonKind {
  Member,
  Spouse,
}

impl PersonKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Member => "member",
      Self::Spouse => "spouse",
    }
  }
}

impl FromStr for PersonKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "member" => Ok(Self::Member),
      "spouse" => Ok(Self::Spouse),
      _ => Err(Error::UnknownPersonKind(s.to_owned())),
    }
  }
}

/// Presence flags for the blobs associated with a person.
///
/// The record store is the source of truth; the blob store is only consulted
/// when the matching flag is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFlags {
  #[serde(default)]
  pub profile:            bool,
  #[serde(default)]
  pub poster:             bool,
  #[serde(default)]
  pub anniversary_poster: bool,
}

/// A single roster record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:            PersonId,
  pub name:          String,
  #[serde(default)]
  pub role:          Option<String>,
  #[serde(default)]
  pub club:          Option<String>,
  #[serde(default)]
  pub phone:         Option<String>,
  #[serde(default)]
  pub email:         Option<String>,
  pub kind:          PersonKind,
  pub date_of_birth: MonthDay,
  #[serde(default)]
  pub anniversary:   Option<MonthDay>,
  pub active:        bool,
  #[serde(default)]
  pub partner_id:    Option<PersonId>,
  #[serde(default)]
  pub images:        ImageFlags,
}

impl Person {
  /// A minimal active member; callers fill in the rest.
  pub fn member(id: i64, name: impl Into<String>, date_of_birth: MonthDay) -> Self {
    Self {
      id: PersonId(id),
      name: name.into(),
      role: None,
      club: None,
      phone: None,
      email: None,
      kind: PersonKind::Member,
      date_of_birth,
      anniversary: None,
      active: true,
      partner_id: None,
      images: ImageFlags::default(),
    }
  }

  /// A minimal active spouse of `partner`.
  pub fn spouse(
    id: i64,
    name: impl Into<String>,
    date_of_birth: MonthDay,
    partner: PersonId,
  ) -> Self {
    Self {
      kind: PersonKind::Spouse,
      partner_id: Some(partner),
      ..Self::member(id, name, date_of_birth)
    }
  }
}

/// A person as returned by a record-store query, with the partner embedded
/// when the query asked for the join.
///
/// `partner` is `None` when the join was not requested, when `partner_id` is
/// unset, or when it names a record that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
  #[serde(flatten)]
  pub person:  Person,
  #[serde(default)]
  pub partner: Option<Person>,
}

impl Candidate {
  pub fn alone(person: Person) -> Self { Self { person, partner: None } }

  /// The joined partner, ignoring a record that names itself.
  pub fn resolved_partner(&self) -> Option<&Person> {
    self.partner.as_ref().filter(|p| p.id != self.person.id)
  }
}

/// One row of a store query: a decoded candidate, or the reason it could not
/// be decoded.
pub type CandidateRow = std::result::Result<Candidate, MalformedRecord>;
