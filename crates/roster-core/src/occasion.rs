//! Occasion: a derived, notification-worthy event for one person or one
//! couple on a given day. Occasions are never persisted.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  date::MonthDay,
  display::{DisplayField, present_owned, title_case},
  pair::PairKey,
  person::{ImageFlags, Person, PersonId, PersonKind},
};

// ─── Match kind ──────────────────────────────────────────────────────────────

/// The three selections the matcher supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
  MemberBirthday,
  SpouseBirthday,
  Anniversary,
}

impl MatchKind {
  pub const ALL: [MatchKind; 3] =
    [Self::MemberBirthday, Self::SpouseBirthday, Self::Anniversary];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::MemberBirthday => "member-birthday",
      Self::SpouseBirthday => "spouse-birthday",
      Self::Anniversary => "anniversary",
    }
  }

  /// The `kind` a candidate must have to be selected.
  pub fn person_kind(&self) -> PersonKind {
    match self {
      Self::MemberBirthday | Self::Anniversary => PersonKind::Member,
      Self::SpouseBirthday => PersonKind::Spouse,
    }
  }

  pub fn occasion_kind(&self) -> OccasionKind {
    match self {
      Self::MemberBirthday | Self::SpouseBirthday => OccasionKind::Birthday,
      Self::Anniversary => OccasionKind::Anniversary,
    }
  }

  /// Whether candidates are joined to their partner.
  pub fn expands_partner(&self) -> bool { !matches!(self, Self::MemberBirthday) }

  /// The date this selection compares against the criterion.
  pub fn date_of(&self, person: &Person) -> Option<MonthDay> {
    match self {
      Self::MemberBirthday | Self::SpouseBirthday => Some(person.date_of_birth),
      Self::Anniversary => person.anniversary,
    }
  }
}

impl fmt::Display for MatchKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for MatchKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|k| k.as_str() == s)
      .ok_or_else(|| Error::UnknownMatchKind(s.to_owned()))
  }
}

// ─── Occasion ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccasionKind {
  Birthday,
  Anniversary,
}

/// A person (or couple) to celebrate, with display fields copied from the
/// underlying records at match time.
///
/// Names are title-cased; the contact fields have placeholders removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occasion {
  pub kind:               OccasionKind,
  pub matched_as:         MatchKind,
  pub date:               MonthDay,
  pub subject_id:         PersonId,
  /// Always set for anniversaries. Set for spouse birthdays when the
  /// referenced member resolved, so greetings can name them.
  pub partner_subject_id: Option<PersonId>,
  pub name:               String,
  pub partner_name:       Option<String>,
  pub role:               Option<String>,
  pub club:               Option<String>,
  pub phone:              Option<String>,
  pub email:              Option<String>,
  pub subject_images:     ImageFlags,
  pub partner_images:     Option<ImageFlags>,
}

impl Occasion {
  /// Copy display fields out of `subject` and, if given, its partner.
  pub fn project(
    matched_as: MatchKind,
    date: MonthDay,
    subject: &Person,
    partner: Option<&Person>,
  ) -> Self {
    Self {
      kind: matched_as.occasion_kind(),
      matched_as,
      date,
      subject_id: subject.id,
      partner_subject_id: partner.map(|p| p.id),
      name: title_case(&subject.name),
      partner_name: partner
        .and_then(|p| present_owned(Some(&p.name)))
        .map(|n| title_case(&n)),
      role: present_owned(subject.role.as_deref()),
      club: present_owned(subject.club.as_deref()),
      phone: present_owned(subject.phone.as_deref()),
      email: present_owned(subject.email.as_deref()).map(|e| e.trim().to_owned()),
      subject_images: subject.images,
      partner_images: partner.map(|p| p.images),
    }
  }

  /// The canonical key of the couple, for anniversaries.
  pub fn pair_key(&self) -> Option<PairKey> {
    match self.kind {
      OccasionKind::Anniversary => {
        self.partner_subject_id.map(|p| PairKey::new(self.subject_id, p))
      }
      OccasionKind::Birthday => None,
    }
  }

  /// `Name` for birthdays, `Name & Partner` for anniversaries.
  pub fn headline(&self) -> String {
    match (self.kind, &self.partner_name) {
      (OccasionKind::Anniversary, Some(partner)) => format!("{} & {partner}", self.name),
      _ => self.name.clone(),
    }
  }

  /// Labelled fields for a card or greeting, placeholders dropped.
  ///
  /// Spouse birthdays lead with the member they are married to; everyone
  /// else leads with their post. Values are title-cased except email.
  pub fn display_fields(&self) -> Vec<DisplayField> {
    let lead = match self.matched_as {
      MatchKind::SpouseBirthday => ("Partner", self.partner_name.clone()),
      MatchKind::MemberBirthday | MatchKind::Anniversary => {
        ("Post", self.role.as_deref().map(title_case))
      }
    };

    [
      lead,
      ("Club", self.club.as_deref().map(title_case)),
      ("Phone", self.phone.clone()),
      ("Email", self.email.clone()),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|value| DisplayField { label, value }))
    .collect()
  }
}
