//! The `RecordStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! The matcher, the API and the notifier depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::{
  date::{MonthDay, MonthDayRange},
  person::{CandidateRow, Person, PersonId, PersonKind},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`RecordStore::query_people`].
///
/// Equality filters are exact; text filters are case-insensitive substring
/// matches. Results are ordered by id so repeated queries over the same
/// snapshot return the same sequence.
#[derive(Debug, Clone, Default)]
pub struct PersonQuery {
  pub kind:                 Option<PersonKind>,
  pub date_of_birth:        Option<MonthDay>,
  pub anniversary:          Option<MonthDay>,
  /// Inclusive month-day ranges; see [`MonthDayRange`] for wrap-around.
  pub date_of_birth_within: Option<MonthDayRange>,
  pub anniversary_within:   Option<MonthDayRange>,
  pub active:               Option<bool>,
  /// Embed each record's partner (single-level join on `partner_id`).
  pub expand_partner:       bool,
  pub name:                 Option<String>,
  pub club:                 Option<String>,
  pub phone:                Option<String>,
  pub email:                Option<String>,
  pub limit:                Option<usize>,
  pub offset:               Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the roster's record store.
///
/// Boolean columns may be stored in legacy forms (`"True"`, `"false"`, `1`);
/// implementations normalise them before anything reaches a [`Person`].
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Run a filtered query. Rows that cannot be decoded come back as
  /// [`MalformedRecord`](crate::MalformedRecord) values rather than failing
  /// the whole query.
  fn query_people<'a>(
    &'a self,
    query: &'a PersonQuery,
  ) -> impl Future<Output = Result<Vec<CandidateRow>, Self::Error>> + Send + 'a;

  /// Retrieve a person by id. Returns `None` if not found.
  fn get_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Insert or replace a person, keyed by id.
  fn upsert_person(
    &self,
    person: Person,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Flip one image-presence flag. Returns `false` if the person is missing.
  fn set_image_flag(
    &self,
    id: PersonId,
    role: crate::blob::ImageRole,
    present: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Distinct, trimmed, non-placeholder emails of all active persons, in
  /// first-seen order.
  fn active_emails(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;
}
