//! The occasion matcher.
//!
//! One canonical routine for "who do we celebrate": select candidates, join
//! them to their partners, apply the eligibility policy for the requested
//! kind, and collapse symmetric couples. Every consumer (API, digest,
//! personal greetings, phone messages) goes through [`find_occasions`] or
//! its range form [`find_occasions_within`].
//!
//! | Kind | Candidates | Partner | Eligibility |
//! |------|------------|---------|-------------|
//! | `member-birthday` | active members, birthday in window | not joined | none |
//! | `spouse-birthday` | active spouses, birthday in window | joined | none; an inactive member still lets the spouse through |
//! | `anniversary` | active members, anniversary in window | joined | partner must exist and be active; couples deduplicated |

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::{
  Error, Result,
  date::{MonthDay, MonthDayRange},
  occasion::{MatchKind, Occasion},
  pair::PairKey,
  person::{CandidateRow, Person},
  store::{PersonQuery, RecordStore},
};

/// The store query that selects candidates for `kind` on `date`.
pub fn candidate_query(kind: MatchKind, date: MonthDay) -> PersonQuery {
  let (date_of_birth, anniversary) = match kind {
    MatchKind::MemberBirthday | MatchKind::SpouseBirthday => (Some(date), None),
    MatchKind::Anniversary => (None, Some(date)),
  };

  PersonQuery {
    date_of_birth,
    anniversary,
    ..base_query(kind)
  }
}

/// The store query that selects candidates for `kind` anywhere in `range`.
pub fn candidate_query_within(kind: MatchKind, range: MonthDayRange) -> PersonQuery {
  let (date_of_birth_within, anniversary_within) = match kind {
    MatchKind::MemberBirthday | MatchKind::SpouseBirthday => (Some(range), None),
    MatchKind::Anniversary => (None, Some(range)),
  };

  PersonQuery {
    date_of_birth_within,
    anniversary_within,
    ..base_query(kind)
  }
}

fn base_query(kind: MatchKind) -> PersonQuery {
  PersonQuery {
    kind: Some(kind.person_kind()),
    active: Some(true),
    expand_partner: kind.expands_partner(),
    ..PersonQuery::default()
  }
}

async fn fetch<S>(store: &S, query: &PersonQuery) -> Result<Vec<CandidateRow>>
where
  S: RecordStore,
{
  store
    .query_people(query)
    .await
    .map_err(Error::data_unavailable)
}

/// Find the occasions of `kind` falling on `date`.
///
/// Zero matches is an empty vector. A store failure is
/// [`Error::DataUnavailable`]; whether to degrade or abort is up to the
/// caller.
pub async fn find_occasions<S>(
  store: &S,
  date: MonthDay,
  kind: MatchKind,
) -> Result<Vec<Occasion>>
where
  S: RecordStore,
{
  let rows = fetch(store, &candidate_query(kind, date)).await?;
  let occasions = match_candidates(rows, date, kind);
  debug!(%kind, %date, count = occasions.len(), "matched occasions");
  Ok(occasions)
}

/// Find the occasions of `kind` anywhere in `range`, in calendar order from
/// `range.from`. A couple is reported once across the whole range.
pub async fn find_occasions_within<S>(
  store: &S,
  range: MonthDayRange,
  kind: MatchKind,
) -> Result<Vec<Occasion>>
where
  S: RecordStore,
{
  let rows = fetch(store, &candidate_query_within(kind, range)).await?;
  let occasions = match_candidates_within(rows, range, kind);
  debug!(%kind, %range, count = occasions.len(), "matched occasions in range");
  Ok(occasions)
}

/// The pure half of [`find_occasions`]: filter, join and deduplicate rows
/// already fetched from a store.
///
/// The selection filters are re-applied here, so the result holds for any
/// input, not only for rows a well-behaved store returned. Rows are visited in
/// the order given; for anniversaries the first row of a couple wins.
pub fn match_candidates<I>(rows: I, date: MonthDay, kind: MatchKind) -> Vec<Occasion>
where
  I: IntoIterator<Item = CandidateRow>,
{
  select(rows, kind, |day| day == date)
}

/// The pure half of [`find_occasions_within`]. Occasions are ordered by
/// their day's position in `range`; rows on the same day keep input order.
pub fn match_candidates_within<I>(rows: I, range: MonthDayRange, kind: MatchKind) -> Vec<Occasion>
where
  I: IntoIterator<Item = CandidateRow>,
{
  let mut occasions = select(rows, kind, |day| range.contains(day));
  occasions.sort_by_key(|o| range.days_after_start(o.date));
  occasions
}

fn select<I, F>(rows: I, kind: MatchKind, in_window: F) -> Vec<Occasion>
where
  I: IntoIterator<Item = CandidateRow>,
  F: Fn(MonthDay) -> bool,
{
  let mut seen_pairs: HashSet<PairKey> = HashSet::new();
  let mut occasions = Vec::new();

  for row in rows {
    let candidate = match row {
      Ok(candidate) => candidate,
      Err(malformed) => {
        warn!(id = ?malformed.id, reason = %malformed.reason, "skipping malformed record");
        continue;
      }
    };

    let subject = &candidate.person;
    let Some(date) = selected_date(kind, subject).filter(|d| in_window(*d)) else {
      continue;
    };

    let partner = if kind.expands_partner() {
      candidate.resolved_partner()
    } else {
      None
    };

    match kind {
      MatchKind::MemberBirthday | MatchKind::SpouseBirthday => {
        occasions.push(Occasion::project(kind, date, subject, partner));
      }
      MatchKind::Anniversary => {
        let Some(partner) = partner.filter(|p| p.active) else {
          debug!(id = %subject.id, "anniversary dropped: partner missing or inactive");
          continue;
        };
        if !seen_pairs.insert(PairKey::new(subject.id, partner.id)) {
          debug!(id = %subject.id, partner = %partner.id, "anniversary already emitted for couple");
          continue;
        }
        occasions.push(Occasion::project(kind, date, subject, Some(partner)));
      }
    }
  }

  occasions
}

/// The day `person` is celebrated for `kind`, if they are eligible at all.
fn selected_date(kind: MatchKind, person: &Person) -> Option<MonthDay> {
  if person.active && person.kind == kind.person_kind() {
    kind.date_of(person)
  } else {
    None
  }
}
