//! Handlers for `/occasions`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/occasions` | `?kind=member-birthday\|spouse-birthday\|anniversary[&date=MM-DD]` |
//! | `GET`  | `/occasions/range` | `?kind=..[&from=MM-DD][&to=MM-DD]`; `to` before `from` wraps past New Year |
//!
//! Without `date` or `from`, "today" is taken at the configured UTC offset.
//! Without `to`, the range runs to the same day next month.

use axum::{
  Json,
  extract::{Query, State},
};
use roster_core::{
  blob::BlobStore,
  date::{MonthDay, MonthDayRange},
  matcher::{find_occasions, find_occasions_within},
  occasion::{MatchKind, Occasion},
  store::RecordStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct OccasionParams {
  pub kind: MatchKind,
  pub date: Option<MonthDay>,
}

#[derive(Debug, Serialize)]
pub struct OccasionList {
  pub kind:      MatchKind,
  pub date:      MonthDay,
  pub occasions: Vec<Occasion>,
}

/// `GET /occasions?kind=<kind>[&date=MM-DD]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<OccasionParams>,
) -> Result<Json<OccasionList>, ApiError>
where
  S: RecordStore + BlobStore,
{
  let date = params
    .date
    .unwrap_or_else(|| MonthDay::today(state.utc_offset));
  let occasions = find_occasions(state.store.as_ref(), date, params.kind).await?;
  Ok(Json(OccasionList { kind: params.kind, date, occasions }))
}

#[derive(Debug, Deserialize)]
pub struct RangeParams {
  pub kind: MatchKind,
  pub from: Option<MonthDay>,
  pub to:   Option<MonthDay>,
}

#[derive(Debug, Serialize)]
pub struct OccasionRange {
  pub kind:      MatchKind,
  pub from:      MonthDay,
  pub to:        MonthDay,
  pub occasions: Vec<Occasion>,
}

/// `GET /occasions/range?kind=<kind>[&from=MM-DD][&to=MM-DD]`
pub async fn range<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<RangeParams>,
) -> Result<Json<OccasionRange>, ApiError>
where
  S: RecordStore + BlobStore,
{
  let from = params
    .from
    .unwrap_or_else(|| MonthDay::today(state.utc_offset));
  let range = match params.to {
    Some(to) => MonthDayRange::new(from, to),
    None => MonthDayRange::month_from(from),
  };
  let occasions = find_occasions_within(state.store.as_ref(), range, params.kind).await?;
  Ok(Json(OccasionRange {
    kind: params.kind,
    from: range.from,
    to: range.to,
    occasions,
  }))
}
