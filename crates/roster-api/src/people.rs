//! Handlers for `/people` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/people` | Optional `kind`, `name`, `club`, `phone`, `email`, `page` (from 1), `limit` |
//! | `GET`  | `/people/:id` | Person with partner embedded; 404 if not found |
//! | `PUT`  | `/people/:id` | Upsert; a body `id` must match the path |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use roster_core::{
  blob::BlobStore,
  person::{Candidate, PersonId, PersonKind},
  store::{PersonQuery, RecordStore},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::{AppState, error::ApiError};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub kind:  Option<PersonKind>,
  pub name:  Option<String>,
  pub club:  Option<String>,
  pub phone: Option<String>,
  pub email: Option<String>,
  pub page:  Option<usize>,
  pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PeoplePage {
  pub page:   usize,
  pub limit:  usize,
  pub people: Vec<Candidate>,
}

/// Row offset of `page` (from 1), if it fits a SQL integer.
fn page_offset(page: usize, limit: usize) -> Option<usize> {
  (page - 1)
    .checked_mul(limit)
    .filter(|offset| i64::try_from(*offset).is_ok())
}

/// `GET /people[?kind=..&name=..&page=..&limit=..]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<PeoplePage>, ApiError>
where
  S: RecordStore + BlobStore,
{
  let page = params.page.unwrap_or(1);
  if page == 0 {
    return Err(ApiError::BadRequest("page numbers start at 1".into()));
  }
  let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
  let offset = page_offset(page, limit)
    .ok_or_else(|| ApiError::BadRequest(format!("page {page} is out of range")))?;

  let query = PersonQuery {
    kind: params.kind,
    name: params.name,
    club: params.club,
    phone: params.phone,
    email: params.email,
    expand_partner: true,
    limit: Some(limit),
    offset: Some(offset),
    ..PersonQuery::default()
  };

  let rows = state
    .store
    .query_people(&query)
    .await
    .map_err(ApiError::store)?;

  let people = rows
    .into_iter()
    .filter_map(|row| {
      row
        .inspect_err(|m| warn!(id = ?m.id, reason = %m.reason, "omitting malformed record"))
        .ok()
    })
    .collect();

  Ok(Json(PeoplePage { page, limit, people }))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// Load `id` and its partner, if the partner exists and is not `id` itself.
///
/// A partner that cannot be read is treated as absent, as in listings.
pub(crate) async fn load_candidate<S>(store: &S, id: PersonId) -> Result<Candidate, ApiError>
where
  S: RecordStore,
{
  let person = store
    .get_person(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;

  let partner = match person.partner_id.filter(|p| *p != id) {
    Some(partner_id) => match store.get_person(partner_id).await {
      Ok(partner) => partner,
      Err(e) => {
        warn!(%id, partner = %partner_id, error = %e, "partner unreadable; treating as absent");
        None
      }
    },
    None => None,
  };

  Ok(Candidate { person, partner })
}

/// `GET /people/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<PersonId>,
) -> Result<Json<Candidate>, ApiError>
where
  S: RecordStore + BlobStore,
{
  Ok(Json(load_candidate(state.store.as_ref(), id).await?))
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

/// Fill in a missing body id from the path, and reject one that disagrees.
fn pin_id(body: &mut Value, id: PersonId) -> Result<(), ApiError> {
  let object = body
    .as_object_mut()
    .ok_or_else(|| ApiError::BadRequest("expected a JSON object".into()))?;

  match object.get("id") {
    None | Some(Value::Null) => {
      object.insert("id".into(), Value::from(id.0));
      Ok(())
    }
    Some(given) if given.as_i64() == Some(id.0) => Ok(()),
    Some(given) => Err(ApiError::BadRequest(format!(
      "body id {given} does not match path id {id}; ids cannot be changed"
    ))),
  }
}

/// `PUT /people/:id`: body: a person, optionally with an embedded `partner`
/// which is upserted as well.
pub async fn put_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<PersonId>,
  Json(mut body): Json<Value>,
) -> Result<Json<Candidate>, ApiError>
where
  S: RecordStore + BlobStore,
{
  pin_id(&mut body, id)?;
  let Candidate { mut person, partner } =
    serde_json::from_value(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

  if let Some(partner) = &partner {
    if partner.id == id {
      return Err(ApiError::BadRequest("a person cannot be their own partner".into()));
    }
    match person.partner_id {
      None => person.partner_id = Some(partner.id),
      Some(existing) if existing != partner.id => {
        return Err(ApiError::BadRequest(format!(
          "partner_id {existing} does not match embedded partner {}",
          partner.id
        )));
      }
      Some(_) => {}
    }
  }

  let person = state.store.upsert_person(person).await.map_err(ApiError::store)?;
  let partner = match partner {
    Some(partner) => Some(state.store.upsert_person(partner).await.map_err(ApiError::store)?),
    None => None,
  };

  info!(%id, with_partner = partner.is_some(), "person upserted");
  Ok(Json(Candidate { person, partner }))
}
