//! Handlers for `/people/:id/images/:role`.
//!
//! `role` is one of `profile`, `poster`, `anniversary-poster`. Blob names are
//! derived from the id and role, so the record's flag is the only state that
//! says whether an image exists.

use axum::{
  extract::{Path, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use bytes::Bytes;
use roster_core::{
  blob::{BlobStore, ImageRole},
  person::{Person, PersonId},
  store::RecordStore,
};
use tracing::info;

use crate::{AppState, error::ApiError};

pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

fn parse_role(role: &str) -> Result<ImageRole, ApiError> {
  role.parse().map_err(|e: roster_core::Error| ApiError::BadRequest(e.to_string()))
}

async fn existing_person<S>(store: &S, id: PersonId) -> Result<Person, ApiError>
where
  S: RecordStore,
{
  store
    .get_person(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))
}

/// `GET /people/:id/images/:role`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path((id, role)): Path<(PersonId, String)>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore + BlobStore,
{
  let role = parse_role(&role)?;
  let person = existing_person(state.store.as_ref(), id).await?;

  // The flag is authoritative; an unflagged image is not looked up.
  if !role.flag(&person.images) {
    return Err(ApiError::NotFound(format!("person {id} has no {role} image")));
  }

  let name = role.blob_name(id);
  let bytes = state
    .store
    .get_blob(&name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("blob {name} not found")))?;

  Ok(([(header::CONTENT_TYPE, IMAGE_CONTENT_TYPE)], bytes))
}

/// `PUT /people/:id/images/:role`: body: the raw image bytes.
pub async fn put_one<S>(
  State(state): State<AppState<S>>,
  Path((id, role)): Path<(PersonId, String)>,
  body: Bytes,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore + BlobStore,
{
  let role = parse_role(&role)?;
  if body.is_empty() {
    return Err(ApiError::BadRequest("image body is empty".into()));
  }
  existing_person(state.store.as_ref(), id).await?;

  let name = role.blob_name(id);
  state.store.put_blob(&name, body).await.map_err(ApiError::store)?;
  state
    .store
    .set_image_flag(id, role, true)
    .await
    .map_err(ApiError::store)?;

  info!(%id, %role, blob = %name, "image stored");
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /people/:id/images/:role`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Path((id, role)): Path<(PersonId, String)>,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore + BlobStore,
{
  let role = parse_role(&role)?;
  existing_person(state.store.as_ref(), id).await?;

  let name = role.blob_name(id);
  let removed = state.store.delete_blob(&name).await.map_err(ApiError::store)?;
  state
    .store
    .set_image_flag(id, role, false)
    .await
    .map_err(ApiError::store)?;

  info!(%id, %role, removed, "image deleted");
  Ok(StatusCode::NO_CONTENT)
}
