//! JSON REST API for the roster.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`RecordStore`] and [`BlobStore`]. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", roster_api::api_router(state))
//! ```

pub mod error;
pub mod images;
pub mod occasions;
pub mod people;

use std::sync::Arc;

use axum::{Router, routing::get};
use chrono::FixedOffset;
use roster_core::{blob::BlobStore, store::RecordStore};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:      Arc<S>,
  /// Offset used to decide what "today" is when a request names no date.
  pub utc_offset: FixedOffset,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), utc_offset: self.utc_offset }
  }
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, utc_offset: FixedOffset) -> Self { Self { store, utc_offset } }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: RecordStore + BlobStore + 'static,
{
  Router::new()
    // Occasions
    .route("/occasions", get(occasions::list::<S>))
    .route("/occasions/range", get(occasions::range::<S>))
    // People
    .route("/people", get(people::list::<S>))
    .route("/people/{id}", get(people::get_one::<S>).put(people::put_one::<S>))
    // Images
    .route(
      "/people/{id}/images/{role}",
      get(images::get_one::<S>)
        .put(images::put_one::<S>)
        .delete(images::delete_one::<S>),
    )
    .with_state(state)
}

#[cfg(test)]
mod tests;
