//! SQLite backend for the roster.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteStore`] serves as both the
//! record store and the blob store.

mod encode;
mod import;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use import::ImportReport;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
