//! Core types and trait definitions for the roster.
//!
//! This crate has no HTTP or database dependencies. It owns the domain model,
//! the collaborator traits (record store, blob store, mail and phone-message
//! senders) and the occasion matcher that every consumer shares.

// Implementations use native `async fn`; the trait signatures spell out the
// `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod blob;
pub mod date;
pub mod display;
pub mod error;
pub mod mail;
pub mod matcher;
pub mod message;
pub mod occasion;
pub mod pair;
pub mod person;
pub mod store;

pub use error::{Error, MalformedRecord, Result};
