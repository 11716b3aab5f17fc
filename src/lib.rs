//! Catalog management core for a music and podcast platform.
//!
//! The crate is layered the usual way: [`models`] holds the domain entities
//! and their relation views, [`repositories`] is the only path to SQLite
//! storage, and [`services`] carries the business rules: one lifecycle
//! service per entity, a generic association component instantiated per
//! relation in [`services::links`], and the owned podcast-episode service.
//!
//! All writes go through versioned upserts; concurrent modification of the
//! same row surfaces as [`CatalogError::Conflict`].

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

pub use error::{CatalogError, Result};
