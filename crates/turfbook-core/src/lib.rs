//! Core types and algorithms for the turfbook canvassing store.
//!
//! Everything here is in-memory and synchronous. Persistence lives behind the
//! [`store::SnapshotStore`] trait, implemented by `turfbook-store-json`.

pub mod collection;
pub mod database;
pub mod disposition;
pub mod error;
pub mod field;
pub mod geojson;
pub mod id;
pub mod integrity;
pub mod note;
pub mod record;
pub mod route;
pub mod store;

pub use database::Database;
pub use error::{Error, Result};
