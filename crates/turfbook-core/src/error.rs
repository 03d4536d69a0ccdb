//! Error types for `turfbook-core`.

use thiserror::Error;

use crate::id::{DoorId, EntityRef};

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0} not found")]
  NotFound(EntityRef),

  /// A partial update named an identifier past the end of its collection.
  #[error("cannot update {0}: no record with that identifier")]
  OutOfRange(EntityRef),

  #[error("door {0} has no geocode")]
  MissingGeocode(DoorId),

  #[error("new record is missing required field `{0}`")]
  MissingField(&'static str),

  /// A programming defect: the store must not be persisted in this state.
  #[error("invariant violation: {0}")]
  InvariantViolation(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
