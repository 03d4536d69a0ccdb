//! Dense integer identifiers.
//!
//! Every collection is a flat list whose element at position `i` carries
//! identifier `i`. Parent/child links are stored as these identifiers in both
//! directions; nothing owns anything else.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Shared behaviour of [`TurfId`], [`DoorId`] and [`VoterId`].
pub trait RecordId:
  Copy + Eq + Ord + std::hash::Hash + fmt::Debug + fmt::Display
{
  fn from_index(index: usize) -> Self;
  fn index(self) -> usize;
}

macro_rules! record_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
      Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub usize);

    impl RecordId for $name {
      fn from_index(index: usize) -> Self { Self(index) }

      fn index(self) -> usize { self.0 }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
      }
    }

    impl std::str::FromStr for $name {
      type Err = std::num::ParseIntError;

      fn from_str(s: &str) -> Result<Self, Self::Err> { s.parse().map(Self) }
    }
  };
}

record_id!(
  /// Identifier of a [`Turf`](crate::record::Turf).
  TurfId
);
record_id!(
  /// Identifier of a [`Door`](crate::record::Door).
  DoorId
);
record_id!(
  /// Identifier of a [`Voter`](crate::record::Voter).
  VoterId
);

/// The three kinds of record held by a [`Database`](crate::Database).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  Turf,
  Door,
  Voter,
}

/// A typed pointer to one record, used wherever an operation accepts any
/// kind (note logs, dispositions, titles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
  Turf(TurfId),
  Door(DoorId),
  Voter(VoterId),
}

impl EntityRef {
  pub fn new(kind: EntityKind, index: usize) -> Self {
    match kind {
      EntityKind::Turf => Self::Turf(TurfId(index)),
      EntityKind::Door => Self::Door(DoorId(index)),
      EntityKind::Voter => Self::Voter(VoterId(index)),
    }
  }

  pub fn kind(self) -> EntityKind {
    match self {
      Self::Turf(_) => EntityKind::Turf,
      Self::Door(_) => EntityKind::Door,
      Self::Voter(_) => EntityKind::Voter,
    }
  }

  pub fn index(self) -> usize {
    match self {
      Self::Turf(id) => id.0,
      Self::Door(id) => id.0,
      Self::Voter(id) => id.0,
    }
  }
}

impl fmt::Display for EntityRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.kind(), self.index())
  }
}

impl From<TurfId> for EntityRef {
  fn from(id: TurfId) -> Self { Self::Turf(id) }
}

impl From<DoorId> for EntityRef {
  fn from(id: DoorId) -> Self { Self::Door(id) }
}

impl From<VoterId> for EntityRef {
  fn from(id: VoterId) -> Self { Self::Voter(id) }
}
