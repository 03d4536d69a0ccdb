//! The persistence seam.
//!
//! The core never touches the filesystem. A backend loads a whole
//! [`Database`] and commits it back; higher layers depend on this trait, not
//! on a concrete backend.

use crate::Database;

/// A durable home for a [`Database`] snapshot.
///
/// Implementations must reconcile `db` before writing and must leave the
/// previously committed snapshot intact if anything fails, including a
/// failed reconciliation.
pub trait SnapshotStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the last committed snapshot.
  fn load(&self) -> Result<Database, Self::Error>;

  /// Reconcile `db` and make it the committed snapshot. With `backup`, the
  /// previous snapshot is kept under a timestamped name.
  fn commit(&self, db: &mut Database, backup: bool) -> Result<(), Self::Error>;
}
