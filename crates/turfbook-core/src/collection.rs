//! [`Collection`] — a dense, append-only list of records.
//!
//! The record at position `i` always carries identifier `i`. Records are
//! never removed, so identifiers are never reused.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  id::RecordId,
  note::FieldDiffs,
  record::Record,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
  items: Vec<T>,
}

impl<T> Default for Collection<T> {
  fn default() -> Self { Self { items: Vec::new() } }
}

impl<T: Record> Collection<T> {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize { self.items.len() }

  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Borrowing iterator in identifier order.
  pub fn iter(&self) -> std::slice::Iter<'_, T> { self.items.iter() }

  pub fn ids(&self) -> impl Iterator<Item = T::Id> + '_ {
    (0..self.items.len()).map(T::Id::from_index)
  }

  /// A deep copy of the record with identifier `id`.
  pub fn get(&self, id: T::Id) -> Result<T> { self.get_ref(id).cloned() }

  pub(crate) fn get_ref(&self, id: T::Id) -> Result<&T> {
    self
      .items
      .get(id.index())
      .ok_or_else(|| Error::NotFound(id.into()))
  }

  pub(crate) fn get_mut(&mut self, id: T::Id) -> Result<&mut T> {
    self
      .items
      .get_mut(id.index())
      .ok_or_else(|| Error::NotFound(id.into()))
  }

  pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
    self.items.iter_mut()
  }

  /// The identifier the next inserted record will receive.
  pub fn next_id(&self) -> T::Id {
    let next = match self.items.last() {
      None => 0,
      Some(last) => last
        .id()
        .map_or(self.items.len(), |id| id.index() + 1),
    };
    T::Id::from_index(next)
  }

  /// Update in place when `id` is given, otherwise append a new record.
  /// Returns a deep copy of the stored record.
  pub fn save(&mut self, id: Option<T::Id>, patch: T::Patch) -> Result<T> {
    match id {
      Some(id) => self.update(id, patch).map(|(record, _)| record),
      None => self.insert(patch),
    }
  }

  /// Append a new record under the next dense identifier.
  pub fn insert(&mut self, patch: T::Patch) -> Result<T> {
    let mut record = T::from_patch(patch)?;
    let id = self.next_id();
    record.set_id(id);
    self.items.push(record.clone());
    tracing::debug!(kind = %T::KIND, %id, "inserted record");
    Ok(record)
  }

  /// Overwrite the fields set in `patch` on record `id`.
  pub fn update(
    &mut self,
    id: T::Id,
    patch: T::Patch,
  ) -> Result<(T, FieldDiffs)> {
    let stored = self
      .items
      .get_mut(id.index())
      .ok_or_else(|| Error::OutOfRange(id.into()))?;
    let diffs = stored.merge(patch);
    Ok((stored.clone(), diffs))
  }

  /// Check that every element's identifier equals its position.
  pub fn check_dense(&self) -> Result<()> {
    for (index, record) in self.items.iter().enumerate() {
      match record.id() {
        Some(id) if id.index() == index => {}
        other => {
          return Err(Error::InvariantViolation(format!(
            "{} at position {index} has identifier {other:?}",
            T::KIND
          )));
        }
      }
    }
    Ok(())
  }
}
