//! Explicit "unset vs. set" markers for partial updates.
//!
//! An update names only the fields the caller touched. Merging it onto a
//! stored record overwrites exactly those fields and reports which values
//! actually changed, for the audit trail.

use crate::{
  id::{DoorId, TurfId},
  note::{FieldChange, FieldDiffs},
  record::GeoPoint,
};

/// One field of a partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Field<T> {
  /// Left alone by the update.
  #[default]
  Unset,
  /// Overwrite the stored value with this one.
  Set(T),
}

impl<T> Field<T> {
  pub fn is_set(&self) -> bool { matches!(self, Self::Set(_)) }

  pub fn into_option(self) -> Option<T> {
    match self {
      Self::Set(value) => Some(value),
      Self::Unset => None,
    }
  }
}

impl<T> From<T> for Field<T> {
  fn from(value: T) -> Self { Self::Set(value) }
}

/// Renders a field value for the old → new audit map.
pub trait DiffValue {
  fn render(&self) -> String;
}

impl DiffValue for String {
  fn render(&self) -> String { self.clone() }
}

impl DiffValue for TurfId {
  fn render(&self) -> String { self.to_string() }
}

impl DiffValue for DoorId {
  fn render(&self) -> String { self.to_string() }
}

impl DiffValue for GeoPoint {
  fn render(&self) -> String { format!("{},{}", self.lat, self.lon) }
}

impl<T: DiffValue> DiffValue for Option<T> {
  fn render(&self) -> String {
    self.as_ref().map(DiffValue::render).unwrap_or_default()
  }
}

/// Overwrite `target` if `field` is set, recording the change in `diffs`
/// when the value differs.
pub(crate) fn merge_field<T>(
  target: &mut T,
  field: Field<T>,
  name: &str,
  diffs: &mut FieldDiffs,
) where
  T: PartialEq + DiffValue,
{
  let Field::Set(value) = field else { return };
  if *target != value {
    diffs.insert(name.to_owned(), FieldChange {
      old: target.render(),
      new: value.render(),
    });
  }
  *target = value;
}
