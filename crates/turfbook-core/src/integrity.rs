//! Referential integrity — rebuilding reverse lists from forward references.
//!
//! A child's pointer to its parent is the single source of truth. For each
//! link (voter → door, voter → turf, door → turf) reconciliation:
//!
//! 1. appends every child to its parent's reverse list if it is missing, and
//! 2. drops every entry whose child no longer points at that parent.
//!
//! Entries keep the order in which they were first associated, so a route
//! order written into `turf.doors` survives reconciliation.

use std::collections::HashSet;

use serde::Serialize;

use crate::{
  Database, Error, Result,
  collection::Collection,
  id::{EntityRef, RecordId},
  record::Record,
};

/// How many reverse-list entries one reconciliation pass touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
  pub added:   usize,
  pub removed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
  pub door_voters: LinkStats,
  pub turf_voters: LinkStats,
  pub turf_doors:  LinkStats,
}

impl ReconcileReport {
  pub fn is_clean(&self) -> bool { *self == Self::default() }
}

/// Reconcile every reverse list in `db`.
///
/// Fails with [`Error::InvariantViolation`] if a collection is not densely
/// identified or a forward reference points at a record that does not exist.
/// Either means the store must not be persisted.
pub fn reconcile(db: &mut Database) -> Result<ReconcileReport> {
  check_dense(db)?;

  let Database { turfs, doors, voters } = &mut *db;

  let report = ReconcileReport {
    door_voters: reconcile_link(voters, doors, |v| v.door_id, |d| &mut d.voters)?,
    turf_voters: reconcile_link(voters, turfs, |v| v.turf_id, |t| &mut t.voters)?,
    turf_doors:  reconcile_link(doors, turfs, |d| d.turf_id, |t| &mut t.doors)?,
  };

  check_dense(db)?;
  tracing::debug!(?report, "reconciled reverse references");
  Ok(report)
}

fn check_dense(db: &Database) -> Result<()> {
  db.turfs().check_dense()?;
  db.doors().check_dense()?;
  db.voters().check_dense()
}

fn reconcile_link<C, P>(
  children: &Collection<C>,
  parents: &mut Collection<P>,
  parent_of: impl Fn(&C) -> Option<P::Id>,
  backrefs: impl Fn(&mut P) -> &mut Vec<C::Id>,
) -> Result<LinkStats>
where
  C: Record,
  P: Record,
{
  let mut stats = LinkStats::default();

  for (child_id, child) in children.ids().zip(children.iter()) {
    let Some(parent_id) = parent_of(child) else { continue };
    let parent = parents.get_mut(parent_id).map_err(|_| {
      let (child, parent): (EntityRef, EntityRef) =
        (child_id.into(), parent_id.into());
      Error::InvariantViolation(format!("{child} points at missing {parent}"))
    })?;

    let list = backrefs(parent);
    if !list.contains(&child_id) {
      list.push(child_id);
      stats.added += 1;
    }
  }

  for (index, parent) in parents.iter_mut().enumerate() {
    let parent_id = P::Id::from_index(index);
    let list = backrefs(parent);
    let before = list.len();
    let mut seen = HashSet::new();

    list.retain(|&child_id| {
      let points_here = children
        .get_ref(child_id)
        .is_ok_and(|child| parent_of(child) == Some(parent_id));
      points_here && seen.insert(child_id)
    });
    stats.removed += before - list.len();
  }

  Ok(stats)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    id::{DoorId, TurfId, VoterId},
    record::{DoorPatch, TurfPatch, VoterPatch},
  };

  /// Two turfs, two doors (one per turf), one voter on door 0.
  fn fixture() -> Database {
    let mut db = Database::new();
    db.save(None, TurfPatch::creating("t")).unwrap();
    db.save(None, TurfPatch::creating("t")).unwrap();
    db.save(None, DoorPatch {
      turf_id: Some(TurfId(0)).into(),
      ..DoorPatch::creating("t")
    })
    .unwrap();
    db.save(None, DoorPatch {
      turf_id: Some(TurfId(1)).into(),
      ..DoorPatch::creating("t")
    })
    .unwrap();
    db.save(None, VoterPatch {
      door_id: Some(DoorId(0)).into(),
      turf_id: Some(TurfId(0)).into(),
      ..VoterPatch::creating("t")
    })
    .unwrap();
    db
  }

  #[test]
  fn reverse_lists_follow_forward_references() {
    let mut db = fixture();
    let report = reconcile(&mut db).unwrap();

    assert_eq!(report.turf_doors.added, 2);
    assert_eq!(db.turf(TurfId(0)).unwrap().doors, vec![DoorId(0)]);
    assert_eq!(db.turf(TurfId(0)).unwrap().voters, vec![VoterId(0)]);
    assert_eq!(db.door(DoorId(0)).unwrap().voters, vec![VoterId(0)]);
    assert!(db.door(DoorId(1)).unwrap().voters.is_empty());
  }

  #[test]
  fn reconciliation_is_idempotent() {
    let mut db = fixture();
    reconcile(&mut db).unwrap();
    let once = db.clone();

    let second = reconcile(&mut db).unwrap();
    assert!(second.is_clean());
    assert_eq!(db, once);
  }

  #[test]
  fn reparenting_moves_the_voter_everywhere() {
    let mut db = fixture();
    reconcile(&mut db).unwrap();

    db.save(Some(VoterId(0)), VoterPatch {
      door_id: Some(DoorId(1)).into(),
      turf_id: Some(TurfId(1)).into(),
      ..VoterPatch::default()
    })
    .unwrap();
    reconcile(&mut db).unwrap();

    assert!(db.turf(TurfId(0)).unwrap().voters.is_empty());
    assert_eq!(db.turf(TurfId(1)).unwrap().voters, vec![VoterId(0)]);
    assert!(db.door(DoorId(0)).unwrap().voters.is_empty());
    assert_eq!(db.door(DoorId(1)).unwrap().voters, vec![VoterId(0)]);
  }

  #[test]
  fn clearing_a_reference_drops_the_backref() {
    let mut db = fixture();
    reconcile(&mut db).unwrap();

    db.save(Some(DoorId(1)), DoorPatch {
      turf_id: crate::field::Field::Set(None),
      ..DoorPatch::default()
    })
    .unwrap();
    let report = reconcile(&mut db).unwrap();

    assert_eq!(report.turf_doors.removed, 1);
    assert!(db.turf(TurfId(1)).unwrap().doors.is_empty());
  }

  #[test]
  fn stale_and_duplicate_entries_are_removed() {
    let mut db = fixture();
    db.turfs.get_mut(TurfId(1)).unwrap().doors =
      vec![DoorId(1), DoorId(0), DoorId(1), DoorId(9)];

    reconcile(&mut db).unwrap();
    assert_eq!(db.turf(TurfId(1)).unwrap().doors, vec![DoorId(1)]);
  }

  #[test]
  fn existing_order_is_preserved() {
    let mut db = fixture();
    db.save(None, DoorPatch {
      turf_id: Some(TurfId(0)).into(),
      ..DoorPatch::creating("t")
    })
    .unwrap();
    db.turfs.get_mut(TurfId(0)).unwrap().doors = vec![DoorId(2), DoorId(0)];

    reconcile(&mut db).unwrap();
    assert_eq!(db.turf(TurfId(0)).unwrap().doors, vec![DoorId(2), DoorId(0)]);
  }

  #[test]
  fn dangling_forward_reference_is_fatal() {
    let mut db = fixture();
    db.voters.get_mut(VoterId(0)).unwrap().door_id = Some(DoorId(42));

    let err = reconcile(&mut db).unwrap_err();
    assert!(matches!(err, Error::InvariantViolation(_)));
  }

  #[test]
  fn non_dense_collection_is_fatal() {
    let mut db = fixture();
    db.doors.get_mut(DoorId(1)).unwrap().id = Some(DoorId(7));

    let err = reconcile(&mut db).unwrap_err();
    assert!(matches!(err, Error::InvariantViolation(_)));
  }
}
