//! [`Database`] — the in-memory store handle.
//!
//! One `Database` is constructed at startup (loaded from a snapshot or
//! empty) and passed explicitly to whatever needs it. Every read hands out a
//! deep copy; every write goes through a partial-update patch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  collection::Collection,
  field::Field,
  id::{DoorId, EntityRef, TurfId, VoterId},
  integrity::{self, ReconcileReport},
  note::{FieldDiffs, Note},
  record::{Door, Record, RecordPatch, Turf, Voter, VoterPatch},
};

/// The previous and next entry around a record in a parent's ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors<I> {
  pub prev: Option<I>,
  pub next: Option<I>,
}

impl<I> Default for Neighbors<I> {
  fn default() -> Self { Self { prev: None, next: None } }
}

impl<I: Copy + PartialEq> Neighbors<I> {
  fn around(list: &[I], item: I) -> Self {
    let Some(pos) = list.iter().position(|&x| x == item) else {
      return Self::default();
    };
    Self {
      prev: pos.checked_sub(1).map(|p| list[p]),
      next: list.get(pos + 1).copied(),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
  #[serde(default)]
  pub(crate) turfs:  Collection<Turf>,
  #[serde(default)]
  pub(crate) doors:  Collection<Door>,
  #[serde(default)]
  pub(crate) voters: Collection<Voter>,
}

impl Database {
  pub fn new() -> Self { Self::default() }

  pub fn turfs(&self) -> &Collection<Turf> { &self.turfs }

  pub fn doors(&self) -> &Collection<Door> { &self.doors }

  pub fn voters(&self) -> &Collection<Voter> { &self.voters }

  // ── Reads ───────────────────────────────────────────────────────────────

  pub fn get<T: Record>(&self, id: T::Id) -> Result<T> {
    T::collection(self).get(id)
  }

  pub fn turf(&self, id: TurfId) -> Result<Turf> { self.turfs.get(id) }

  pub fn door(&self, id: DoorId) -> Result<Door> { self.doors.get(id) }

  pub fn voter(&self, id: VoterId) -> Result<Voter> { self.voters.get(id) }

  /// The note log of any record, most recent first.
  pub fn notes(&self, entity: EntityRef) -> Result<Vec<Note>> {
    Ok(self.notes_ref(entity)?.to_vec())
  }

  pub(crate) fn notes_ref(&self, entity: EntityRef) -> Result<&[Note]> {
    Ok(match entity {
      EntityRef::Turf(id) => self.turfs.get_ref(id)?.notes(),
      EntityRef::Door(id) => self.doors.get_ref(id)?.notes(),
      EntityRef::Voter(id) => self.voters.get_ref(id)?.notes(),
    })
  }

  /// A short human label: turf description, door address, or voter name.
  pub fn title(&self, entity: EntityRef) -> Result<String> {
    Ok(match entity {
      EntityRef::Turf(id) => self.turfs.get_ref(id)?.desc.clone(),
      EntityRef::Door(id) => self.doors.get_ref(id)?.address.clone(),
      EntityRef::Voter(id) => self.voters.get_ref(id)?.full_name(),
    })
  }

  /// Previous and next door in the door's turf, following the turf's
  /// (route) order.
  pub fn adjacent_doors(&self, id: DoorId) -> Result<Neighbors<DoorId>> {
    let door = self.doors.get_ref(id)?;
    let Some(turf_id) = door.turf_id else {
      return Ok(Neighbors::default());
    };
    Ok(Neighbors::around(&self.turfs.get_ref(turf_id)?.doors, id))
  }

  /// Previous and next voter on a turf's voter list.
  pub fn adjacent_voters(
    &self,
    turf: TurfId,
    id: VoterId,
  ) -> Result<Neighbors<VoterId>> {
    self.voters.get_ref(id)?;
    Ok(Neighbors::around(&self.turfs.get_ref(turf)?.voters, id))
  }

  // ── Writes ──────────────────────────────────────────────────────────────

  /// Insert (`id == None`) or partially update a record.
  ///
  /// Reverse lists are not touched here; they catch up on the next
  /// [`Database::reconcile`], which every commit runs.
  pub fn save<P: RecordPatch>(
    &mut self,
    id: Option<<P::Record as Record>::Id>,
    patch: P,
  ) -> Result<P::Record> {
    <P::Record as Record>::collection_mut(self).save(id, patch)
  }

  /// Partially update an existing record. Returns the updated copy and the
  /// fields whose values actually changed.
  pub fn update<P: RecordPatch>(
    &mut self,
    id: <P::Record as Record>::Id,
    patch: P,
  ) -> Result<(P::Record, FieldDiffs)> {
    <P::Record as Record>::collection_mut(self).update(id, patch)
  }

  /// Partially update a record and, if anything actually changed, prepend a
  /// system note describing the change. Returns the updated copy and the
  /// audit note, if one was written.
  pub fn update_with_audit<P: RecordPatch>(
    &mut self,
    id: <P::Record as Record>::Id,
    patch: P,
    author: Option<String>,
  ) -> Result<(P::Record, Option<Note>)> {
    let (record, diffs) = self.update(id, patch)?;
    if diffs.is_empty() {
      return Ok((record, None));
    }

    let collection = <P::Record as Record>::collection_mut(self);
    let note = Note::audit(author, diffs);
    collection.get_mut(id)?.notes_mut().insert(0, note.clone());
    Ok((collection.get(id)?, Some(note)))
  }

  /// Create a placeholder voter on `door`, in the door's turf, with a system
  /// note recording who created it. Reverse lists are reconciled.
  pub fn add_voter_at_door(
    &mut self,
    door: DoorId,
    created_by: impl Into<String>,
  ) -> Result<Voter> {
    let created_by = created_by.into();
    let turf_id = self.doors.get_ref(door)?.turf_id;

    let voter = self.save(None, VoterPatch {
      first_name: Field::Set("New".into()),
      last_name: Field::Set("Voter".into()),
      door_id: Field::Set(Some(door)),
      turf_id: Field::Set(turf_id),
      ..VoterPatch::creating(created_by.clone())
    })?;
    let id = voter.id.ok_or_else(|| {
      Error::InvariantViolation("inserted voter has no identifier".into())
    })?;

    self.add_note(
      id.into(),
      Note::new("created the voter").by(created_by).system(),
    )?;
    self.reconcile()?;
    self.voters.get(id)
  }

  /// Prepend `note` to a record's log. Existing notes are never touched.
  pub fn add_note(&mut self, entity: EntityRef, note: Note) -> Result<()> {
    let notes = match entity {
      EntityRef::Turf(id) => self.turfs.get_mut(id)?.notes_mut(),
      EntityRef::Door(id) => self.doors.get_mut(id)?.notes_mut(),
      EntityRef::Voter(id) => self.voters.get_mut(id)?.notes_mut(),
    };
    notes.insert(0, note);
    tracing::debug!(%entity, "added note");
    Ok(())
  }

  /// Move doors to new turfs, taking every voter on each door along.
  ///
  /// `mapping` comes from an external spatial join. All identifiers are
  /// validated before anything changes; reverse lists are then reconciled.
  pub fn assign_turfs(
    &mut self,
    mapping: &BTreeMap<DoorId, TurfId>,
  ) -> Result<ReconcileReport> {
    for (&door, &turf) in mapping {
      self.doors.get_ref(door)?;
      self.turfs.get_ref(turf)?;
    }

    for (&door_id, &turf_id) in mapping {
      self.doors.get_mut(door_id)?.turf_id = Some(turf_id);
      for voter in self.voters.iter_mut() {
        if voter.door_id == Some(door_id) {
          voter.turf_id = Some(turf_id);
        }
      }
    }
    tracing::info!(doors = mapping.len(), "applied turf assignments");

    self.reconcile()
  }

  /// See [`integrity::reconcile`].
  pub fn reconcile(&mut self) -> Result<ReconcileReport> {
    integrity::reconcile(self)
  }
}
