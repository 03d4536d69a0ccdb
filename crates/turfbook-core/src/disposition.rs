//! Resolving a record's current contact outcome from its note log.
//!
//! Only the most recent tagged note counts. An optional `after` cutoff hides
//! older tags, except hard refusals, which always count. Doors aggregate
//! their voters; turfs define the cutoff window for everything inside them.

use chrono::{DateTime, Utc};

use crate::{
  Database, Result,
  id::{DoorId, EntityRef, TurfId, VoterId},
  note::{Disposition, Note},
};

/// Whether a note tagged `tag` at `created_at` survives the cutoff.
fn qualifies(
  created_at: DateTime<Utc>,
  tag: Disposition,
  after: Option<DateTime<Utc>>,
) -> bool {
  tag.is_hard_refusal() || after.is_none_or(|cutoff| created_at > cutoff)
}

/// Qualifying tags of a most-recent-first log, newest first.
fn qualifying(
  notes: &[Note],
  after: Option<DateTime<Utc>>,
) -> impl Iterator<Item = Disposition> + '_ {
  notes.iter().filter_map(move |note| {
    let tag = note.disposition?;
    qualifies(note.created_at, tag, after).then_some(tag)
  })
}

/// The most recent qualifying tag in a note log.
pub fn latest(
  notes: &[Note],
  after: Option<DateTime<Utc>>,
) -> Option<Disposition> {
  qualifying(notes, after).next()
}

/// How a voter's outcome is reported at door level: a follow-up on a voter
/// means the door itself has been dealt with.
fn escalate(tag: Disposition) -> Disposition {
  match tag {
    Disposition::NeedsFollowUp => Disposition::Done,
    other => other,
  }
}

impl Database {
  /// The current disposition of any record, ignoring non-refusal tags
  /// recorded at or before `after`.
  pub fn disposition(
    &self,
    entity: EntityRef,
    after: Option<DateTime<Utc>>,
  ) -> Result<Option<Disposition>> {
    match entity {
      EntityRef::Turf(id) => Ok(latest(&self.turfs.get_ref(id)?.notes, after)),
      EntityRef::Door(id) => self.door_disposition(id, after),
      EntityRef::Voter(id) => self.voter_disposition(id, after),
    }
  }

  pub fn voter_disposition(
    &self,
    id: VoterId,
    after: Option<DateTime<Utc>>,
  ) -> Result<Option<Disposition>> {
    Ok(latest(&self.voters.get_ref(id)?.notes, after))
  }

  /// The first voter on the door with a qualifying tag decides the door's
  /// outcome. Failing that, the door's own "attempted" tag, if any.
  ///
  /// Voters are taken from `door.voters`, so call this on a reconciled
  /// database (every loaded or committed one is).
  pub fn door_disposition(
    &self,
    id: DoorId,
    after: Option<DateTime<Utc>>,
  ) -> Result<Option<Disposition>> {
    let door = self.doors.get_ref(id)?;

    for &voter_id in &door.voters {
      if let Some(tag) = self.voter_disposition(voter_id, after)? {
        return Ok(Some(escalate(tag)));
      }
    }

    Ok(
      qualifying(&door.notes, after)
        .find(|&tag| tag == Disposition::Attempted),
    )
  }

  /// Start of the turf's active window: the earliest "in progress" note.
  pub fn turf_window_start(&self, id: TurfId) -> Result<Option<DateTime<Utc>>> {
    Ok(
      self
        .turfs
        .get_ref(id)?
        .notes
        .iter()
        .rev()
        .find(|note| note.disposition == Some(Disposition::InProgress))
        .map(|note| note.created_at),
    )
  }

  /// Disposition of a record as seen from inside `turf`'s active window.
  pub fn disposition_in_turf(
    &self,
    entity: EntityRef,
    turf: TurfId,
  ) -> Result<Option<Disposition>> {
    let after = self.turf_window_start(turf)?;
    self.disposition(entity, after)
  }

  /// True once any note on the voter carries a hard refusal.
  pub fn is_do_not_contact(&self, id: VoterId) -> Result<bool> {
    Ok(
      self
        .voters
        .get_ref(id)?
        .notes
        .iter()
        .any(|note| note.disposition.is_some_and(Disposition::is_hard_refusal)),
    )
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::record::{DoorPatch, TurfPatch, VoterPatch};

  fn t(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 3, 9, 0, 0).unwrap()
      + Duration::minutes(minute)
  }

  fn tagged(tag: Disposition, minute: i64) -> Note {
    Note::new(tag.to_string()).with_disposition(tag).at(t(minute))
  }

  /// One turf, one door, two voters on it.
  fn db() -> Database {
    let mut db = Database::new();
    db.save(None, TurfPatch::creating("t")).unwrap();
    db.save(None, DoorPatch {
      turf_id: Some(TurfId(0)).into(),
      ..DoorPatch::creating("t")
    })
    .unwrap();
    for _ in 0..2 {
      db.save(None, VoterPatch {
        door_id: Some(DoorId(0)).into(),
        turf_id: Some(TurfId(0)).into(),
        ..VoterPatch::creating("t")
      })
      .unwrap();
    }
    db.reconcile().unwrap();
    db
  }

  #[test]
  fn most_recent_tag_wins() {
    let mut db = db();
    let voter = EntityRef::Voter(VoterId(0));
    db.add_note(voter, tagged(Disposition::Attempted, 0)).unwrap();
    db.add_note(voter, Note::new("untagged").at(t(5))).unwrap();
    db.add_note(voter, tagged(Disposition::Done, 10)).unwrap();
    db.add_note(voter, Note::new("untagged").at(t(15))).unwrap();

    assert_eq!(db.disposition(voter, None).unwrap(), Some(Disposition::Done));
  }

  #[test]
  fn untagged_log_has_no_disposition() {
    let mut db = db();
    let voter = EntityRef::Voter(VoterId(0));
    assert_eq!(db.disposition(voter, None).unwrap(), None);
    db.add_note(voter, Note::new("said hi")).unwrap();
    assert_eq!(db.disposition(voter, None).unwrap(), None);
  }

  #[test]
  fn refusal_ignores_the_cutoff() {
    let mut db = db();
    let refused = EntityRef::Voter(VoterId(0));
    let attempted = EntityRef::Voter(VoterId(1));
    db.add_note(refused, tagged(Disposition::DoNotContact, 0)).unwrap();
    db.add_note(attempted, tagged(Disposition::Attempted, 0)).unwrap();

    let after = Some(t(30));
    assert_eq!(
      db.disposition(refused, after).unwrap(),
      Some(Disposition::DoNotContact)
    );
    assert_eq!(db.disposition(attempted, after).unwrap(), None);
  }

  #[test]
  fn cutoff_is_strict() {
    let mut db = db();
    let voter = EntityRef::Voter(VoterId(0));
    db.add_note(voter, tagged(Disposition::Done, 10)).unwrap();

    assert_eq!(db.disposition(voter, Some(t(10))).unwrap(), None);
    assert_eq!(
      db.disposition(voter, Some(t(9))).unwrap(),
      Some(Disposition::Done)
    );
  }

  #[test]
  fn follow_up_escalates_to_done_at_the_door() {
    let mut db = db();
    db.add_note(VoterId(1).into(), tagged(Disposition::NeedsFollowUp, 3))
      .unwrap();

    assert_eq!(
      db.disposition(VoterId(1).into(), None).unwrap(),
      Some(Disposition::NeedsFollowUp)
    );
    assert_eq!(
      db.disposition(DoorId(0).into(), None).unwrap(),
      Some(Disposition::Done)
    );
  }

  #[test]
  fn door_uses_first_voter_with_a_tag() {
    let mut db = db();
    db.add_note(VoterId(0).into(), tagged(Disposition::Refused, 1)).unwrap();
    db.add_note(VoterId(1).into(), tagged(Disposition::Done, 2)).unwrap();

    assert_eq!(
      db.disposition(DoorId(0).into(), None).unwrap(),
      Some(Disposition::Refused)
    );
  }

  #[test]
  fn door_sees_a_new_voter_once_reconciled() {
    let mut db = db();
    let voter = db
      .save(None, VoterPatch {
        door_id: Some(DoorId(0)).into(),
        ..VoterPatch::creating("t")
      })
      .unwrap();
    let id = voter.id.unwrap();
    db.add_note(id.into(), tagged(Disposition::Refused, 2)).unwrap();

    assert_eq!(db.disposition(DoorId(0).into(), None).unwrap(), None);
    db.reconcile().unwrap();
    assert_eq!(
      db.disposition(DoorId(0).into(), None).unwrap(),
      Some(Disposition::Refused)
    );
  }

  #[test]
  fn door_falls_back_to_its_own_attempt() {
    let mut db = db();
    let door = EntityRef::Door(DoorId(0));
    assert_eq!(db.disposition(door, None).unwrap(), None);

    db.add_note(door, tagged(Disposition::Attempted, 4)).unwrap();
    db.add_note(door, tagged(Disposition::Done, 6)).unwrap();
    assert_eq!(
      db.disposition(door, None).unwrap(),
      Some(Disposition::Attempted)
    );
    assert_eq!(db.disposition(door, Some(t(5))).unwrap(), None);
  }

  #[test]
  fn turf_window_starts_at_the_earliest_in_progress_note() {
    let mut db = db();
    let turf = TurfId(0);
    assert_eq!(db.turf_window_start(turf).unwrap(), None);

    db.add_note(turf.into(), tagged(Disposition::InProgress, 20)).unwrap();
    db.add_note(turf.into(), tagged(Disposition::InProgress, 40)).unwrap();
    assert_eq!(db.turf_window_start(turf).unwrap(), Some(t(20)));

    db.add_note(VoterId(0).into(), tagged(Disposition::Done, 10)).unwrap();
    db.add_note(VoterId(1).into(), tagged(Disposition::Attempted, 30))
      .unwrap();

    assert_eq!(db.disposition_in_turf(VoterId(0).into(), turf).unwrap(), None);
    assert_eq!(
      db.disposition_in_turf(DoorId(0).into(), turf).unwrap(),
      Some(Disposition::Attempted)
    );
  }

  #[test]
  fn do_not_contact_flag() {
    let mut db = db();
    assert!(!db.is_do_not_contact(VoterId(0)).unwrap());
    db.add_note(VoterId(0).into(), tagged(Disposition::DoNotContact, 0))
      .unwrap();
    db.add_note(VoterId(0).into(), tagged(Disposition::Attempted, 9))
      .unwrap();
    assert!(db.is_do_not_contact(VoterId(0)).unwrap());
  }
}
