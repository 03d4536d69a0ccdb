//! The three record kinds (turfs, doors and voters) and their partial
//! updates.
//!
//! Forward references (`door.turf_id`, `voter.door_id`, `voter.turf_id`) are
//! authoritative. The reverse lists (`turf.doors`, `turf.voters`,
//! `door.voters`) are caches rebuilt by [`crate::integrity`]; no patch type
//! can touch them.

use serde::{Deserialize, Serialize};

use crate::{
  Database, Error, Result,
  collection::Collection,
  field::{Field, merge_field},
  id::{DoorId, EntityKind, EntityRef, RecordId, TurfId, VoterId},
  note::{FieldDiffs, Note},
};

// ─── Record trait ────────────────────────────────────────────────────────────

/// Behaviour shared by every stored record kind.
pub trait Record: Clone {
  type Id: RecordId + Into<EntityRef>;
  type Patch: Default;

  const KIND: EntityKind;

  /// `None` until the record has been saved.
  fn id(&self) -> Option<Self::Id>;
  fn set_id(&mut self, id: Self::Id);

  /// Build a brand-new record; unset fields take their defaults.
  fn from_patch(patch: Self::Patch) -> Result<Self>;

  /// Overwrite exactly the fields set in `patch`, returning what changed.
  fn merge(&mut self, patch: Self::Patch) -> FieldDiffs;

  fn notes(&self) -> &[Note];
  fn notes_mut(&mut self) -> &mut Vec<Note>;

  fn collection(db: &Database) -> &Collection<Self>;
  fn collection_mut(db: &mut Database) -> &mut Collection<Self>;
}

/// Ties a patch type back to the record it updates, so callers can write
/// `db.save(None, VoterPatch::creating(..))` without naming the record.
pub trait RecordPatch: Default {
  type Record: Record<Patch = Self>;
}

impl RecordPatch for TurfPatch {
  type Record = Turf;
}

impl RecordPatch for DoorPatch {
  type Record = Door;
}

impl RecordPatch for VoterPatch {
  type Record = Voter;
}

fn required(field: Field<String>, name: &'static str) -> Result<String> {
  field.into_option().ok_or(Error::MissingField(name))
}

// ─── Geocode ─────────────────────────────────────────────────────────────────

/// A WGS84 coordinate pair. Stored whole or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub lat: f64,
  pub lon: f64,
}

impl GeoPoint {
  pub fn new(lat: f64, lon: f64) -> Self { Self { lat, lon } }
}

// ─── Turf ────────────────────────────────────────────────────────────────────

/// A named grouping of doors and voters handed to one canvasser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turf {
  #[serde(default)]
  pub id:         Option<TurfId>,
  pub created_by: String,
  #[serde(default)]
  pub desc:       String,
  /// Set when the turf is worked by phone; names the phone field to dial.
  #[serde(default)]
  pub phone_key:  Option<String>,
  /// Door visiting order; route ordering permutes this list.
  #[serde(default)]
  pub doors:      Vec<DoorId>,
  #[serde(default)]
  pub voters:     Vec<VoterId>,
  #[serde(default)]
  pub notes:      Vec<Note>,
}

impl Turf {
  pub fn is_phonebank(&self) -> bool { self.phone_key.is_some() }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurfPatch {
  pub created_by: Field<String>,
  pub desc:       Field<String>,
  pub phone_key:  Field<Option<String>>,
}

impl TurfPatch {
  /// A patch suitable for inserting a new turf.
  pub fn creating(created_by: impl Into<String>) -> Self {
    Self { created_by: Field::Set(created_by.into()), ..Self::default() }
  }
}

impl Record for Turf {
  type Id = TurfId;
  type Patch = TurfPatch;

  const KIND: EntityKind = EntityKind::Turf;

  fn id(&self) -> Option<TurfId> { self.id }

  fn set_id(&mut self, id: TurfId) { self.id = Some(id); }

  fn from_patch(patch: TurfPatch) -> Result<Self> {
    Ok(Self {
      id:         None,
      created_by: required(patch.created_by, "created_by")?,
      desc:       patch.desc.into_option().unwrap_or_default(),
      phone_key:  patch.phone_key.into_option().flatten(),
      doors:      Vec::new(),
      voters:     Vec::new(),
      notes:      Vec::new(),
    })
  }

  fn merge(&mut self, patch: TurfPatch) -> FieldDiffs {
    let mut diffs = FieldDiffs::new();
    merge_field(&mut self.created_by, patch.created_by, "created_by", &mut diffs);
    merge_field(&mut self.desc, patch.desc, "desc", &mut diffs);
    merge_field(&mut self.phone_key, patch.phone_key, "phone_key", &mut diffs);
    diffs
  }

  fn notes(&self) -> &[Note] { &self.notes }

  fn notes_mut(&mut self) -> &mut Vec<Note> { &mut self.notes }

  fn collection(db: &Database) -> &Collection<Self> { db.turfs() }

  fn collection_mut(db: &mut Database) -> &mut Collection<Self> {
    &mut db.turfs
  }
}

// ─── Door ────────────────────────────────────────────────────────────────────

/// A physical address with zero or more voters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
  #[serde(default)]
  pub id:         Option<DoorId>,
  pub created_by: String,
  #[serde(default)]
  pub turf_id:    Option<TurfId>,
  /// House number first, then street tokens, e.g. `"12 N Oak St"`.
  #[serde(default)]
  pub address:    String,
  #[serde(default)]
  pub unit:       String,
  #[serde(default)]
  pub city:       String,
  #[serde(default)]
  pub voters:     Vec<VoterId>,
  #[serde(default)]
  pub location:   Option<GeoPoint>,
  #[serde(default)]
  pub notes:      Vec<Note>,
}

impl Door {
  pub fn has_geocode(&self) -> bool { self.location.is_some() }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoorPatch {
  pub created_by: Field<String>,
  pub turf_id:    Field<Option<TurfId>>,
  pub address:    Field<String>,
  pub unit:       Field<String>,
  pub city:       Field<String>,
  pub location:   Field<Option<GeoPoint>>,
}

impl DoorPatch {
  /// A patch suitable for inserting a new door.
  pub fn creating(created_by: impl Into<String>) -> Self {
    Self { created_by: Field::Set(created_by.into()), ..Self::default() }
  }
}

impl Record for Door {
  type Id = DoorId;
  type Patch = DoorPatch;

  const KIND: EntityKind = EntityKind::Door;

  fn id(&self) -> Option<DoorId> { self.id }

  fn set_id(&mut self, id: DoorId) { self.id = Some(id); }

  fn from_patch(patch: DoorPatch) -> Result<Self> {
    Ok(Self {
      id:         None,
      created_by: required(patch.created_by, "created_by")?,
      turf_id:    patch.turf_id.into_option().flatten(),
      address:    patch.address.into_option().unwrap_or_default(),
      unit:       patch.unit.into_option().unwrap_or_default(),
      city:       patch.city.into_option().unwrap_or_default(),
      voters:     Vec::new(),
      location:   patch.location.into_option().flatten(),
      notes:      Vec::new(),
    })
  }

  fn merge(&mut self, patch: DoorPatch) -> FieldDiffs {
    let mut diffs = FieldDiffs::new();
    merge_field(&mut self.created_by, patch.created_by, "created_by", &mut diffs);
    merge_field(&mut self.turf_id, patch.turf_id, "turf_id", &mut diffs);
    merge_field(&mut self.address, patch.address, "address", &mut diffs);
    merge_field(&mut self.unit, patch.unit, "unit", &mut diffs);
    merge_field(&mut self.city, patch.city, "city", &mut diffs);
    merge_field(&mut self.location, patch.location, "location", &mut diffs);
    diffs
  }

  fn notes(&self) -> &[Note] { &self.notes }

  fn notes_mut(&mut self) -> &mut Vec<Note> { &mut self.notes }

  fn collection(db: &Database) -> &Collection<Self> { db.doors() }

  fn collection_mut(db: &mut Database) -> &mut Collection<Self> {
    &mut db.doors
  }
}

// ─── Voter ───────────────────────────────────────────────────────────────────

/// A person living at a door. `turf_id` may differ from the door's turf,
/// e.g. when the voter is on a phone-bank list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voter {
  #[serde(default)]
  pub id:                Option<VoterId>,
  pub created_by:        String,
  #[serde(default)]
  pub door_id:           Option<DoorId>,
  #[serde(default)]
  pub turf_id:           Option<TurfId>,
  #[serde(default)]
  pub state_voter_id:    String,
  /// Registration status as reported by the voter file ("A", "I", ...).
  #[serde(default)]
  pub status:            String,
  #[serde(default)]
  pub first_name:        String,
  #[serde(default)]
  pub middle_name:       String,
  #[serde(default)]
  pub last_name:         String,
  #[serde(default)]
  pub cell_phone:        String,
  #[serde(default)]
  pub landline_phone:    String,
  #[serde(default)]
  pub best_phone:        String,
  #[serde(default)]
  pub gender:            String,
  #[serde(default)]
  pub race:              String,
  #[serde(default)]
  pub birth_date:        String,
  #[serde(default)]
  pub registration_date: String,
  #[serde(default)]
  pub notes:             Vec<Note>,
}

impl Voter {
  pub fn full_name(&self) -> String {
    [&self.first_name, &self.middle_name, &self.last_name]
      .into_iter()
      .filter(|part| !part.is_empty())
      .map(String::as_str)
      .collect::<Vec<_>>()
      .join(" ")
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoterPatch {
  pub created_by:        Field<String>,
  pub door_id:           Field<Option<DoorId>>,
  pub turf_id:           Field<Option<TurfId>>,
  pub state_voter_id:    Field<String>,
  pub status:            Field<String>,
  pub first_name:        Field<String>,
  pub middle_name:       Field<String>,
  pub last_name:         Field<String>,
  pub cell_phone:        Field<String>,
  pub landline_phone:    Field<String>,
  pub best_phone:        Field<String>,
  pub gender:            Field<String>,
  pub race:              Field<String>,
  pub birth_date:        Field<String>,
  pub registration_date: Field<String>,
}

impl VoterPatch {
  /// A patch suitable for inserting a new voter.
  pub fn creating(created_by: impl Into<String>) -> Self {
    Self { created_by: Field::Set(created_by.into()), ..Self::default() }
  }
}

impl Record for Voter {
  type Id = VoterId;
  type Patch = VoterPatch;

  const KIND: EntityKind = EntityKind::Voter;

  fn id(&self) -> Option<VoterId> { self.id }

  fn set_id(&mut self, id: VoterId) { self.id = Some(id); }

  fn from_patch(patch: VoterPatch) -> Result<Self> {
    Ok(Self {
      id:                None,
      created_by:        required(patch.created_by, "created_by")?,
      door_id:           patch.door_id.into_option().flatten(),
      turf_id:           patch.turf_id.into_option().flatten(),
      state_voter_id:    patch.state_voter_id.into_option().unwrap_or_default(),
      status:            patch.status.into_option().unwrap_or_default(),
      first_name:        patch.first_name.into_option().unwrap_or_default(),
      middle_name:       patch.middle_name.into_option().unwrap_or_default(),
      last_name:         patch.last_name.into_option().unwrap_or_default(),
      cell_phone:        patch.cell_phone.into_option().unwrap_or_default(),
      landline_phone:    patch.landline_phone.into_option().unwrap_or_default(),
      best_phone:        patch.best_phone.into_option().unwrap_or_default(),
      gender:            patch.gender.into_option().unwrap_or_default(),
      race:              patch.race.into_option().unwrap_or_default(),
      birth_date:        patch.birth_date.into_option().unwrap_or_default(),
      registration_date: patch
        .registration_date
        .into_option()
        .unwrap_or_default(),
      notes:             Vec::new(),
    })
  }

  fn merge(&mut self, patch: VoterPatch) -> FieldDiffs {
    let mut d = FieldDiffs::new();
    merge_field(&mut self.created_by, patch.created_by, "created_by", &mut d);
    merge_field(&mut self.door_id, patch.door_id, "door_id", &mut d);
    merge_field(&mut self.turf_id, patch.turf_id, "turf_id", &mut d);
    merge_field(
      &mut self.state_voter_id,
      patch.state_voter_id,
      "state_voter_id",
      &mut d,
    );
    merge_field(&mut self.status, patch.status, "status", &mut d);
    merge_field(&mut self.first_name, patch.first_name, "first_name", &mut d);
    merge_field(&mut self.middle_name, patch.middle_name, "middle_name", &mut d);
    merge_field(&mut self.last_name, patch.last_name, "last_name", &mut d);
    merge_field(&mut self.cell_phone, patch.cell_phone, "cell_phone", &mut d);
    merge_field(
      &mut self.landline_phone,
      patch.landline_phone,
      "landline_phone",
      &mut d,
    );
    merge_field(&mut self.best_phone, patch.best_phone, "best_phone", &mut d);
    merge_field(&mut self.gender, patch.gender, "gender", &mut d);
    merge_field(&mut self.race, patch.race, "race", &mut d);
    merge_field(&mut self.birth_date, patch.birth_date, "birth_date", &mut d);
    merge_field(
      &mut self.registration_date,
      patch.registration_date,
      "registration_date",
      &mut d,
    );
    d
  }

  fn notes(&self) -> &[Note] { &self.notes }

  fn notes_mut(&mut self) -> &mut Vec<Note> { &mut self.notes }

  fn collection(db: &Database) -> &Collection<Self> { db.voters() }

  fn collection_mut(db: &mut Database) -> &mut Collection<Self> {
    &mut db.voters
  }
}
