//! Subcommands. Each one loads the snapshot, does one thing, and commits if
//! it changed anything.

use std::{collections::BTreeMap, fs, path::PathBuf};

use anyhow::{Context as _, bail};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::Value;
use turfbook_core::{
  Database,
  field::Field,
  id::{DoorId, EntityKind, EntityRef, TurfId, VoterId},
  note::{Disposition, Note},
  record::{DoorPatch, GeoPoint, VoterPatch},
  store::SnapshotStore,
};
use turfbook_store_json::JsonSnapshotStore;

use crate::settings::Settings;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Create an empty snapshot.
  Init,

  /// Load and validate the snapshot, then print collection sizes.
  Check,

  /// Print one record as JSON.
  Show { kind: EntityKind, id: usize },

  /// Plan walking routes and store them as the turfs' door order.
  Route {
    #[arg(required_unless_present = "all")]
    turf:    Option<TurfId>,
    /// Every walk turf (phone-bank turfs are skipped).
    #[arg(long, conflicts_with = "turf")]
    all:     bool,
    /// Print the route without committing it.
    #[arg(long)]
    dry_run: bool,
  },

  /// Print the current disposition of a record.
  Disposition {
    kind:  EntityKind,
    id:    usize,
    /// Only count tags inside this turf's active window.
    #[arg(long, conflicts_with = "after")]
    turf:  Option<TurfId>,
    /// Only count tags recorded after this RFC 3339 time.
    #[arg(long)]
    after: Option<DateTime<Utc>>,
  },

  /// Prepend a note to a record's log.
  Note {
    kind:        EntityKind,
    id:          usize,
    body:        String,
    #[arg(long)]
    disposition: Option<Disposition>,
    #[arg(long)]
    author:      Option<String>,
  },

  /// Edit a voter's contact details, leaving an audit note.
  EditVoter {
    id:          VoterId,
    #[arg(long)]
    first_name:  Option<String>,
    #[arg(long)]
    last_name:   Option<String>,
    #[arg(long)]
    cell_phone:  Option<String>,
    #[arg(long)]
    best_phone:  Option<String>,
    #[arg(long)]
    author:      Option<String>,
  },

  /// Add a placeholder voter to a door, in the door's turf.
  NewVoter {
    door:   DoorId,
    #[arg(long)]
    author: Option<String>,
  },

  /// Set a door's coordinates, or clear them when none are given.
  Geocode {
    door: DoorId,
    #[arg(allow_negative_numbers = true, requires = "lon")]
    lat:  Option<f64>,
    #[arg(allow_negative_numbers = true)]
    lon:  Option<f64>,
  },

  /// Re-parent doors (and their voters) from a JSON `{door: turf}` map.
  AssignTurfs { mapping: PathBuf },

  /// Write geocoded doors as a GeoJSON FeatureCollection.
  ExportGeojson {
    #[arg(long)]
    turf: Option<TurfId>,
    /// Output file; stdout when omitted.
    #[arg(long)]
    out:  Option<PathBuf>,
  },
}

pub fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
  let store = JsonSnapshotStore::new(&settings.snapshot_path);

  match command {
    Command::Init => {
      if store.exists() {
        bail!("snapshot {} already exists", store.path().display());
      }
      commit(&store, &mut Database::new(), settings)?;
    }

    Command::Check => {
      let db = load(&store)?;
      println!(
        "{}: {} turfs, {} doors, {} voters",
        store.path().display(),
        db.turfs().len(),
        db.doors().len(),
        db.voters().len()
      );
    }

    Command::Show { kind, id } => {
      let record = record_json(&load(&store)?, EntityRef::new(kind, id))?;
      println!("{}", serde_json::to_string_pretty(&record)?);
    }

    Command::Route { turf, all, dry_run } => {
      let mut db = load(&store)?;
      if all {
        let n = db.reorder_all_turfs()?;
        println!("reordered {n} turfs");
      } else {
        let turf = turf.context("a turf id or --all is required")?;
        let route = db.reorder_turf(turf)?;
        let order: Vec<String> =
          route.doors.iter().map(ToString::to_string).collect();
        println!("{} (cost {:.1})", order.join(" "), route.cost);
      }
      if !dry_run {
        commit(&store, &mut db, settings)?;
      }
    }

    Command::Disposition { kind, id, turf, after } => {
      let db = load(&store)?;
      let entity = EntityRef::new(kind, id);
      let tag = match turf {
        Some(turf) => db.disposition_in_turf(entity, turf)?,
        None => db.disposition(entity, after)?,
      };
      match tag {
        Some(tag) => println!("{tag}"),
        None => println!("none"),
      }
    }

    Command::Note { kind, id, body, disposition, author } => {
      let mut db = load(&store)?;
      let mut note = Note::new(body);
      if let Some(author) = author.or_else(|| settings.author.clone()) {
        note = note.by(author);
      }
      if let Some(tag) = disposition {
        note = note.with_disposition(tag);
      }
      db.add_note(EntityRef::new(kind, id), note)?;
      commit(&store, &mut db, settings)?;
    }

    Command::EditVoter {
      id,
      first_name,
      last_name,
      cell_phone,
      best_phone,
      author,
    } => {
      let mut db = load(&store)?;
      let patch = VoterPatch {
        first_name: first_name.map_or(Field::Unset, Field::Set),
        last_name: last_name.map_or(Field::Unset, Field::Set),
        cell_phone: cell_phone.map_or(Field::Unset, Field::Set),
        best_phone: best_phone.map_or(Field::Unset, Field::Set),
        ..VoterPatch::default()
      };
      let author = author.or_else(|| settings.author.clone());
      match db.update_with_audit(id, patch, author)? {
        (_, Some(note)) => {
          println!("{}", note.body);
          commit(&store, &mut db, settings)?;
        }
        (_, None) => println!("nothing changed"),
      }
    }

    Command::NewVoter { door, author } => {
      let mut db = load(&store)?;
      let author = author
        .or_else(|| settings.author.clone())
        .context("an author is required to create a voter")?;
      let voter = db.add_voter_at_door(door, author)?;
      commit(&store, &mut db, settings)?;
      if let Some(id) = voter.id {
        println!("created voter {id}");
      }
    }

    Command::Geocode { door, lat, lon } => {
      let mut db = load(&store)?;
      let location = lat.zip(lon).map(|(lat, lon)| GeoPoint::new(lat, lon));
      db.save(Some(door), DoorPatch {
        location: Field::Set(location),
        ..DoorPatch::default()
      })?;
      commit(&store, &mut db, settings)?;
    }

    Command::AssignTurfs { mapping } => {
      let mut db = load(&store)?;
      let raw = fs::read_to_string(&mapping)
        .with_context(|| format!("reading {}", mapping.display()))?;
      let mapping: BTreeMap<DoorId, TurfId> =
        serde_json::from_str(&raw).context("parsing turf mapping")?;
      let report = db.assign_turfs(&mapping)?;
      tracing::debug!(?report, "assigned turfs");
      println!("moved {} doors", mapping.len());
      commit(&store, &mut db, settings)?;
    }

    Command::ExportGeojson { turf, out } => {
      let collection = load(&store)?.geojson(turf)?;
      let json = serde_json::to_string(&collection)?;
      match out {
        Some(path) => {
          fs::write(&path, json)
            .with_context(|| format!("writing {}", path.display()))?;
          let n = collection["features"].as_array().map_or(0, Vec::len);
          println!("wrote {n} doors to {}", path.display());
        }
        None => println!("{json}"),
      }
    }
  }

  Ok(())
}

fn load(store: &JsonSnapshotStore) -> anyhow::Result<Database> {
  store
    .load()
    .with_context(|| format!("failed to load {}", store.path().display()))
}

fn commit(
  store: &JsonSnapshotStore,
  db: &mut Database,
  settings: &Settings,
) -> anyhow::Result<()> {
  store
    .commit(db, settings.backup)
    .with_context(|| format!("failed to commit {}", store.path().display()))
}

fn record_json(db: &Database, entity: EntityRef) -> anyhow::Result<Value> {
  Ok(match entity {
    EntityRef::Turf(id) => serde_json::to_value(db.turf(id)?)?,
    EntityRef::Door(id) => serde_json::to_value(db.door(id)?)?,
    EntityRef::Voter(id) => serde_json::to_value(db.voter(id)?)?,
  })
}

#[cfg(test)]
mod tests {
  use turfbook_core::record::TurfPatch;

  use super::*;

  fn settings(dir: &tempfile::TempDir) -> Settings {
    Settings {
      snapshot_path: dir.path().join("database.json"),
      backup:        false,
      author:        Some("sam".into()),
    }
  }

  fn seed(settings: &Settings) {
    let mut db = Database::new();
    db.save(None, TurfPatch::creating("test")).unwrap();
    db.save(None, TurfPatch::creating("test")).unwrap();
    for address in ["2 Main St", "1 Main St"] {
      db.save(None, DoorPatch {
        turf_id: Some(TurfId(0)).into(),
        address: address.to_string().into(),
        ..DoorPatch::creating("test")
      })
      .unwrap();
    }
    db.save(None, VoterPatch {
      door_id: Some(DoorId(0)).into(),
      turf_id: Some(TurfId(0)).into(),
      first_name: "Ann".to_string().into(),
      ..VoterPatch::creating("test")
    })
    .unwrap();
    JsonSnapshotStore::new(&settings.snapshot_path)
      .commit(&mut db, false)
      .unwrap();
  }

  fn load(settings: &Settings) -> Database {
    JsonSnapshotStore::new(&settings.snapshot_path).load().unwrap()
  }

  #[test]
  fn init_refuses_to_clobber() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(&dir);
    run(Command::Init, &settings).unwrap();
    assert!(load(&settings).turfs().is_empty());
    assert!(run(Command::Init, &settings).is_err());
  }

  #[test]
  fn note_uses_the_configured_author() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(&dir);
    seed(&settings);

    run(
      Command::Note {
        kind:        EntityKind::Voter,
        id:          0,
        body:        "not home".into(),
        disposition: Some(Disposition::Attempted),
        author:      None,
      },
      &settings,
    )
    .unwrap();

    let db = load(&settings);
    let note = &db.voter(VoterId(0)).unwrap().notes[0];
    assert_eq!(note.author.as_deref(), Some("sam"));
    assert_eq!(
      db.disposition(DoorId(0).into(), None).unwrap(),
      Some(Disposition::Attempted)
    );
  }

  #[test]
  fn geocode_then_route() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(&dir);
    seed(&settings);

    for (door, lon) in [(0, 1.0), (1, 0.0)] {
      run(
        Command::Geocode { door: DoorId(door), lat: Some(0.0), lon: Some(lon) },
        &settings,
      )
      .unwrap();
    }
    run(
      Command::Route { turf: Some(TurfId(0)), all: false, dry_run: false },
      &settings,
    )
    .unwrap();

    let doors = load(&settings).turf(TurfId(0)).unwrap().doors;
    assert_eq!(doors, vec![DoorId(0), DoorId(1)]);
  }

  #[test]
  fn route_on_ungeocoded_turf_fails_without_commit() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(&dir);
    seed(&settings);
    let before = fs::read(&settings.snapshot_path).unwrap();

    let err = run(
      Command::Route { turf: None, all: true, dry_run: false },
      &settings,
    )
    .unwrap_err();
    assert!(err.to_string().contains("no geocode"));
    assert_eq!(fs::read(&settings.snapshot_path).unwrap(), before);
  }

  #[test]
  fn assign_turfs_from_mapping_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(&dir);
    seed(&settings);
    let mapping = dir.path().join("mapping.json");
    fs::write(&mapping, r#"{ "0": 1 }"#).unwrap();

    run(Command::AssignTurfs { mapping }, &settings).unwrap();

    let db = load(&settings);
    assert_eq!(db.turf(TurfId(1)).unwrap().doors, vec![DoorId(0)]);
    assert_eq!(db.turf(TurfId(1)).unwrap().voters, vec![VoterId(0)]);
    assert_eq!(db.turf(TurfId(0)).unwrap().doors, vec![DoorId(1)]);
  }

  #[test]
  fn edit_voter_writes_an_audit_note() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(&dir);
    seed(&settings);

    run(
      Command::EditVoter {
        id:         VoterId(0),
        first_name: None,
        last_name:  Some("Smith".into()),
        cell_phone: None,
        best_phone: None,
        author:     None,
      },
      &settings,
    )
    .unwrap();

    let voter = load(&settings).voter(VoterId(0)).unwrap();
    assert_eq!(voter.first_name, "Ann");
    assert_eq!(voter.last_name, "Smith");
    assert!(voter.notes[0].system);
    assert_eq!(voter.notes[0].diffs["last_name"].new, "Smith");
  }

  #[test]
  fn new_voter_lands_on_the_door() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(&dir);
    seed(&settings);

    run(Command::NewVoter { door: DoorId(1), author: None }, &settings)
      .unwrap();

    let db = load(&settings);
    let voter = db.voter(VoterId(1)).unwrap();
    assert_eq!(voter.created_by, "sam");
    assert_eq!(voter.turf_id, Some(TurfId(0)));
    assert_eq!(db.door(DoorId(1)).unwrap().voters, vec![VoterId(1)]);
  }

  #[test]
  fn export_writes_only_geocoded_doors() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(&dir);
    seed(&settings);
    run(
      Command::Geocode { door: DoorId(1), lat: Some(45.0), lon: Some(-93.0) },
      &settings,
    )
    .unwrap();

    let out = dir.path().join("doors.geojson");
    run(Command::ExportGeojson { turf: None, out: Some(out.clone()) }, &settings)
      .unwrap();

    let written: Value =
      serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
    assert_eq!(written["features"].as_array().unwrap().len(), 1);
  }
}
