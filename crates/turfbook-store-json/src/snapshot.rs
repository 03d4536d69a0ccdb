//! [`JsonSnapshotStore`] — the JSON-file implementation of [`SnapshotStore`].
//!
//! A commit happens in two steps:
//!
//! 1. [`JsonSnapshotStore::stage`] reconciles the database and writes the
//!    serialised form to the temp file. The canonical file is untouched.
//! 2. [`StagedSnapshot::publish`] optionally renames the canonical file to a
//!    backup name, then renames the temp file over the canonical path.
//!
//! The final rename is the only step that makes new data visible. There is
//! no fsync and no lock: one process, one writer.

use std::{
  fs, io,
  path::{Path, PathBuf},
};

use chrono::Utc;
use turfbook_core::{Database, store::SnapshotStore};

use crate::{Error, Result, naming};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A turfbook store persisted as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
  path: PathBuf,
}

impl JsonSnapshotStore {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  /// The canonical snapshot path.
  pub fn path(&self) -> &Path { &self.path }

  pub fn temp_path(&self) -> PathBuf { naming::temp_path(&self.path) }

  pub fn exists(&self) -> bool { self.path.exists() }

  /// Load the snapshot, or start from an empty database if none exists yet.
  /// A snapshot that exists but cannot be read is still an error.
  pub fn load_or_init(&self) -> Result<Database> {
    match self.load() {
      Err(Error::SnapshotNotFound(path)) => {
        tracing::info!(path = %path.display(), "no snapshot yet; starting empty");
        Ok(Database::new())
      }
      other => other,
    }
  }

  /// Reconcile `db` and write it to the temp file.
  ///
  /// Nothing is written if reconciliation fails.
  pub fn stage(&self, db: &mut Database) -> Result<StagedSnapshot<'_>> {
    let report = db.reconcile()?;
    tracing::debug!(?report, "reconciled before commit");

    let json = serde_json::to_string_pretty(db)?;
    let temp = self.temp_path();
    fs::write(&temp, json).map_err(|e| Error::io(&temp, e))?;

    Ok(StagedSnapshot { store: self, temp })
  }

  /// Move the current canonical file out of the way under a fresh backup
  /// name. Returns `None` when there is nothing to back up.
  fn rotate_backup(&self) -> Result<Option<PathBuf>> {
    if !self.exists() {
      return Ok(None);
    }

    let now = Utc::now();
    let mut attempt = 0;
    let backup = loop {
      let candidate = naming::backup_path(&self.path, now, attempt);
      if !candidate.exists() {
        break candidate;
      }
      tracing::warn!(
        backup = %candidate.display(),
        "backup name already taken; adding a counter"
      );
      attempt += 1;
    };

    fs::rename(&self.path, &backup).map_err(|e| Error::io(&self.path, e))?;
    tracing::info!(backup = %backup.display(), "rotated previous snapshot");
    Ok(Some(backup))
  }
}

impl SnapshotStore for JsonSnapshotStore {
  type Error = Error;

  fn load(&self) -> Result<Database> {
    let raw = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
      io::ErrorKind::NotFound => Error::SnapshotNotFound(self.path.clone()),
      _ => Error::io(&self.path, e),
    })?;

    let mut db: Database =
      serde_json::from_str(&raw).map_err(|source| Error::Parse {
        path: self.path.clone(),
        source,
      })?;

    let report = db.reconcile()?;
    if !report.is_clean() {
      tracing::warn!(?report, "snapshot reverse references were stale");
    }

    tracing::info!(
      path = %self.path.display(),
      turfs = db.turfs().len(),
      doors = db.doors().len(),
      voters = db.voters().len(),
      "loaded snapshot"
    );
    Ok(db)
  }

  fn commit(&self, db: &mut Database, backup: bool) -> Result<()> {
    self.stage(db)?.publish(backup)?;
    Ok(())
  }
}

// ─── Staged commit ───────────────────────────────────────────────────────────

/// A snapshot written to the temp file but not yet visible.
///
/// Dropping it without calling [`publish`](Self::publish) leaves the
/// canonical snapshot exactly as it was; the temp file is overwritten by the
/// next stage.
#[must_use = "a staged snapshot is not committed until published"]
#[derive(Debug)]
pub struct StagedSnapshot<'a> {
  store: &'a JsonSnapshotStore,
  temp:  PathBuf,
}

impl StagedSnapshot<'_> {
  pub fn temp_path(&self) -> &Path { &self.temp }

  /// Swap the staged file in. Returns the backup path, if one was made.
  pub fn publish(self, backup: bool) -> Result<Option<PathBuf>> {
    let rotated = if backup { self.store.rotate_backup()? } else { None };

    let canonical = self.store.path();
    fs::rename(&self.temp, canonical).map_err(|e| Error::io(canonical, e))?;
    tracing::info!(path = %canonical.display(), "committed snapshot");
    Ok(rotated)
  }
}
