//! File names derived from the canonical snapshot path.
//!
//! For `data/database.json`:
//! - temp file: `data/database.json.tmp`
//! - backups:   `data/database-20261015T093000Z.json`

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Second resolution; commits are serialised so this rarely collides.
const BACKUP_STAMP: &str = "%Y%m%dT%H%M%SZ";

pub fn temp_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().unwrap_or_default().to_os_string();
  name.push(".tmp");
  path.with_file_name(name)
}

/// Backup name for a snapshot taken at `at`. `attempt > 0` appends a
/// disambiguating counter for commits landing in the same second.
pub fn backup_path(path: &Path, at: DateTime<Utc>, attempt: u32) -> PathBuf {
  let stem = path.file_stem().unwrap_or_default().to_string_lossy();
  let stamp = at.format(BACKUP_STAMP);
  let suffix = if attempt == 0 { String::new() } else { format!("-{attempt}") };
  let name = match path.extension() {
    Some(ext) => format!("{stem}-{stamp}{suffix}.{}", ext.to_string_lossy()),
    None => format!("{stem}-{stamp}{suffix}"),
  };
  path.with_file_name(name)
}
