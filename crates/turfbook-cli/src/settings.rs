//! Runtime configuration: optional TOML file layered with `TURFBOOK_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
  /// Canonical snapshot file; temp and backup files live beside it.
  #[serde(default = "default_snapshot_path")]
  pub snapshot_path: PathBuf,
  /// Keep the previous snapshot under a timestamped name on every commit.
  #[serde(default = "default_backup")]
  pub backup:        bool,
  /// Recorded as the author of notes written from the command line.
  #[serde(default)]
  pub author:        Option<String>,
}

fn default_snapshot_path() -> PathBuf { PathBuf::from("database.json") }

fn default_backup() -> bool { true }

impl Settings {
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(file.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("TURFBOOK"))
      .build()
      .context("failed to read config file")?;

    let mut settings: Self = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.snapshot_path = expand_tilde(&settings.snapshot_path);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.snapshot_path, PathBuf::from("database.json"));
    assert!(settings.backup);
    assert_eq!(settings.author, None);
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("turfbook.toml");
    std::fs::write(
      &file,
      "snapshot_path = \"/srv/hd25/database.json\"\nbackup = false\nauthor = \"sam\"\n",
    )
    .unwrap();

    let settings = Settings::load(&file).unwrap();
    assert_eq!(settings.snapshot_path, PathBuf::from("/srv/hd25/database.json"));
    assert!(!settings.backup);
    assert_eq!(settings.author.as_deref(), Some("sam"));
  }

  #[test]
  fn relative_paths_are_left_alone() {
    assert_eq!(expand_tilde(Path::new("data/db.json")), Path::new("data/db.json"));
  }
}
