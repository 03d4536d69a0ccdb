//! Notes — the append-only event log attached to every record.
//!
//! A note is never edited after creation. Logs are kept most-recent-first;
//! new notes are only ever inserted at the head.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ─── Disposition ─────────────────────────────────────────────────────────────

/// The contact outcome a note can be tagged with.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Disposition {
  /// Canvassing of a turf has started; opens the turf's active window.
  InProgress,
  /// Knocked or called, nobody answered.
  Attempted,
  Done,
  /// Contact made, someone should come back.
  NeedsFollowUp,
  Refused,
  DoNotContact,
}

impl Disposition {
  /// Refusals are never hidden by a recency cutoff.
  pub fn is_hard_refusal(self) -> bool {
    matches!(self, Self::Refused | Self::DoNotContact)
  }
}

// ─── Audit diffs ─────────────────────────────────────────────────────────────

/// Old and new rendering of one edited field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
  pub old: String,
  pub new: String,
}

/// Field name → change, as recorded on audit notes.
pub type FieldDiffs = BTreeMap<String, FieldChange>;

// ─── Note ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
  pub body:        String,
  /// Username of whoever wrote the note, if known.
  #[serde(default)]
  pub author:      Option<String>,
  /// Written by the system rather than typed by a person.
  #[serde(default)]
  pub system:      bool,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub diffs:       FieldDiffs,
  #[serde(default)]
  pub disposition: Option<Disposition>,
  pub created_at:  DateTime<Utc>,
}

impl Note {
  /// A plain human note stamped with the current time.
  pub fn new(body: impl Into<String>) -> Self {
    Self {
      body:        body.into(),
      author:      None,
      system:      false,
      diffs:       FieldDiffs::new(),
      disposition: None,
      created_at:  Utc::now(),
    }
  }

  /// The system note recorded alongside an audited edit.
  pub fn audit(author: Option<String>, diffs: FieldDiffs) -> Self {
    let body = diffs
      .iter()
      .map(|(field, change)| {
        format!("changed {field} from '{}' to '{}'.", change.old, change.new)
      })
      .collect::<Vec<_>>()
      .join(" ");

    Self { author, system: true, diffs, ..Self::new(body) }
  }

  pub fn by(mut self, author: impl Into<String>) -> Self {
    self.author = Some(author.into());
    self
  }

  pub fn system(mut self) -> Self {
    self.system = true;
    self
  }

  pub fn with_disposition(mut self, disposition: Disposition) -> Self {
    self.disposition = Some(disposition);
    self
  }

  /// Override the creation time (imports, tests).
  pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
    self.created_at = created_at;
    self
  }
}
