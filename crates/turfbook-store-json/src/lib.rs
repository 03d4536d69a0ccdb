//! JSON snapshot backend for the turfbook store.
//!
//! The whole [`turfbook_core::Database`] lives in one pretty-printed JSON
//! file. Commits are staged to a sibling temp file and swapped in by rename,
//! optionally keeping the previous snapshot under a timestamped name.

mod naming;
mod snapshot;

pub mod error;

pub use error::{Error, Result};
pub use snapshot::{JsonSnapshotStore, StagedSnapshot};
