//! Cache Codec - on-disk forms of the entity collections
//!
//! Two backends:
//! - JSON snapshots, one file per root entity kind, Cache-view records
//! - SQLite, customers only, imported in chunked transactions
//!
//! Both fall back to a bundled default copied from the assets directory
//! when the data file does not exist yet.

pub mod schema;
pub mod snapshot;
pub mod sqlite;

pub use snapshot::SnapshotCache;
pub use sqlite::{BulkStep, ImportReport, PragmaModes, SqlCache};

use crate::Result;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Copy `default` to `target` unless `target` already exists.
/// Returns whether `target` exists afterwards.
pub(crate) fn copy_default_into_place(target: &Path, default: &Path) -> Result<bool> {
    if target.exists() {
        return Ok(true);
    }
    if !default.exists() {
        debug!("No cache at {} and no default at {}", target.display(), default.display());
        return Ok(false);
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(default, target)?;
    info!("Copied default {} to {}", default.display(), target.display());
    Ok(true)
}
