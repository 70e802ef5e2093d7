//! JSON snapshot files

use super::copy_default_into_place;
use crate::model::EntityKind;
use crate::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Reads and writes whole-collection snapshot files.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    data_dir: PathBuf,
    assets_dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(data_dir: impl Into<PathBuf>, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            assets_dir: assets_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Snapshot file of a root entity kind
    pub fn path_for(&self, kind: EntityKind) -> Result<PathBuf> {
        Ok(self.data_dir.join(file_name(kind)?))
    }

    fn default_path_for(&self, kind: EntityKind) -> Result<PathBuf> {
        Ok(self.assets_dir.join(file_name(kind)?))
    }

    /// Read the records of one kind, copying the bundled default into place
    /// first if there is no snapshot yet. No file at all yields no records.
    pub fn read(&self, kind: EntityKind) -> Result<Vec<serde_json::Value>> {
        let path = self.path_for(kind)?;
        if !copy_default_into_place(&path, &self.default_path_for(kind)?)? {
            debug!("No {} snapshot, starting empty", kind);
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<serde_json::Value>(&content)? {
            serde_json::Value::Array(records) => {
                debug!("Read {} {} records from {}", records.len(), kind, path.display());
                Ok(records)
            }
            other => {
                warn!(
                    "{} is not a JSON array (found {}), ignoring",
                    path.display(),
                    json_type(&other)
                );
                Ok(Vec::new())
            }
        }
    }

    /// Replace the snapshot of one kind with these records.
    pub fn write(&self, kind: EntityKind, records: &[serde_json::Value]) -> Result<PathBuf> {
        let path = self.path_for(kind)?;
        fs::create_dir_all(&self.data_dir)?;

        let mut file = NamedTempFile::new_in(&self.data_dir)?;
        serde_json::to_writer_pretty(&mut file, records)?;
        file.write_all(b"\n")?;
        file.persist(&path).map_err(|e| e.error)?;

        debug!("Wrote {} {} records to {}", records.len(), kind, path.display());
        Ok(path)
    }
}

fn file_name(kind: EntityKind) -> Result<&'static str> {
    kind.cache_file_name().ok_or_else(|| Error::InvalidRecord {
        kind,
        reason: "no snapshot file for this kind".to_string(),
    })
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn cache(dir: &TempDir) -> SnapshotCache {
        SnapshotCache::new(dir.path().join("data"), dir.path().join("assets"))
    }

    #[test]
    fn test_missing_everything_is_empty() {
        let dir = TempDir::new().unwrap();
        let records = cache(&dir).read(EntityKind::Order).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        let records = vec![json!({"nr": 1}), json!({"nr": 2})];

        let path = cache.write(EntityKind::Customer, &records).unwrap();
        assert!(path.ends_with("cacheKunde.json"));
        assert_eq!(cache.read(EntityKind::Customer).unwrap(), records);

        cache.write(EntityKind::Customer, &records[..1]).unwrap();
        assert_eq!(cache.read(EntityKind::Customer).unwrap().len(), 1);
    }

    #[test]
    fn test_default_fallback() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        fs::create_dir_all(cache.assets_dir()).unwrap();
        fs::write(
            cache.assets_dir().join("cacheSchlagwort.json"),
            r#"[{"uuid": "k-1", "text": "eilig"}]"#,
        )
        .unwrap();

        let records = cache.read(EntityKind::Keyword).unwrap();
        assert_eq!(records, vec![json!({"uuid": "k-1", "text": "eilig"})]);
        assert!(cache.path_for(EntityKind::Keyword).unwrap().exists());
    }

    #[test]
    fn test_non_array_is_ignored() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        fs::create_dir_all(cache.data_dir()).unwrap();
        fs::write(cache.path_for(EntityKind::Order).unwrap(), r#"{"nr": 1}"#).unwrap();
        assert!(cache.read(EntityKind::Order).unwrap().is_empty());
    }

    #[test]
    fn test_positions_have_no_file() {
        let dir = TempDir::new().unwrap();
        assert!(cache(&dir).read(EntityKind::Position).is_err());
    }
}
