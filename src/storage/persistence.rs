//! Snapshot durability for the in-memory store.
//!
//! After every successful commit the full set of tables (rows and id
//! sequences) is written as one JSON document. The write goes to a temporary
//! file in the same directory which is then renamed over the target, so a
//! reader never observes a half-written snapshot.

use crate::core::{DbError, Result};
use crate::storage::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

// ============================================================================
// Database Snapshot
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: u32,
    pub tables: BTreeMap<String, Table>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: u64,
    pub row_count: usize,
    pub table_count: usize,
}

impl DatabaseSnapshot {
    pub fn new(tables: BTreeMap<String, Table>) -> Self {
        let row_count = tables.values().map(|t| t.row_count()).sum();
        let table_count = tables.len();
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            version: SNAPSHOT_FORMAT_VERSION,
            tables,
            metadata: SnapshotMetadata { created_at, row_count, table_count },
        }
    }
}

// ============================================================================
// Durability Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DurabilityMode {
    /// fsync the snapshot before it replaces the previous one
    #[default]
    Sync,
    /// Leave flushing to the OS
    Buffered,
}

// ============================================================================
// Snapshot Manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
    durability_mode: DurabilityMode,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P, durability_mode: DurabilityMode) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
            durability_mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn save(&self, snapshot: &DatabaseSnapshot) -> Result<()> {
        let parent = match self.snapshot_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .map_err(|e| DbError::IoError(format!("Failed to create snapshot directory: {}", e)))?;

        let temp = NamedTempFile::new_in(&parent)
            .map_err(|e| DbError::IoError(format!("Failed to create temp file: {}", e)))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
            writer
                .flush()
                .map_err(|e| DbError::IoError(format!("Failed to flush snapshot: {}", e)))?;
        }
        if self.durability_mode == DurabilityMode::Sync {
            temp.as_file()
                .sync_all()
                .map_err(|e| DbError::IoError(format!("Failed to sync snapshot: {}", e)))?;
        }
        temp.persist(&self.snapshot_path)
            .map_err(|e| DbError::IoError(format!("Failed to replace snapshot: {}", e)))?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<DatabaseSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.snapshot_path)
            .map_err(|e| DbError::IoError(format!("Failed to read snapshot: {}", e)))?;
        let snapshot: DatabaseSnapshot = serde_json::from_slice(&data)?;
        if snapshot.version != SNAPSHOT_FORMAT_VERSION {
            return Err(DbError::Serialization(format!(
                "Unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_FORMAT_VERSION
            )));
        }
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DataType, Value};
    use crate::storage::table::TableSchema;
    use tempfile::TempDir;

    fn person_table() -> Table {
        Table::new(TableSchema::new(
            "person",
            vec![
                Column::new("id", DataType::Integer).primary_key(),
                Column::new("name", DataType::Text).not_null(),
            ],
        ))
    }

    #[test]
    fn test_snapshot_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SnapshotManager::new(temp_dir.path().join("db.json"), DurabilityMode::Sync);

        let mut table = person_table();
        let id = table.reserve_id();
        table.insert(vec![Value::Integer(id), Value::from("Homer")]).unwrap();

        let mut tables = BTreeMap::new();
        tables.insert("person".to_string(), table);
        manager.save(&DatabaseSnapshot::new(tables)).unwrap();
        assert!(manager.path().exists());

        let loaded = manager.load().unwrap().unwrap();
        assert_eq!(loaded.metadata.table_count, 1);
        assert_eq!(loaded.metadata.row_count, 1);
        let mut person = loaded.tables.get("person").cloned().unwrap();
        assert_eq!(person.get(id).unwrap()[1], Value::from("Homer"));
        assert_eq!(person.reserve_id(), id + 1);
    }

    #[test]
    fn test_load_missing_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let manager =
            SnapshotManager::new(temp_dir.path().join("none.json"), DurabilityMode::Buffered);
        assert!(manager.load().unwrap().is_none());
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        let manager = SnapshotManager::new(&path, DurabilityMode::Sync);
        let mut snapshot = DatabaseSnapshot::new(BTreeMap::new());
        snapshot.version = 99;
        manager.save(&snapshot).unwrap();
        assert!(matches!(manager.load().unwrap_err(), DbError::Serialization(_)));
    }
}
