use super::engine::StorageEngine;
use super::persistence::{DatabaseSnapshot, DurabilityMode, SnapshotManager};
use super::{Table, TableSchema};
use crate::core::{DbError, Result, Row};
use crate::transaction::Change;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

pub struct InMemoryStorage {
    /// Tables with individual locks
    tables: RwLock<HashMap<String, Arc<RwLock<Table>>>>,
    /// Written after every successful apply and id reservation when configured
    snapshot: Option<SnapshotManager>,
    /// Held by whoever writes the snapshot; always taken before any table lock
    snapshot_lock: Mutex<()>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            snapshot: None,
            snapshot_lock: Mutex::new(()),
        }
    }

    /// Open a snapshot-backed store, restoring the tables found in `path`.
    pub fn open<P: AsRef<Path>>(path: P, durability_mode: DurabilityMode) -> Result<Self> {
        let manager = SnapshotManager::new(path, durability_mode);
        let mut tables = HashMap::new();
        if let Some(snapshot) = manager.load()? {
            debug!(
                path = %manager.path().display(),
                tables = snapshot.metadata.table_count,
                rows = snapshot.metadata.row_count,
                "restored snapshot"
            );
            for (name, table) in snapshot.tables {
                tables.insert(name, Arc::new(RwLock::new(table)));
            }
        }
        Ok(Self {
            tables: RwLock::new(tables),
            snapshot: Some(manager),
            snapshot_lock: Mutex::new(()),
        })
    }

    async fn get_table(&self, name: &str) -> Result<Arc<RwLock<Table>>> {
        self.tables
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    /// Caller must hold `snapshot_lock`. Tables in `staged` are taken from
    /// there and must be the ones the caller has write-locked.
    async fn write_snapshot(
        &self,
        manager: &SnapshotManager,
        staged: &BTreeMap<String, Table>,
    ) -> Result<()> {
        let handles: Vec<(String, Arc<RwLock<Table>>)> = self
            .tables
            .read()
            .await
            .iter()
            .map(|(name, handle)| (name.clone(), handle.clone()))
            .collect();

        let mut all = BTreeMap::new();
        for (name, handle) in handles {
            let table = match staged.get(&name) {
                Some(table) => table.clone(),
                None => handle.read().await.clone(),
            };
            all.insert(name, table);
        }
        manager.save(&DatabaseSnapshot::new(all))
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageEngine for InMemoryStorage {
    async fn create_table(&self, schema: TableSchema) -> Result<()> {
        let mut tables = self.tables.write().await;
        let name = schema.name().to_string();
        if tables.contains_key(&name) {
            return Err(DbError::TableExists(name));
        }
        tables.insert(name, Arc::new(RwLock::new(Table::new(schema))));
        Ok(())
    }

    async fn get_schema(&self, table: &str) -> Result<TableSchema> {
        let handle = self.get_table(table).await?;
        let table = handle.read().await;
        Ok(table.schema().clone())
    }

    async fn table_exists(&self, name: &str) -> bool {
        self.tables.read().await.contains_key(name)
    }

    async fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    async fn next_id(&self, table: &str) -> Result<i64> {
        let handle = self.get_table(table).await?;
        let id = handle.write().await.reserve_id();

        // The reservation outlives a rollback or a restart.
        if let Some(manager) = &self.snapshot {
            let _snapshot = self.snapshot_lock.lock().await;
            self.write_snapshot(manager, &BTreeMap::new()).await?;
        }
        Ok(id)
    }

    async fn get_row(&self, table: &str, id: i64) -> Result<Option<Row>> {
        let handle = self.get_table(table).await?;
        let table = handle.read().await;
        Ok(table.get(id).cloned())
    }

    async fn scan_table(&self, table: &str) -> Result<Vec<Row>> {
        let handle = self.get_table(table).await?;
        let table = handle.read().await;
        Ok(table.scan())
    }

    async fn row_count(&self, table: &str) -> Result<usize> {
        let handle = self.get_table(table).await?;
        let table = handle.read().await;
        Ok(table.row_count())
    }

    async fn apply(&self, changes: &[Change]) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        // Lock every touched table in name order, stage the changes on
        // copies and swap them in only once all of them succeeded.
        let mut names: Vec<&str> = changes.iter().map(Change::table_name).collect();
        names.sort_unstable();
        names.dedup();

        let _snapshot = self.snapshot_lock.lock().await;

        let mut handles = Vec::with_capacity(names.len());
        for name in &names {
            handles.push(self.get_table(name).await?);
        }
        let mut guards = Vec::with_capacity(handles.len());
        for handle in &handles {
            guards.push(handle.write().await);
        }

        let mut staged: BTreeMap<String, Table> = names
            .iter()
            .zip(guards.iter())
            .map(|(name, guard)| (name.to_string(), (**guard).clone()))
            .collect();

        for change in changes {
            let table = staged
                .get_mut(change.table_name())
                .ok_or_else(|| DbError::TableNotFound(change.table_name().to_string()))?;
            match change {
                Change::InsertRow { row, .. } => {
                    table.insert(row.clone())?;
                }
                Change::DeleteRow { table: name, id } => {
                    if !table.delete(*id) {
                        return Err(DbError::ExecutionError(format!(
                            "Row {} not found in table '{}'",
                            id, name
                        )));
                    }
                }
            }
        }

        if let Some(manager) = &self.snapshot {
            self.write_snapshot(manager, &staged).await?;
        }

        for (name, guard) in names.iter().zip(guards.iter_mut()) {
            if let Some(table) = staged.remove(*name) {
                **guard = table;
            }
        }
        debug!(changes = changes.len(), tables = names.len(), "applied changes");
        Ok(())
    }
}
