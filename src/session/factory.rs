use super::Session;
use super::config::{SchemaAction, SessionConfig};
use crate::core::{DbError, Result};
use crate::mapping::{Entity, MappingRegistry, Metadata};
use crate::storage::{InMemoryStorage, StorageEngine};
use crate::transaction::TransactionId;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Builds sessions over one store and one set of validated mappings.
///
/// Constructed explicitly and passed by reference; there is no process-wide
/// factory.
pub struct SessionFactory {
    storage: Arc<dyn StorageEngine>,
    metadata: Arc<Metadata>,
    config: SessionConfig,
    next_txn_id: AtomicU64,
}

impl SessionFactory {
    /// Validate the mappings, open the store described by `config` and make
    /// sure every mapped table exists with the mapped layout.
    pub async fn build(config: SessionConfig, registry: MappingRegistry) -> Result<Self> {
        let metadata = registry.build()?;
        let storage: Arc<dyn StorageEngine> = match &config.data_file {
            Some(path) => Arc::new(InMemoryStorage::open(path, config.durability)?),
            None => Arc::new(InMemoryStorage::new()),
        };
        Self::with_metadata(config, metadata, storage).await
    }

    /// Same as [`build`](Self::build) over a caller-supplied store.
    pub async fn with_storage(
        config: SessionConfig,
        registry: MappingRegistry,
        storage: Arc<dyn StorageEngine>,
    ) -> Result<Self> {
        let metadata = registry.build()?;
        Self::with_metadata(config, metadata, storage).await
    }

    async fn with_metadata(
        config: SessionConfig,
        metadata: Metadata,
        storage: Arc<dyn StorageEngine>,
    ) -> Result<Self> {
        let factory = Self {
            storage,
            metadata: Arc::new(metadata),
            config,
            next_txn_id: AtomicU64::new(1),
        };
        factory.prepare_schema().await?;
        info!(url = %factory.config.to_url(), "session factory ready");
        Ok(factory)
    }

    async fn prepare_schema(&self) -> Result<()> {
        for mapping in self.metadata.mappings() {
            let expected = mapping.table_schema()?;
            if self.storage.table_exists(mapping.table()).await {
                let actual = self.storage.get_schema(mapping.table()).await?;
                if actual != expected {
                    return Err(DbError::MappingConfiguration(format!(
                        "table '{}' exists with a layout that does not match entity '{}'",
                        mapping.table(),
                        mapping.entity_name()
                    )));
                }
                debug!(table = mapping.table(), "validated existing table");
                continue;
            }

            match self.config.schema_action {
                SchemaAction::Validate => {
                    return Err(DbError::MappingConfiguration(format!(
                        "table '{}' for entity '{}' does not exist",
                        mapping.table(),
                        mapping.entity_name()
                    )));
                }
                SchemaAction::Create => {
                    if self.config.show_sql {
                        info!(ddl = %mapping.create_table_sql()?, "creating table");
                    }
                    self.storage.create_table(expected).await?;
                    debug!(table = mapping.table(), "created table");
                }
            }
        }
        Ok(())
    }

    /// Open a new unit of work. It starts in `NotStarted`.
    pub fn open_session(&self) -> Session {
        let id = TransactionId(self.next_txn_id.fetch_add(1, Ordering::SeqCst));
        debug!(txn = %id, "opening session");
        Session::new(
            id,
            Arc::clone(&self.storage),
            Arc::clone(&self.metadata),
            self.config.show_sql,
        )
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn storage(&self) -> &Arc<dyn StorageEngine> {
        &self.storage
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Committed row count of the table mapped for `E`
    pub async fn count<E: Entity>(&self) -> Result<usize> {
        let mapping = self.metadata.mapping(E::ENTITY_NAME)?;
        self.storage.row_count(mapping.table()).await
    }

    /// `CREATE TABLE` statements for every mapped table
    pub fn schema_sql(&self) -> Result<Vec<String>> {
        self.metadata
            .mappings()
            .iter()
            .map(|mapping| mapping.create_table_sql())
            .collect()
    }
}
