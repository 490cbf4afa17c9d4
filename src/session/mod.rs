//! Unit of work over the mapped store.
//!
//! ```text
//! NotStarted ──begin──> Active ──commit──> Committed ──┐
//!                         └────rollback──> RolledBack ─┴──close──> Closed
//! ```
//!
//! Writes registered with [`Session::persist`] and [`Session::remove`] stay
//! inside the session until [`Session::commit`] hands them to the store as
//! one atomic batch. Nothing is visible to other sessions before that.

pub mod config;
pub mod factory;

pub use config::{SchemaAction, SessionConfig};
pub use factory::SessionFactory;

use crate::core::{DbError, Result, Row, Value};
use crate::mapping::{Entity, EntityMapping, Metadata};
use crate::storage::StorageEngine;
use crate::transaction::{Change, Transaction, TransactionId, TransactionState};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One unit of work. Obtained from [`SessionFactory::open_session`]; closed
/// explicitly with [`close`](Session::close) or implicitly when dropped.
pub struct Session {
    storage: Arc<dyn StorageEngine>,
    metadata: Arc<Metadata>,
    txn: Transaction,
    show_sql: bool,
}

impl Session {
    pub(crate) fn new(
        id: TransactionId,
        storage: Arc<dyn StorageEngine>,
        metadata: Arc<Metadata>,
        show_sql: bool,
    ) -> Self {
        Self {
            storage,
            metadata,
            txn: Transaction::new(id),
            show_sql,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.txn.id()
    }

    pub fn state(&self) -> TransactionState {
        self.txn.state()
    }

    /// Number of writes waiting for commit
    pub fn pending_changes(&self) -> usize {
        self.txn.change_count()
    }

    /// NotStarted -> Active
    pub fn begin(&mut self) -> Result<()> {
        self.txn.begin()?;
        debug!(txn = %self.txn.id(), "transaction started");
        Ok(())
    }

    /// Register `entity` for insertion and assign its id.
    ///
    /// The row is checked against the table (NOT NULL, types, text length) right away;
    /// it reaches the store on commit. Every failure is reported as
    /// [`DbError::Persistence`] and leaves the entity untouched.
    pub async fn persist<E: Entity>(&mut self, entity: &mut E) -> Result<i64> {
        self.try_persist(entity)
            .await
            .map_err(|e| DbError::persistence(E::ENTITY_NAME, e))
    }

    async fn try_persist<E: Entity>(&mut self, entity: &mut E) -> Result<i64> {
        self.txn.ensure_active("persist")?;
        if let Some(id) = entity.id() {
            return Err(DbError::ExecutionError(format!(
                "{} with id {} is already persistent",
                E::ENTITY_NAME,
                id
            )));
        }

        let mapping = self.metadata.mapping(E::ENTITY_NAME)?;
        let schema = mapping.table_schema()?;

        // Check with a placeholder key so a rejected entity does not use up an id.
        let mut row = mapping.dehydrate(0, &entity.dehydrate())?;
        schema.schema().validate_row(&row)?;

        let id = self.storage.next_id(mapping.table()).await?;
        row[0] = Value::Integer(id);

        self.txn.record_change(Change::InsertRow {
            table: mapping.table().to_string(),
            row,
        })?;
        entity.assign_id(id);
        debug!(txn = %self.txn.id(), entity = E::ENTITY_NAME, id, "registered insert");
        Ok(id)
    }

    /// Register the deletion of `entity`'s row. Embedded components live in
    /// that row and go with it.
    pub async fn remove<E: Entity>(&mut self, entity: &E) -> Result<()> {
        self.try_remove(entity)
            .await
            .map_err(|e| DbError::persistence(E::ENTITY_NAME, e))
    }

    async fn try_remove<E: Entity>(&mut self, entity: &E) -> Result<()> {
        self.txn.ensure_active("remove")?;
        let id = entity.id().ok_or_else(|| {
            DbError::ExecutionError(format!("{} has no id and is not persistent", E::ENTITY_NAME))
        })?;

        let mapping = self.metadata.mapping(E::ENTITY_NAME)?;
        if self.lookup_row(&mapping, id).await?.is_none() {
            return Err(DbError::ExecutionError(format!(
                "{} with id {} not found",
                E::ENTITY_NAME,
                id
            )));
        }

        self.txn.record_change(Change::DeleteRow {
            table: mapping.table().to_string(),
            id,
        })?;
        debug!(txn = %self.txn.id(), entity = E::ENTITY_NAME, id, "registered delete");
        Ok(())
    }

    /// Load an entity by id, including writes registered in this session.
    pub async fn find<E: Entity>(&self, id: i64) -> Result<Option<E>> {
        self.ensure_open()?;
        let mapping = self.metadata.mapping(E::ENTITY_NAME)?;
        match self.lookup_row(&mapping, id).await? {
            Some(row) => {
                let (id, values) = mapping.hydrate(&row)?;
                Ok(Some(E::hydrate(id, &values)?))
            }
            None => Ok(None),
        }
    }

    /// Load every entity of type `E`, ordered by id.
    pub async fn list<E: Entity>(&self) -> Result<Vec<E>> {
        self.ensure_open()?;
        let mapping = self.metadata.mapping(E::ENTITY_NAME)?;

        let mut rows: Vec<Row> = self.storage.scan_table(mapping.table()).await?;
        for change in self.txn.changes() {
            match change {
                Change::InsertRow { table, row } if table == mapping.table() => {
                    rows.push(row.clone());
                }
                Change::DeleteRow { table, id } if table == mapping.table() => {
                    rows.retain(|row| row.first() != Some(&Value::Integer(*id)));
                }
                _ => {}
            }
        }
        rows.sort_by_key(|row| row.first().and_then(Value::as_i64));

        rows.iter()
            .map(|row| {
                let (id, values) = mapping.hydrate(row)?;
                E::hydrate(id, &values)
            })
            .collect()
    }

    /// Active -> Committed. Applies every registered write atomically.
    ///
    /// If the store rejects the batch the error is [`DbError::Commit`],
    /// nothing was written, and the session stays `Active` so the caller
    /// can roll back.
    pub async fn commit(&mut self) -> Result<()> {
        self.txn.ensure_active("commit")?;

        let changes = self.txn.changes().to_vec();
        if self.show_sql {
            for change in &changes {
                info!(txn = %self.txn.id(), ?change, "flush");
            }
        }

        self.storage.apply(&changes).await.map_err(DbError::commit)?;
        self.txn.commit()?;
        debug!(
            txn = %self.txn.id(),
            changes = changes.len(),
            elapsed_ms = self.txn.duration().as_millis() as u64,
            "transaction committed"
        );
        Ok(())
    }

    /// Active -> RolledBack. Registered writes are dropped; ids they
    /// reserved are not reused.
    pub fn rollback(&mut self) -> Result<()> {
        let discarded = self.txn.change_count();
        self.txn.rollback()?;
        debug!(txn = %self.txn.id(), discarded, "transaction rolled back");
        Ok(())
    }

    /// Release the session. Safe to call more than once and from any
    /// state; an active transaction is discarded.
    pub fn close(&mut self) {
        match self.txn.close() {
            Some(TransactionState::Active) => {
                warn!(
                    txn = %self.txn.id(),
                    "session closed with an active transaction, discarding it"
                );
            }
            Some(previous) => {
                debug!(txn = %self.txn.id(), from = %previous, "session closed");
            }
            None => {}
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.txn.state() == TransactionState::Closed {
            return Err(DbError::ExecutionError(format!(
                "Session {} is closed",
                self.txn.id()
            )));
        }
        Ok(())
    }

    async fn lookup_row(&self, mapping: &EntityMapping, id: i64) -> Result<Option<Row>> {
        let key = Value::Integer(id);
        let mut pending: Option<Option<Row>> = None;
        for change in self.txn.changes() {
            match change {
                Change::InsertRow { table, row }
                    if table == mapping.table() && row.first() == Some(&key) =>
                {
                    pending = Some(Some(row.clone()));
                }
                Change::DeleteRow { table, id: deleted }
                    if table == mapping.table() && *deleted == id =>
                {
                    pending = Some(None);
                }
                _ => {}
            }
        }

        match pending {
            Some(row) => Ok(row),
            None => self.storage.get_row(mapping.table(), id).await,
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingRegistry;
    use crate::model::{Address, Person, person_mapping};

    async fn factory() -> SessionFactory {
        SessionFactory::build(
            SessionConfig::new(),
            MappingRegistry::new().register(person_mapping()),
        )
        .await
        .unwrap()
    }

    fn homer() -> Person {
        Person::new(
            "Homer",
            Address::new("742 Evergreen Terrace", "Springfield", "80085"),
            Address::new("57 Walnut Street", "Springfield", "80085"),
        )
    }

    #[tokio::test]
    async fn test_persist_requires_begin() {
        let factory = factory().await;
        let mut session = factory.open_session();
        let mut person = homer();
        let err = session.persist(&mut person).await.unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(person.id(), None);
    }

    #[tokio::test]
    async fn test_find_sees_own_pending_insert() {
        let factory = factory().await;
        let mut session = factory.open_session();
        session.begin().unwrap();
        let mut person = homer();
        let id = session.persist(&mut person).await.unwrap();

        let found: Person = session.find(id).await.unwrap().unwrap();
        assert_eq!(found, person);
        assert_eq!(factory.count::<Person>().await.unwrap(), 0);
        assert_eq!(session.pending_changes(), 1);
    }

    #[tokio::test]
    async fn test_persist_twice_is_rejected() {
        let factory = factory().await;
        let mut session = factory.open_session();
        session.begin().unwrap();
        let mut person = homer();
        session.persist(&mut person).await.unwrap();
        assert!(session.persist(&mut person).await.unwrap_err().is_persistence());
        assert_eq!(session.pending_changes(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_final() {
        let factory = factory().await;
        let mut session = factory.open_session();
        session.begin().unwrap();
        session.close();
        session.close();
        assert_eq!(session.state(), TransactionState::Closed);
        assert!(session.find::<Person>(1).await.is_err());
        assert!(session.begin().is_err());
    }

    #[tokio::test]
    async fn test_list_merges_pending_changes() {
        let factory = factory().await;

        let mut first = homer();
        let mut session = factory.open_session();
        session.begin().unwrap();
        session.persist(&mut first).await.unwrap();
        session.commit().await.unwrap();
        session.close();

        let mut session = factory.open_session();
        session.begin().unwrap();
        let mut second = homer();
        second.set_name("Marge");
        session.persist(&mut second).await.unwrap();
        session.remove(&first).await.unwrap();

        let people: Vec<Person> = session.list().await.unwrap();
        assert_eq!(people, vec![second]);
    }
}
