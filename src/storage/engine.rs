use super::table::TableSchema;
use crate::core::{Result, Row};
use crate::transaction::Change;
use async_trait::async_trait;

/// Storage engine trait - the store a unit of work writes through.
///
/// `apply` must be all-or-nothing: either every change becomes visible or
/// none does.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Create a new table with the given schema
    async fn create_table(&self, schema: TableSchema) -> Result<()>;

    /// Get the schema for a table
    async fn get_schema(&self, table: &str) -> Result<TableSchema>;

    /// Check if a table exists
    async fn table_exists(&self, name: &str) -> bool;

    /// List all table names
    async fn list_tables(&self) -> Vec<String>;

    /// Reserve the next value of the table's id sequence
    async fn next_id(&self, table: &str) -> Result<i64>;

    /// Fetch a committed row by primary key
    async fn get_row(&self, table: &str, id: i64) -> Result<Option<Row>>;

    /// Scan all committed rows in a table
    async fn scan_table(&self, table: &str) -> Result<Vec<Row>>;

    /// Get table row count
    async fn row_count(&self, table: &str) -> Result<usize>;

    /// Atomically apply the changes of one unit of work
    async fn apply(&self, changes: &[Change]) -> Result<()>;
}
