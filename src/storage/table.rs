use crate::core::{Column, DbError, Result, Row, Schema, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rows of one table keyed by primary key, plus the table's id sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    schema: TableSchema,
    rows: BTreeMap<i64, Row>,
    /// Next value handed out by the id sequence. Never decremented.
    next_id: i64,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Reserve the next id. Reserved ids are never handed out again,
    /// whether or not a row with that id is ever committed.
    pub fn reserve_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, row: Row) -> Result<i64> {
        self.schema.schema().validate_row(&row)?;
        let id = self.primary_key_of(&row)?;

        if self.rows.contains_key(&id) {
            return Err(DbError::ConstraintViolation(format!(
                "Unique constraint violation: table '{}' already contains id {}",
                self.schema.name, id
            )));
        }

        self.rows.insert(id, row);
        // Keeps the sequence ahead of ids that were written explicitly.
        if id >= self.next_id {
            self.next_id = id + 1;
        }
        Ok(id)
    }

    pub fn delete(&mut self, id: i64) -> bool {
        self.rows.remove(&id).is_some()
    }

    pub fn get(&self, id: i64) -> Option<&Row> {
        self.rows.get(&id)
    }

    pub fn scan(&self) -> Vec<Row> {
        self.rows.values().cloned().collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn primary_key_of(&self, row: &Row) -> Result<i64> {
        let idx = self.schema.schema().primary_key_index().ok_or_else(|| {
            DbError::ExecutionError(format!("Table '{}' has no primary key", self.schema.name))
        })?;

        match &row[idx] {
            Value::Integer(id) => Ok(*id),
            other => Err(DbError::TypeMismatch(format!(
                "Primary key of '{}' must be INTEGER, got {}",
                self.schema.name,
                other.type_name()
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    schema: Schema,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            schema: Schema::new(columns),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}
