use super::{DataType, DbError, MAX_TEXT_LENGTH, Result, Value};
use serde::{Deserialize, Serialize};

pub type Row = Vec<Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub primary_key: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            if !self.nullable {
                return Err(DbError::ConstraintViolation(format!(
                    "Column '{}' cannot be NULL",
                    self.name
                )));
            }
            return Ok(());
        }

        if !self.data_type.is_compatible(value) {
            return Err(DbError::TypeMismatch(format!(
                "Column '{}' expects type {}, got {}",
                self.name,
                self.data_type,
                value.type_name()
            )));
        }

        if let Value::Text(text) = value
            && text.chars().count() > MAX_TEXT_LENGTH
        {
            return Err(DbError::ConstraintViolation(format!(
                "Column '{}' holds at most {} characters, got {}",
                self.name,
                MAX_TEXT_LENGTH,
                text.chars().count()
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn primary_key_index(&self) -> Option<usize> {
        self.columns.iter().position(|col| col.primary_key)
    }

    /// Checks arity, NOT NULL and column types of a full row.
    pub fn validate_row(&self, row: &Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(DbError::ExecutionError(format!(
                "Expected {} columns, got {}",
                self.columns.len(),
                row.len()
            )));
        }
        for (column, value) in self.columns.iter().zip(row.iter()) {
            column.validate(value)?;
        }
        Ok(())
    }
}
