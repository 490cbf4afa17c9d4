// ============================================================================
// Unit-of-Work Change Tracking
// ============================================================================
//
// Writes registered inside a unit of work are recorded as Changes and only
// reach the store when the unit of work commits. Rollback drops them.
//
// ============================================================================

use crate::core::Row;

/// A single write recorded by a unit of work
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Insert a new row into a table
    InsertRow { table: String, row: Row },

    /// Delete the row with the given primary key
    DeleteRow { table: String, id: i64 },
}

impl Change {
    /// Get the table name affected by this change
    pub fn table_name(&self) -> &str {
        match self {
            Change::InsertRow { table, .. } => table,
            Change::DeleteRow { table, .. } => table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    #[test]
    fn test_change_table_name() {
        let insert = Change::InsertRow {
            table: "person".to_string(),
            row: vec![Value::Integer(1)],
        };
        let delete = Change::DeleteRow {
            table: "person".to_string(),
            id: 1,
        };
        assert_eq!(insert.table_name(), "person");
        assert_eq!(delete.table_name(), "person");
    }
}
