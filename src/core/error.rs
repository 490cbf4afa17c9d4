use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Invalid mapping declaration, detected when the registry is built.
    #[error("Mapping configuration error: {0}")]
    MappingConfiguration(String),

    /// A write could not be registered in the unit of work.
    #[error("Could not persist {entity}: {source}")]
    Persistence {
        entity: String,
        #[source]
        source: Box<DbError>,
    },

    /// The store rejected the unit of work at flush time.
    #[error("Commit failed: {source}")]
    Commit {
        #[source]
        source: Box<DbError>,
    },

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DbError {
    pub fn persistence(entity: impl Into<String>, source: DbError) -> Self {
        Self::Persistence {
            entity: entity.into(),
            source: Box::new(source),
        }
    }

    pub fn commit(source: DbError) -> Self {
        Self::Commit {
            source: Box::new(source),
        }
    }

    pub fn is_mapping_configuration(&self) -> bool {
        matches!(self, Self::MappingConfiguration(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    pub fn is_commit(&self) -> bool {
        matches!(self, Self::Commit { .. })
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
