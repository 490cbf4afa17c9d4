use crate::storage::DurabilityMode;
use std::path::{Path, PathBuf};

/// What the session factory does with mapped tables when it is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaAction {
    /// Create missing tables, check existing ones against the mapping
    #[default]
    Create,
    /// Only check; a missing table is an error
    Validate,
}

/// Session factory configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Snapshot file; `None` keeps everything in memory
    pub data_file: Option<PathBuf>,

    /// How snapshot writes are flushed
    pub durability: DurabilityMode,

    /// Log every row written at commit
    pub show_sql: bool,

    pub schema_action: SchemaAction,
}

impl SessionConfig {
    /// In-memory configuration
    pub fn new() -> Self {
        Self {
            data_file: None,
            durability: DurabilityMode::Sync,
            show_sql: false,
            schema_action: SchemaAction::Create,
        }
    }

    /// Persist committed data to a snapshot file
    pub fn data_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.durability = mode;
        self
    }

    pub fn show_sql(mut self, enabled: bool) -> Self {
        self.show_sql = enabled;
        self
    }

    pub fn schema_action(mut self, action: SchemaAction) -> Self {
        self.schema_action = action;
        self
    }

    /// Connection string logged when the factory starts:
    /// `compomap:mem` or `compomap:file:<path>`
    pub fn to_url(&self) -> String {
        match &self.data_file {
            Some(path) => format!("compomap:file:{}", path.display()),
            None => "compomap:mem".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}
