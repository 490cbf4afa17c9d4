pub mod engine;
pub mod memory;
pub mod persistence;
pub mod table;

pub use engine::StorageEngine;
pub use memory::InMemoryStorage;
pub use persistence::DurabilityMode;
pub use table::{Table, TableSchema};
