// ============================================================================
// compomap Library
// ============================================================================
//
// Maps entities and their embedded value components onto single rows of a
// transactional in-memory table store.
//
// ============================================================================

//! # Examples
//!
//! ```
//! use compomap::{Address, MappingRegistry, Person, SessionConfig, SessionFactory, person_mapping};
//!
//! # #[tokio::main]
//! # async fn main() -> compomap::Result<()> {
//! let factory = SessionFactory::build(
//!     SessionConfig::new(),
//!     MappingRegistry::new().register(person_mapping()),
//! )
//! .await?;
//!
//! let mut person = Person::new(
//!     "Homer",
//!     Address::new("742 Evergreen Terrace", "Springfield", "80085"),
//!     Address::new("57 Walnut Street", "Springfield", "80085"),
//! );
//!
//! let mut session = factory.open_session();
//! session.begin()?;
//! let id = session.persist(&mut person).await?;
//! session.commit().await?;
//! session.close();
//!
//! assert_eq!(person.id(), Some(id));
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod driver;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod session;
pub mod storage;
pub mod transaction;

// Re-export main types for convenience
pub use core::{DbError, Result, Value};
pub use mapping::{Component, ComponentMapping, Entity, EntityMapping, MappingRegistry};
pub use model::{Address, Person, person_mapping};
pub use session::{SchemaAction, Session, SessionConfig, SessionFactory};
pub use storage::{DurabilityMode, InMemoryStorage, StorageEngine};
pub use transaction::TransactionState;
