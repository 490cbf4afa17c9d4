//! Declarative entity and value-component mapping.
//!
//! An [`EntityMapping`] ties one entity type to one table. Value components
//! ([`ComponentMapping`]) have no table of their own; each embedding places
//! the component's attributes into the owner's row, with per-embedding
//! column overrides so the same shape can appear more than once.

pub mod component;
pub mod entity;
pub mod registry;
pub mod values;

pub use component::{Attribute, ComponentMapping};
pub use entity::{
    BasicProperty, ColumnBinding, EmbeddedProperty, EntityMapping, IdGeneration, IdMapping,
};
pub use registry::{MappingRegistry, Metadata};
pub use values::PropertyValues;

use crate::core::Result;

/// A type with its own identity and its own row.
///
/// Entities only convert to and from property values; which column each
/// property lands in is decided by the [`EntityMapping`] registered under
/// [`Entity::ENTITY_NAME`].
pub trait Entity: Sized + Send + Sync {
    const ENTITY_NAME: &'static str;

    fn id(&self) -> Option<i64>;

    /// Called once, when the entity is first persisted.
    fn assign_id(&mut self, id: i64);

    fn dehydrate(&self) -> PropertyValues;

    fn hydrate(id: i64, values: &PropertyValues) -> Result<Self>;
}

/// A value type stored only as attributes of an owning entity.
pub trait Component: Sized {
    fn component_mapping() -> ComponentMapping;

    /// `(attribute, value)` pairs in declaration order
    fn attribute_values(&self) -> Vec<(&'static str, crate::core::Value)>;

    /// Rebuild from the attributes stored under `property`.
    fn from_property(values: &PropertyValues, property: &str) -> Result<Self>;
}
