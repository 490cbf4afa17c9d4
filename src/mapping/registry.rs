use super::entity::EntityMapping;
use crate::core::{DbError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Collects entity mappings before a session factory is built.
#[derive(Debug, Default)]
pub struct MappingRegistry {
    mappings: Vec<EntityMapping>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, mapping: EntityMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Validate every mapping and index them by entity name.
    pub fn build(self) -> Result<Metadata> {
        let mut by_entity: HashMap<String, Arc<EntityMapping>> = HashMap::new();
        let mut tables: HashMap<String, String> = HashMap::new();

        for mapping in self.mappings {
            mapping.validate()?;

            if let Some(owner) = tables.get(mapping.table()) {
                return Err(DbError::MappingConfiguration(format!(
                    "table '{}' is mapped by both '{}' and '{}'",
                    mapping.table(),
                    owner,
                    mapping.entity_name()
                )));
            }
            if by_entity.contains_key(mapping.entity_name()) {
                return Err(DbError::MappingConfiguration(format!(
                    "entity '{}' is registered twice",
                    mapping.entity_name()
                )));
            }

            debug!(entity = mapping.entity_name(), table = mapping.table(), "registered mapping");
            tables.insert(mapping.table().to_string(), mapping.entity_name().to_string());
            by_entity.insert(mapping.entity_name().to_string(), Arc::new(mapping));
        }

        Ok(Metadata { by_entity })
    }
}

/// Validated, immutable mapping metadata shared by all sessions.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    by_entity: HashMap<String, Arc<EntityMapping>>,
}

impl Metadata {
    pub fn mapping(&self, entity_name: &str) -> Result<Arc<EntityMapping>> {
        self.by_entity.get(entity_name).cloned().ok_or_else(|| {
            DbError::MappingConfiguration(format!(
                "no mapping registered for entity '{}'",
                entity_name
            ))
        })
    }

    /// Mappings ordered by table name
    pub fn mappings(&self) -> Vec<Arc<EntityMapping>> {
        let mut all: Vec<_> = self.by_entity.values().cloned().collect();
        all.sort_by(|a, b| a.table().cmp(b.table()));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    fn named(entity: &str, table: &str) -> EntityMapping {
        EntityMapping::new(entity, table).required("name", "name", DataType::Text)
    }

    #[test]
    fn test_build_and_lookup() {
        let metadata = MappingRegistry::new()
            .register(named("Person", "person"))
            .register(named("Band", "band"))
            .build()
            .unwrap();
        assert_eq!(metadata.mapping("Person").unwrap().table(), "person");
        let tables: Vec<_> = metadata.mappings().iter().map(|m| m.table().to_string()).collect();
        assert_eq!(tables, ["band", "person"]);
        assert!(metadata.mapping("Artist").unwrap_err().is_mapping_configuration());
    }

    #[test]
    fn test_same_table_twice() {
        let err = MappingRegistry::new()
            .register(named("Person", "person"))
            .register(named("Customer", "person"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("table 'person' is mapped by both"));
    }

    #[test]
    fn test_same_entity_twice() {
        let err = MappingRegistry::new()
            .register(named("Person", "person"))
            .register(named("Person", "people"))
            .build()
            .unwrap_err();
        assert!(err.is_mapping_configuration());
    }

    #[test]
    fn test_invalid_mapping_fails_build() {
        let bad = named("Person", "person").property("nickname", "name", DataType::Text);
        assert!(MappingRegistry::new().register(bad).build().is_err());
    }
}
