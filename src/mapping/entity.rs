use super::component::ComponentMapping;
use super::values::{PropertyValues, property_path};
use crate::core::{Column, DataType, DbError, Result, Row, Value};
use crate::storage::TableSchema;
use std::collections::{BTreeMap, HashMap, HashSet};

/// How primary keys are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdGeneration {
    /// Taken from the table's sequence when the entity is persisted.
    /// Values are increasing and never handed out twice.
    #[default]
    Sequence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMapping {
    pub property: String,
    pub column: String,
    pub generation: IdGeneration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicProperty {
    pub property: String,
    pub column: String,
    pub data_type: DataType,
    pub nullable: bool,
}

/// One embedding of a value component inside the entity's row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedProperty {
    pub property: String,
    pub component: ComponentMapping,
    /// attribute name -> column name
    pub overrides: BTreeMap<String, String>,
}

impl EmbeddedProperty {
    /// Column an attribute lands in; the attribute's own name unless overridden.
    pub fn column_for<'a>(&'a self, attribute: &'a str) -> &'a str {
        self.overrides
            .get(attribute)
            .map(String::as_str)
            .unwrap_or(attribute)
    }
}

/// A resolved column: which property path feeds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    pub path: String,
    pub column: Column,
}

/// Declarative mapping of one entity onto one table.
///
/// ```
/// use compomap::core::DataType;
/// use compomap::mapping::{ComponentMapping, EntityMapping};
///
/// let address = ComponentMapping::new("Address")
///     .attribute("street", DataType::Text)
///     .attribute("city", DataType::Text);
///
/// let mapping = EntityMapping::new("Customer", "customer")
///     .id("id", "id")
///     .required("name", "name", DataType::Text)
///     .embedded("address", address, [("street", "addr_street"), ("city", "addr_city")]);
///
/// assert!(mapping.validate().is_ok());
/// assert_eq!(mapping.columns().unwrap().len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMapping {
    entity_name: String,
    table: String,
    id: IdMapping,
    properties: Vec<BasicProperty>,
    embedded: Vec<EmbeddedProperty>,
}

impl EntityMapping {
    pub fn new(entity_name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            table: table.into(),
            id: IdMapping {
                property: "id".to_string(),
                column: "id".to_string(),
                generation: IdGeneration::Sequence,
            },
            properties: Vec::new(),
            embedded: Vec::new(),
        }
    }

    pub fn id(mut self, property: impl Into<String>, column: impl Into<String>) -> Self {
        self.id.property = property.into();
        self.id.column = column.into();
        self
    }

    pub fn id_generation(mut self, generation: IdGeneration) -> Self {
        self.id.generation = generation;
        self
    }

    /// Map a nullable basic property.
    pub fn property(
        mut self,
        property: impl Into<String>,
        column: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        self.properties.push(BasicProperty {
            property: property.into(),
            column: column.into(),
            data_type,
            nullable: true,
        });
        self
    }

    /// Map a NOT NULL basic property.
    pub fn required(
        mut self,
        property: impl Into<String>,
        column: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        self.properties.push(BasicProperty {
            property: property.into(),
            column: column.into(),
            data_type,
            nullable: false,
        });
        self
    }

    /// Embed a value component under `property`, with per-attribute column
    /// overrides given as `(attribute, column)` pairs.
    pub fn embedded<I, A, C>(
        mut self,
        property: impl Into<String>,
        component: ComponentMapping,
        overrides: I,
    ) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: Into<String>,
        C: Into<String>,
    {
        self.embedded.push(EmbeddedProperty {
            property: property.into(),
            component,
            overrides: overrides
                .into_iter()
                .map(|(a, c)| (a.into(), c.into()))
                .collect(),
        });
        self
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_mapping(&self) -> &IdMapping {
        &self.id
    }

    pub fn properties(&self) -> &[BasicProperty] {
        &self.properties
    }

    pub fn embeddings(&self) -> &[EmbeddedProperty] {
        &self.embedded
    }

    /// Check the declaration: names present, overrides refer to real
    /// attributes, and no two properties share a column.
    pub fn validate(&self) -> Result<()> {
        self.columns().map(|_| ())
    }

    /// Resolve every column in row order: id, basic properties, then each
    /// embedding's attributes in component order.
    pub fn columns(&self) -> Result<Vec<ColumnBinding>> {
        let fail = |msg: String| -> Result<Vec<ColumnBinding>> {
            Err(DbError::MappingConfiguration(format!(
                "{} (entity '{}'): {}",
                self.table, self.entity_name, msg
            )))
        };

        if self.entity_name.trim().is_empty() {
            return fail("entity name is empty".into());
        }
        if self.table.trim().is_empty() {
            return fail("table name is empty".into());
        }

        let mut bindings = Vec::with_capacity(1 + self.properties.len());
        bindings.push(ColumnBinding {
            path: self.id.property.clone(),
            column: Column::new(self.id.column.clone(), DataType::Integer).primary_key(),
        });

        for prop in &self.properties {
            let mut column = Column::new(prop.column.clone(), prop.data_type);
            if !prop.nullable {
                column = column.not_null();
            }
            bindings.push(ColumnBinding {
                path: prop.property.clone(),
                column,
            });
        }

        for embedding in &self.embedded {
            if embedding.component.attributes().is_empty() {
                return fail(format!(
                    "component '{}' embedded as '{}' has no attributes",
                    embedding.component.name(),
                    embedding.property
                ));
            }
            if let Some(unknown) = embedding
                .overrides
                .keys()
                .find(|attr| !embedding.component.has_attribute(attr))
            {
                return fail(format!(
                    "override for unknown attribute '{}' of component '{}' in '{}'",
                    unknown,
                    embedding.component.name(),
                    embedding.property
                ));
            }
            for attribute in embedding.component.attributes() {
                bindings.push(ColumnBinding {
                    path: property_path(&embedding.property, &attribute.name),
                    column: Column::new(embedding.column_for(&attribute.name), attribute.data_type),
                });
            }
        }

        let mut seen_columns: HashMap<&str, &str> = HashMap::new();
        let mut seen_paths: HashSet<&str> = HashSet::new();
        for binding in &bindings {
            if binding.column.name.trim().is_empty() {
                return fail(format!("property '{}' has an empty column name", binding.path));
            }
            if !seen_paths.insert(&binding.path) {
                return fail(format!("property '{}' is mapped twice", binding.path));
            }
            if let Some(previous) = seen_columns.insert(&binding.column.name, &binding.path) {
                return fail(format!(
                    "column '{}' is used by both '{}' and '{}'",
                    binding.column.name, previous, binding.path
                ));
            }
        }

        Ok(bindings)
    }

    pub fn table_schema(&self) -> Result<TableSchema> {
        let columns = self.columns()?.into_iter().map(|b| b.column).collect();
        Ok(TableSchema::new(self.table.clone(), columns))
    }

    /// Build a row for `values` with `id` in the primary-key column.
    /// Properties missing from `values` become NULL.
    pub fn dehydrate(&self, id: i64, values: &PropertyValues) -> Result<Row> {
        let bindings = self.columns()?;
        let mut row = Vec::with_capacity(bindings.len());
        for (idx, binding) in bindings.iter().enumerate() {
            if idx == 0 {
                row.push(Value::Integer(id));
            } else {
                row.push(values.get(&binding.path).clone());
            }
        }
        Ok(row)
    }

    /// Split a stored row back into its id and property values.
    pub fn hydrate(&self, row: &Row) -> Result<(i64, PropertyValues)> {
        let bindings = self.columns()?;
        if row.len() != bindings.len() {
            return Err(DbError::ExecutionError(format!(
                "Row of '{}' has {} columns, mapping expects {}",
                self.table,
                row.len(),
                bindings.len()
            )));
        }

        let id = row[0].as_i64().ok_or_else(|| {
            DbError::TypeMismatch(format!(
                "Primary key of '{}' must be INTEGER, got {}",
                self.table,
                row[0].type_name()
            ))
        })?;

        let mut values = PropertyValues::new();
        for (binding, value) in bindings.iter().zip(row.iter()).skip(1) {
            values.put(binding.path.clone(), value.clone());
        }
        Ok((id, values))
    }

    /// Render the mapped table as a `CREATE TABLE` statement.
    pub fn create_table_sql(&self) -> Result<String> {
        let bindings = self.columns()?;
        let mut sql = format!("CREATE TABLE {} (\n", self.table);
        for binding in &bindings {
            let column = &binding.column;
            let null = if column.nullable { "" } else { " NOT NULL" };
            sql.push_str(&format!("    {} {}{},\n", column.name, column.data_type, null));
        }
        sql.push_str(&format!("    PRIMARY KEY ({})\n)", self.id.column));
        Ok(sql)
    }
}
