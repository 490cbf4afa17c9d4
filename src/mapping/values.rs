use crate::core::{DbError, Result, Value};
use std::collections::BTreeMap;

/// Property values of one entity instance, keyed by property path.
///
/// Basic properties use their own name (`name`); attributes of an embedded
/// component are addressed as `<property>.<attribute>`
/// (`homeAddress.street`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyValues {
    values: BTreeMap<String, Value>,
}

pub fn property_path(property: &str, attribute: &str) -> String {
    format!("{}.{}", property, attribute)
}

impl PropertyValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, path: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(path.into(), value.into());
        self
    }

    /// Store every attribute of an embedded component under `property`.
    pub fn put_component<I, V>(&mut self, property: &str, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<Value>,
    {
        for (attribute, value) in attributes {
            self.values.insert(property_path(property, attribute), value.into());
        }
        self
    }

    /// Missing paths read as NULL.
    pub fn get(&self, path: &str) -> &Value {
        self.values.get(path).unwrap_or(&Value::Null)
    }

    pub fn text(&self, path: &str) -> Result<Option<String>> {
        match self.get(path) {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.clone())),
            other => Err(DbError::TypeMismatch(format!(
                "Property '{}' expects TEXT, got {}",
                path,
                other.type_name()
            ))),
        }
    }

    pub fn component_text(&self, property: &str, attribute: &str) -> Result<Option<String>> {
        self.text(&property_path(property, attribute))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_paths() {
        let mut values = PropertyValues::new();
        values.put("name", "Homer").put_component(
            "homeAddress",
            [("street", "742 Evergreen Terrace"), ("city", "Springfield")],
        );
        assert_eq!(values.len(), 3);
        assert_eq!(
            values.component_text("homeAddress", "city").unwrap().as_deref(),
            Some("Springfield")
        );
        assert_eq!(values.get("homeAddress.zipcode"), &Value::Null);
    }

    #[test]
    fn test_text_rejects_integer() {
        let mut values = PropertyValues::new();
        values.put("name", 5i64);
        assert!(values.text("name").is_err());
    }
}
