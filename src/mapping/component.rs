use crate::core::DataType;

/// One attribute of a value component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
}

/// The shape of a value type: a named list of attributes and nothing else.
///
/// A component has no identity and no table of its own. Where its
/// attributes land is decided by each embedding (see
/// [`EntityMapping::embedded`](super::EntityMapping::embedded)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentMapping {
    name: String,
    attributes: Vec<Attribute>,
}

impl ComponentMapping {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            data_type,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }
}
