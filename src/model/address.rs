use crate::core::{DataType, Result, Value};
use crate::mapping::{Component, ComponentMapping, PropertyValues};
use std::fmt;

/// A postal address. Value type: no identity, compared by content, and
/// stored only as columns of whichever entity embeds it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zipcode: String,
}

impl Address {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        zipcode: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            zipcode: zipcode.into(),
        }
    }
}

impl Component for Address {
    fn component_mapping() -> ComponentMapping {
        ComponentMapping::new("Address")
            .attribute("street", DataType::Text)
            .attribute("city", DataType::Text)
            .attribute("zipcode", DataType::Text)
    }

    fn attribute_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("street", Value::from(self.street.as_str())),
            ("city", Value::from(self.city.as_str())),
            ("zipcode", Value::from(self.zipcode.as_str())),
        ]
    }

    // The columns are nullable; a NULL attribute reads back as "".
    fn from_property(values: &PropertyValues, property: &str) -> Result<Self> {
        let text = |attribute: &str| -> Result<String> {
            Ok(values.component_text(property, attribute)?.unwrap_or_default())
        };
        Ok(Self {
            street: text("street")?,
            city: text("city")?,
            zipcode: text("zipcode")?,
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Address [street={}, city={}, zipcode={}]",
            self.street, self.city, self.zipcode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_structural() {
        let a = Address::new("57 Walnut Street", "Springfield", "80085");
        let b = Address::new("57 Walnut Street", "Springfield", "80085");
        assert_eq!(a, b);
        assert_ne!(a, Address::new("57 Walnut Street", "Shelbyville", "80085"));
    }

    #[test]
    fn test_attribute_values_match_component_shape() {
        let address = Address::new("742 Evergreen Terrace", "Springfield", "80085");
        let names: Vec<_> = address.attribute_values().into_iter().map(|(n, _)| n).collect();
        let declared: Vec<_> = Address::component_mapping()
            .attributes()
            .iter()
            .map(|a| a.name.clone())
            .collect();
        assert_eq!(names, declared);
    }

    #[test]
    fn test_from_property_reads_nulls_as_empty() {
        let mut values = PropertyValues::new();
        values.put("homeAddress.street", "742 Evergreen Terrace");
        let address = Address::from_property(&values, "homeAddress").unwrap();
        assert_eq!(address.street, "742 Evergreen Terrace");
        assert_eq!(address.city, "");
    }

    #[test]
    fn test_display() {
        let address = Address::new("742 Evergreen Terrace", "Springfield", "80085");
        assert_eq!(
            address.to_string(),
            "Address [street=742 Evergreen Terrace, city=Springfield, zipcode=80085]"
        );
    }
}
