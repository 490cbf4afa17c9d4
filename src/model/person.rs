use super::address::Address;
use crate::core::{DataType, Result};
use crate::mapping::{Component, Entity, EntityMapping, PropertyValues};
use std::fmt;

pub const PERSON_TABLE: &str = "person";
pub const HOME_ADDRESS: &str = "homeAddress";
pub const BILLING_ADDRESS: &str = "billingAddress";

/// A person with two embedded addresses.
///
/// The id stays `None` until the person is persisted and is never changed
/// afterwards. Both addresses are owned by value, so an address cannot be
/// shared between two people.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Person {
    id: Option<i64>,
    name: Option<String>,
    home_address: Address,
    billing_address: Address,
}

impl Person {
    pub fn new(name: impl Into<String>, home_address: Address, billing_address: Address) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            home_address,
            billing_address,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn home_address(&self) -> &Address {
        &self.home_address
    }

    pub fn set_home_address(&mut self, address: Address) {
        self.home_address = address;
    }

    pub fn billing_address(&self) -> &Address {
        &self.billing_address
    }

    pub fn set_billing_address(&mut self, address: Address) {
        self.billing_address = address;
    }
}

impl Entity for Person {
    const ENTITY_NAME: &'static str = "Person";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn assign_id(&mut self, id: i64) {
        debug_assert!(self.id.is_none(), "person id is assigned once");
        self.id = Some(id);
    }

    fn dehydrate(&self) -> PropertyValues {
        let mut values = PropertyValues::new();
        values
            .put("name", self.name.clone())
            .put_component(HOME_ADDRESS, self.home_address.attribute_values())
            .put_component(BILLING_ADDRESS, self.billing_address.attribute_values());
        values
    }

    fn hydrate(id: i64, values: &PropertyValues) -> Result<Self> {
        Ok(Self {
            id: Some(id),
            name: values.text("name")?,
            home_address: Address::from_property(values, HOME_ADDRESS)?,
            billing_address: Address::from_property(values, BILLING_ADDRESS)?,
        })
    }
}

/// Mapping of [`Person`] onto the `person` table.
///
/// | column | source |
/// |---|---|
/// | `id` | generated primary key |
/// | `name` | `name`, NOT NULL |
/// | `home_street`, `home_city`, `home_zipcode` | `homeAddress` |
/// | `billing_street`, `billing_city`, `billing_zipcode` | `billingAddress` |
pub fn person_mapping() -> EntityMapping {
    EntityMapping::new(Person::ENTITY_NAME, PERSON_TABLE)
        .id("id", "id")
        .required("name", "name", DataType::Text)
        .embedded(
            HOME_ADDRESS,
            Address::component_mapping(),
            [
                ("street", "home_street"),
                ("city", "home_city"),
                ("zipcode", "home_zipcode"),
            ],
        )
        .embedded(
            BILLING_ADDRESS,
            Address::component_mapping(),
            [
                ("street", "billing_street"),
                ("city", "billing_city"),
                ("zipcode", "billing_zipcode"),
            ],
        )
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.map(|id| id.to_string()).unwrap_or_else(|| "null".into());
        write!(
            f,
            "Person [id={}, name={}, homeAddress={}, billingAddress={}]",
            id,
            self.name.as_deref().unwrap_or("null"),
            self.home_address,
            self.billing_address
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    fn homer() -> Person {
        Person::new(
            "Homer",
            Address::new("742 Evergreen Terrace", "Springfield", "80085"),
            Address::new("57 Walnut Street", "Springfield", "80085"),
        )
    }

    #[test]
    fn test_new_person_has_no_id() {
        assert_eq!(homer().id(), None);
        assert_eq!(Person::default().name(), None);
    }

    #[test]
    fn test_row_layout() {
        let row = person_mapping().dehydrate(1, &homer().dehydrate()).unwrap();
        assert_eq!(
            row,
            vec![
                Value::Integer(1),
                Value::from("Homer"),
                Value::from("742 Evergreen Terrace"),
                Value::from("Springfield"),
                Value::from("80085"),
                Value::from("57 Walnut Street"),
                Value::from("Springfield"),
                Value::from("80085"),
            ]
        );
    }

    #[test]
    fn test_billing_city_does_not_touch_home_city() {
        let mapping = person_mapping();
        let mut person = homer();
        person.set_billing_address(Address::new("57 Walnut Street", "Shelbyville", "80085"));
        let row = mapping.dehydrate(1, &person.dehydrate()).unwrap();
        assert_eq!(row[3], Value::from("Springfield"));
        assert_eq!(row[6], Value::from("Shelbyville"));
    }

    #[test]
    fn test_hydrate_restores_person() {
        let mapping = person_mapping();
        let row = mapping.dehydrate(5, &homer().dehydrate()).unwrap();
        let (id, values) = mapping.hydrate(&row).unwrap();
        let person = Person::hydrate(id, &values).unwrap();
        assert_eq!(person.id(), Some(5));
        assert_eq!(person.name(), Some("Homer"));
        assert_eq!(person.home_address(), homer().home_address());
    }

    #[test]
    fn test_display() {
        let mut person = homer();
        person.assign_id(1);
        assert_eq!(
            person.to_string(),
            "Person [id=1, name=Homer, \
             homeAddress=Address [street=742 Evergreen Terrace, city=Springfield, zipcode=80085], \
             billingAddress=Address [street=57 Walnut Street, city=Springfield, zipcode=80085]]"
        );
    }
}
