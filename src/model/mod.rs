//! The `Person` aggregate and its `Address` value component.

pub mod address;
pub mod person;

pub use address::Address;
pub use person::{BILLING_ADDRESS, HOME_ADDRESS, PERSON_TABLE, Person, person_mapping};
