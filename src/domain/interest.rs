use serde::Serialize;

use super::fields::{Name, PropertyName};

/// A contact's interest in a property, keyed by the two identity names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interest {
    pub contact: Name,
    pub property: PropertyName,
}

impl Interest {
    pub fn contact_key(&self) -> String {
        self.contact.key()
    }

    pub fn property_key(&self) -> String {
        self.property.key()
    }

    pub fn links(&self, contact_key: &str, property_key: &str) -> bool {
        self.contact_key() == contact_key && self.property_key() == property_key
    }
}
