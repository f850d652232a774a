use serde::Serialize;

use super::fields::{Address, Price, PropertyName};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub property_name: PropertyName,
    pub address: Address,
    pub price: Price,
}

impl Property {
    pub fn key(&self) -> String {
        self.property_name.key()
    }
}
