use std::collections::BTreeSet;

use serde::Serialize;

use super::fields::{Address, Email, Listing, Name, Phone, Tag};

/// A validated contact. Built by the contact codec or from parsed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub name: Name,
    pub phone: Phone,
    pub email: Email,
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<Listing>,
    pub tags: BTreeSet<Tag>,
}

impl Contact {
    pub fn key(&self) -> String {
        self.name.key()
    }

    pub fn tag_list(&self) -> Vec<&str> {
        self.tags.iter().map(Tag::as_str).collect()
    }
}
