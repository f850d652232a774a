use std::collections::BTreeSet;

use serde_json::Value;

use crate::domain::fields::{
    Address, Email, FieldError, Listing, Name, Phone, Price, PropertyName, Tag,
};
use crate::domain::{Contact, Interest, Property};

use super::{FieldValue, FieldViolation, RawRecord, RecordKind};

/// Converts one kind of raw record to and from its domain record.
///
/// `validate` checks every declared field and reports all violations at
/// once; a domain record only exists when the list is empty.
pub trait RecordCodec {
    type Record;

    const KIND: RecordKind;
    const FIELDS: &'static [&'static str];

    fn validate(raw: &RawRecord) -> Result<Self::Record, Vec<FieldViolation>>;

    fn to_raw(record: &Self::Record) -> RawRecord;
}

/// Compact JSON for diagnostics and repair pre-fill; `{}` if serialization
/// fails.
pub fn render(raw: &RawRecord) -> String {
    serde_json::to_string(raw.fields()).unwrap_or_else(|_| "{}".to_string())
}

pub struct ContactCodec;
pub struct PropertyCodec;
pub struct InterestCodec;

pub const NAME: &str = "name";
pub const PHONE: &str = "phone";
pub const EMAIL: &str = "email";
pub const ADDRESS: &str = "address";
pub const LISTING: &str = "listing";
pub const TAGS: &str = "tags";
pub const PROPERTY_NAME: &str = "propertyName";
pub const PRICE: &str = "price";
pub const INTEREST_CONTACT: &str = "contact";
pub const INTEREST_PROPERTY: &str = "property";

impl RecordCodec for ContactCodec {
    type Record = Contact;

    const KIND: RecordKind = RecordKind::Contact;
    const FIELDS: &'static [&'static str] = &[NAME, PHONE, EMAIL, ADDRESS, LISTING, TAGS];

    fn validate(raw: &RawRecord) -> Result<Contact, Vec<FieldViolation>> {
        let mut check = FieldCheck::new(Self::KIND, raw);
        let name = check.required_text(NAME, Name::parse);
        let phone = check.required_text(PHONE, Phone::parse);
        let email = check.required_text(EMAIL, Email::parse);
        let address = check.required_text(ADDRESS, Address::parse);
        let listing = check.optional_text(LISTING, Listing::parse);
        let tags = check.tags(TAGS);

        match (name, phone, email, address, listing, tags) {
            (Some(name), Some(phone), Some(email), Some(address), Some(listing), Some(tags))
                if check.is_clean() =>
            {
                Ok(Contact {
                    name,
                    phone,
                    email,
                    address,
                    listing,
                    tags,
                })
            }
            _ => Err(check.into_violations()),
        }
    }

    fn to_raw(contact: &Contact) -> RawRecord {
        let mut raw = RawRecord::new()
            .with(NAME, contact.name.as_str())
            .with(PHONE, contact.phone.as_str())
            .with(EMAIL, contact.email.as_str())
            .with(ADDRESS, contact.address.as_str());
        if let Some(listing) = &contact.listing {
            raw.set(LISTING, Value::from(listing.as_str()));
        }
        if !contact.tags.is_empty() {
            raw.set(TAGS, Value::from(contact.tag_list()));
        }
        raw
    }
}

impl RecordCodec for PropertyCodec {
    type Record = Property;

    const KIND: RecordKind = RecordKind::Property;
    const FIELDS: &'static [&'static str] = &[PROPERTY_NAME, ADDRESS, PRICE];

    fn validate(raw: &RawRecord) -> Result<Property, Vec<FieldViolation>> {
        let mut check = FieldCheck::new(Self::KIND, raw);
        let property_name = check.required_text(PROPERTY_NAME, PropertyName::parse);
        let address = check.required_text(ADDRESS, Address::parse);
        let price = check.price(PRICE);

        match (property_name, address, price) {
            (Some(property_name), Some(address), Some(price)) if check.is_clean() => {
                Ok(Property {
                    property_name,
                    address,
                    price,
                })
            }
            _ => Err(check.into_violations()),
        }
    }

    fn to_raw(property: &Property) -> RawRecord {
        RawRecord::new()
            .with(PROPERTY_NAME, property.property_name.as_str())
            .with(ADDRESS, property.address.as_str())
            .with(PRICE, property.price.get())
    }
}

/// Structural check only; whether both endpoints name valid records is
/// decided during reconciliation.
impl RecordCodec for InterestCodec {
    type Record = Interest;

    const KIND: RecordKind = RecordKind::Interest;
    const FIELDS: &'static [&'static str] = &[INTEREST_CONTACT, INTEREST_PROPERTY];

    fn validate(raw: &RawRecord) -> Result<Interest, Vec<FieldViolation>> {
        let mut check = FieldCheck::new(Self::KIND, raw);
        let contact = check.required_text(INTEREST_CONTACT, Name::parse);
        let property = check.required_text(INTEREST_PROPERTY, PropertyName::parse);

        match (contact, property) {
            (Some(contact), Some(property)) if check.is_clean() => {
                Ok(Interest { contact, property })
            }
            _ => Err(check.into_violations()),
        }
    }

    fn to_raw(interest: &Interest) -> RawRecord {
        RawRecord::new()
            .with(INTEREST_CONTACT, interest.contact.as_str())
            .with(INTEREST_PROPERTY, interest.property.as_str())
    }
}

/// Accumulates violations while fields are parsed one by one.
struct FieldCheck<'a> {
    kind: RecordKind,
    raw: &'a RawRecord,
    violations: Vec<FieldViolation>,
}

impl<'a> FieldCheck<'a> {
    fn new(kind: RecordKind, raw: &'a RawRecord) -> Self {
        Self {
            kind,
            raw,
            violations: Vec::new(),
        }
    }

    fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    fn into_violations(self) -> Vec<FieldViolation> {
        self.violations
    }

    fn required_text<T>(
        &mut self,
        field: &str,
        parse: impl Fn(&str) -> Result<T, FieldError>,
    ) -> Option<T> {
        match self.optional_text(field, parse) {
            Some(Some(value)) => Some(value),
            Some(None) => {
                self.violations
                    .push(FieldViolation::missing(self.kind, field));
                None
            }
            None => None,
        }
    }

    /// Outer `None` means the field was present but invalid.
    fn optional_text<T>(
        &mut self,
        field: &str,
        parse: impl Fn(&str) -> Result<T, FieldError>,
    ) -> Option<Option<T>> {
        let text = match self.raw.get(field) {
            FieldValue::Absent => return Some(None),
            FieldValue::Text(text) => text.to_string(),
            FieldValue::Number(number) => number.to_string(),
            FieldValue::List(_) | FieldValue::Other(_) => {
                self.malformed(field, format!("{} must be text", field));
                return None;
            }
        };
        match parse(&text) {
            Ok(value) => Some(Some(value)),
            Err(FieldError::Blank) => Some(None),
            Err(FieldError::Constraint(message)) => {
                self.malformed(field, message);
                None
            }
        }
    }

    fn price(&mut self, field: &str) -> Option<Price> {
        let parsed = match self.raw.get(field) {
            FieldValue::Absent => Err(FieldError::Blank),
            FieldValue::Number(number) => Price::parse_number(number),
            FieldValue::Text(text) => Price::parse(text),
            FieldValue::List(_) | FieldValue::Other(_) => {
                Err(FieldError::Constraint(Price::CONSTRAINT))
            }
        };
        match parsed {
            Ok(price) => Some(price),
            Err(FieldError::Blank) => {
                self.violations
                    .push(FieldViolation::missing(self.kind, field));
                None
            }
            Err(FieldError::Constraint(message)) => {
                self.malformed(field, message);
                None
            }
        }
    }

    fn tags(&mut self, field: &str) -> Option<BTreeSet<Tag>> {
        let items = match self.raw.get(field) {
            FieldValue::Absent => return Some(BTreeSet::new()),
            FieldValue::List(items) => items,
            _ => {
                self.malformed(field, "tags must be a list of words");
                return None;
            }
        };
        let mut tags = BTreeSet::new();
        for item in items {
            let parsed = item
                .as_str()
                .ok_or(FieldError::Constraint(Tag::CONSTRAINT))
                .and_then(Tag::parse);
            match parsed {
                Ok(tag) => {
                    tags.insert(tag);
                }
                Err(FieldError::Blank) => {
                    self.malformed(field, Tag::CONSTRAINT);
                    return None;
                }
                Err(FieldError::Constraint(message)) => {
                    self.malformed(field, message);
                    return None;
                }
            }
        }
        Some(tags)
    }

    fn malformed(&mut self, field: &str, message: impl Into<String>) {
        self.violations.push(FieldViolation::malformed(
            field,
            self.raw.raw_value(field),
            message,
        ));
    }
}
