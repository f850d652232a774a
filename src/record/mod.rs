//! Raw, position-identified records as they appear on disk, and the
//! field-level violations reported when they fail validation.

pub mod codec;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

pub use codec::{render, ContactCodec, InterestCodec, PropertyCodec, RecordCodec};

use crate::domain::fields::identity_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Contact,
    Property,
    Interest,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [
        RecordKind::Contact,
        RecordKind::Property,
        RecordKind::Interest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Contact => "contact",
            RecordKind::Property => "property",
            RecordKind::Interest => "interest",
        }
    }

    /// Top-level document key holding this kind's list.
    pub fn section(self) -> &'static str {
        match self {
            RecordKind::Contact => "contacts",
            RecordKind::Property => "properties",
            RecordKind::Interest => "interests",
        }
    }

    /// Field names the codec for this kind understands, in check order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::Contact => ContactCodec::FIELDS,
            RecordKind::Property => PropertyCodec::FIELDS,
            RecordKind::Interest => InterestCodec::FIELDS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Contact => "Contact",
            RecordKind::Property => "Property",
            RecordKind::Interest => "Interest",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown record kind '{0}': expected contact, property or interest")]
pub struct ParseRecordKindError(pub String);

impl FromStr for RecordKind {
    type Err = ParseRecordKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "contact" | "contacts" | "person" | "persons" => Ok(RecordKind::Contact),
            "property" | "properties" => Ok(RecordKind::Property),
            "interest" | "interests" => Ok(RecordKind::Interest),
            _ => Err(ParseRecordKindError(value.to_string())),
        }
    }
}

/// One field read from a raw record. `null` reads as `Absent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Absent,
    Text(&'a str),
    Number(&'a Number),
    List(&'a [Value]),
    Other(&'a Value),
}

/// The unvalidated on-disk shape of one record: field name to JSON value,
/// in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> FieldValue<'_> {
        match self.fields.get(field) {
            None | Some(Value::Null) => FieldValue::Absent,
            Some(Value::String(text)) => FieldValue::Text(text),
            Some(Value::Number(number)) => FieldValue::Number(number),
            Some(Value::Array(items)) => FieldValue::List(items),
            Some(other) => FieldValue::Other(other),
        }
    }

    /// The stored JSON for a field, absent when missing or `null`.
    pub fn raw_value(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|value| !value.is_null())
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.get(field) {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// A scalar field as the text the codecs parse: strings as stored,
    /// numbers in their JSON form.
    pub fn scalar_text(&self, field: &str) -> Option<Cow<'_, str>> {
        match self.get(field) {
            FieldValue::Text(text) => Some(Cow::Borrowed(text)),
            FieldValue::Number(number) => Some(Cow::Owned(number.to_string())),
            _ => None,
        }
    }

    /// Identity key of a name field, whether it was stored as text or as a
    /// number.
    pub fn key_of(&self, field: &str) -> Option<String> {
        self.scalar_text(field).map(|text| identity_key(&text))
    }

    /// Sets a field; `null` clears it.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        if value.is_null() {
            self.fields.shift_remove(&field);
        } else {
            self.fields.insert(field, value);
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Missing,
    Malformed,
    Unresolved,
}

impl ViolationKind {
    pub fn code(self) -> &'static str {
        match self {
            ViolationKind::Missing => "FIELD_MISSING",
            ViolationKind::Malformed => "FIELD_MALFORMED",
            ViolationKind::Unresolved => "FIELD_UNRESOLVED",
        }
    }
}

/// One reason a raw record failed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub kind: ViolationKind,
    pub message: String,
}

impl FieldViolation {
    pub fn missing(kind: RecordKind, field: &str) -> Self {
        Self {
            field: field.to_string(),
            value: None,
            kind: ViolationKind::Missing,
            message: format!("{}'s {} field is missing", kind.label(), field),
        }
    }

    pub fn malformed(field: &str, value: Option<&Value>, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: value.cloned(),
            kind: ViolationKind::Malformed,
            message: message.into(),
        }
    }

    pub fn unresolved(field: &str, value: Option<&Value>, target: RecordKind) -> Self {
        let shown = match value {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Self {
            field: field.to_string(),
            value: value.cloned(),
            kind: ViolationKind::Unresolved,
            message: format!("no valid {} named '{}'", target.as_str(), shown),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.field, self.kind.code(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn field_values_distinguish_absent_and_shapes() {
        let raw: RawRecord = serde_json::from_value(json!({
            "name": "Alex",
            "price": 5,
            "tags": ["a"],
            "listing": null,
            "flag": true
        }))
        .expect("object should decode");

        assert_eq!(raw.get("name"), FieldValue::Text("Alex"));
        assert!(matches!(raw.get("price"), FieldValue::Number(_)));
        assert!(matches!(raw.get("tags"), FieldValue::List(items) if items.len() == 1));
        assert_eq!(raw.get("listing"), FieldValue::Absent);
        assert_eq!(raw.get("missing"), FieldValue::Absent);
        assert!(matches!(raw.get("flag"), FieldValue::Other(_)));
        assert!(raw.raw_value("listing").is_none());
    }

    #[test]
    fn keys_come_from_text_or_numbers() {
        let raw = RawRecord::new()
            .with("contact", " Alex YEOH ")
            .with("property", json!(221))
            .with("tags", json!(["a"]));
        assert_eq!(raw.key_of("contact").as_deref(), Some("alex yeoh"));
        assert_eq!(raw.key_of("property").as_deref(), Some("221"));
        assert_eq!(raw.key_of("tags"), None);
        assert_eq!(raw.key_of("missing"), None);
    }

    #[test]
    fn set_null_clears_field_and_keeps_order() {
        let mut raw = RawRecord::new()
            .with("name", "A")
            .with("phone", "123")
            .with("email", "a@b.co");
        raw.set("phone", Value::Null);
        let keys = raw.fields().keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys, vec!["name", "email"]);
    }

    #[test]
    fn record_kind_parses_aliases() {
        assert_eq!("Contacts".parse::<RecordKind>(), Ok(RecordKind::Contact));
        assert_eq!("person".parse::<RecordKind>(), Ok(RecordKind::Contact));
        assert_eq!("properties".parse::<RecordKind>(), Ok(RecordKind::Property));
        assert_eq!("interest".parse::<RecordKind>(), Ok(RecordKind::Interest));
        assert!("edge".parse::<RecordKind>().is_err());
    }

    #[test]
    fn violation_messages_name_the_field() {
        let missing = FieldViolation::missing(RecordKind::Property, "price");
        assert_eq!(missing.message, "Property's price field is missing");
        assert_eq!(missing.kind.code(), "FIELD_MISSING");

        let unresolved =
            FieldViolation::unresolved("contact", Some(&json!("Ghost")), RecordKind::Contact);
        assert_eq!(unresolved.message, "no valid contact named 'Ghost'");
        assert_eq!(
            unresolved.to_string(),
            "contact [FIELD_UNRESOLVED]: no valid contact named 'Ghost'"
        );
    }
}
