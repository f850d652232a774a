//! Whole-document codec: bytes to ordered raw record lists and back.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::record::{RawRecord, RecordKind};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),
    #[error("document root must be a JSON object, found {0}")]
    RootNotObject(&'static str),
    #[error("section '{section}' must be a list, found {found}")]
    SectionNotList {
        section: &'static str,
        found: &'static str,
    },
    #[error("{section}[{position}] must be an object, found {found}")]
    RecordNotObject {
        section: &'static str,
        position: usize,
        found: &'static str,
    },
    #[error("failed to serialize document: {0}")]
    Encode(#[source] serde_json::Error),
}

impl DocumentError {
    pub fn code(&self) -> &'static str {
        "DOCUMENT_MALFORMED"
    }
}

/// The complete persisted unit: one ordered raw list per record kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub contacts: Vec<RawRecord>,
    pub properties: Vec<RawRecord>,
    pub interests: Vec<RawRecord>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self, kind: RecordKind) -> &[RawRecord] {
        match kind {
            RecordKind::Contact => &self.contacts,
            RecordKind::Property => &self.properties,
            RecordKind::Interest => &self.interests,
        }
    }

    pub fn records_mut(&mut self, kind: RecordKind) -> &mut Vec<RawRecord> {
        match kind {
            RecordKind::Contact => &mut self.contacts,
            RecordKind::Property => &mut self.properties,
            RecordKind::Interest => &mut self.interests,
        }
    }

    pub fn total(&self) -> usize {
        self.contacts.len() + self.properties.len() + self.interests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

pub fn decode(bytes: &[u8]) -> Result<Document, DocumentError> {
    let root: Value = serde_json::from_slice(bytes).map_err(DocumentError::Syntax)?;
    let Value::Object(mut root) = root else {
        return Err(DocumentError::RootNotObject(json_type(&root)));
    };

    let mut document = Document::new();
    for kind in RecordKind::ALL {
        *document.records_mut(kind) = decode_section(&mut root, kind.section())?;
    }
    Ok(document)
}

fn decode_section(
    root: &mut Map<String, Value>,
    section: &'static str,
) -> Result<Vec<RawRecord>, DocumentError> {
    let items = match root.remove(section) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(DocumentError::SectionNotList {
                section,
                found: json_type(&other),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| match item {
            Value::Object(fields) => Ok(RawRecord::from_fields(fields)),
            other => Err(DocumentError::RecordNotObject {
                section,
                position,
                found: json_type(&other),
            }),
        })
        .collect()
}

/// Pretty JSON with every section present and a trailing newline.
pub fn encode(document: &Document) -> Result<Vec<u8>, DocumentError> {
    let mut root = Map::new();
    for kind in RecordKind::ALL {
        let items = document
            .records(kind)
            .iter()
            .map(|raw| Value::Object(raw.fields().clone()))
            .collect::<Vec<_>>();
        root.insert(kind.section().to_string(), Value::Array(items));
    }
    let mut bytes = serde_json::to_vec_pretty(&Value::Object(root)).map_err(DocumentError::Encode)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_object_and_empty_lists_decode_to_empty_document() {
        assert_eq!(decode(b"{}").expect("empty root"), Document::new());
        let empty = decode(br#"{"contacts": [], "properties": null}"#).expect("empty lists");
        assert!(empty.is_empty());
    }

    #[test]
    fn missing_sections_are_tolerated_and_unknown_keys_ignored() {
        let document = decode(
            br#"{"contacts": [{"name": "A"}], "schemaHint": 3}"#,
        )
        .expect("should decode");
        assert_eq!(document.contacts.len(), 1);
        assert!(document.properties.is_empty());
        assert!(document.interests.is_empty());
    }

    #[test]
    fn structural_failures_are_document_errors() {
        assert!(matches!(
            decode(br#"{"contacts": [{"name": "A"}"#),
            Err(DocumentError::Syntax(_))
        ));
        assert!(matches!(
            decode(b"[1, 2]"),
            Err(DocumentError::RootNotObject("a list"))
        ));
        assert!(matches!(
            decode(br#"{"properties": {"a": 1}}"#),
            Err(DocumentError::SectionNotList {
                section: "properties",
                ..
            })
        ));
        let err = decode(br#"{"contacts": [{"name": "A"}, "Bob"]}"#).expect_err("bad element");
        assert_eq!(err.to_string(), "contacts[1] must be an object, found a string");
        assert_eq!(err.code(), "DOCUMENT_MALFORMED");
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let mut document = Document::new();
        document.contacts.push(
            serde_json::from_value(json!({"name": "Alex", "tags": ["a", "b"]}))
                .expect("record"),
        );
        document.properties.push(
            serde_json::from_value(json!({"propertyName": "Loft", "price": 10})).expect("record"),
        );
        document.interests.push(
            serde_json::from_value(json!({"contact": "Alex", "property": "Loft"}))
                .expect("record"),
        );

        let bytes = encode(&document).expect("encode");
        assert!(bytes.ends_with(b"}\n"));
        assert_eq!(decode(&bytes).expect("decode"), document);
    }

    #[test]
    fn encode_preserves_field_order() {
        let mut document = Document::new();
        document.properties.push(
            serde_json::from_value(json!({"price": 1, "address": "A", "propertyName": "P"}))
                .expect("record"),
        );
        let text = String::from_utf8(encode(&document).expect("encode")).expect("utf8");
        let price = text.find("\"price\"").expect("price present");
        let name = text.find("\"propertyName\"").expect("name present");
        assert!(price < name);
    }
}
