//! In-place correction of one raw record.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::reconcile::{PositionOutOfRange, ReconciledStore, Status};
use crate::record::{render, FieldViolation, RecordKind};

#[derive(Debug, Error)]
pub enum RepairError {
    #[error(transparent)]
    OutOfRange(#[from] PositionOutOfRange),
    #[error("positions start at 1 (pass --zero-based to count from 0)")]
    ZeroPosition,
    #[error("invalid correction '{0}': expected field=value")]
    InvalidAssignment(String),
    #[error("{kind} records have no field '{field}' (known: {known})", known = .kind.fields().join(", "))]
    UnknownField { kind: RecordKind, field: String },
}

impl RepairError {
    pub fn code(&self) -> &'static str {
        match self {
            RepairError::OutOfRange(err) => err.code(),
            RepairError::ZeroPosition
            | RepairError::InvalidAssignment(_)
            | RepairError::UnknownField { .. } => "INVALID_ARGUMENT",
        }
    }
}

/// A zero-based record position, whichever way the caller counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecordPosition(usize);

impl RecordPosition {
    pub fn zero_based(index: usize) -> Self {
        Self(index)
    }

    pub fn one_based(index: usize) -> Result<Self, RepairError> {
        index
            .checked_sub(1)
            .map(Self)
            .ok_or(RepairError::ZeroPosition)
    }

    pub fn from_user(index: usize, zero_based: bool) -> Result<Self, RepairError> {
        if zero_based {
            Ok(Self::zero_based(index))
        } else {
            Self::one_based(index)
        }
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn display(self) -> usize {
        self.0 + 1
    }
}

/// Field values to merge over a raw record. A `null` value clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corrections(Map<String, Value>);

impl Corrections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Parses `field=value` pairs. A value that reads as JSON (a number,
    /// `null`, a quoted string, a list) is taken as that JSON; anything
    /// else is taken as plain text.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self, RepairError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut corrections = Self::new();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let Some((field, value)) = assignment.split_once('=') else {
                return Err(RepairError::InvalidAssignment(assignment.to_string()));
            };
            let field = field.trim();
            if field.is_empty() {
                return Err(RepairError::InvalidAssignment(assignment.to_string()));
            }
            let value = serde_json::from_str::<Value>(value)
                .unwrap_or_else(|_| Value::String(value.to_string()));
            corrections.0.insert(field.to_string(), value);
        }
        Ok(corrections)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    fn check_fields(&self, kind: RecordKind) -> Result<(), RepairError> {
        match self.0.keys().find(|field| !kind.fields().contains(&field.as_str())) {
            Some(field) => Err(RepairError::UnknownField {
                kind,
                field: field.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairOutcome {
    pub kind: RecordKind,
    pub position: usize,
    pub before: Status,
    pub after: Status,
    pub violations: Vec<FieldViolation>,
    /// Interest edges re-checked because they point at the repaired record.
    pub reresolved_edges: usize,
    pub rendered: String,
}

impl RepairOutcome {
    pub fn fixed(&self) -> bool {
        self.before == Status::Invalid && self.after == Status::Valid
    }
}

impl ReconciledStore {
    /// Merges `corrections` over the raw record at `position` and
    /// re-validates that record alone. Nothing is persisted.
    pub fn repair(
        &mut self,
        kind: RecordKind,
        position: usize,
        corrections: &Corrections,
    ) -> Result<RepairOutcome, RepairError> {
        let mut raw = self.raw(kind, position)?.clone();
        corrections.check_fields(kind)?;
        for (field, value) in corrections.iter() {
            raw.set(field.clone(), value.clone());
        }

        let change = self.replace(kind, position, raw)?;
        let outcome = RepairOutcome {
            kind,
            position,
            before: change.before,
            after: change.after,
            violations: self.violations(kind, position)?,
            reresolved_edges: change.reresolved,
            rendered: render(self.raw(kind, position)?),
        };
        tracing::info!(
            kind = kind.as_str(),
            position,
            before = outcome.before.as_str(),
            after = outcome.after.as_str(),
            reresolved = outcome.reresolved_edges,
            "repaired record"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::Document;
    use crate::reconcile::reconcile;
    use crate::record::{RawRecord, ViolationKind};

    fn property(name: &str, price: Value) -> RawRecord {
        RawRecord::new()
            .with("propertyName", name)
            .with("address", "123 Example St")
            .with("price", price)
    }

    fn contact(name: &str) -> RawRecord {
        RawRecord::new()
            .with("name", name)
            .with("phone", "87438807")
            .with("email", "alexyeoh@example.com")
            .with("address", "Blk 30 Geylang Street 29")
    }

    fn sample_store() -> ReconciledStore {
        let mut document = Document::new();
        document.contacts = vec![contact("Alex Yeoh"), contact("Bernice Yu")];
        document.properties = vec![
            property("Sunny Villa", json!(500000)),
            property("City Loft", json!("abc")),
        ];
        document.interests = vec![
            RawRecord::new()
                .with("contact", "Bernice Yu")
                .with("property", "City Loft"),
        ];
        reconcile(document)
    }

    #[test]
    fn repairing_a_malformed_price_moves_the_record_to_valid() {
        let mut store = sample_store();
        assert_eq!(store.properties().valid.len(), 1);
        assert_eq!(store.properties().invalid.len(), 1);

        let outcome = store
            .repair(
                RecordKind::Property,
                1,
                &Corrections::new().with("price", 500000),
            )
            .expect("repair should apply");

        assert!(outcome.fixed());
        assert!(outcome.violations.is_empty());
        assert_eq!(outcome.reresolved_edges, 1);
        assert_eq!(store.properties().valid.len(), 2);
        assert!(store.properties().invalid.is_empty());
        assert_eq!(store.interests().valid.len(), 1);
        assert_eq!(
            store.document().properties[1].text("propertyName"),
            Some("City Loft")
        );
    }

    #[test]
    fn out_of_range_leaves_the_store_untouched() {
        let mut store = sample_store();
        let before = store.document().clone();
        let err = store
            .repair(
                RecordKind::Contact,
                99,
                &Corrections::new().with("name", "Nobody"),
            )
            .expect_err("position 99 does not exist");
        assert_eq!(err.code(), "RECORD_OUT_OF_RANGE");
        assert_eq!(store.document(), &before);
    }

    #[test]
    fn repair_touches_only_the_target_record() {
        let mut store = sample_store();
        let untouched = store.document().contacts[1].clone();
        let outcome = store
            .repair(
                RecordKind::Contact,
                0,
                &Corrections::new().with("phone", "12"),
            )
            .expect("in range");

        assert_eq!(outcome.before, Status::Valid);
        assert_eq!(outcome.after, Status::Invalid);
        assert_eq!(outcome.violations[0].field, "phone");
        assert_eq!(outcome.violations[0].kind, ViolationKind::Malformed);
        assert_eq!(outcome.reresolved_edges, 0);
        assert_eq!(store.document().contacts[1], untouched);
        assert_eq!(store.status(RecordKind::Contact, 1), Ok(Status::Valid));
    }

    #[test]
    fn null_correction_clears_a_field() {
        let mut store = sample_store();
        let outcome = store
            .repair(
                RecordKind::Contact,
                1,
                &Corrections::new().with("email", Value::Null),
            )
            .expect("in range");
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].kind, ViolationKind::Missing);
        assert!(store.document().contacts[1].raw_value("email").is_none());
        // Bernice no longer resolves, so her edge drops out too.
        assert_eq!(outcome.reresolved_edges, 1);
        assert_eq!(store.interests().valid.len(), 0);
    }

    #[test]
    fn unknown_fields_are_rejected_before_mutation() {
        let mut store = sample_store();
        let err = store
            .repair(
                RecordKind::Property,
                1,
                &Corrections::new().with("cost", 10),
            )
            .expect_err("cost is not a property field");
        assert!(err.to_string().contains("propertyName, address, price"));
        assert_eq!(store.status(RecordKind::Property, 1), Ok(Status::Invalid));
    }

    #[test]
    fn range_is_checked_before_correction_fields() {
        let mut store = sample_store();
        let err = store
            .repair(
                RecordKind::Property,
                99,
                &Corrections::new().with("cost", 1),
            )
            .expect_err("position 99 is past the end");
        assert_eq!(err.code(), "RECORD_OUT_OF_RANGE");
    }

    #[test]
    fn assignments_parse_json_or_text() {
        let corrections = Corrections::from_assignments([
            "price=500000",
            "name=Alex Yeoh",
            "phone=007",
            "listing=null",
            r#"tags=["vip","buyer"]"#,
            "address=",
        ])
        .expect("valid assignments");
        let collected = corrections
            .iter()
            .map(|(field, value)| (field.as_str(), value.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            collected,
            vec![
                ("price", json!(500000)),
                ("name", json!("Alex Yeoh")),
                ("phone", json!("007")),
                ("listing", Value::Null),
                ("tags", json!(["vip", "buyer"])),
                ("address", json!("")),
            ]
        );
        assert!(Corrections::from_assignments(["price"]).is_err());
        assert!(Corrections::from_assignments(["=5"]).is_err());
    }

    #[test]
    fn positions_normalize_to_zero_based() {
        assert_eq!(RecordPosition::from_user(1, false).expect("ok").index(), 0);
        assert_eq!(RecordPosition::from_user(0, true).expect("ok").display(), 1);
        assert!(matches!(
            RecordPosition::from_user(0, false),
            Err(RepairError::ZeroPosition)
        ));
    }
}
