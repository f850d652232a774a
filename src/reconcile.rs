//! Classification of every raw record in a document as valid or invalid.
//!
//! A [`ReconciledStore`] owns the decoded document plus one slot per raw
//! record. Slots hold either the validated domain record or the violations
//! that kept it from validating, so `valid + invalid == total` holds per kind
//! by construction. Interest edges are classified last, against the identity
//! keys of the valid contacts and properties.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use thiserror::Error;

use crate::document::Document;
use crate::domain::{Contact, Interest, Property};
use crate::record::codec::{INTEREST_CONTACT, INTEREST_PROPERTY};
use crate::record::{
    render, ContactCodec, FieldViolation, InterestCodec, PropertyCodec, RawRecord, RecordCodec,
    RecordKind,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} position {position} is out of range ({len} {section} stored)", section = .kind.section())]
pub struct PositionOutOfRange {
    pub kind: RecordKind,
    pub position: usize,
    pub len: usize,
}

impl PositionOutOfRange {
    pub fn code(&self) -> &'static str {
        "RECORD_OUT_OF_RANGE"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Valid,
    Invalid,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Valid => "valid",
            Status::Invalid => "invalid",
        }
    }
}

/// Why one raw record is currently invalid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidRecordReport {
    pub kind: RecordKind,
    /// Zero-based position within the kind's list.
    pub position: usize,
    pub violations: Vec<FieldViolation>,
    pub rendered: String,
}

/// Valid records of one kind in document order, plus reports for the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation<T> {
    pub valid: Vec<T>,
    pub invalid: Vec<InvalidRecordReport>,
}

impl<T> Reconciliation<T> {
    pub fn total(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    pub kind: RecordKind,
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

/// Valid records sharing one identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub kind: RecordKind,
    pub key: String,
    pub positions: Vec<usize>,
}

/// Classification of one position before and after an in-place change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotChange {
    pub before: Status,
    pub after: Status,
    pub reresolved: usize,
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Valid(T),
    Invalid(Vec<FieldViolation>),
}

impl<T> Slot<T> {
    fn from_result(result: Result<T, Vec<FieldViolation>>) -> Self {
        match result {
            Ok(record) => Slot::Valid(record),
            Err(violations) => Slot::Invalid(violations),
        }
    }

    fn valid(&self) -> Option<&T> {
        match self {
            Slot::Valid(record) => Some(record),
            Slot::Invalid(_) => None,
        }
    }

    fn violations(&self) -> Option<&[FieldViolation]> {
        match self {
            Slot::Valid(_) => None,
            Slot::Invalid(violations) => Some(violations),
        }
    }

    fn status(&self) -> Status {
        match self {
            Slot::Valid(_) => Status::Valid,
            Slot::Invalid(_) => Status::Invalid,
        }
    }
}

/// Multiset of identity keys among valid records of one kind.
#[derive(Debug, Clone, Default)]
struct KeyCounts(HashMap<String, usize>);

impl KeyCounts {
    fn add(&mut self, key: String) {
        *self.0.entry(key).or_insert(0) += 1;
    }

    fn remove(&mut self, key: &str) {
        if let Some(count) = self.0.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                self.0.remove(key);
            }
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

/// Interest positions by the identity key one endpoint names, valid or not.
#[derive(Debug, Clone, Default)]
struct EdgeIndex(HashMap<String, BTreeSet<usize>>);

impl EdgeIndex {
    fn build(interests: &[RawRecord], endpoint: &str) -> Self {
        let mut index = Self::default();
        for (position, raw) in interests.iter().enumerate() {
            index.insert(raw.key_of(endpoint), position);
        }
        index
    }

    fn insert(&mut self, key: Option<String>, position: usize) {
        if let Some(key) = key {
            self.0.entry(key).or_default().insert(position);
        }
    }

    fn discard(&mut self, key: Option<String>, position: usize) {
        let Some(key) = key else { return };
        if let Some(positions) = self.0.get_mut(&key) {
            positions.remove(&position);
            if positions.is_empty() {
                self.0.remove(&key);
            }
        }
    }

    fn positions(&self, key: &str) -> impl Iterator<Item = usize> + '_ {
        self.0.get(key).into_iter().flatten().copied()
    }

    /// Positions after `removed` move down by one.
    fn shift_down(&mut self, removed: usize) {
        for positions in self.0.values_mut() {
            if positions.last().is_some_and(|last| *last > removed) {
                *positions = positions
                    .iter()
                    .map(|&position| {
                        if position > removed {
                            position - 1
                        } else {
                            position
                        }
                    })
                    .collect();
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReconciledStore {
    document: Document,
    contacts: Vec<Slot<Contact>>,
    properties: Vec<Slot<Property>>,
    interests: Vec<Slot<Interest>>,
    contact_keys: KeyCounts,
    property_keys: KeyCounts,
    contact_edges: EdgeIndex,
    property_edges: EdgeIndex,
}

pub fn reconcile(document: Document) -> ReconciledStore {
    let mut contact_keys = KeyCounts::default();
    let contacts = document
        .contacts
        .iter()
        .map(|raw| {
            let slot = Slot::from_result(ContactCodec::validate(raw));
            if let Some(contact) = slot.valid() {
                contact_keys.add(contact.key());
            }
            slot
        })
        .collect::<Vec<_>>();

    let mut property_keys = KeyCounts::default();
    let properties = document
        .properties
        .iter()
        .map(|raw| {
            let slot = Slot::from_result(PropertyCodec::validate(raw));
            if let Some(property) = slot.valid() {
                property_keys.add(property.key());
            }
            slot
        })
        .collect::<Vec<_>>();

    let interests = document
        .interests
        .iter()
        .map(|raw| classify_interest(raw, &contact_keys, &property_keys))
        .collect::<Vec<_>>();
    let contact_edges = EdgeIndex::build(&document.interests, INTEREST_CONTACT);
    let property_edges = EdgeIndex::build(&document.interests, INTEREST_PROPERTY);

    let store = ReconciledStore {
        document,
        contacts,
        properties,
        interests,
        contact_keys,
        property_keys,
        contact_edges,
        property_edges,
    };
    for summary in store.summary() {
        tracing::debug!(
            kind = summary.kind.as_str(),
            total = summary.total,
            valid = summary.valid,
            invalid = summary.invalid,
            "reconciled records"
        );
    }
    store
}

fn classify_interest(
    raw: &RawRecord,
    contact_keys: &KeyCounts,
    property_keys: &KeyCounts,
) -> Slot<Interest> {
    let interest = match InterestCodec::validate(raw) {
        Ok(interest) => interest,
        Err(violations) => return Slot::Invalid(violations),
    };
    let mut violations = Vec::new();
    if !contact_keys.contains(&interest.contact_key()) {
        violations.push(FieldViolation::unresolved(
            INTEREST_CONTACT,
            raw.raw_value(INTEREST_CONTACT),
            RecordKind::Contact,
        ));
    }
    if !property_keys.contains(&interest.property_key()) {
        violations.push(FieldViolation::unresolved(
            INTEREST_PROPERTY,
            raw.raw_value(INTEREST_PROPERTY),
            RecordKind::Property,
        ));
    }
    if violations.is_empty() {
        Slot::Valid(interest)
    } else {
        Slot::Invalid(violations)
    }
}

fn collect<T: Clone>(
    kind: RecordKind,
    slots: &[Slot<T>],
    raws: &[RawRecord],
) -> Reconciliation<T> {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for (position, (slot, raw)) in slots.iter().zip(raws).enumerate() {
        match slot {
            Slot::Valid(record) => valid.push(record.clone()),
            Slot::Invalid(violations) => invalid.push(InvalidRecordReport {
                kind,
                position,
                violations: violations.clone(),
                rendered: render(raw),
            }),
        }
    }
    Reconciliation { valid, invalid }
}

fn valid_positions<T>(slots: &[Slot<T>]) -> impl Iterator<Item = (usize, &T)> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(position, slot)| slot.valid().map(|record| (position, record)))
}

impl ReconciledStore {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn len(&self, kind: RecordKind) -> usize {
        self.document.records(kind).len()
    }

    pub fn raw(&self, kind: RecordKind, position: usize) -> Result<&RawRecord, PositionOutOfRange> {
        self.check_position(kind, position)?;
        Ok(&self.document.records(kind)[position])
    }

    pub fn status(&self, kind: RecordKind, position: usize) -> Result<Status, PositionOutOfRange> {
        self.check_position(kind, position)?;
        Ok(match kind {
            RecordKind::Contact => self.contacts[position].status(),
            RecordKind::Property => self.properties[position].status(),
            RecordKind::Interest => self.interests[position].status(),
        })
    }

    /// Violations of the record at `position`; empty when it is valid.
    pub fn violations(
        &self,
        kind: RecordKind,
        position: usize,
    ) -> Result<Vec<FieldViolation>, PositionOutOfRange> {
        self.check_position(kind, position)?;
        let violations = match kind {
            RecordKind::Contact => self.contacts[position].violations(),
            RecordKind::Property => self.properties[position].violations(),
            RecordKind::Interest => self.interests[position].violations(),
        };
        Ok(violations.map(<[FieldViolation]>::to_vec).unwrap_or_default())
    }

    pub fn contacts(&self) -> Reconciliation<Contact> {
        collect(RecordKind::Contact, &self.contacts, &self.document.contacts)
    }

    pub fn properties(&self) -> Reconciliation<Property> {
        collect(RecordKind::Property, &self.properties, &self.document.properties)
    }

    pub fn interests(&self) -> Reconciliation<Interest> {
        collect(RecordKind::Interest, &self.interests, &self.document.interests)
    }

    pub fn valid_contacts(&self) -> impl Iterator<Item = (usize, &Contact)> {
        valid_positions(&self.contacts)
    }

    pub fn valid_properties(&self) -> impl Iterator<Item = (usize, &Property)> {
        valid_positions(&self.properties)
    }

    pub fn valid_interests(&self) -> impl Iterator<Item = (usize, &Interest)> {
        valid_positions(&self.interests)
    }

    pub fn has_contact_key(&self, key: &str) -> bool {
        self.contact_keys.contains(key)
    }

    pub fn has_property_key(&self, key: &str) -> bool {
        self.property_keys.contains(key)
    }

    /// Positions of the interest edges whose `endpoint` names `key`, in
    /// document order.
    pub fn edges_pointing_at(&self, endpoint: &str, key: &str) -> Vec<usize> {
        self.edge_index(endpoint).positions(key).collect()
    }

    /// Every invalid record across all kinds, contacts first.
    pub fn invalid_reports(&self) -> Vec<InvalidRecordReport> {
        let mut reports = self.contacts().invalid;
        reports.extend(self.properties().invalid);
        reports.extend(self.interests().invalid);
        reports
    }

    pub fn summary(&self) -> Vec<KindSummary> {
        fn count<T>(kind: RecordKind, slots: &[Slot<T>]) -> KindSummary {
            let valid = slots.iter().filter(|slot| slot.valid().is_some()).count();
            KindSummary {
                kind,
                total: slots.len(),
                valid,
                invalid: slots.len() - valid,
            }
        }
        vec![
            count(RecordKind::Contact, &self.contacts),
            count(RecordKind::Property, &self.properties),
            count(RecordKind::Interest, &self.interests),
        ]
    }

    pub fn has_invalid(&self) -> bool {
        self.summary().iter().any(|summary| summary.invalid > 0)
    }

    /// Only the valid records, re-encoded from their domain form.
    pub fn valid_records_as_document(&self) -> Document {
        Document {
            contacts: self
                .valid_contacts()
                .map(|(_, contact)| ContactCodec::to_raw(contact))
                .collect(),
            properties: self
                .valid_properties()
                .map(|(_, property)| PropertyCodec::to_raw(property))
                .collect(),
            interests: self
                .valid_interests()
                .map(|(_, interest)| InterestCodec::to_raw(interest))
                .collect(),
        }
    }

    /// Groups of valid records sharing an identity key, ordered by first
    /// position. Interest groups repeat the same contact/property pair.
    pub fn duplicates(&self) -> Vec<DuplicateGroup> {
        let mut groups = Vec::new();
        groups.extend(group_keys(
            RecordKind::Contact,
            self.valid_contacts()
                .map(|(position, contact)| (position, contact.key())),
        ));
        groups.extend(group_keys(
            RecordKind::Property,
            self.valid_properties()
                .map(|(position, property)| (position, property.key())),
        ));
        groups.extend(group_keys(
            RecordKind::Interest,
            self.valid_interests().map(|(position, interest)| {
                (
                    position,
                    format!("{} -> {}", interest.contact_key(), interest.property_key()),
                )
            }),
        ));
        if !groups.is_empty() {
            tracing::warn!(groups = groups.len(), "duplicate identity keys among valid records");
        }
        groups
    }

    fn check_position(&self, kind: RecordKind, position: usize) -> Result<(), PositionOutOfRange> {
        let len = self.len(kind);
        if position < len {
            Ok(())
        } else {
            Err(PositionOutOfRange {
                kind,
                position,
                len,
            })
        }
    }

    /// Swaps the raw record at `position` and re-validates only it, plus
    /// the interest edges that point at its old or new identity key.
    pub(crate) fn replace(
        &mut self,
        kind: RecordKind,
        position: usize,
        raw: RawRecord,
    ) -> Result<SlotChange, PositionOutOfRange> {
        let before = self.status(kind, position)?;
        let reresolved = match kind {
            RecordKind::Contact => {
                let old = self.contacts[position].valid().map(Contact::key);
                if let Some(key) = &old {
                    self.contact_keys.remove(key);
                }
                let slot = Slot::from_result(ContactCodec::validate(&raw));
                let new = slot.valid().map(Contact::key);
                if let Some(key) = &new {
                    self.contact_keys.add(key.clone());
                }
                self.contacts[position] = slot;
                self.document.contacts[position] = raw;
                self.reresolve(INTEREST_CONTACT, old.into_iter().chain(new).collect())
            }
            RecordKind::Property => {
                let old = self.properties[position].valid().map(Property::key);
                if let Some(key) = &old {
                    self.property_keys.remove(key);
                }
                let slot = Slot::from_result(PropertyCodec::validate(&raw));
                let new = slot.valid().map(Property::key);
                if let Some(key) = &new {
                    self.property_keys.add(key.clone());
                }
                self.properties[position] = slot;
                self.document.properties[position] = raw;
                self.reresolve(INTEREST_PROPERTY, old.into_iter().chain(new).collect())
            }
            RecordKind::Interest => {
                self.unindex_edge(position);
                self.interests[position] =
                    classify_interest(&raw, &self.contact_keys, &self.property_keys);
                self.document.interests[position] = raw;
                self.index_edge(position);
                0
            }
        };
        let after = self.status(kind, position)?;
        Ok(SlotChange {
            before,
            after,
            reresolved,
        })
    }

    /// Appends a raw record and returns its position.
    pub(crate) fn push(&mut self, kind: RecordKind, raw: RawRecord) -> usize {
        let position = self.len(kind);
        match kind {
            RecordKind::Contact => {
                let slot = Slot::from_result(ContactCodec::validate(&raw));
                let key = slot.valid().map(Contact::key);
                self.contacts.push(slot);
                self.document.contacts.push(raw);
                if let Some(key) = key {
                    self.contact_keys.add(key.clone());
                    self.reresolve(INTEREST_CONTACT, vec![key]);
                }
            }
            RecordKind::Property => {
                let slot = Slot::from_result(PropertyCodec::validate(&raw));
                let key = slot.valid().map(Property::key);
                self.properties.push(slot);
                self.document.properties.push(raw);
                if let Some(key) = key {
                    self.property_keys.add(key.clone());
                    self.reresolve(INTEREST_PROPERTY, vec![key]);
                }
            }
            RecordKind::Interest => {
                let slot = classify_interest(&raw, &self.contact_keys, &self.property_keys);
                self.interests.push(slot);
                self.document.interests.push(raw);
                self.index_edge(position);
            }
        }
        position
    }

    /// Drops the raw record at `position`; later positions shift down by one.
    pub(crate) fn remove(
        &mut self,
        kind: RecordKind,
        position: usize,
    ) -> Result<RawRecord, PositionOutOfRange> {
        self.check_position(kind, position)?;
        let raw = match kind {
            RecordKind::Contact => {
                let slot = self.contacts.remove(position);
                let raw = self.document.contacts.remove(position);
                if let Some(key) = slot.valid().map(Contact::key) {
                    self.contact_keys.remove(&key);
                    self.reresolve(INTEREST_CONTACT, vec![key]);
                }
                raw
            }
            RecordKind::Property => {
                let slot = self.properties.remove(position);
                let raw = self.document.properties.remove(position);
                if let Some(key) = slot.valid().map(Property::key) {
                    self.property_keys.remove(&key);
                    self.reresolve(INTEREST_PROPERTY, vec![key]);
                }
                raw
            }
            RecordKind::Interest => {
                self.unindex_edge(position);
                self.contact_edges.shift_down(position);
                self.property_edges.shift_down(position);
                self.interests.remove(position);
                self.document.interests.remove(position)
            }
        };
        Ok(raw)
    }

    /// Re-classifies interest edges whose `endpoint` field names one of
    /// `keys`. Returns how many edges were re-checked.
    fn reresolve(&mut self, endpoint: &str, keys: Vec<String>) -> usize {
        let index = self.edge_index(endpoint);
        let positions = keys
            .iter()
            .flat_map(|key| index.positions(key))
            .collect::<BTreeSet<_>>();
        for &position in &positions {
            let raw = &self.document.interests[position];
            self.interests[position] =
                classify_interest(raw, &self.contact_keys, &self.property_keys);
        }
        positions.len()
    }

    fn edge_index(&self, endpoint: &str) -> &EdgeIndex {
        match endpoint {
            INTEREST_PROPERTY => &self.property_edges,
            _ => &self.contact_edges,
        }
    }

    fn index_edge(&mut self, position: usize) {
        let raw = &self.document.interests[position];
        self.contact_edges.insert(raw.key_of(INTEREST_CONTACT), position);
        self.property_edges.insert(raw.key_of(INTEREST_PROPERTY), position);
    }

    fn unindex_edge(&mut self, position: usize) {
        let raw = &self.document.interests[position];
        self.contact_edges.discard(raw.key_of(INTEREST_CONTACT), position);
        self.property_edges.discard(raw.key_of(INTEREST_PROPERTY), position);
    }
}

fn group_keys(
    kind: RecordKind,
    entries: impl Iterator<Item = (usize, String)>,
) -> Vec<DuplicateGroup> {
    let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
    for (position, key) in entries {
        by_key.entry(key).or_default().push(position);
    }
    let mut groups = by_key
        .into_iter()
        .filter(|(_, positions)| positions.len() > 1)
        .map(|(key, positions)| DuplicateGroup {
            kind,
            key,
            positions,
        })
        .collect::<Vec<_>>();
    groups.sort_by_key(|group| group.positions[0]);
    groups
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::document::decode;
    use crate::record::ViolationKind;

    fn contact(name: &str) -> RawRecord {
        RawRecord::new()
            .with("name", name)
            .with("phone", "87438807")
            .with("email", "someone@example.com")
            .with("address", "Blk 30 Geylang Street 29")
    }

    fn property(name: &str, price: Value) -> RawRecord {
        RawRecord::new()
            .with("propertyName", name)
            .with("address", "123 Example St")
            .with("price", price)
    }

    fn interest(contact: &str, property: &str) -> RawRecord {
        RawRecord::new()
            .with("contact", contact)
            .with("property", property)
    }

    #[test]
    fn three_well_formed_records_are_all_valid() {
        let mut document = Document::new();
        document.contacts = vec![contact("Alex"), contact("Bernice"), contact("Charlotte")];
        let store = reconcile(document);
        let contacts = store.contacts();
        assert_eq!(contacts.valid.len(), 3);
        assert!(contacts.invalid.is_empty());
        let names = contacts
            .valid
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Alex", "Bernice", "Charlotte"]);
    }

    #[test]
    fn missing_name_is_reported_at_its_position() {
        let mut nameless = contact("x");
        nameless.set("name", Value::Null);
        let mut document = Document::new();
        document.contacts = vec![contact("Alex"), nameless, contact("Charlotte")];

        let store = reconcile(document);
        let contacts = store.contacts();
        assert_eq!(contacts.valid.len(), 2);
        assert_eq!(contacts.invalid.len(), 1);
        let report = &contacts.invalid[0];
        assert_eq!(report.position, 1);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].field, "name");
        assert_eq!(report.violations[0].kind.code(), "FIELD_MISSING");
        assert!(report.rendered.starts_with("{\"phone\""));
    }

    #[test]
    fn empty_documents_reconcile_to_nothing() {
        for bytes in [&b"{}"[..], br#"{"contacts": [], "properties": [], "interests": []}"#] {
            let store = reconcile(decode(bytes).expect("decodes"));
            for summary in store.summary() {
                assert_eq!((summary.total, summary.valid, summary.invalid), (0, 0, 0));
            }
            assert!(store.invalid_reports().is_empty());
            assert!(store.duplicates().is_empty());
        }
    }

    #[test]
    fn interests_resolve_only_against_valid_records() {
        let mut broken = contact("Bernice");
        broken.set("email", json!("nope"));
        let mut document = Document::new();
        document.contacts = vec![contact("Alex"), broken];
        document.properties = vec![property("Sunny Villa", json!(500000))];
        document.interests = vec![
            interest("alex", "SUNNY VILLA"),
            interest("Bernice", "Sunny Villa"),
            interest("Alex", "Ghost Tower"),
        ];

        let store = reconcile(document);
        let interests = store.interests();
        assert_eq!(interests.valid.len(), 1);
        let invalid = interests
            .invalid
            .iter()
            .map(|report| (report.position, report.violations[0].field.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(invalid, vec![(1, "contact"), (2, "property")]);
        assert_eq!(
            interests.invalid[0].violations[0].kind,
            ViolationKind::Unresolved
        );
    }

    #[test]
    fn duplicates_stay_valid_and_are_grouped() {
        let mut document = Document::new();
        document.contacts = vec![contact("Alex"), contact("Bernice"), contact("ALEX ")];
        document.properties = vec![
            property("Loft", json!(1)),
            property("loft", json!(2)),
            property("Villa", json!(3)),
        ];
        let store = reconcile(document);
        assert_eq!(store.contacts().valid.len(), 3);
        let groups = store.duplicates();
        assert_eq!(
            groups,
            vec![
                DuplicateGroup {
                    kind: RecordKind::Contact,
                    key: "alex".to_string(),
                    positions: vec![0, 2],
                },
                DuplicateGroup {
                    kind: RecordKind::Property,
                    key: "loft".to_string(),
                    positions: vec![0, 1],
                },
            ]
        );
    }

    #[test]
    fn replacing_a_contact_reresolves_only_its_edges() {
        let mut document = Document::new();
        document.contacts = vec![contact("Alex"), contact("Bernice")];
        document.properties = vec![property("Loft", json!(10))];
        document.interests = vec![interest("Alex", "Loft"), interest("Bernice", "Loft")];
        let mut store = reconcile(document);

        let change = store
            .replace(RecordKind::Contact, 0, contact("Alexander"))
            .expect("in range");
        assert_eq!(change.before, Status::Valid);
        assert_eq!(change.after, Status::Valid);
        assert_eq!(change.reresolved, 1);
        assert_eq!(store.status(RecordKind::Interest, 0), Ok(Status::Invalid));
        assert_eq!(store.status(RecordKind::Interest, 1), Ok(Status::Valid));

        store
            .replace(RecordKind::Interest, 0, interest("Alexander", "Loft"))
            .expect("in range");
        assert_eq!(store.status(RecordKind::Interest, 0), Ok(Status::Valid));
    }

    #[test]
    fn removing_a_property_invalidates_its_edges() {
        let mut document = Document::new();
        document.contacts = vec![contact("Alex")];
        document.properties = vec![property("Loft", json!(10)), property("Villa", json!(20))];
        document.interests = vec![interest("Alex", "Loft"), interest("Alex", "Villa")];
        let mut store = reconcile(document);

        let removed = store.remove(RecordKind::Property, 0).expect("in range");
        assert_eq!(removed.text("propertyName"), Some("Loft"));
        assert_eq!(store.len(RecordKind::Property), 1);
        assert_eq!(store.status(RecordKind::Interest, 0), Ok(Status::Invalid));
        assert_eq!(store.status(RecordKind::Interest, 1), Ok(Status::Valid));
        assert!(store.remove(RecordKind::Property, 1).is_err());
    }

    #[test]
    fn pushing_a_contact_resolves_waiting_edges() {
        let mut document = Document::new();
        document.properties = vec![property("Loft", json!(10))];
        document.interests = vec![interest("Dana", "Loft")];
        let mut store = reconcile(document);
        assert_eq!(store.status(RecordKind::Interest, 0), Ok(Status::Invalid));

        let position = store.push(RecordKind::Contact, contact("Dana"));
        assert_eq!(position, 0);
        assert_eq!(store.status(RecordKind::Interest, 0), Ok(Status::Valid));
    }

    #[test]
    fn numeric_endpoints_follow_their_records() {
        let mut document = Document::new();
        document.contacts = vec![contact("x").with("name", json!(12345))];
        document.properties = vec![property("Loft", json!(10))];
        document.interests = vec![RawRecord::new()
            .with("contact", json!(12345))
            .with("property", "Loft")];
        let mut store = reconcile(document);
        assert_eq!(store.status(RecordKind::Interest, 0), Ok(Status::Valid));
        assert_eq!(store.edges_pointing_at(INTEREST_CONTACT, "12345"), vec![0]);

        let change = store
            .replace(RecordKind::Contact, 0, contact("Renamed"))
            .expect("in range");
        assert_eq!(change.reresolved, 1);
        assert_eq!(store.status(RecordKind::Interest, 0), Ok(Status::Invalid));
        assert_eq!(
            store.interests(),
            reconcile(store.document().clone()).interests()
        );

        let message = &store.violations(RecordKind::Interest, 0).expect("in range")[0].message;
        assert_eq!(message, "no valid contact named '12345'");
    }

    #[test]
    fn reresolve_touches_only_indexed_edges() {
        let mut document = Document::new();
        document.contacts = vec![contact("Alex"), contact("Bernice")];
        document.properties = vec![property("Loft", json!(10))];
        document.interests = (0..50)
            .map(|_| interest("Bernice", "Loft"))
            .chain([interest("alex ", "Loft"), interest("Alex", "Loft")])
            .collect();
        let mut store = reconcile(document);

        let change = store
            .replace(RecordKind::Contact, 0, contact("Alexander"))
            .expect("in range");
        assert_eq!(change.reresolved, 2);
        assert_eq!(store.status(RecordKind::Interest, 50), Ok(Status::Invalid));
        assert_eq!(store.status(RecordKind::Interest, 51), Ok(Status::Invalid));
        assert_eq!(store.interests().valid.len(), 50);
    }

    #[test]
    fn edge_index_follows_interest_mutations() {
        let mut document = Document::new();
        document.contacts = vec![contact("Alex"), contact("Bernice")];
        document.properties = vec![property("Loft", json!(10))];
        document.interests = vec![
            interest("Alex", "Loft"),
            interest("Bernice", "Loft"),
            interest("Alex", "Loft"),
        ];
        let mut store = reconcile(document);

        store.remove(RecordKind::Interest, 0).expect("in range");
        assert_eq!(store.edges_pointing_at(INTEREST_CONTACT, "alex"), vec![1]);
        assert_eq!(store.edges_pointing_at(INTEREST_CONTACT, "bernice"), vec![0]);

        store
            .replace(RecordKind::Interest, 0, interest("Alex", "Loft"))
            .expect("in range");
        assert_eq!(store.edges_pointing_at(INTEREST_CONTACT, "alex"), vec![0, 1]);
        assert!(store.edges_pointing_at(INTEREST_CONTACT, "bernice").is_empty());

        let position = store.push(RecordKind::Interest, interest("Bernice", "Loft"));
        assert_eq!(store.edges_pointing_at(INTEREST_CONTACT, "bernice"), vec![position]);
        assert_eq!(store.edges_pointing_at(INTEREST_PROPERTY, "loft"), vec![0, 1, 2]);

        store.remove(RecordKind::Contact, 1).expect("in range");
        assert_eq!(store.status(RecordKind::Interest, position), Ok(Status::Invalid));
        assert_eq!(
            store.interests(),
            reconcile(store.document().clone()).interests()
        );
    }

    #[test]
    fn out_of_range_positions_report_length() {
        let store = reconcile(Document::new());
        let err = store
            .status(RecordKind::Property, 4)
            .expect_err("empty store");
        assert_eq!(err.len, 0);
        assert_eq!(err.code(), "RECORD_OUT_OF_RANGE");
        assert_eq!(
            err.to_string(),
            "property position 4 is out of range (0 properties stored)"
        );
    }
}

#[cfg(test)]
#[path = "reconcile_tests_ext.rs"]
mod tests_ext;
