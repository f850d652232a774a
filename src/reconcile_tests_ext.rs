use proptest::prelude::*;
use serde_json::{json, Value};

use super::{reconcile, InvalidRecordReport, ReconciledStore, Status};
use crate::document::{decode, encode, Document};
use crate::record::{RawRecord, RecordKind};
use crate::repair::Corrections;

const NAMES: [&str; 5] = ["Alex Yeoh", "Bernice Yu", "Charlotte", "David Li", "Irfan"];
const PROPERTIES: [&str; 3] = ["Sunny Villa", "City Loft", "Hilltop Mansion"];

fn arb_contact() -> impl Strategy<Value = RawRecord> {
    (
        prop_oneof![
            prop::sample::select(NAMES.to_vec()).prop_map(Value::from),
            Just(Value::Null),
            Just(json!("*bad*")),
        ],
        prop_oneof![Just(json!("87438807")), Just(json!("12")), Just(json!(93210283))],
        prop_oneof![Just(json!("someone@example.com")), Just(json!("nope"))],
        prop::bool::ANY,
    )
        .prop_map(|(name, phone, email, with_address)| {
            let mut raw = RawRecord::new()
                .with("name", name)
                .with("phone", phone)
                .with("email", email);
            if with_address {
                raw.set("address", json!("Blk 30 Geylang Street 29"));
            }
            raw
        })
}

fn arb_property() -> impl Strategy<Value = RawRecord> {
    (
        prop::sample::select(PROPERTIES.to_vec()),
        prop_oneof![
            (1u64..5_000_000).prop_map(Value::from),
            (1u64..5_000_000).prop_map(|price| Value::from(price.to_string())),
            Just(json!(0)),
            Just(json!("cheap")),
            Just(Value::Null),
        ],
    )
        .prop_map(|(name, price)| {
            RawRecord::new()
                .with("propertyName", name)
                .with("address", "123 Example St")
                .with("price", price)
        })
}

fn arb_interest() -> impl Strategy<Value = RawRecord> {
    (
        prop_oneof![prop::sample::select(NAMES.to_vec()), Just("Ghost")],
        prop_oneof![prop::sample::select(PROPERTIES.to_vec()), Just("")],
    )
        .prop_map(|(contact, property)| {
            RawRecord::new()
                .with("contact", contact)
                .with("property", property)
        })
}

fn arb_document() -> impl Strategy<Value = Document> {
    (
        prop::collection::vec(arb_contact(), 0..12),
        prop::collection::vec(arb_property(), 0..8),
        prop::collection::vec(arb_interest(), 0..10),
    )
        .prop_map(|(contacts, properties, interests)| Document {
            contacts,
            properties,
            interests,
        })
}

fn arb_correction() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::sample::select(NAMES.to_vec()).prop_map(Value::from),
        Just(json!("12")),
        Just(json!("87438807")),
        Just(json!(500000)),
        Just(json!("cheap")),
        Just(Value::Null),
    ]
}

fn correction_field(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Contact => "phone",
        RecordKind::Property => "price",
        RecordKind::Interest => "contact",
    }
}

/// Invalid reports of `kind` everywhere except `position`.
fn reports_elsewhere(
    store: &ReconciledStore,
    kind: RecordKind,
    position: usize,
) -> Vec<InvalidRecordReport> {
    store
        .invalid_reports()
        .into_iter()
        .filter(|report| report.kind == kind && report.position != position)
        .collect()
}

proptest! {
    #[test]
    fn every_record_is_classified_exactly_once(document in arb_document()) {
        let store = reconcile(document.clone());
        for kind in RecordKind::ALL {
            let total = document.records(kind).len();
            let (valid, invalid_positions) = match kind {
                RecordKind::Contact => {
                    let result = store.contacts();
                    (result.valid.len(), result.invalid.iter().map(|r| r.position).collect::<Vec<_>>())
                }
                RecordKind::Property => {
                    let result = store.properties();
                    (result.valid.len(), result.invalid.iter().map(|r| r.position).collect::<Vec<_>>())
                }
                RecordKind::Interest => {
                    let result = store.interests();
                    (result.valid.len(), result.invalid.iter().map(|r| r.position).collect::<Vec<_>>())
                }
            };
            prop_assert_eq!(valid + invalid_positions.len(), total);

            let ascending = invalid_positions.windows(2).all(|pair| pair[0] < pair[1]);
            prop_assert!(ascending, "invalid reports must follow document order");
            for position in 0..total {
                let status = store.status(kind, position).expect("position in range");
                prop_assert_eq!(
                    status == Status::Invalid,
                    invalid_positions.contains(&position)
                );
            }
        }
    }

    #[test]
    fn reconciling_twice_gives_the_same_result(document in arb_document()) {
        let first = reconcile(document.clone());
        let second = reconcile(document);
        prop_assert_eq!(first.contacts(), second.contacts());
        prop_assert_eq!(first.properties(), second.properties());
        prop_assert_eq!(first.interests(), second.interests());
    }

    #[test]
    fn valid_records_survive_a_save_and_reload(document in arb_document()) {
        let store = reconcile(document);
        let bytes = encode(&store.valid_records_as_document()).expect("encode");
        let reloaded = reconcile(decode(&bytes).expect("decode"));

        prop_assert!(!reloaded.has_invalid());
        prop_assert_eq!(reloaded.contacts().valid, store.contacts().valid);
        prop_assert_eq!(reloaded.properties().valid, store.properties().valid);
        prop_assert_eq!(reloaded.interests().valid, store.interests().valid);
    }

    #[test]
    fn repair_leaves_other_records_of_its_kind_alone(
        document in arb_document(),
        kind in prop::sample::select(RecordKind::ALL.to_vec()),
        index in any::<usize>(),
        value in arb_correction(),
    ) {
        let total = document.records(kind).len();
        prop_assume!(total > 0);
        let position = index % total;
        let mut store = reconcile(document);
        let before = reports_elsewhere(&store, kind, position);

        let corrections = Corrections::new().with(correction_field(kind), value);
        let outcome = store.repair(kind, position, &corrections).expect("position in range");

        prop_assert_eq!(reports_elsewhere(&store, kind, position), before);
        prop_assert_eq!(store.status(kind, position).expect("in range"), outcome.after);
        prop_assert_eq!(store.len(kind), total);
        for summary in store.summary() {
            let reported = store
                .invalid_reports()
                .iter()
                .filter(|report| report.kind == summary.kind)
                .count();
            prop_assert_eq!(summary.valid + reported, store.len(summary.kind));
        }

        let fresh = reconcile(store.document().clone());
        prop_assert_eq!(store.contacts(), fresh.contacts());
        prop_assert_eq!(store.properties(), fresh.properties());
        prop_assert_eq!(store.interests(), fresh.interests());
    }
}
