use super::{
    format_contact_row, format_invalid_record, format_property_row, group_thousands, Palette,
};
use crate::app::{ContactView, PropertyView};
use crate::reconcile::InvalidRecordReport;
use crate::record::{FieldViolation, RecordKind};

fn plain() -> Palette {
    Palette { enabled: false }
}

fn sample_contact() -> ContactView {
    ContactView {
        index: 2,
        name: "Bernice Yu".to_string(),
        phone: "99272758".to_string(),
        email: "berniceyu@example.com".to_string(),
        address: "Blk 30 Lorong 3".to_string(),
        listing: Some("HDB".to_string()),
        tags: vec!["colleagues".to_string(), "friends".to_string()],
        interested_in: vec!["Sunny Villa".to_string()],
    }
}

#[test]
fn contact_row_shows_listing_tags_and_interests() {
    let row = format_contact_row(&sample_contact(), &plain());
    assert!(row.starts_with("2. Bernice Yu 99272758"));
    assert!(row.contains("(HDB)"));
    assert!(row.contains("#colleagues #friends"));
    assert!(row.ends_with("-> Sunny Villa"));
}

#[test]
fn contact_row_omits_empty_optional_parts() {
    let mut contact = sample_contact();
    contact.listing = None;
    contact.tags.clear();
    contact.interested_in.clear();
    let row = format_contact_row(&contact, &plain());
    assert_eq!(
        row,
        "2. Bernice Yu 99272758 berniceyu@example.com Blk 30 Lorong 3"
    );
}

#[test]
fn property_row_groups_price_digits() {
    let property = PropertyView {
        index: 1,
        property_name: "City Loft".to_string(),
        address: "45 Orchard Rd".to_string(),
        price: 1_200_000,
        interested_contacts: vec!["David Li".to_string()],
    };
    assert_eq!(
        format_property_row(&property, &plain()),
        "1. City Loft $1,200,000 45 Orchard Rd <- David Li"
    );
}

#[test]
fn thousands_grouping_handles_short_numbers() {
    assert_eq!(group_thousands(7), "7");
    assert_eq!(group_thousands(999), "999");
    assert_eq!(group_thousands(1000), "1,000");
    assert_eq!(group_thousands(123_456_789), "123,456,789");
}

#[test]
fn invalid_record_lines_use_one_based_positions() {
    let report = InvalidRecordReport {
        kind: RecordKind::Contact,
        position: 0,
        violations: vec![FieldViolation::missing(RecordKind::Contact, "email")],
        rendered: r#"{"name":"Broken"}"#.to_string(),
    };
    let lines = format_invalid_record(&report, &plain());
    assert_eq!(lines[0], r#"  contact #1 {"name":"Broken"}"#);
    assert_eq!(lines[1], "    - email: Contact's email field is missing");
}

#[test]
fn disabled_palette_leaves_text_untouched() {
    let palette = plain();
    assert_eq!(palette.heading("Contacts"), "Contacts");
    assert_eq!(palette.error("x"), "x");
    let colored = Palette { enabled: true };
    assert_eq!(colored.ok("ok"), "\x1b[32mok\x1b[0m");
}
