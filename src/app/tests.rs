use super::{
    history_log, init_store, recent_history, App, AppError, ContactFilter, ContactInput,
    ContactPatch, PropertyInput, PropertyPatch, SIMILAR_PROPERTY_WARNING,
};
use crate::config::Config;
use crate::record::RecordKind;
use crate::repair::{Corrections, RecordPosition};
use std::path::{Path, PathBuf};
use uuid::Uuid;

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("propbook-app-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("temp workspace should be creatable");
    root
}

fn open_app(root: &Path) -> App {
    App::open(Config::defaults(root)).expect("app should open")
}

fn contact_input(name: &str) -> ContactInput {
    ContactInput {
        name: name.to_string(),
        phone: "87438807".to_string(),
        email: "someone@example.com".to_string(),
        address: "Blk 30 Geylang Street 29".to_string(),
        listing: Some("Condo".to_string()),
        tags: vec!["friends".to_string()],
    }
}

fn property_input(name: &str, price: &str) -> PropertyInput {
    PropertyInput {
        property_name: name.to_string(),
        address: "123 Example St".to_string(),
        price: price.to_string(),
    }
}

fn write_store(root: &Path, body: &str) {
    let path = Config::defaults(root).data_file;
    std::fs::create_dir_all(path.parent().expect("data dir")).expect("data dir creatable");
    std::fs::write(path, body).expect("store fixture should write");
}

#[test]
fn add_contact_saves_and_reopens() {
    let root = unique_workspace();
    let mut app = open_app(&root);
    let view = app
        .add_contact(contact_input("Alex Yeoh"))
        .expect("add should succeed");
    assert_eq!(view.index, 1);
    assert_eq!(view.listing.as_deref(), Some("Condo"));

    let reopened = open_app(&root);
    let contacts = reopened.list_contacts();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].name, "Alex Yeoh");
    assert_eq!(contacts[0].tags, vec!["friends"]);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn add_contact_reports_every_violation_and_rejects_duplicates() {
    let root = unique_workspace();
    let mut app = open_app(&root);
    let mut bad = contact_input("Alex Yeoh");
    bad.phone = "12".to_string();
    bad.email = "nope".to_string();
    let err = app.add_contact(bad).expect_err("invalid contact");
    match &err {
        AppError::InvalidRecord { kind, violations } => {
            assert_eq!(*kind, RecordKind::Contact);
            assert_eq!(violations.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.code(), "RECORD_INVALID");

    app.add_contact(contact_input("Alex Yeoh"))
        .expect("first add succeeds");
    let err = app
        .add_contact(contact_input("alex yeoh"))
        .expect_err("case-insensitive duplicate");
    assert!(matches!(err, AppError::Duplicate { .. }));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn renaming_a_contact_carries_interest_edges() {
    let root = unique_workspace();
    let mut app = open_app(&root);
    app.add_contact(contact_input("Alex Yeoh")).expect("add contact");
    app.add_property(property_input("Sunny Villa", "500000"))
        .expect("add property");
    app.link_interest(1, "sunny villa").expect("link");

    let edited = app
        .edit_contact(
            1,
            ContactPatch {
                name: Some("Alexander Yeoh".to_string()),
                ..ContactPatch::default()
            },
        )
        .expect("rename should succeed");
    assert_eq!(edited.name, "Alexander Yeoh");
    assert_eq!(edited.interested_in, vec!["Sunny Villa"]);

    let reopened = open_app(&root);
    let interests = reopened.list_interests();
    assert_eq!(interests.len(), 1);
    assert_eq!(interests[0].contact, "Alexander Yeoh");
    assert!(!reopened.store().has_invalid());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn edit_requires_changes_and_valid_index() {
    let root = unique_workspace();
    let mut app = open_app(&root);
    app.add_contact(contact_input("Alex Yeoh")).expect("add contact");
    assert!(matches!(
        app.edit_contact(1, ContactPatch::default()),
        Err(AppError::InvalidArgument(_))
    ));
    let err = app
        .edit_contact(
            3,
            ContactPatch {
                phone: Some("999".to_string()),
                ..ContactPatch::default()
            },
        )
        .expect_err("index 3 does not exist");
    assert_eq!(err.code(), "RECORD_OUT_OF_RANGE");
    assert_eq!(err.to_string(), "no contact at index 3 (1 listed)");

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn deleting_a_property_removes_its_edges() {
    let root = unique_workspace();
    let mut app = open_app(&root);
    app.add_contact(contact_input("Alex Yeoh")).expect("add contact");
    app.add_property(property_input("Sunny Villa", "500000"))
        .expect("add property");
    app.add_property(property_input("City Loft", "1200000"))
        .expect("add property");
    app.link_interest(1, "Sunny Villa").expect("link");
    app.link_interest(1, "City Loft").expect("link");

    let removed = app.delete_property(1).expect("delete");
    assert_eq!(removed.property_name, "Sunny Villa");
    assert_eq!(removed.interested_contacts, vec!["Alex Yeoh"]);

    let interests = app.list_interests();
    assert_eq!(interests.len(), 1);
    assert_eq!(interests[0].property, "City Loft");
    assert_eq!(app.store().document().interests.len(), 1);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn similar_property_names_warn_but_save() {
    let root = unique_workspace();
    let mut app = open_app(&root);
    let first = app
        .add_property(property_input("Sunny Villa", "500000"))
        .expect("add");
    assert!(first.warning.is_none());
    let second = app
        .add_property(property_input("SunnyVilla", "600000"))
        .expect("similar names are allowed");
    assert_eq!(second.warning.as_deref(), Some(SIMILAR_PROPERTY_WARNING));

    let edited = app
        .edit_property(
            2,
            PropertyPatch {
                price: Some("650000".to_string()),
                ..PropertyPatch::default()
            },
        )
        .expect("edit");
    assert_eq!(edited.property.price, 650000);
    assert_eq!(edited.warning.as_deref(), Some(SIMILAR_PROPERTY_WARNING));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn linking_rejects_unknown_property_and_duplicate_edges() {
    let root = unique_workspace();
    let mut app = open_app(&root);
    app.add_contact(contact_input("Alex Yeoh")).expect("add contact");
    app.add_property(property_input("Sunny Villa", "500000"))
        .expect("add property");

    assert!(matches!(
        app.link_interest(1, "Ghost Tower"),
        Err(AppError::NotFound(_))
    ));
    app.link_interest(1, "Sunny Villa").expect("link");
    assert!(matches!(
        app.link_interest(1, " SUNNY VILLA "),
        Err(AppError::Duplicate { .. })
    ));
    assert_eq!(app.unlink_interest(1, "sunny villa").expect("unlink"), 1);
    assert!(matches!(
        app.unlink_interest(1, "Sunny Villa"),
        Err(AppError::NotFound(_))
    ));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn invalid_records_survive_unrelated_mutations() {
    let root = unique_workspace();
    write_store(
        &root,
        r#"{"contacts": [{"name": "Broken", "phone": "1"}], "properties": [], "interests": []}"#,
    );
    let mut app = open_app(&root);
    assert_eq!(app.load_report().invalid.len(), 1);

    app.add_contact(contact_input("Alex Yeoh")).expect("add contact");
    let reopened = open_app(&root);
    let report = reopened.load_report();
    assert_eq!(report.invalid.len(), 1);
    assert_eq!(report.invalid[0].position, 0);
    assert_eq!(reopened.list_contacts().len(), 1);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn repair_saves_unless_dry_run() {
    let root = unique_workspace();
    write_store(
        &root,
        r#"{"properties": [
            {"propertyName": "Sunny Villa", "address": "123 Example St", "price": 500000},
            {"propertyName": "City Loft", "address": "45 Orchard Rd", "price": "abc"}
        ]}"#,
    );
    let corrections = Corrections::new().with("price", 1200000);
    let position = RecordPosition::one_based(2).expect("position");

    let mut app = open_app(&root);
    let outcome = app
        .repair(RecordKind::Property, position, &corrections, true)
        .expect("dry run");
    assert!(outcome.fixed());
    assert_eq!(open_app(&root).list_properties().len(), 1);

    let mut app = open_app(&root);
    app.repair(RecordKind::Property, position, &corrections, false)
        .expect("repair");
    assert_eq!(open_app(&root).list_properties().len(), 2);

    let err = app
        .repair(
            RecordKind::Property,
            RecordPosition::one_based(99).expect("position"),
            &corrections,
            false,
        )
        .expect_err("out of range");
    assert_eq!(err.code(), "RECORD_OUT_OF_RANGE");
    assert!(matches!(
        app.repair(RecordKind::Property, position, &Corrections::new(), false),
        Err(AppError::InvalidArgument(_))
    ));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn discard_drops_raw_record_and_orphaned_edges() {
    let root = unique_workspace();
    write_store(
        &root,
        r#"{
            "contacts": [{"name": "Alex Yeoh", "phone": "87438807", "email": "a@example.com", "address": "X"}],
            "properties": [{"propertyName": "Sunny Villa", "price": 5}],
            "interests": [{"contact": "Alex Yeoh", "property": "Sunny Villa"}]
        }"#,
    );
    let mut app = open_app(&root);
    let outcome = app
        .discard(RecordKind::Property, RecordPosition::zero_based(0))
        .expect("discard");
    assert_eq!(outcome.removed_edges, 1);
    assert_eq!(outcome.rendered, r#"{"propertyName":"Sunny Villa","price":5}"#);

    let reopened = open_app(&root);
    assert_eq!(reopened.store().document().total(), 1);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let root = unique_workspace();
    let config = Config::defaults(&root);
    init_store(&config, true, false).expect("first init");
    assert!(matches!(
        init_store(&config, false, false),
        Err(AppError::AlreadyInitialized(_))
    ));
    assert_eq!(open_app(&root).list_contacts().len(), 6);

    init_store(&config, false, true).expect("forced init");
    assert!(open_app(&root).list_contacts().is_empty());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn export_uses_configured_directory() {
    let root = unique_workspace();
    let config = Config::defaults(&root);
    init_store(&config, true, false).expect("init");
    let app = open_app(&root);
    let summary = app.export(Some("book")).expect("export");
    assert_eq!(summary.path, config.export_dir.join("book.csv"));
    assert_eq!((summary.contacts, summary.properties), (6, 3));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn history_reads_recorded_commands() {
    let root = unique_workspace();
    let config = Config::defaults(&root);
    history_log(&config).record("ls contacts").expect("record");
    history_log(&config).record("load").expect("record");
    let entries = recent_history(&config, Some(1)).expect("history");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].command, "load");

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn malformed_store_fails_to_open() {
    let root = unique_workspace();
    write_store(&root, "[1, 2");
    let err = App::open(Config::defaults(&root))
        .err()
        .expect("malformed store");
    assert_eq!(err.code(), "DOCUMENT_MALFORMED");

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn contact_filters_match_whole_words_or_tags() {
    let root = unique_workspace();
    let config = Config::defaults(&root);
    init_store(&config, true, false).expect("sample store");
    let app = open_app(&root);

    let by_name = ContactFilter::from_flags(&["ALEX li".to_string()], None).expect("keywords");
    let names = app
        .find_contacts(&by_name)
        .into_iter()
        .map(|contact| (contact.index, contact.name))
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![(1, "Alex Yeoh".to_string()), (4, "David Li".to_string())]
    );

    let partial = ContactFilter::from_flags(&["Ale".to_string()], None).expect("keywords");
    assert!(app.find_contacts(&partial).is_empty());

    let by_tag = ContactFilter::from_flags(&[], Some(" Colleagues ")).expect("tag");
    let indexes = app
        .find_contacts(&by_tag)
        .iter()
        .map(|contact| contact.index)
        .collect::<Vec<_>>();
    assert_eq!(indexes, vec![2, 6]);

    assert_eq!(
        ContactFilter::from_flags(&[], None).expect("no filter"),
        ContactFilter::All
    );
    assert_eq!(app.find_contacts(&ContactFilter::All), app.list_contacts());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn contact_filters_reject_blank_or_combined_input() {
    let blank_name = ContactFilter::from_flags(&["   ".to_string()], None)
        .expect_err("blank keywords");
    assert_eq!(blank_name.code(), "INVALID_ARGUMENT");
    let blank_tag = ContactFilter::from_flags(&[], Some("  ")).expect_err("blank tag");
    assert_eq!(blank_tag.code(), "INVALID_ARGUMENT");
    let both = ContactFilter::from_flags(&["Alice".to_string()], Some("friends"))
        .expect_err("name and tag together");
    assert!(both.to_string().contains("not both"));
}
