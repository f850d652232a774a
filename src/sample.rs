use serde_json::Value;

use crate::document::Document;
use crate::record::codec::{
    ADDRESS, EMAIL, INTEREST_CONTACT, INTEREST_PROPERTY, LISTING, NAME, PHONE, PRICE,
    PROPERTY_NAME, TAGS,
};
use crate::record::RawRecord;

struct SampleContact {
    name: &'static str,
    phone: &'static str,
    email: &'static str,
    address: &'static str,
    listing: &'static str,
    tags: &'static [&'static str],
    interested_in: usize,
}

const PROPERTIES: [(&str, &str, u64); 3] = [
    ("Sunny Villa", "123 Example St", 500_000),
    ("City Loft", "45 Orchard Rd", 1_200_000),
    ("Hilltop Mansion", "7 Bukit Timah", 2_000_000),
];

/// `interested_in` counts how many of the sample properties, in order,
/// the contact is linked to.
const CONTACTS: [SampleContact; 6] = [
    SampleContact {
        name: "Alex Yeoh",
        phone: "87438807",
        email: "alexyeoh@example.com",
        address: "Blk 30 Geylang Street 29, #06-40",
        listing: "Condo",
        tags: &["friends"],
        interested_in: 0,
    },
    SampleContact {
        name: "Bernice Yu",
        phone: "99272758",
        email: "berniceyu@example.com",
        address: "Blk 30 Lorong 3 Serangoon Gardens, #07-18",
        listing: "HDB",
        tags: &["colleagues", "friends"],
        interested_in: 3,
    },
    SampleContact {
        name: "Charlotte Oliveiro",
        phone: "93210283",
        email: "charlotte@example.com",
        address: "Blk 11 Ang Mo Kio Street 74, #11-04",
        listing: "Landed Property",
        tags: &["neighbours"],
        interested_in: 1,
    },
    SampleContact {
        name: "David Li",
        phone: "91031282",
        email: "lidavid@example.com",
        address: "Blk 436 Serangoon Gardens Street 26, #16-43",
        listing: "Condo",
        tags: &["family"],
        interested_in: 2,
    },
    SampleContact {
        name: "Irfan Ibrahim",
        phone: "92492021",
        email: "irfan@example.com",
        address: "Blk 47 Tampines Street 20, #17-35",
        listing: "HDB",
        tags: &["classmates"],
        interested_in: 2,
    },
    SampleContact {
        name: "Roy Balakrishnan",
        phone: "92624417",
        email: "royb@example.com",
        address: "Blk 45 Aljunied Street 85, #11-31",
        listing: "Landed Property",
        tags: &["colleagues"],
        interested_in: 0,
    },
];

pub fn sample_document() -> Document {
    let mut document = Document::new();
    for contact in &CONTACTS {
        document.contacts.push(
            RawRecord::new()
                .with(NAME, contact.name)
                .with(PHONE, contact.phone)
                .with(EMAIL, contact.email)
                .with(ADDRESS, contact.address)
                .with(LISTING, contact.listing)
                .with(TAGS, Value::from(contact.tags.to_vec())),
        );
        for (property, _, _) in PROPERTIES.iter().take(contact.interested_in) {
            document.interests.push(
                RawRecord::new()
                    .with(INTEREST_CONTACT, contact.name)
                    .with(INTEREST_PROPERTY, *property),
            );
        }
    }
    for (name, address, price) in PROPERTIES {
        document.properties.push(
            RawRecord::new()
                .with(PROPERTY_NAME, name)
                .with(ADDRESS, address)
                .with(PRICE, price),
        );
    }
    document
}
