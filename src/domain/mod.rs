pub mod contact;
pub mod fields;
pub mod interest;
pub mod property;

pub use contact::Contact;
pub use interest::Interest;
pub use property::Property;
