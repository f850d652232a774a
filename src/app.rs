use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::document::Document;
use crate::domain::fields::{identity_key, PropertyName};
use crate::domain::{Contact, Property};
use crate::export::{self, ExportError, ExportSummary};
use crate::history::{HistoryEntry, HistoryError, HistoryLog};
use crate::reconcile::{
    DuplicateGroup, InvalidRecordReport, KindSummary, PositionOutOfRange, ReconciledStore,
};
use crate::record::codec::{
    ADDRESS, EMAIL, INTEREST_CONTACT, INTEREST_PROPERTY, LISTING, NAME, PHONE, PRICE,
    PROPERTY_NAME, TAGS,
};
use crate::record::{
    render, ContactCodec, FieldViolation, InterestCodec, ParseRecordKindError, PropertyCodec,
    RawRecord, RecordCodec, RecordKind,
};
use crate::repair::{Corrections, RecordPosition, RepairError, RepairOutcome};
use crate::sample::sample_document;
use crate::store::{StoreError, StoreGateway};

pub const SIMILAR_PROPERTY_WARNING: &str = "Warning: A similar property name already exists";

pub struct App {
    gateway: StoreGateway,
    config: Config,
    store: ReconciledStore,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContactView {
    pub index: usize,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<String>,
    pub tags: Vec<String>,
    pub interested_in: Vec<String>,
}

/// Which valid contacts a listing shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactFilter {
    All,
    /// Lowercased keywords; a contact matches when any keyword equals a
    /// whole word of its name.
    Name(Vec<String>),
    /// Lowercased tag, compared without case.
    Tag(String),
}

impl ContactFilter {
    pub fn from_flags(keywords: &[String], tag: Option<&str>) -> Result<Self, AppError> {
        match (keywords.is_empty(), tag) {
            (true, None) => Ok(ContactFilter::All),
            (false, Some(_)) => Err(AppError::InvalidArgument(
                "filter by --name or by --tag, not both".to_string(),
            )),
            (false, None) => {
                let words = keywords
                    .iter()
                    .flat_map(|keyword| keyword.split_whitespace())
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>();
                if words.is_empty() {
                    return Err(AppError::InvalidArgument(
                        "--name needs at least one keyword".to_string(),
                    ));
                }
                Ok(ContactFilter::Name(words))
            }
            (true, Some(tag)) => match tag.trim() {
                "" => Err(AppError::InvalidArgument("--tag needs a tag".to_string())),
                tag => Ok(ContactFilter::Tag(tag.to_lowercase())),
            },
        }
    }

    fn matches(&self, contact: &Contact) -> bool {
        match self {
            ContactFilter::All => true,
            ContactFilter::Name(keywords) => contact
                .name
                .as_str()
                .split_whitespace()
                .any(|word| keywords.contains(&word.to_lowercase())),
            ContactFilter::Tag(tag) => contact
                .tag_list()
                .into_iter()
                .any(|candidate| candidate.to_lowercase() == *tag),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyView {
    pub index: usize,
    pub property_name: String,
    pub address: String,
    pub price: u64,
    pub interested_contacts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InterestView {
    pub index: usize,
    pub contact: String,
    pub property: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoadReport {
    pub path: PathBuf,
    pub summary: Vec<KindSummary>,
    pub invalid: Vec<InvalidRecordReport>,
    pub duplicates: Vec<DuplicateGroup>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DiscardOutcome {
    pub kind: RecordKind,
    pub position: usize,
    pub rendered: String,
    pub removed_edges: usize,
}

/// A property mutation result plus the similar-name warning, if any.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PropertyChange {
    pub property: PropertyView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactInput {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub listing: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub listing: Option<String>,
    pub clear_listing: bool,
    pub tags: Option<Vec<String>>,
}

impl ContactPatch {
    fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.phone.is_some()
            || self.email.is_some()
            || self.address.is_some()
            || self.listing.is_some()
            || self.clear_listing
            || self.tags.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PropertyInput {
    pub property_name: String,
    pub address: String,
    pub price: String,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyPatch {
    pub property_name: Option<String>,
    pub address: Option<String>,
    pub price: Option<String>,
}

impl PropertyPatch {
    fn has_changes(&self) -> bool {
        self.property_name.is_some() || self.address.is_some() || self.price.is_some()
    }
}

/// Writes a fresh store at the configured data path.
pub fn init_store(config: &Config, sample: bool, force: bool) -> Result<PathBuf, AppError> {
    let gateway = StoreGateway::new(&config.data_file);
    if !force && config.data_file.exists() {
        return Err(AppError::AlreadyInitialized(config.data_file.clone()));
    }
    let document = if sample {
        sample_document()
    } else {
        Document::new()
    };
    gateway.save(&document)?;
    tracing::info!(path = %config.data_file.display(), sample, "initialized store");
    Ok(config.data_file.clone())
}

impl App {
    pub fn open(config: Config) -> Result<Self, AppError> {
        let gateway = StoreGateway::new(&config.data_file);
        let store = gateway.load_and_reconcile()?;
        Ok(Self {
            gateway,
            config,
            store,
        })
    }

    pub fn data_path(&self) -> &Path {
        self.gateway.path()
    }

    pub fn store(&self) -> &ReconciledStore {
        &self.store
    }

    pub fn load_report(&self) -> LoadReport {
        LoadReport {
            path: self.gateway.path().to_path_buf(),
            summary: self.store.summary(),
            invalid: self.store.invalid_reports(),
            duplicates: self.store.duplicates(),
        }
    }

    pub fn list_contacts(&self) -> Vec<ContactView> {
        self.find_contacts(&ContactFilter::All)
    }

    /// Matching contacts keep their full-list display index, so the result
    /// can be fed straight to `edit-contact` or `delete-contact`.
    pub fn find_contacts(&self, filter: &ContactFilter) -> Vec<ContactView> {
        let found = self
            .store
            .valid_contacts()
            .enumerate()
            .filter(|(_, (_, contact))| filter.matches(contact))
            .map(|(index, (_, contact))| self.contact_view(index, contact))
            .collect::<Vec<_>>();
        tracing::debug!(?filter, found = found.len(), "filtered contacts");
        found
    }

    pub fn list_properties(&self) -> Vec<PropertyView> {
        self.store
            .valid_properties()
            .enumerate()
            .map(|(index, (_, property))| self.property_view(index, property))
            .collect()
    }

    pub fn list_interests(&self) -> Vec<InterestView> {
        self.store
            .valid_interests()
            .enumerate()
            .map(|(index, (_, interest))| InterestView {
                index: index + 1,
                contact: interest.contact.as_str().to_string(),
                property: interest.property.as_str().to_string(),
            })
            .collect()
    }

    pub fn add_contact(&mut self, input: ContactInput) -> Result<ContactView, AppError> {
        let mut raw = RawRecord::new()
            .with(NAME, input.name)
            .with(PHONE, input.phone)
            .with(EMAIL, input.email)
            .with(ADDRESS, input.address)
            .with(TAGS, input.tags);
        if let Some(listing) = input.listing {
            raw.set(LISTING, Value::from(listing));
        }
        let contact = validated::<ContactCodec>(&raw)?;
        if self.store.has_contact_key(&contact.key()) {
            return Err(AppError::Duplicate {
                kind: RecordKind::Contact,
                name: contact.name.as_str().to_string(),
            });
        }

        self.store
            .push(RecordKind::Contact, ContactCodec::to_raw(&contact));
        self.save()?;
        Ok(self.contact_view(self.store.valid_contacts().count() - 1, &contact))
    }

    /// Edits the contact shown at `index`. A rename carries its interest
    /// edges along.
    pub fn edit_contact(
        &mut self,
        index: usize,
        patch: ContactPatch,
    ) -> Result<ContactView, AppError> {
        if !patch.has_changes() {
            return Err(AppError::InvalidArgument(
                "no fields to edit; pass at least one field flag".to_string(),
            ));
        }
        let (position, current) = self.valid_contact_at(index)?;
        let old_key = current.key();

        let mut raw = self.store.raw(RecordKind::Contact, position)?.clone();
        set_text(&mut raw, NAME, patch.name);
        set_text(&mut raw, PHONE, patch.phone);
        set_text(&mut raw, EMAIL, patch.email);
        set_text(&mut raw, ADDRESS, patch.address);
        if patch.clear_listing {
            raw.set(LISTING, Value::Null);
        }
        set_text(&mut raw, LISTING, patch.listing);
        if let Some(tags) = patch.tags {
            raw.set(TAGS, Value::from(tags));
        }

        let contact = validated::<ContactCodec>(&raw)?;
        let new_key = contact.key();
        if new_key != old_key && self.store.has_contact_key(&new_key) {
            return Err(AppError::Duplicate {
                kind: RecordKind::Contact,
                name: contact.name.as_str().to_string(),
            });
        }

        self.store
            .replace(RecordKind::Contact, position, ContactCodec::to_raw(&contact))?;
        if new_key != old_key && !self.store.has_contact_key(&old_key) {
            self.rename_edges(INTEREST_CONTACT, &old_key, contact.name.as_str())?;
        }
        self.save()?;
        Ok(self.contact_view(index - 1, &contact))
    }

    pub fn delete_contact(&mut self, index: usize) -> Result<ContactView, AppError> {
        let (position, contact) = self.valid_contact_at(index)?;
        let view = self.contact_view(index - 1, &contact);
        self.store.remove(RecordKind::Contact, position)?;
        if !self.store.has_contact_key(&contact.key()) {
            self.remove_edges(INTEREST_CONTACT, &contact.key())?;
        }
        self.save()?;
        Ok(view)
    }

    pub fn add_property(&mut self, input: PropertyInput) -> Result<PropertyChange, AppError> {
        let raw = RawRecord::new()
            .with(PROPERTY_NAME, input.property_name)
            .with(ADDRESS, input.address)
            .with(PRICE, price_value(input.price));
        let property = validated::<PropertyCodec>(&raw)?;
        if self.store.has_property_key(&property.key()) {
            return Err(AppError::Duplicate {
                kind: RecordKind::Property,
                name: property.property_name.as_str().to_string(),
            });
        }
        let warning = self.similar_property_warning(&property.property_name, None);

        self.store
            .push(RecordKind::Property, PropertyCodec::to_raw(&property));
        self.save()?;
        let index = self.store.valid_properties().count() - 1;
        Ok(PropertyChange {
            property: self.property_view(index, &property),
            warning,
        })
    }

    pub fn edit_property(
        &mut self,
        index: usize,
        patch: PropertyPatch,
    ) -> Result<PropertyChange, AppError> {
        if !patch.has_changes() {
            return Err(AppError::InvalidArgument(
                "no fields to edit; pass at least one field flag".to_string(),
            ));
        }
        let (position, current) = self.valid_property_at(index)?;
        let old_key = current.key();

        let mut raw = self.store.raw(RecordKind::Property, position)?.clone();
        set_text(&mut raw, PROPERTY_NAME, patch.property_name);
        set_text(&mut raw, ADDRESS, patch.address);
        if let Some(price) = patch.price {
            raw.set(PRICE, price_value(price));
        }

        let property = validated::<PropertyCodec>(&raw)?;
        let new_key = property.key();
        if new_key != old_key && self.store.has_property_key(&new_key) {
            return Err(AppError::Duplicate {
                kind: RecordKind::Property,
                name: property.property_name.as_str().to_string(),
            });
        }
        let warning = self.similar_property_warning(&property.property_name, Some(position));

        self.store
            .replace(RecordKind::Property, position, PropertyCodec::to_raw(&property))?;
        if new_key != old_key && !self.store.has_property_key(&old_key) {
            self.rename_edges(INTEREST_PROPERTY, &old_key, property.property_name.as_str())?;
        }
        self.save()?;
        Ok(PropertyChange {
            property: self.property_view(index - 1, &property),
            warning,
        })
    }

    pub fn delete_property(&mut self, index: usize) -> Result<PropertyView, AppError> {
        let (position, property) = self.valid_property_at(index)?;
        let view = self.property_view(index - 1, &property);
        self.store.remove(RecordKind::Property, position)?;
        if !self.store.has_property_key(&property.key()) {
            self.remove_edges(INTEREST_PROPERTY, &property.key())?;
        }
        self.save()?;
        Ok(view)
    }

    pub fn link_interest(
        &mut self,
        contact_index: usize,
        property_name: &str,
    ) -> Result<InterestView, AppError> {
        let (_, contact) = self.valid_contact_at(contact_index)?;
        let property = self.known_property(property_name)?;
        let already_linked = self
            .store
            .valid_interests()
            .any(|(_, interest)| interest.links(&contact.key(), &property.key()));
        if already_linked {
            return Err(AppError::Duplicate {
                kind: RecordKind::Interest,
                name: format!("{} -> {}", contact.name, property),
            });
        }

        let raw = RawRecord::new()
            .with(INTEREST_CONTACT, contact.name.as_str())
            .with(INTEREST_PROPERTY, property.as_str());
        let interest = validated::<InterestCodec>(&raw)?;
        self.store.push(RecordKind::Interest, raw);
        self.save()?;
        Ok(InterestView {
            index: self.store.valid_interests().count(),
            contact: interest.contact.as_str().to_string(),
            property: interest.property.as_str().to_string(),
        })
    }

    /// Removes every edge between the contact and the named property.
    pub fn unlink_interest(
        &mut self,
        contact_index: usize,
        property_name: &str,
    ) -> Result<usize, AppError> {
        let (_, contact) = self.valid_contact_at(contact_index)?;
        let property_key = identity_key(property_name);
        let positions = self
            .store
            .valid_interests()
            .filter(|(_, interest)| interest.links(&contact.key(), &property_key))
            .map(|(position, _)| position)
            .collect::<Vec<_>>();
        if positions.is_empty() {
            return Err(AppError::NotFound(format!(
                "{} is not interested in '{}'",
                contact.name,
                property_name.trim()
            )));
        }
        for position in positions.iter().rev() {
            self.store.remove(RecordKind::Interest, *position)?;
        }
        self.save()?;
        Ok(positions.len())
    }

    /// Repairs one raw record in memory and saves unless `dry_run`.
    pub fn repair(
        &mut self,
        kind: RecordKind,
        position: RecordPosition,
        corrections: &Corrections,
        dry_run: bool,
    ) -> Result<RepairOutcome, AppError> {
        self.store.raw(kind, position.index())?;
        if corrections.is_empty() {
            return Err(AppError::InvalidArgument(
                "nothing to repair; pass at least one --set field=value".to_string(),
            ));
        }
        let outcome = self.store.repair(kind, position.index(), corrections)?;
        if !dry_run {
            self.save()?;
        }
        Ok(outcome)
    }

    /// Drops one raw record by document position. Dropping a contact or
    /// property also drops the edges that pointed only at it.
    pub fn discard(
        &mut self,
        kind: RecordKind,
        position: RecordPosition,
    ) -> Result<DiscardOutcome, AppError> {
        let removed = self.store.remove(kind, position.index())?;
        let removed_edges = match kind {
            RecordKind::Contact => self.drop_orphaned_edges(INTEREST_CONTACT, &removed, NAME)?,
            RecordKind::Property => {
                self.drop_orphaned_edges(INTEREST_PROPERTY, &removed, PROPERTY_NAME)?
            }
            RecordKind::Interest => 0,
        };
        self.save()?;
        Ok(DiscardOutcome {
            kind,
            position: position.index(),
            rendered: render(&removed),
            removed_edges,
        })
    }

    pub fn export(&self, name: Option<&str>) -> Result<ExportSummary, AppError> {
        Ok(export::export(&self.store, &self.config.export_dir, name)?)
    }

    fn save(&self) -> Result<(), AppError> {
        self.gateway.save(self.store.document())?;
        Ok(())
    }

    fn valid_contact_at(&self, index: usize) -> Result<(usize, Contact), AppError> {
        let len = self.store.valid_contacts().count();
        index
            .checked_sub(1)
            .and_then(|offset| self.store.valid_contacts().nth(offset))
            .map(|(position, contact)| (position, contact.clone()))
            .ok_or(AppError::IndexOutOfRange {
                kind: RecordKind::Contact,
                index,
                len,
            })
    }

    fn valid_property_at(&self, index: usize) -> Result<(usize, Property), AppError> {
        let len = self.store.valid_properties().count();
        index
            .checked_sub(1)
            .and_then(|offset| self.store.valid_properties().nth(offset))
            .map(|(position, property)| (position, property.clone()))
            .ok_or(AppError::IndexOutOfRange {
                kind: RecordKind::Property,
                index,
                len,
            })
    }

    fn known_property(&self, raw_name: &str) -> Result<PropertyName, AppError> {
        let key = identity_key(raw_name);
        self.store
            .valid_properties()
            .find(|(_, property)| property.key() == key)
            .map(|(_, property)| property.property_name.clone())
            .ok_or_else(|| AppError::NotFound(format!("no property named '{}'", raw_name.trim())))
    }

    fn similar_property_warning(
        &self,
        name: &PropertyName,
        skip_position: Option<usize>,
    ) -> Option<String> {
        let similar = self.store.valid_properties().any(|(position, other)| {
            Some(position) != skip_position
                && other.key() != name.key()
                && other.property_name.similarity_key() == name.similarity_key()
        });
        similar.then(|| SIMILAR_PROPERTY_WARNING.to_string())
    }

    fn rename_edges(&mut self, endpoint: &str, old_key: &str, new_name: &str) -> Result<(), AppError> {
        for position in self.store.edges_pointing_at(endpoint, old_key) {
            let raw = self
                .store
                .raw(RecordKind::Interest, position)?
                .clone()
                .with(endpoint, new_name);
            self.store.replace(RecordKind::Interest, position, raw)?;
        }
        Ok(())
    }

    fn remove_edges(&mut self, endpoint: &str, key: &str) -> Result<usize, AppError> {
        let positions = self.store.edges_pointing_at(endpoint, key);
        for position in positions.iter().rev() {
            self.store.remove(RecordKind::Interest, *position)?;
        }
        Ok(positions.len())
    }

    /// Edges are only dropped when no remaining valid record carries the
    /// removed record's key.
    fn drop_orphaned_edges(
        &mut self,
        endpoint: &str,
        removed: &RawRecord,
        name_field: &str,
    ) -> Result<usize, AppError> {
        let Some(key) = removed.key_of(name_field) else {
            return Ok(0);
        };
        let still_present = match endpoint {
            INTEREST_CONTACT => self.store.has_contact_key(&key),
            _ => self.store.has_property_key(&key),
        };
        if still_present {
            return Ok(0);
        }
        self.remove_edges(endpoint, &key)
    }

    fn contact_view(&self, offset: usize, contact: &Contact) -> ContactView {
        let key = contact.key();
        ContactView {
            index: offset + 1,
            name: contact.name.as_str().to_string(),
            phone: contact.phone.as_str().to_string(),
            email: contact.email.as_str().to_string(),
            address: contact.address.as_str().to_string(),
            listing: contact.listing.as_ref().map(|listing| listing.as_str().to_string()),
            tags: contact.tag_list().into_iter().map(str::to_string).collect(),
            interested_in: self
                .store
                .valid_interests()
                .filter(|(_, interest)| interest.contact_key() == key)
                .map(|(_, interest)| interest.property.as_str().to_string())
                .collect(),
        }
    }

    fn property_view(&self, offset: usize, property: &Property) -> PropertyView {
        let key = property.key();
        PropertyView {
            index: offset + 1,
            property_name: property.property_name.as_str().to_string(),
            address: property.address.as_str().to_string(),
            price: property.price.get(),
            interested_contacts: self
                .store
                .valid_interests()
                .filter(|(_, interest)| interest.property_key() == key)
                .map(|(_, interest)| interest.contact.as_str().to_string())
                .collect(),
        }
    }
}

pub fn history_log(config: &Config) -> HistoryLog {
    HistoryLog::new(&config.history_file, config.history_limit)
}

pub fn recent_history(config: &Config, limit: Option<usize>) -> Result<Vec<HistoryEntry>, AppError> {
    Ok(history_log(config).recent(limit)?)
}

fn validated<C: RecordCodec>(raw: &RawRecord) -> Result<C::Record, AppError> {
    C::validate(raw).map_err(|violations| AppError::InvalidRecord {
        kind: C::KIND,
        violations,
    })
}

fn set_text(raw: &mut RawRecord, field: &str, value: Option<String>) {
    if let Some(value) = value {
        raw.set(field, Value::from(value));
    }
}

/// Digit strings become JSON numbers so saved prices stay numeric.
fn price_value(raw: String) -> Value {
    match raw.trim().parse::<u64>() {
        Ok(amount) => Value::from(amount),
        Err(_) => Value::from(raw),
    }
}

fn describe_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|violation| format!("{}: {}", violation.field, violation.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Repair(#[from] RepairError),
    #[error(transparent)]
    OutOfRange(#[from] PositionOutOfRange),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Kind(#[from] ParseRecordKindError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid {kind}: {}", describe_violations(.violations))]
    InvalidRecord {
        kind: RecordKind,
        violations: Vec<FieldViolation>,
    },
    #[error("{kind} '{name}' already exists")]
    Duplicate { kind: RecordKind, name: String },
    #[error("no {kind} at index {index} ({len} listed)")]
    IndexOutOfRange {
        kind: RecordKind,
        index: usize,
        len: usize,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("store {} already exists; pass --force to overwrite", .0.display())]
    AlreadyInitialized(PathBuf),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Store(err) => err.code(),
            AppError::Repair(err) => err.code(),
            AppError::OutOfRange(err) => err.code(),
            AppError::Config(err) => err.code(),
            AppError::History(err) => err.code(),
            AppError::Export(err) => err.code(),
            AppError::Kind(_) => "INVALID_ARGUMENT",
            AppError::Io(_) => "IO_ERROR",
            AppError::InvalidRecord { .. } => "RECORD_INVALID",
            AppError::Duplicate { .. } => "RECORD_DUPLICATE",
            AppError::IndexOutOfRange { .. } => "RECORD_OUT_OF_RANGE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::AlreadyInitialized(_) => "STORE_EXISTS",
        }
    }
}

#[cfg(test)]
mod tests;
