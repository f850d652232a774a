//! CSV snapshot of the valid contacts and properties.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::reconcile::ReconciledStore;
use crate::store::write_atomic;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: the store has no valid contacts or properties")]
    Empty,
    #[error("invalid export name '{0}': use letters, digits, '-', '_' or '.'")]
    InvalidName(String),
    #[error("unable to write export {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn code(&self) -> &'static str {
        match self {
            ExportError::Empty => "EXPORT_EMPTY",
            ExportError::InvalidName(_) => "INVALID_ARGUMENT",
            ExportError::Write { .. } => "EXPORT_UNWRITABLE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub contacts: usize,
    pub properties: usize,
}

pub fn export(
    store: &ReconciledStore,
    dir: &Path,
    name: Option<&str>,
) -> Result<ExportSummary, ExportError> {
    let name = match name {
        Some(name) => validate_name(name)?,
        None => format!("propbook-export-{}", filename_timestamp()),
    };
    let contacts = store.valid_contacts().count();
    let properties = store.valid_properties().count();
    if contacts == 0 && properties == 0 {
        return Err(ExportError::Empty);
    }

    let path = dir.join(format!("{name}.csv"));
    write_atomic(&path, render_csv(store).as_bytes()).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), contacts, properties, "exported csv");
    Ok(ExportSummary {
        path,
        contacts,
        properties,
    })
}

fn validate_name(raw: &str) -> Result<String, ExportError> {
    let name = raw.trim().trim_end_matches(".csv");
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
    if valid {
        Ok(name.to_string())
    } else {
        Err(ExportError::InvalidName(raw.to_string()))
    }
}

/// Contacts section, blank line, properties section. Interest edges appear
/// as `;`-joined name lists on both sides.
pub fn render_csv(store: &ReconciledStore) -> String {
    let mut interested_in: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    let mut interested: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (_, interest) in store.valid_interests() {
        interested_in
            .entry(interest.contact_key())
            .or_default()
            .push(interest.property.as_str());
        interested
            .entry(interest.property_key())
            .or_default()
            .push(interest.contact.as_str());
    }

    let mut out = String::new();
    push_row(&mut out, &["Contacts"]);
    push_row(
        &mut out,
        &[
            "Name",
            "Phone",
            "Email",
            "Address",
            "Listing",
            "Tags",
            "Interested Properties",
        ],
    );
    for (_, contact) in store.valid_contacts() {
        let tags = contact.tag_list().join(";");
        let properties = interested_in
            .get(&contact.key())
            .map(|names| names.join(";"))
            .unwrap_or_default();
        push_row(
            &mut out,
            &[
                contact.name.as_str(),
                contact.phone.as_str(),
                contact.email.as_str(),
                contact.address.as_str(),
                contact.listing.as_ref().map_or("", |listing| listing.as_str()),
                &tags,
                &properties,
            ],
        );
    }

    out.push_str("\r\n");
    push_row(&mut out, &["Properties"]);
    push_row(
        &mut out,
        &["Property Name", "Address", "Price", "Interested Contacts"],
    );
    for (_, property) in store.valid_properties() {
        let price = property.price.to_string();
        let contacts = interested
            .get(&property.key())
            .map(|names| names.join(";"))
            .unwrap_or_default();
        push_row(
            &mut out,
            &[
                property.property_name.as_str(),
                property.address.as_str(),
                &price,
                &contacts,
            ],
        );
    }
    out
}

fn push_row(out: &mut String, cells: &[&str]) {
    let row = cells
        .iter()
        .map(|cell| escape_cell(cell))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&row);
    out.push_str("\r\n");
}

fn escape_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn filename_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}Z",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
