//! File-backed persistence for the document.
//!
//! The gateway owns the configured path and talks to storage only through
//! a [`StoreBackend`], so every load is exactly one read and every save is
//! exactly one atomic replace.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::document::{decode, encode, Document, DocumentError};
use crate::reconcile::{reconcile, ReconciledStore};
use crate::record::RecordKind;
use crate::repair::{Corrections, RepairError, RepairOutcome};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to read store {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to write store {}: {source}", .path.display())]
    Unwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store {} is malformed: {source}", .path.display())]
    DocumentMalformed {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
    #[error(transparent)]
    Repair(#[from] RepairError),
}

/// The file on disk is untouched when encoding fails, so this is a write
/// failure rather than a malformed store.
fn encode_failure(path: &Path, source: DocumentError) -> StoreError {
    StoreError::Unwritable {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, source),
    }
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unreadable { .. } => "STORE_UNREADABLE",
            StoreError::Unwritable { .. } => "STORE_UNWRITABLE",
            StoreError::DocumentMalformed { .. } => "DOCUMENT_MALFORMED",
            StoreError::Repair(err) => err.code(),
        }
    }
}

/// Raw byte access to wherever documents live.
pub trait StoreBackend {
    /// `Ok(None)` when nothing exists at `path`.
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>>;

    /// Replaces the content at `path` so readers see either the old bytes
    /// or the new ones, never a mix.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsBackend;

impl StoreBackend for FsBackend {
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        write_atomic(path, bytes)
    }
}

/// Writes a hidden sibling temp file, syncs it and renames it over `path`.
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", path.display()),
        )
    })?;
    fs::create_dir_all(parent)?;

    let temp_path = parent.join(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        Uuid::now_v7()
    ));
    let result = write_and_rename(&temp_path, path, bytes);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_and_rename(temp_path: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp_path, path)
}

pub struct StoreGateway<B: StoreBackend = FsBackend> {
    path: PathBuf,
    backend: B,
}

impl StoreGateway<FsBackend> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_backend(path, FsBackend)
    }
}

impl<B: StoreBackend> StoreGateway<B> {
    pub fn with_backend(path: impl Into<PathBuf>, backend: B) -> Self {
        Self {
            path: path.into(),
            backend,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn load(&self) -> Result<Option<Document>, StoreError> {
        self.load_from(&self.path)
    }

    pub fn load_from(&self, path: &Path) -> Result<Option<Document>, StoreError> {
        let bytes = self
            .backend
            .read(path)
            .map_err(|source| StoreError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let Some(bytes) = bytes else {
            tracing::debug!(path = %path.display(), "store file missing; starting empty");
            return Ok(None);
        };
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "read store");
        decode(&bytes)
            .map(Some)
            .map_err(|source| StoreError::DocumentMalformed {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn load_and_reconcile(&self) -> Result<ReconciledStore, StoreError> {
        self.load_and_reconcile_at(&self.path)
    }

    /// A missing file reconciles to an empty store.
    pub fn load_and_reconcile_at(&self, path: &Path) -> Result<ReconciledStore, StoreError> {
        let document = self.load_from(path)?.unwrap_or_default();
        Ok(reconcile(document))
    }

    pub fn save(&self, document: &Document) -> Result<(), StoreError> {
        self.save_to(&self.path, document)
    }

    pub fn save_to(&self, path: &Path, document: &Document) -> Result<(), StoreError> {
        let bytes = encode(document).map_err(|source| encode_failure(path, source))?;
        self.backend
            .write_atomic(path, &bytes)
            .map_err(|source| StoreError::Unwritable {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(
            path = %path.display(),
            records = document.total(),
            bytes = bytes.len(),
            "saved store"
        );
        Ok(())
    }

    /// Loads and reconciles `path`, then applies one repair in memory.
    /// The caller decides whether to save the result.
    pub fn repair_and_reconcile(
        &self,
        path: &Path,
        kind: RecordKind,
        position: usize,
        corrections: &Corrections,
    ) -> Result<(ReconciledStore, RepairOutcome), StoreError> {
        let mut store = self.load_and_reconcile_at(path)?;
        let outcome = store.repair(kind, position, corrections)?;
        Ok((store, outcome))
    }
}
