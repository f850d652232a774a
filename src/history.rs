use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::store::write_atomic;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("unable to read history {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("history {} is malformed: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to write history {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HistoryError {
    pub fn code(&self) -> &'static str {
        match self {
            HistoryError::Read { .. } | HistoryError::Malformed { .. } => "HISTORY_UNREADABLE",
            HistoryError::Write { .. } => "HISTORY_UNWRITABLE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub command: String,
    pub recorded_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub commands: Vec<HistoryEntry>,
}

/// Command lines in execution order, oldest first, capped at `limit`.
pub struct HistoryLog {
    path: PathBuf,
    limit: usize,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit: limit.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<History, HistoryError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(History::default())
            }
            Err(source) => {
                return Err(HistoryError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes).map_err(|source| HistoryError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// The newest `limit` entries, still oldest first.
    pub fn recent(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut commands = self.load()?.commands;
        if let Some(limit) = limit {
            let skip = commands.len().saturating_sub(limit);
            commands.drain(..skip);
        }
        Ok(commands)
    }

    /// Appends one command line. An unreadable history is replaced rather
    /// than blocking the command that is being recorded.
    pub fn record(&self, command: &str) -> Result<(), HistoryError> {
        let mut history = match self.load() {
            Ok(history) => history,
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable command history");
                History::default()
            }
        };
        history.commands.push(HistoryEntry {
            command: command.to_string(),
            recorded_at: now_rfc3339(),
        });
        let excess = history.commands.len().saturating_sub(self.limit);
        history.commands.drain(..excess);

        let mut bytes = serde_json::to_vec_pretty(&history).map_err(|source| {
            HistoryError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes).map_err(|source| HistoryError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
