//! Per-operation record of a staged rename.
//!
//! The journal is written before the first rename and removed after the
//! last link refresh. Each entry knows the note's original, staging and final
//! filename, so [`super::recover`] can finish an operation from any point.

use super::{LinkTarget, Rename};
use crate::store::{JournalStore, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal store error: {0}")]
    Store(#[from] StoreError),

    #[error("malformed journal {operation}: {source}")]
    Malformed {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Which pass an operation is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Staging,
    Commit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Staging => f.write_str("staging"),
            Phase::Commit => f.write_str("commit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Folder of the note, relative to the store root.
    pub folder: PathBuf,
    pub original: String,
    pub staged: String,
    pub target: String,
    pub link: LinkTarget,
}

impl JournalEntry {
    pub fn new(rename: &Rename, staged: String) -> Self {
        Self {
            folder: rename.note.folder().to_path_buf(),
            original: rename.note.filename(),
            staged,
            target: rename.filename.clone(),
            link: rename.link.clone(),
        }
    }

    pub fn original_path(&self) -> PathBuf {
        self.folder.join(&self.original)
    }

    pub fn staged_path(&self) -> PathBuf {
        self.folder.join(&self.staged)
    }

    pub fn target_path(&self) -> PathBuf {
        self.folder.join(&self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub operation: String,
    pub phase: Phase,
    pub entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new(operation: impl Into<String>, entries: Vec<JournalEntry>) -> Self {
        Self {
            operation: operation.into(),
            phase: Phase::Staging,
            entries,
        }
    }

    pub fn save<S: JournalStore + ?Sized>(&self, store: &mut S) -> Result<(), JournalError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|source| JournalError::Malformed {
                operation: self.operation.clone(),
                source,
            })?;
        store.save_journal(&self.operation, &content)?;
        Ok(())
    }

    /// Every journal in the store, oldest operation first.
    pub fn load_all<S: JournalStore + ?Sized>(store: &S) -> Result<Vec<Self>, JournalError> {
        store
            .journals()?
            .into_iter()
            .map(|(operation, content)| {
                serde_json::from_str(&content)
                    .map_err(|source| JournalError::Malformed { operation, source })
            })
            .collect()
    }

    pub fn remove<S: JournalStore + ?Sized>(&self, store: &mut S) -> Result<(), JournalError> {
        store.remove_journal(&self.operation)?;
        Ok(())
    }
}
