//! Note storage collaborators: the file store and the metadata store.

mod fs;
mod memory;

pub use fs::VaultStore;
pub use memory::MemoryStore;

use crate::domain::{Note, NoteMetadata};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("note file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("target already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("invalid encoding in {path}: {reason}")]
    InvalidEncoding { path: PathBuf, reason: String },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("store rejected operation on {path}: {reason}")]
    Rejected { path: PathBuf, reason: String },
}

impl StoreError {
    /// Creates an appropriate StoreError from an io::Error.
    pub(crate) fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound { path: path.into() },
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied { path: path.into() },
            io::ErrorKind::AlreadyExists => StoreError::AlreadyExists { path: path.into() },
            _ => StoreError::Io {
                path: path.into(),
                source: error,
            },
        }
    }
}

/// File store holding the notes.
///
/// Every operation touches exactly one file. `rename` is atomic for that file
/// and refuses to overwrite an existing one; nothing spans multiple files.
pub trait NoteStore {
    /// Enumerates every note in the store.
    fn list(&self) -> Result<Vec<Note>, StoreError>;

    /// Creates a note `filename` in `folder` (relative to the store root).
    fn create(&mut self, folder: &Path, filename: &str, content: &str) -> Result<Note, StoreError>;

    /// Renames a note within its folder and returns the renamed note.
    fn rename(&mut self, note: &Note, new_filename: &str) -> Result<Note, StoreError>;

    fn read(&self, note: &Note) -> Result<String, StoreError>;

    fn write(&mut self, note: &Note, content: &str) -> Result<(), StoreError>;
}

/// Durable records of in-flight rename operations, keyed by operation id.
///
/// Journals live outside the note listing: `NoteStore::list` never returns
/// them.
pub trait JournalStore {
    /// Writes (or replaces) the journal of `operation`.
    fn save_journal(&mut self, operation: &str, content: &str) -> Result<(), StoreError>;

    /// Every stored journal as `(operation, content)`, oldest operation first.
    fn journals(&self) -> Result<Vec<(String, String)>, StoreError>;

    /// Deletes the journal of `operation`. Missing journals are not an error.
    fn remove_journal(&mut self, operation: &str) -> Result<(), StoreError>;
}

/// Metadata cache: display title and timestamps for a note path.
///
/// Never consulted for identifier derivation.
pub trait MetadataStore {
    fn metadata(&self, path: &Path) -> Result<NoteMetadata, StoreError>;
}
