//! In-memory store with scripted failures.

use super::{JournalStore, MetadataStore, NoteStore, StoreError};
use crate::domain::{Note, NoteMetadata};
use crate::infra::frontmatter;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct MemoryFile {
    content: String,
    created: Option<DateTime<Utc>>,
    modified: DateTime<Utc>,
}

/// A store kept entirely in memory.
///
/// Records every successful rename in order, and can be told to fail the
/// n-th rename so partial-failure handling can be exercised.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    files: BTreeMap<PathBuf, MemoryFile>,
    clock: DateTime<Utc>,
    journals: BTreeMap<String, String>,
    renames: Vec<(PathBuf, PathBuf)>,
    fail_rename_at: Option<usize>,
    rename_attempts: usize,
}

impl MemoryStore {
    /// Creates an empty store whose files report `clock` as their mtime.
    pub fn new(clock: DateTime<Utc>) -> Self {
        Self {
            files: BTreeMap::new(),
            clock,
            journals: BTreeMap::new(),
            renames: Vec::new(),
            fail_rename_at: None,
            rename_attempts: 0,
        }
    }

    /// Adds a file, replacing any existing one at `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> &mut Self {
        self.files.insert(
            path.into(),
            MemoryFile {
                content: content.into(),
                created: None,
                modified: self.clock,
            },
        );
        self
    }

    /// Sets a file's creation time.
    pub fn set_created(&mut self, path: &Path, created: DateTime<Utc>) {
        if let Some(file) = self.files.get_mut(path) {
            file.created = Some(created);
        }
    }

    /// Makes the rename attempt with this zero-based index fail.
    pub fn fail_rename_at(&mut self, attempt: usize) {
        self.fail_rename_at = Some(attempt);
        self.rename_attempts = 0;
    }

    /// Stops injecting rename failures.
    pub fn clear_failures(&mut self) {
        self.fail_rename_at = None;
    }

    /// Successful renames so far, as `(from, to)` pairs.
    pub fn renames(&self) -> &[(PathBuf, PathBuf)] {
        &self.renames
    }

    /// All file paths currently present.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    /// Filenames currently present, sorted.
    pub fn filenames(&self) -> Vec<String> {
        self.files
            .keys()
            .filter_map(|p| p.file_name().map(|f| f.to_string_lossy().into_owned()))
            .collect()
    }

    pub fn content(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(|f| f.content.as_str())
    }

    fn note_at(&self, path: &Path) -> Result<Note, StoreError> {
        Ok(Note::new(path, self.metadata(path)?))
    }
}

impl MetadataStore for MemoryStore {
    fn metadata(&self, path: &Path) -> Result<NoteMetadata, StoreError> {
        let file = self
            .files
            .get(path)
            .ok_or_else(|| StoreError::NotFound { path: path.into() })?;
        Ok(NoteMetadata {
            title: frontmatter::title(&file.content).ok().flatten(),
            created: file.created,
            modified: file.modified,
        })
    }
}

impl JournalStore for MemoryStore {
    fn save_journal(&mut self, operation: &str, content: &str) -> Result<(), StoreError> {
        self.journals.insert(operation.to_string(), content.to_string());
        Ok(())
    }

    fn journals(&self) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self
            .journals
            .iter()
            .map(|(op, content)| (op.clone(), content.clone()))
            .collect())
    }

    fn remove_journal(&mut self, operation: &str) -> Result<(), StoreError> {
        self.journals.remove(operation);
        Ok(())
    }
}

impl NoteStore for MemoryStore {
    fn list(&self) -> Result<Vec<Note>, StoreError> {
        self.files
            .keys()
            .filter(|p| p.extension().is_some_and(|e| e == "md"))
            .map(|p| self.note_at(p))
            .collect()
    }

    fn create(&mut self, folder: &Path, filename: &str, content: &str) -> Result<Note, StoreError> {
        let path = folder.join(filename);
        if self.files.contains_key(&path) {
            return Err(StoreError::AlreadyExists { path });
        }
        self.insert(path.clone(), content);
        self.note_at(&path)
    }

    fn rename(&mut self, note: &Note, new_filename: &str) -> Result<Note, StoreError> {
        let attempt = self.rename_attempts;
        self.rename_attempts += 1;
        if self.fail_rename_at == Some(attempt) {
            return Err(StoreError::Rejected {
                path: note.path().into(),
                reason: "injected rename failure".into(),
            });
        }

        let new_path = note.folder().join(new_filename);
        if self.files.contains_key(&new_path) {
            return Err(StoreError::AlreadyExists { path: new_path });
        }
        let file = self
            .files
            .remove(note.path())
            .ok_or_else(|| StoreError::NotFound {
                path: note.path().into(),
            })?;
        self.files.insert(new_path.clone(), file);
        self.renames.push((note.path().to_path_buf(), new_path.clone()));
        self.note_at(&new_path)
    }

    fn read(&self, note: &Note) -> Result<String, StoreError> {
        self.content(note.path())
            .map(str::to_string)
            .ok_or_else(|| StoreError::NotFound {
                path: note.path().into(),
            })
    }

    fn write(&mut self, note: &Note, content: &str) -> Result<(), StoreError> {
        let clock = self.clock;
        let file = self
            .files
            .get_mut(note.path())
            .ok_or_else(|| StoreError::NotFound {
                path: note.path().into(),
            })?;
        file.content = content.to_string();
        file.modified = clock;
        Ok(())
    }
}
