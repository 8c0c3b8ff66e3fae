//! Directory-backed vault with atomic single-file writes.

use super::{JournalStore, MetadataStore, NoteStore, StoreError};
use crate::domain::{Note, NoteMetadata};
use crate::infra::frontmatter;
use chrono::{DateTime, Utc};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::{DirEntry, WalkDir};

/// Journal directory, relative to the vault root.
const JOURNAL_DIR: &str = ".zettel/journal";

/// A directory of markdown notes.
///
/// Scans recursively, skipping hidden files and directories (starting with
/// `.`). Note paths are relative to the vault root. Rename journals are kept
/// under `.zettel/journal/`, which the scan never enters.
#[derive(Debug, Clone)]
pub struct VaultStore {
    root: PathBuf,
}

impl VaultStore {
    /// Opens an existing vault directory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the directory doesn't exist.
    /// Returns `StoreError::NotADirectory` if the path is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.exists() {
            return Err(StoreError::NotFound { path: root });
        }
        if !root.is_dir() {
            return Err(StoreError::NotADirectory { path: root });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a note-relative path.
    pub fn absolute(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    fn scan(&self) -> impl Iterator<Item = PathBuf> + '_ {
        WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(has_md_extension)
            .filter_map(|e| e.path().strip_prefix(&self.root).ok().map(Path::to_path_buf))
    }

    fn write_atomic(&self, path: &Path, content: &str, clobber: bool) -> Result<(), StoreError> {
        let target = self.absolute(path);
        let parent = target
            .parent()
            .ok_or_else(|| StoreError::NotFound { path: path.into() })?;

        let mut temp =
            NamedTempFile::new_in(parent).map_err(|e| StoreError::from_io(path, e))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| StoreError::from_io(path, e))?;

        if clobber {
            temp.persist(&target)
                .map_err(|e| StoreError::from_io(path, e.error))?;
        } else {
            temp.persist_noclobber(&target)
                .map_err(|e| StoreError::from_io(path, e.error))?;
        }
        Ok(())
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

fn has_md_extension(entry: &DirEntry) -> bool {
    entry.path().extension().is_some_and(|e| e == "md")
}

impl MetadataStore for VaultStore {
    fn metadata(&self, path: &Path) -> Result<NoteMetadata, StoreError> {
        let absolute = self.absolute(path);
        let fs_meta = std::fs::metadata(&absolute).map_err(|e| StoreError::from_io(path, e))?;

        let modified = fs_meta
            .modified()
            .map(DateTime::<Utc>::from)
            .map_err(|e| StoreError::from_io(path, e))?;
        let created = fs_meta.created().ok().map(DateTime::<Utc>::from);

        let title = match std::fs::read_to_string(&absolute) {
            Ok(content) => frontmatter::title(&content).unwrap_or_else(|err| {
                tracing::debug!(path = %path.display(), error = %err, "unreadable frontmatter");
                None
            }),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "cannot read note for title");
                None
            }
        };

        Ok(NoteMetadata {
            title,
            created,
            modified,
        })
    }
}

impl JournalStore for VaultStore {
    fn save_journal(&mut self, operation: &str, content: &str) -> Result<(), StoreError> {
        let dir = Path::new(JOURNAL_DIR);
        std::fs::create_dir_all(self.absolute(dir)).map_err(|e| StoreError::from_io(dir, e))?;
        self.write_atomic(&dir.join(format!("{operation}.json")), content, true)
    }

    fn journals(&self) -> Result<Vec<(String, String)>, StoreError> {
        let dir = Path::new(JOURNAL_DIR);
        let entries = match std::fs::read_dir(self.absolute(dir)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::from_io(dir, e)),
        };

        let mut journals = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::from_io(dir, e))?.path();
            if path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            let Some(operation) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content =
                std::fs::read_to_string(&path).map_err(|e| StoreError::from_io(&path, e))?;
            journals.push((operation.to_string(), content));
        }
        journals.sort();
        Ok(journals)
    }

    fn remove_journal(&mut self, operation: &str) -> Result<(), StoreError> {
        let path = Path::new(JOURNAL_DIR).join(format!("{operation}.json"));
        match std::fs::remove_file(self.absolute(&path)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(StoreError::from_io(&path, e)),
            _ => Ok(()),
        }
    }
}

impl NoteStore for VaultStore {
    fn list(&self) -> Result<Vec<Note>, StoreError> {
        let mut notes = Vec::new();
        for path in self.scan() {
            match self.metadata(&path) {
                Ok(metadata) => notes.push(Note::new(path, metadata)),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable note");
                }
            }
        }
        notes.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(notes)
    }

    fn create(&mut self, folder: &Path, filename: &str, content: &str) -> Result<Note, StoreError> {
        let absolute_folder = self.absolute(folder);
        std::fs::create_dir_all(&absolute_folder).map_err(|e| StoreError::from_io(folder, e))?;

        let path = folder.join(filename);
        self.write_atomic(&path, content, false)?;
        tracing::debug!(path = %path.display(), "created note");

        let metadata = self.metadata(&path)?;
        Ok(Note::new(path, metadata))
    }

    fn rename(&mut self, note: &Note, new_filename: &str) -> Result<Note, StoreError> {
        let from = self.absolute(note.path());
        let new_path = note.folder().join(new_filename);
        let to = self.absolute(&new_path);

        if to.exists() {
            return Err(StoreError::AlreadyExists { path: new_path });
        }
        std::fs::rename(&from, &to).map_err(|e| StoreError::from_io(note.path(), e))?;
        tracing::trace!(from = %note.path().display(), to = %new_path.display(), "renamed");

        Ok(note.moved_to(new_path))
    }

    fn read(&self, note: &Note) -> Result<String, StoreError> {
        let bytes =
            std::fs::read(self.absolute(note.path())).map_err(|e| StoreError::from_io(note.path(), e))?;
        let content = String::from_utf8(bytes).map_err(|e| StoreError::InvalidEncoding {
            path: note.path().into(),
            reason: format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
        })?;
        Ok(content
            .strip_prefix('\u{FEFF}')
            .map(str::to_string)
            .unwrap_or(content))
    }

    fn write(&mut self, note: &Note, content: &str) -> Result<(), StoreError> {
        self.write_atomic(note.path(), content, true)
    }
}
