//! Isolated test vault in a temp directory.

#![allow(dead_code)]

use super::{TestNote, ZettelCommand};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary notes directory plus an empty config home.
///
/// Both are removed when the TestEnv is dropped.
pub struct TestEnv {
    _temp_dir: TempDir,
    notes_dir: PathBuf,
    config_home: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let notes_dir = temp_dir.path().join("notes");
        let config_home = temp_dir.path().join("config");
        std::fs::create_dir_all(&notes_dir).expect("Failed to create notes dir");
        std::fs::create_dir_all(&config_home).expect("Failed to create config dir");
        Self {
            _temp_dir: temp_dir,
            notes_dir,
            config_home,
        }
    }

    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    /// Writes the note into the vault root and returns its path.
    pub fn add_note(&self, note: &TestNote) -> PathBuf {
        self.write_file(&note.filename(), &note.content())
    }

    /// Writes a file relative to the vault root, creating folders as needed.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.notes_dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create folder");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Writes `zettel/config.toml` in the isolated config home.
    pub fn write_config(&self, content: &str) {
        let dir = self.config_home.join("zettel");
        std::fs::create_dir_all(&dir).expect("Failed to create config dir");
        std::fs::write(dir.join("config.toml"), content).expect("Failed to write config");
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.notes_dir.join(name))
            .unwrap_or_else(|e| panic!("Failed to read {name}: {e}"))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.notes_dir.join(name).exists()
    }

    /// Filenames in the vault root, sorted.
    pub fn filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.notes_dir)
            .expect("Failed to read notes dir")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// A command that finds the notes directory through the config file.
    pub fn cmd_without_dir(&self) -> ZettelCommand {
        ZettelCommand::new().config_home(&self.config_home)
    }

    /// A command preconfigured with `--dir` and the isolated config home.
    pub fn cmd(&self) -> ZettelCommand {
        ZettelCommand::new()
            .dir(&self.notes_dir)
            .config_home(&self.config_home)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
