//! Configuration file support.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::reorder::DEFAULT_TIMESTAMP_ATTEMPTS;

/// Application configuration loaded from config file.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Default notes directory
    pub dir: Option<PathBuf>,

    /// Leave identifiers that break letter/number alternation out of trees
    pub strict: bool,

    /// Millisecond steps tried when a new root timestamp collides
    pub timestamp_attempts: Option<u32>,

    /// Editor command for editing notes
    pub editor: Option<String>,
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))
    }

    /// Returns the path to the config file.
    ///
    /// Default: `~/.config/zettel/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zettel")
            .join("config.toml")
    }

    /// Resolve the notes directory: CLI `--dir`, then config `dir`, then cwd.
    pub fn notes_dir(&self, cli_dir: Option<&PathBuf>) -> PathBuf {
        cli_dir
            .cloned()
            .or_else(|| self.dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn timestamp_attempts(&self) -> u32 {
        self.timestamp_attempts.unwrap_or(DEFAULT_TIMESTAMP_ATTEMPTS)
    }

    /// Resolve the editor command: config, then `$EDITOR`, then `$VISUAL`, then `vi`.
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .unwrap_or_else(|| "vi".to_string())
    }
}
