//! Output format types for CLI commands.

use clap::ValueEnum;
use serde::Serialize;

use crate::domain::Note;
use crate::reorder::{Rename, RenameSet};
use crate::sequence::SequenceNode;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for programmatic consumption
    Json,
    /// Plain file paths, one per line
    Paths,
}

/// Wrapper for serializable command output.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Output<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Prints `data` as pretty JSON wrapped in `{"data": ...}`.
pub fn print_json<T: Serialize>(data: T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&Output::new(data))?);
    Ok(())
}

/// A single note in listing output.
#[derive(Debug, Serialize)]
pub struct NoteListing {
    pub id: Option<String>,
    pub title: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,
}

impl NoteListing {
    pub fn new(note: &Note) -> Self {
        Self {
            id: note.id().map(ToString::to_string),
            title: note.title().to_string(),
            path: note.path().display().to_string(),
            level: None,
        }
    }

    pub fn at_level(note: &Note, level: usize) -> Self {
        Self {
            level: Some(level),
            ..Self::new(note)
        }
    }
}

/// A sequence node with its children, for JSON trees.
#[derive(Debug, Serialize)]
pub struct TreeListing {
    #[serde(flatten)]
    pub note: NoteListing,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeListing>,
}

impl From<&SequenceNode> for TreeListing {
    fn from(node: &SequenceNode) -> Self {
        Self {
            note: NoteListing::at_level(&node.note, node.level),
            children: node.children.iter().map(TreeListing::from).collect(),
        }
    }
}

/// One rename of a dry run.
#[derive(Debug, Serialize)]
pub struct PlannedRename {
    pub from: String,
    pub to: String,
    pub path: String,
    pub filename: String,
}

impl From<&Rename> for PlannedRename {
    fn from(rename: &Rename) -> Self {
        Self {
            from: rename.from.to_string(),
            to: rename.to.to_string(),
            path: rename.note.path().display().to_string(),
            filename: rename.filename.clone(),
        }
    }
}

pub fn planned(set: &RenameSet) -> Vec<PlannedRename> {
    set.iter().map(PlannedRename::from).collect()
}
