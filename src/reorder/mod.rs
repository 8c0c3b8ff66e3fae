//! Subtree renumbering, tree moves, and the staged renamer that applies them.
//!
//! Planning is pure: [`ReorderPlan::compute`] and the functions in
//! [`moves`] turn the current listing into a [`RenameSet`] without touching
//! the store. Only [`apply`] and [`recover`] mutate, one rename at a time.

mod apply;
mod journal;
pub mod moves;
mod plan;
mod timestamp;

pub use apply::{
    ApplyError, Cancellation, LinkFailure, RenameReport, RenamedNote, StagedName, apply, recover,
};
pub use journal::{Journal, JournalEntry, JournalError, Phase};
pub use plan::{PlanEntry, ReorderPlan};
pub use timestamp::{DEFAULT_TIMESTAMP_ATTEMPTS, allocate_root_timestamp};

use crate::domain::{Note, ZettelId};
use crate::sequence::SlotError;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Invalid operations, detected before any file is renamed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("note has no zettel identifier: {path}")]
    Unaddressable { path: PathBuf },

    #[error("reorder plan is empty")]
    EmptyPlan,

    #[error("{id} appears more than once in the plan")]
    DuplicateEntry { id: String },

    #[error("{id} is not below {root}")]
    OutsideSubtree { id: String, root: String },

    #[error("first plan entry must have indent 0, found {indent}")]
    BadFirstIndent { indent: usize },

    #[error("{id} jumps to indent {indent} after an entry at indent {previous}")]
    IndentJump {
        id: String,
        indent: usize,
        previous: usize,
    },

    #[error("promoted note {id} must have indent 0, found {indent}")]
    PromotedIndent { id: String, indent: usize },

    #[error("{id} is a root note")]
    RootNote { id: String },

    #[error("{id} has no previous sibling to indent under")]
    NoPreviousSibling { id: String },

    #[error("cannot move {id} below its own subtree ({parent})")]
    Cycle { id: String, parent: String },

    #[error("{} and {} would both become {target}", .first.display(), .second.display())]
    TargetCollision {
        target: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error("no free root timestamp from {base} after {attempts} attempts")]
    TimestampExhausted { base: String, attempts: u32 },
}

/// Returns the note's identifier or `PlanError::Unaddressable`.
pub(crate) fn id_of(note: &Note) -> Result<&ZettelId, PlanError> {
    note.id().ok_or_else(|| PlanError::Unaddressable {
        path: note.path().into(),
    })
}

/// Clock and limits used while planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderOptions {
    /// Local "now" for new root timestamps.
    pub now: NaiveDateTime,
    /// Millisecond increments tried when a root timestamp collides.
    pub timestamp_attempts: u32,
}

impl ReorderOptions {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now,
            timestamp_attempts: DEFAULT_TIMESTAMP_ATTEMPTS,
        }
    }
}

impl Default for ReorderOptions {
    fn default() -> Self {
        Self::at(Local::now().naive_local())
    }
}

/// What the `up:` frontmatter link of a renamed note should become.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkTarget {
    /// Point at the parent note with this filename stem.
    Parent(String),
    /// The note became a root; drop the link.
    Remove,
    /// No parent note exists on disk; leave the link alone.
    Keep,
}

/// One computed rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub note: Note,
    pub from: ZettelId,
    pub to: ZettelId,
    /// Final filename, keeping the note's prefix and title.
    pub filename: String,
    pub link: LinkTarget,
}

/// Every rename an operation needs, checked for collisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameSet {
    renames: Vec<Rename>,
}

impl RenameSet {
    /// Turns `(note, new id)` pairs into a collision-free rename set.
    ///
    /// Pairs whose identifier does not change are dropped but still occupy
    /// their identifier. Notes outside `moves` keep theirs.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::TargetCollision` if two notes would end up with
    /// the same identifier.
    pub fn resolve(moves: Vec<(Note, ZettelId)>, notes: &[Note]) -> Result<Self, PlanError> {
        let moved: HashSet<&Path> = moves.iter().map(|(n, _)| n.path()).collect();
        let mut owners: HashMap<&ZettelId, &Path> = HashMap::new();

        let staying = notes
            .iter()
            .filter(|n| !moved.contains(n.path()))
            .filter_map(|n| n.id().map(|id| (id, n.path())));
        let targets = moves.iter().map(|(n, to)| (to, n.path()));

        for (id, path) in targets.chain(staying) {
            if let Some(first) = owners.insert(id, path) {
                return Err(PlanError::TargetCollision {
                    target: id.to_string(),
                    first: first.into(),
                    second: path.into(),
                });
            }
        }

        let mut stems: HashMap<&ZettelId, String> = HashMap::new();
        for note in notes.iter().filter(|n| !moved.contains(n.path())) {
            if let Some(id) = note.id() {
                stems.entry(id).or_insert_with(|| note.stem().to_string());
            }
        }
        for (note, to) in &moves {
            let filename = note.filename_for(to);
            let stem = filename.strip_suffix(".md").unwrap_or(&filename).to_string();
            stems.entry(to).or_insert(stem);
        }

        let mut renames: Vec<Rename> = moves
            .iter()
            .filter_map(|(note, to)| {
                let from = note.id()?;
                (from != to).then(|| Rename {
                    note: note.clone(),
                    from: from.clone(),
                    to: to.clone(),
                    filename: note.filename_for(to),
                    link: link_target(to, |parent| stems.get(parent).cloned()),
                })
            })
            .collect();
        renames.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.note.path().cmp(b.note.path())));

        Ok(Self { renames })
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rename> {
        self.renames.iter()
    }
}

impl<'a> IntoIterator for &'a RenameSet {
    type Item = &'a Rename;
    type IntoIter = std::slice::Iter<'a, Rename>;

    fn into_iter(self) -> Self::IntoIter {
        self.renames.iter()
    }
}

/// Frontmatter link for a note that now lives at `id`.
pub(crate) fn link_target(id: &ZettelId, stem_of: impl Fn(&ZettelId) -> Option<String>) -> LinkTarget {
    match id.parent() {
        None => LinkTarget::Remove,
        Some(parent) => stem_of(&parent).map_or(LinkTarget::Keep, LinkTarget::Parent),
    }
}

/// Every identifier in use plus all of their ancestors.
///
/// A slot whose note was deleted but whose descendants remain is treated as
/// taken, so a note moved into it cannot collide with those descendants.
pub(crate) fn occupied_slots<'a>(ids: impl IntoIterator<Item = &'a ZettelId>) -> HashSet<ZettelId> {
    let mut occupied = HashSet::new();
    for id in ids {
        let mut current = Some(id.clone());
        while let Some(id) = current {
            current = id.parent();
            if !occupied.insert(id) {
                break;
            }
        }
    }
    occupied
}
