//! Renumbering a root's subtree from an ordered, indented outline.

use super::{PlanError, ReorderOptions, RenameSet, allocate_root_timestamp, id_of, occupied_slots};
use crate::domain::{Note, Segment, ZettelId};
use crate::sequence::{addressable, find_next_available_child_slot};
use std::collections::{HashMap, HashSet};

/// One line of a reorder outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub note: Note,
    /// Nesting level below the reordered root; 0 is a direct child.
    pub indent: usize,
    /// Lift this note (and whatever is nested under it) out of the subtree.
    pub promoted: bool,
}

impl PlanEntry {
    pub fn new(note: Note, indent: usize) -> Self {
        Self {
            note,
            indent,
            promoted: false,
        }
    }

    pub fn promoted(note: Note) -> Self {
        Self {
            note,
            indent: 0,
            promoted: true,
        }
    }
}

/// The desired order of some notes below `root`.
///
/// Entries are laid out depth first: an entry's logical parent is the
/// closest earlier entry with indent one less, or `root` for indent 0.
/// Sibling order is the order of appearance. Descendants of `root` that the
/// plan does not mention follow their nearest planned ancestor and keep
/// their slots under it.
#[derive(Debug, Clone)]
pub struct ReorderPlan {
    root: Note,
    entries: Vec<PlanEntry>,
}

impl ReorderPlan {
    pub fn new(root: Note, entries: Vec<PlanEntry>) -> Self {
        Self { root, entries }
    }

    pub fn root(&self) -> &Note {
        &self.root
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Checks the outline's shape without looking at the rest of the store.
    pub fn validate(&self) -> Result<(), PlanError> {
        let root = id_of(&self.root)?;
        if self.entries.is_empty() {
            return Err(PlanError::EmptyPlan);
        }

        let mut seen = HashSet::new();
        let mut previous: Option<usize> = None;
        for entry in &self.entries {
            let id = id_of(&entry.note)?;
            if !root.is_ancestor_of(id) {
                return Err(PlanError::OutsideSubtree {
                    id: id.to_string(),
                    root: root.to_string(),
                });
            }
            if !seen.insert(id) {
                return Err(PlanError::DuplicateEntry { id: id.to_string() });
            }
            match previous {
                None if entry.indent != 0 => {
                    return Err(PlanError::BadFirstIndent {
                        indent: entry.indent,
                    });
                }
                Some(prev) if entry.indent > prev + 1 => {
                    return Err(PlanError::IndentJump {
                        id: id.to_string(),
                        indent: entry.indent,
                        previous: prev,
                    });
                }
                _ => {}
            }
            if entry.promoted && entry.indent != 0 {
                return Err(PlanError::PromotedIndent {
                    id: id.to_string(),
                    indent: entry.indent,
                });
            }
            previous = Some(entry.indent);
        }
        Ok(())
    }

    /// Computes the renames that realize this plan against `notes`.
    ///
    /// Retained entries are numbered compactly under their logical parent,
    /// skipping ordinals still held by unplanned children of that parent.
    /// Promoted entries go to the first free slot under the root's parent,
    /// or get a fresh root timestamp when the reordered note is itself a
    /// root. Every unplanned descendant is rebased onto its nearest planned
    /// ancestor's new identifier.
    pub fn compute(&self, notes: &[Note], options: &ReorderOptions) -> Result<RenameSet, PlanError> {
        self.validate()?;
        let root = id_of(&self.root)?.clone();
        let zettels = addressable(notes, false);

        let mut planned: HashSet<&ZettelId> = HashSet::from([&root]);
        for entry in &self.entries {
            planned.insert(id_of(&entry.note)?);
        }

        // Unplanned descendants, with the planned ancestor they travel with.
        let mut reserved: HashMap<ZettelId, HashSet<u64>> = HashMap::new();
        let mut followers = Vec::new();
        for &(note, id) in &zettels {
            if !root.is_ancestor_of(id) || planned.contains(id) {
                continue;
            }
            let Some(anchor) = nearest_planned_ancestor(id, &planned) else {
                continue;
            };
            let ordinal = id.segments()[anchor.depth()].ordinal();
            reserved.entry(anchor.clone()).or_default().insert(ordinal);
            followers.push((note, id, anchor));
        }

        let mut occupied = occupied_slots(zettels.iter().map(|&(_, id)| id));
        let mut roots_taken: HashSet<String> = zettels
            .iter()
            .map(|(_, id)| id.timestamp().to_string())
            .collect();

        let mut assigned: HashMap<ZettelId, ZettelId> = HashMap::from([(root.clone(), root.clone())]);
        let mut cursors: HashMap<ZettelId, u64> = HashMap::new();
        let mut stack: Vec<(ZettelId, ZettelId)> = Vec::new();
        let mut moves = Vec::new();

        for entry in &self.entries {
            let old = id_of(&entry.note)?.clone();
            stack.truncate(entry.indent);

            let new = if entry.promoted {
                match root.parent() {
                    Some(grandparent) => {
                        let slot = find_next_available_child_slot(&grandparent, &occupied)?;
                        occupied.insert(slot.id.clone());
                        slot.id
                    }
                    None => {
                        let id = allocate_root_timestamp(
                            &roots_taken,
                            options.now,
                            entry.note.created(),
                            Some(&old),
                            options.timestamp_attempts,
                        )?;
                        roots_taken.insert(id.timestamp().to_string());
                        id
                    }
                }
            } else {
                let (parent_old, parent_new) = stack
                    .last()
                    .cloned()
                    .unwrap_or_else(|| (root.clone(), root.clone()));
                let skip = reserved.get(&parent_old);
                let cursor = cursors.entry(parent_old).or_insert(0);
                *cursor += 1;
                while skip.is_some_and(|s| s.contains(&*cursor)) {
                    *cursor += 1;
                }
                parent_new.with_child(Segment::from_ordinal(parent_new.child_kind(), *cursor))
            };

            tracing::trace!(from = %old, to = %new, "planned");
            stack.push((old.clone(), new.clone()));
            assigned.insert(old, new.clone());
            moves.push((entry.note.clone(), new));
        }

        for (note, id, anchor) in followers {
            let target = &assigned[&anchor];
            if let Some(new) = id.rebase(&anchor, target) {
                moves.push((note.clone(), new));
            }
        }

        RenameSet::resolve(moves, notes)
    }
}

fn nearest_planned_ancestor(id: &ZettelId, planned: &HashSet<&ZettelId>) -> Option<ZettelId> {
    let mut current = id.parent();
    while let Some(candidate) = current {
        if planned.contains(&candidate) {
            return Some(candidate);
        }
        current = candidate.parent();
    }
    None
}
