//! Single-note tree moves and slots for new notes.
//!
//! Each move relocates a whole subtree: the note gets a new identifier and
//! every descendant is rebased beneath it.

use super::{PlanError, ReorderOptions, RenameSet, allocate_root_timestamp, id_of, occupied_slots};
use crate::domain::{Note, ZettelId};
use crate::sequence::{SlotAllocation, addressable, find_next_available_child_slot};
use std::collections::HashSet;

/// Moves `note` under its previous sibling, into that sibling's first free child slot.
pub fn indent(note: &Note, notes: &[Note]) -> Result<RenameSet, PlanError> {
    let id = id_of(note)?;
    let parent = id.parent().ok_or_else(|| PlanError::RootNote { id: id.to_string() })?;

    let sibling = addressable(notes, false)
        .into_iter()
        .map(|(_, other)| other)
        .filter(|other| parent.is_parent_of(other) && *other < id)
        .max()
        .cloned()
        .ok_or_else(|| PlanError::NoPreviousSibling { id: id.to_string() })?;

    let target = child_slot(&sibling, notes)?.id;
    move_subtree(id, &target, notes)
}

/// Moves `note` up one level, next to its former parent.
///
/// A direct child of a root becomes a root itself.
pub fn outdent(note: &Note, notes: &[Note], options: &ReorderOptions) -> Result<RenameSet, PlanError> {
    let id = id_of(note)?;
    let parent = id.parent().ok_or_else(|| PlanError::RootNote { id: id.to_string() })?;

    let target = match parent.parent() {
        Some(grandparent) => child_slot(&grandparent, notes)?.id,
        None => fresh_root(note, notes, options)?,
    };
    move_subtree(id, &target, notes)
}

/// Moves `note` under `parent`, taking the first free child slot.
pub fn attach(note: &Note, parent: &Note, notes: &[Note]) -> Result<RenameSet, PlanError> {
    let id = id_of(note)?;
    let parent_id = id_of(parent)?;
    if id == parent_id || id.is_ancestor_of(parent_id) {
        return Err(PlanError::Cycle {
            id: id.to_string(),
            parent: parent_id.to_string(),
        });
    }
    if parent_id.is_parent_of(id) {
        return Ok(RenameSet::default());
    }

    let target = child_slot(parent_id, notes)?.id;
    move_subtree(id, &target, notes)
}

/// Turns `note` into the root of its own hierarchy.
pub fn detach(note: &Note, notes: &[Note], options: &ReorderOptions) -> Result<RenameSet, PlanError> {
    let id = id_of(note)?;
    if id.is_root() {
        return Err(PlanError::RootNote { id: id.to_string() });
    }
    let target = fresh_root(note, notes, options)?;
    move_subtree(id, &target, notes)
}

/// First free child slot of `parent` for a new note.
pub fn child_slot(parent: &ZettelId, notes: &[Note]) -> Result<SlotAllocation, PlanError> {
    let occupied = occupied_slots(addressable(notes, false).into_iter().map(|(_, id)| id));
    Ok(find_next_available_child_slot(parent, &occupied)?)
}

/// An unused root identifier for a new note, based on `options.now`.
pub fn root_slot(notes: &[Note], options: &ReorderOptions) -> Result<ZettelId, PlanError> {
    allocate_root_timestamp(
        &taken_roots(notes),
        options.now,
        None,
        None,
        options.timestamp_attempts,
    )
}

fn fresh_root(note: &Note, notes: &[Note], options: &ReorderOptions) -> Result<ZettelId, PlanError> {
    allocate_root_timestamp(
        &taken_roots(notes),
        options.now,
        note.created(),
        note.id(),
        options.timestamp_attempts,
    )
}

fn taken_roots(notes: &[Note]) -> HashSet<String> {
    addressable(notes, false)
        .into_iter()
        .map(|(_, id)| id.timestamp().to_string())
        .collect()
}

fn move_subtree(from: &ZettelId, to: &ZettelId, notes: &[Note]) -> Result<RenameSet, PlanError> {
    let moves = addressable(notes, false)
        .into_iter()
        .filter_map(|(note, id)| id.rebase(from, to).map(|new| (note.clone(), new)))
        .collect();
    RenameSet::resolve(moves, notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NoteMetadata;
    use crate::reorder::LinkTarget;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    const ROOT: &str = "20240101000000000";

    fn note(tail: &str) -> Note {
        Note::new(
            format!("{ROOT}{tail}.md"),
            NoteMetadata::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        )
    }

    fn notes(tails: &[&str]) -> Vec<Note> {
        tails.iter().map(|t| note(t)).collect()
    }

    fn options() -> ReorderOptions {
        ReorderOptions::at(
            NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_milli_opt(12, 0, 0, 0)
                .unwrap(),
        )
    }

    fn moved(set: &RenameSet) -> Vec<(String, String)> {
        set.iter().map(|r| (r.from.tail(), r.to.to_string())).collect()
    }

    fn pair(from: &str, to: &str) -> (String, String) {
        (from.to_string(), format!("{ROOT}{to}"))
    }

    #[test]
    fn indent_under_previous_sibling() {
        let all = notes(&["", "a", "a1", "b", "b1"]);
        let set = indent(&note("b"), &all).unwrap();
        assert_eq!(moved(&set), vec![pair("b", "a2"), pair("b1", "a2a")]);
    }

    #[test]
    fn indent_fills_the_first_gap_among_children() {
        let all = notes(&["", "a", "a1", "a3", "b"]);
        let set = indent(&note("b"), &all).unwrap();
        assert_eq!(moved(&set), vec![pair("b", "a2")]);
    }

    #[test]
    fn indent_first_child_fails() {
        let all = notes(&["", "a", "b"]);
        assert_eq!(
            indent(&note("a"), &all),
            Err(PlanError::NoPreviousSibling {
                id: format!("{ROOT}a")
            })
        );
        assert!(matches!(indent(&note(""), &all), Err(PlanError::RootNote { .. })));
    }

    #[test]
    fn outdent_next_to_parent() {
        let all = notes(&["", "a", "a1", "a1a", "b"]);
        let set = outdent(&note("a1"), &all, &options()).unwrap();
        assert_eq!(moved(&set), vec![pair("a1", "c"), pair("a1a", "c1")]);
    }

    #[test]
    fn outdent_child_of_root_becomes_root() {
        let all = notes(&["", "a", "a1"]);
        let set = outdent(&note("a"), &all, &options()).unwrap();
        let ids: Vec<String> = set.iter().map(|r| r.to.to_string()).collect();
        assert_eq!(ids, vec!["20240601120000000", "20240601120000000a"]);
        assert_eq!(set.iter().next().unwrap().link, LinkTarget::Remove);
    }

    #[test]
    fn attach_and_cycle() {
        let all = notes(&["", "a", "a1", "b"]);
        let set = attach(&note("b"), &note("a"), &all).unwrap();
        assert_eq!(moved(&set), vec![pair("b", "a2")]);

        assert!(matches!(
            attach(&note("a"), &note("a1"), &all),
            Err(PlanError::Cycle { .. })
        ));
        assert!(attach(&note("a1"), &note("a"), &all).unwrap().is_empty());
    }

    #[test]
    fn detach_keeps_subtree_shape() {
        let all = notes(&["", "a", "a1", "a1a"]);
        let set = detach(&note("a1"), &all, &options()).unwrap();
        let ids: Vec<String> = set.iter().map(|r| r.to.to_string()).collect();
        assert_eq!(ids, vec!["20240601120000000", "20240601120000000a"]);
    }

    #[test]
    fn child_slot_skips_orphans() {
        let all = notes(&["", "a", "b1"]);
        let slot = child_slot(&ROOT.parse().unwrap(), &all).unwrap();
        assert_eq!(slot.id.to_string(), format!("{ROOT}c"));
    }

    #[test]
    fn root_slot_avoids_existing_timestamp() {
        let mut all = notes(&[""]);
        all.push(Note::new(
            "20240601120000000.md",
            NoteMetadata::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        ));
        let id = root_slot(&all, &options()).unwrap();
        assert_eq!(id.to_string(), "20240601120000001");
    }
}
