//! Note resolution utilities.

use anyhow::{Result, bail};
use std::path::Path;

use crate::domain::{Note, NoteName};

/// Result of resolving a note reference.
#[derive(Debug)]
pub enum ResolveResult {
    /// Exactly one note matched.
    Unique(Note),
    /// Multiple notes matched (ambiguous).
    Ambiguous(Vec<Note>),
    /// No notes matched.
    NotFound,
}

/// Prints the candidates so the user can pick a more precise reference.
pub(crate) fn print_ambiguous_notes(reference: &str, notes: &[Note]) {
    eprintln!("Ambiguous: '{}' matches {} notes:", reference, notes.len());
    for note in notes {
        eprintln!("  {}", note.path().display());
    }
    eprintln!();
    eprintln!("Use the file path to specify which note you mean.");
}

/// Resolves a reference to a unique note.
///
/// Resolution order, stopping at the first step with any match:
/// 1. Path relative to the notes directory (`.md` optional)
/// 2. Zettel identifier (a legacy prefix in the reference is ignored)
/// 3. Exact filename stem
/// 4. Exact title, case-insensitive
pub fn resolve_note(notes: &[Note], reference: &str) -> ResolveResult {
    let reference = reference.trim();
    let path = Path::new(reference);
    let with_ext = format!("{reference}.md");
    let wanted = NoteName::parse(reference);

    let steps: [&dyn Fn(&Note) -> bool; 4] = [
        &|n: &Note| n.path() == path || n.path() == Path::new(&with_ext),
        &|n: &Note| wanted.id().is_some() && n.id() == wanted.id(),
        &|n: &Note| n.stem() == reference,
        &|n: &Note| n.title().eq_ignore_ascii_case(reference),
    ];

    for matches in steps {
        let mut found: Vec<Note> = notes.iter().filter(|n| matches(n)).cloned().collect();
        match found.len() {
            0 => continue,
            1 => return ResolveResult::Unique(found.remove(0)),
            _ => return ResolveResult::Ambiguous(found),
        }
    }
    ResolveResult::NotFound
}

/// Resolves `reference` or fails with a message naming it.
pub(crate) fn require_note(notes: &[Note], reference: &str) -> Result<Note> {
    match resolve_note(notes, reference) {
        ResolveResult::Unique(note) => Ok(note),
        ResolveResult::Ambiguous(candidates) => {
            print_ambiguous_notes(reference, &candidates);
            bail!("ambiguous note reference");
        }
        ResolveResult::NotFound => bail!("note not found: '{}'", reference),
    }
}
