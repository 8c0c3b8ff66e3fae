//! Command handlers for the CLI.

mod completions;
mod moves;
mod new;
mod reorder;
mod resolve;
mod slots;
mod tree;


use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::config::Config;
use crate::cli::output::{NoteListing, OutputFormat, planned, print_json};
use crate::domain::Note;
use crate::reorder::{ApplyError, Cancellation, RenameReport, RenameSet, ReorderOptions, apply};
use crate::store::{NoteStore, VaultStore};

pub use completions::handle_completions;
pub use moves::{handle_attach, handle_detach, handle_indent, handle_outdent};
pub use new::{NewNoteResult, create_new_note, handle_new};
pub use reorder::{handle_recover, handle_reorder, plan_from_outline};
pub use resolve::{ResolveResult, resolve_note};
pub use slots::handle_next_slot;
pub use tree::{handle_children, handle_tree};

// ===========================================
// Shared Utilities
// ===========================================

pub(crate) fn open_store(notes_dir: &Path) -> Result<VaultStore> {
    VaultStore::open(notes_dir)
        .with_context(|| format!("failed to open notes directory: {}", notes_dir.display()))
}

pub(crate) fn list_notes(store: &VaultStore) -> Result<Vec<Note>> {
    store.list().with_context(|| "failed to list notes")
}

pub(crate) fn reorder_options(config: &Config) -> ReorderOptions {
    ReorderOptions {
        timestamp_attempts: config.timestamp_attempts(),
        ..ReorderOptions::default()
    }
}

/// Prints a dry run, or applies `set` and prints what happened.
pub(crate) fn execute(
    store: &mut VaultStore,
    set: &RenameSet,
    dry_run: bool,
    format: OutputFormat,
) -> Result<()> {
    if dry_run {
        return print_planned(set, format);
    }
    match apply(store, set, &Cancellation::new()) {
        Ok(report) => print_report(&report, format),
        Err(err) => {
            print_apply_failure(&err);
            Err(err).with_context(|| "rename failed; run `zettel recover` to finish staged renames")
        }
    }
}

fn print_apply_failure(err: &ApplyError) {
    let (finalized, staged, pending) = match err {
        ApplyError::Partial {
            finalized,
            staged,
            pending,
            ..
        } => (finalized.as_slice(), staged.as_slice(), pending.as_slice()),
        ApplyError::Cancelled { staged, .. } => (&[][..], staged.as_slice(), &[][..]),
        _ => return,
    };
    for renamed in finalized {
        eprintln!("  renamed: {} -> {}", renamed.from.display(), renamed.to.display());
    }
    for renamed in staged {
        eprintln!("  staged:  {} -> {}", renamed.from.display(), renamed.to.display());
    }
    for path in pending {
        eprintln!("  pending: {}", path.display());
    }
}

fn print_planned(set: &RenameSet, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(planned(set)),
        OutputFormat::Paths => {
            for rename in set {
                println!("{}", rename.note.path().display());
            }
            Ok(())
        }
        OutputFormat::Human => {
            if set.is_empty() {
                println!("Nothing to rename");
            }
            for rename in set {
                println!("{} -> {}", rename.note.filename(), rename.filename);
            }
            Ok(())
        }
    }
}

pub(crate) fn print_report(report: &RenameReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Paths => {
            for renamed in &report.renamed {
                println!("{}", renamed.to.display());
            }
            Ok(())
        }
        OutputFormat::Human => {
            if report.renamed.is_empty() {
                println!("Nothing to rename");
            }
            for renamed in &report.renamed {
                println!("{} -> {}", renamed.from.display(), renamed.to.display());
            }
            if !report.links_updated.is_empty() {
                println!("Updated {} up link(s)", report.links_updated.len());
            }
            for failure in &report.link_failures {
                eprintln!("  warning: {}: {}", failure.path.display(), failure.error);
            }
            for conflict in &report.conflicts {
                eprintln!("  skipped: {} (final name taken)", conflict.display());
            }
            Ok(())
        }
    }
}

pub(crate) fn print_notes(notes: &[&Note], levels: Option<&[usize]>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let listings: Vec<NoteListing> = notes
                .iter()
                .enumerate()
                .map(|(i, note)| match levels {
                    Some(levels) => NoteListing::at_level(note, levels[i]),
                    None => NoteListing::new(note),
                })
                .collect();
            print_json(listings)
        }
        OutputFormat::Paths => {
            for note in notes {
                println!("{}", note.path().display());
            }
            Ok(())
        }
        OutputFormat::Human => {
            for (i, note) in notes.iter().enumerate() {
                let depth = levels.map_or(0, |levels| levels[i]);
                println!("{}{}", "  ".repeat(depth), display_line(note));
            }
            Ok(())
        }
    }
}

/// `<id>  <title>`, or just the title for notes without an identifier.
pub(crate) fn display_line(note: &Note) -> String {
    match note.id() {
        Some(id) if note.title() != note.stem() => format!("{id}  {}", note.title()),
        Some(id) => id.to_string(),
        None => note.title().to_string(),
    }
}
