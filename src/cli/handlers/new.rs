//! New note command handler.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

use super::resolve::require_note;
use super::{list_notes, open_store, reorder_options};
use crate::cli::NewArgs;
use crate::cli::config::Config;
use crate::domain::{Note, NoteName, ZettelId};
use crate::infra::frontmatter;
use crate::reorder::ReorderOptions;
use crate::reorder::moves::{child_slot, root_slot};
use crate::store::NoteStore;

/// A note ready to be written (for testability).
#[derive(Debug, PartialEq, Eq)]
pub struct NewNoteResult {
    pub id: ZettelId,
    /// Folder relative to the notes directory.
    pub folder: PathBuf,
    pub filename: String,
    pub content: String,
}

/// Picks an identifier and renders the file for a new note (no I/O).
///
/// With a parent the note takes the parent's next free child slot and lives
/// in the parent's folder; otherwise it gets a fresh root timestamp.
///
/// # Errors
///
/// Returns an error if the title is empty, the parent has no identifier, or
/// no slot is free.
pub fn create_new_note(
    title: &str,
    parent: Option<&Note>,
    folder: Option<&Path>,
    notes: &[Note],
    options: &ReorderOptions,
) -> Result<NewNoteResult> {
    let title = title.trim();
    if title.is_empty() {
        bail!("title cannot be empty");
    }

    let (id, folder, parent_stem) = match parent {
        Some(parent) => {
            let Some(parent_id) = parent.id() else {
                bail!("parent has no zettel identifier: {}", parent.path().display());
            };
            let slot = child_slot(parent_id, notes)
                .with_context(|| format!("no free slot under {parent_id}"))?;
            if slot.widened {
                tracing::warn!(parent = %parent_id, id = %slot.id, "using a widened slot");
            }
            (slot.id, parent.folder().to_path_buf(), Some(parent.stem()))
        }
        None => {
            let id = root_slot(notes, options).with_context(|| "no free root timestamp")?;
            (id, folder.map(Path::to_path_buf).unwrap_or_default(), None)
        }
    };

    Ok(NewNoteResult {
        filename: NoteName::render(None, &id, Some(title)),
        content: frontmatter::render_new(title, parent_stem),
        id,
        folder,
    })
}

/// Opens a file in the user's configured editor.
pub(crate) fn open_in_editor(path: &Path, config: &Config) -> Result<()> {
    let editor = config.editor();

    // Parse editor command (may include args like "code --wait")
    let parts: Vec<&str> = editor.split_whitespace().collect();
    let Some((cmd, args)) = parts.split_first() else {
        bail!("editor command is empty");
    };

    let status = Command::new(cmd)
        .args(args)
        .arg(path)
        .status()
        .with_context(|| format!("failed to launch editor '{}'", editor))?;

    if !status.success() {
        bail!("editor '{}' exited with non-zero status", editor);
    }

    Ok(())
}

pub fn handle_new(args: &NewArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let mut store = open_store(notes_dir)?;
    let notes = list_notes(&store)?;

    let parent = args
        .parent
        .as_deref()
        .map(|reference| require_note(&notes, reference))
        .transpose()?;
    let result = create_new_note(
        &args.title,
        parent.as_ref(),
        args.folder.as_deref(),
        &notes,
        &reorder_options(config),
    )?;

    let note = store
        .create(&result.folder, &result.filename, &result.content)
        .with_context(|| format!("failed to create note {}", result.filename))?;

    println!("Created: {} [{}]", note.title(), result.id);
    println!("  {}", note.path().display());

    if args.edit {
        open_in_editor(&notes_dir.join(note.path()), config)?;
    }

    Ok(())
}
