//! Indent, outdent, attach, and detach command handlers.

use anyhow::{Context, Result};
use std::path::Path;

use super::resolve::require_note;
use super::{execute, list_notes, open_store, reorder_options};
use crate::cli::config::Config;
use crate::cli::{AttachArgs, MoveArgs};
use crate::reorder::moves;

pub fn handle_indent(args: &MoveArgs, notes_dir: &Path) -> Result<()> {
    let mut store = open_store(notes_dir)?;
    let notes = list_notes(&store)?;
    let note = require_note(&notes, &args.note)?;

    let set = moves::indent(&note, &notes).with_context(|| format!("cannot indent {}", args.note))?;
    execute(&mut store, &set, args.dry_run, args.format)
}

pub fn handle_outdent(args: &MoveArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let mut store = open_store(notes_dir)?;
    let notes = list_notes(&store)?;
    let note = require_note(&notes, &args.note)?;

    let set = moves::outdent(&note, &notes, &reorder_options(config))
        .with_context(|| format!("cannot outdent {}", args.note))?;
    execute(&mut store, &set, args.dry_run, args.format)
}

pub fn handle_attach(args: &AttachArgs, notes_dir: &Path) -> Result<()> {
    let mut store = open_store(notes_dir)?;
    let notes = list_notes(&store)?;
    let note = require_note(&notes, &args.note)?;
    let parent = require_note(&notes, &args.parent)?;

    let set = moves::attach(&note, &parent, &notes)
        .with_context(|| format!("cannot attach {} to {}", args.note, args.parent))?;
    execute(&mut store, &set, args.dry_run, args.format)
}

pub fn handle_detach(args: &MoveArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let mut store = open_store(notes_dir)?;
    let notes = list_notes(&store)?;
    let note = require_note(&notes, &args.note)?;

    let set = moves::detach(&note, &notes, &reorder_options(config))
        .with_context(|| format!("cannot detach {}", args.note))?;
    execute(&mut store, &set, args.dry_run, args.format)
}
