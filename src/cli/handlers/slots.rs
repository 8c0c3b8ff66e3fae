//! Next-slot command handler.

use anyhow::{Context, Result, bail};
use std::path::Path;

use super::resolve::require_note;
use super::{list_notes, open_store, reorder_options};
use crate::cli::NextSlotArgs;
use crate::cli::config::Config;
use crate::reorder::moves::{child_slot, root_slot};

pub fn handle_next_slot(args: &NextSlotArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let store = open_store(notes_dir)?;
    let notes = list_notes(&store)?;

    let id = match &args.note {
        Some(reference) => {
            let parent = require_note(&notes, reference)?;
            let Some(parent_id) = parent.id() else {
                bail!("note has no zettel identifier: {}", parent.path().display());
            };
            let slot = child_slot(parent_id, &notes)
                .with_context(|| format!("no free slot under {parent_id}"))?;
            if slot.widened {
                eprintln!("warning: the usual slots under {parent_id} are full");
            }
            slot.id
        }
        None => root_slot(&notes, &reorder_options(config)).with_context(|| "no free root timestamp")?,
    };

    println!("{id}");
    Ok(())
}
