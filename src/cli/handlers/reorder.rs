//! Reorder and recover command handlers.

use anyhow::{Context, Result, bail};
use std::io::Read;
use std::path::Path;

use super::resolve::require_note;
use super::{execute, list_notes, open_store, print_report, reorder_options};
use crate::cli::config::Config;
use crate::cli::outline::{self, OutlineLine};
use crate::cli::{RecoverArgs, ReorderArgs};
use crate::domain::Note;
use crate::reorder::{PlanEntry, ReorderPlan, recover};
use crate::sequence::{BuildOptions, build_sequence};

/// Resolves outline lines against the listing and builds the plan.
pub fn plan_from_outline(root: Note, lines: &[OutlineLine], notes: &[Note]) -> Result<ReorderPlan> {
    let entries = lines
        .iter()
        .map(|line| {
            let note = require_note(notes, &line.reference)
                .with_context(|| format!("outline line {}", line.line))?;
            Ok(if line.promoted {
                PlanEntry {
                    indent: line.indent,
                    ..PlanEntry::promoted(note)
                }
            } else {
                PlanEntry::new(note, line.indent)
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ReorderPlan::new(root, entries))
}

fn read_plan(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .with_context(|| "failed to read outline from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read outline: {}", path.display()))
}

pub fn handle_reorder(args: &ReorderArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let mut store = open_store(notes_dir)?;
    let notes = list_notes(&store)?;
    let root = require_note(&notes, &args.note)?;

    if args.show {
        let options = BuildOptions::default().strict(config.strict);
        let Some(sequence) = build_sequence(&root, &notes, &options) else {
            bail!("note has no zettel identifier: {}", root.path().display());
        };
        print!("{}", outline::render(&sequence));
        return Ok(());
    }

    let Some(plan_path) = &args.plan else {
        bail!("an outline is required: pass --plan <FILE> or --show");
    };
    let text = read_plan(plan_path)?;
    let lines = outline::parse(&text).with_context(|| "invalid outline")?;
    let plan = plan_from_outline(root, &lines, &notes)?;

    let set = plan
        .compute(&notes, &reorder_options(config))
        .with_context(|| format!("cannot reorder {}", args.note))?;
    tracing::info!(renames = set.len(), "reorder planned");
    execute(&mut store, &set, args.dry_run, args.format)
}

pub fn handle_recover(args: &RecoverArgs, notes_dir: &Path) -> Result<()> {
    let mut store = open_store(notes_dir)?;
    let report = recover(&mut store).with_context(|| "recovery failed")?;
    print_report(&report, args.format)
}
