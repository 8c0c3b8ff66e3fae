//! Tree and children command handlers.

use anyhow::{Result, bail};
use std::path::Path;

use super::resolve::require_note;
use super::{display_line, list_notes, open_store, print_notes};
use crate::cli::config::Config;
use crate::cli::output::{OutputFormat, TreeListing, print_json};
use crate::cli::{ChildrenArgs, TreeArgs};
use crate::sequence::{
    BuildOptions, Sequence, SequenceNode, build_sequence, calculate_level, find_all_sequences,
    find_children,
};

pub fn handle_tree(args: &TreeArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let store = open_store(notes_dir)?;
    let notes = list_notes(&store)?;

    let mut options = BuildOptions::default().strict(config.strict);
    if let Some(depth) = args.depth {
        options = options.max_depth(depth);
    }

    let sequences: Vec<Sequence> = match &args.note {
        Some(reference) => {
            let root = require_note(&notes, reference)?;
            match build_sequence(&root, &notes, &options) {
                Some(sequence) => vec![sequence],
                None => bail!("note has no zettel identifier: {}", root.path().display()),
            }
        }
        None => find_all_sequences(&notes, &options, !args.all),
    };

    match args.format {
        OutputFormat::Json => {
            let trees: Vec<TreeListing> = sequences.iter().map(|s| TreeListing::from(&s.root)).collect();
            print_json(trees)
        }
        OutputFormat::Paths => {
            for node in sequences.iter().flat_map(|s| &s.nodes) {
                println!("{}", node.note.path().display());
            }
            Ok(())
        }
        OutputFormat::Human => {
            for sequence in &sequences {
                print_node(&sequence.root);
            }
            if sequences.is_empty() {
                println!("No sequences found");
            }
            Ok(())
        }
    }
}

fn print_node(node: &SequenceNode) {
    println!("{}{}", "  ".repeat(node.level), display_line(&node.note));
    for child in &node.children {
        print_node(child);
    }
}

pub fn handle_children(args: &ChildrenArgs, notes_dir: &Path) -> Result<()> {
    let store = open_store(notes_dir)?;
    let notes = list_notes(&store)?;
    let parent = require_note(&notes, &args.note)?;
    let Some(parent_id) = parent.id() else {
        bail!("note has no zettel identifier: {}", parent.path().display());
    };

    let children = find_children(parent_id, &notes, !args.all);
    let levels: Vec<usize> = children
        .iter()
        .filter_map(|n| n.id())
        .map(|id| calculate_level(id) - calculate_level(parent_id) - 1)
        .collect();
    print_notes(&children, Some(&levels), args.format)
}
