//! zettel - Folgezettel identifiers, derived sequences, and safe renumbering

pub mod cli;
pub mod domain;
pub mod infra;
pub mod logging;
pub mod reorder;
pub mod sequence;
pub mod store;

use anyhow::Result;
use clap::Parser;

use cli::{
    Cli, Command,
    config::Config,
    handlers::{
        handle_attach, handle_children, handle_completions, handle_detach, handle_indent,
        handle_new, handle_next_slot, handle_outdent, handle_recover, handle_reorder, handle_tree,
    },
};

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::load()?;
    let notes_dir = config.notes_dir(cli.dir.as_ref());
    tracing::debug!(notes_dir = %notes_dir.display(), strict = config.strict, "starting");

    match &cli.command {
        Command::Tree(args) => handle_tree(args, &notes_dir, &config),
        Command::Children(args) => handle_children(args, &notes_dir),
        Command::NextSlot(args) => handle_next_slot(args, &notes_dir, &config),
        Command::New(args) => handle_new(args, &notes_dir, &config),
        Command::Indent(args) => handle_indent(args, &notes_dir),
        Command::Outdent(args) => handle_outdent(args, &notes_dir, &config),
        Command::Attach(args) => handle_attach(args, &notes_dir),
        Command::Detach(args) => handle_detach(args, &notes_dir, &config),
        Command::Reorder(args) => handle_reorder(args, &notes_dir, &config),
        Command::Recover(args) => handle_recover(args, &notes_dir),
        Command::Completions(args) => handle_completions(args),
    }
}
