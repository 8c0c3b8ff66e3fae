//! CLI command definitions and handlers

pub mod config;
pub mod handlers;
pub mod outline;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use output::OutputFormat;

/// zettel - Folgezettel hierarchies over markdown notes
#[derive(Parser, Debug)]
#[command(name = "zettel", version, about, long_about = None)]
pub struct Cli {
    /// Notes directory (overrides config file)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show sequences as indented trees
    Tree(TreeArgs),

    /// List the children of a note
    Children(ChildrenArgs),

    /// Print the next free identifier under a note (or a new root)
    NextSlot(NextSlotArgs),

    /// Create a new note as a root or as the next child of a note
    New(NewArgs),

    /// Make a note the last child of its previous sibling
    Indent(MoveArgs),

    /// Move a note up one level, next to its parent
    Outdent(MoveArgs),

    /// Move a note under another note
    Attach(AttachArgs),

    /// Turn a note into the root of its own sequence
    Detach(MoveArgs),

    /// Renumber a note's subtree from an outline
    Reorder(ReorderArgs),

    /// Finish renames left behind by an interrupted reorder
    Recover(RecoverArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `tree` command
#[derive(Parser, Debug)]
pub struct TreeArgs {
    /// Root of the sequence to show (all sequences if omitted)
    pub note: Option<String>,

    /// Only descend this many levels
    #[arg(long)]
    pub depth: Option<usize>,

    /// Include roots without children
    #[arg(short, long)]
    pub all: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `children` command
#[derive(Parser, Debug)]
pub struct ChildrenArgs {
    /// Parent note (identifier, filename stem, or path)
    pub note: String,

    /// Include all descendants, not just direct children
    #[arg(short, long)]
    pub all: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `next-slot` command
#[derive(Parser, Debug)]
pub struct NextSlotArgs {
    /// Parent note; prints a fresh root identifier if omitted
    pub note: Option<String>,
}

/// Arguments for the `new` command
#[derive(Parser, Debug)]
pub struct NewArgs {
    /// Note title
    pub title: String,

    /// Create the note as the next child of this note
    #[arg(short, long)]
    pub parent: Option<String>,

    /// Folder for a new root note, relative to the notes directory
    #[arg(long, conflicts_with = "parent")]
    pub folder: Option<PathBuf>,

    /// Open in editor after creation
    #[arg(short, long)]
    pub edit: bool,
}

/// Arguments shared by `indent`, `outdent`, and `detach`
#[derive(Parser, Debug)]
pub struct MoveArgs {
    /// Note to move
    pub note: String,

    /// Print the renames without performing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `attach` command
#[derive(Parser, Debug)]
pub struct AttachArgs {
    /// Note to move
    pub note: String,

    /// New parent
    pub parent: String,

    /// Print the renames without performing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `reorder` command
#[derive(Parser, Debug)]
pub struct ReorderArgs {
    /// Note whose subtree is renumbered
    pub note: String,

    /// Outline file with the desired order (`-` reads stdin)
    #[arg(short, long, required_unless_present = "show")]
    pub plan: Option<PathBuf>,

    /// Print the current outline instead of reordering
    #[arg(long, conflicts_with = "plan")]
    pub show: bool,

    /// Print the renames without performing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `recover` command
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `completions` command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish)
    #[arg(value_enum)]
    pub shell: Shell,
}
