//! Text outlines for the `reorder` command.
//!
//! ```text
//! # desired order below 20240101000000000
//! 20240101000000000b Second
//!   20240101000000000b1 Child
//! ^20240101000000000a Lifted out
//! ```
//!
//! Two spaces per level. The first word of a line names the note (an
//! identifier, filename stem, or path); the rest is ignored. `^` marks a
//! promoted entry. Blank lines and lines starting with `#` are skipped.

use thiserror::Error;

use crate::sequence::Sequence;

const INDENT: &str = "  ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutlineError {
    #[error("line {line}: indentation must be a multiple of two spaces")]
    Indentation { line: usize },

    #[error("line {line}: tabs are not allowed in indentation")]
    Tab { line: usize },

    #[error("line {line}: missing note reference")]
    MissingNote { line: usize },
}

/// An unresolved outline line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineLine {
    /// One-based line number in the source text.
    pub line: usize,
    pub indent: usize,
    pub promoted: bool,
    pub reference: String,
}

pub fn parse(text: &str) -> Result<Vec<OutlineLine>, OutlineError> {
    let mut lines = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim_start_matches([' ', '\t']);
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let leading = &raw[..raw.len() - trimmed.len()];
        if leading.contains('\t') {
            return Err(OutlineError::Tab { line });
        }
        if leading.len() % INDENT.len() != 0 {
            return Err(OutlineError::Indentation { line });
        }

        let (promoted, rest) = match trimmed.strip_prefix('^') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };
        let reference = rest
            .split_whitespace()
            .next()
            .ok_or(OutlineError::MissingNote { line })?;

        lines.push(OutlineLine {
            line,
            indent: leading.len() / INDENT.len(),
            promoted,
            reference: reference.to_string(),
        });
    }
    Ok(lines)
}

/// Renders the current shape of a sequence, root excluded, so it can be
/// edited and fed back to `reorder --plan`.
pub fn render(sequence: &Sequence) -> String {
    let mut out = String::new();
    if let Some(id) = sequence.root.note.id() {
        out.push_str(&format!("# order below {id} {}\n", sequence.root.note.title()));
    }
    for node in sequence.nodes.iter().skip(1) {
        let Some(id) = node.note.id() else { continue };
        out.push_str(&INDENT.repeat(node.level.saturating_sub(1)));
        out.push_str(&format!("{id} {}\n", node.note.title()));
    }
    out
}
