//! YAML frontmatter access: the note title and the `up:` parent link.
//!
//! Edits are line-based so that every other key, comment and the body are
//! written back byte for byte; `serde_yaml` is only used to read values.

use serde_yaml::Value;
use thiserror::Error;

/// Frontmatter key mirroring the note's parent.
pub const UP_KEY: &str = "up";

/// Errors during frontmatter parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing closing frontmatter delimiter '---'")]
    MissingClosingDelimiter,

    #[error("invalid YAML in frontmatter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

/// Byte ranges of a frontmatter block inside a note's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    /// YAML between the delimiters.
    pub yaml: &'a str,
    /// Everything after the closing delimiter line.
    pub body: &'a str,
    yaml_start: usize,
    yaml_end: usize,
}

/// Splits content into frontmatter and body.
///
/// Returns `Ok(None)` when the content does not open with `---`.
///
/// # Errors
///
/// Returns `ParseError::MissingClosingDelimiter` if the block is never closed.
pub fn split(content: &str) -> Result<Option<Frontmatter<'_>>, ParseError> {
    let after_opening = if content.starts_with("---\r\n") {
        5
    } else if content.starts_with("---\n") {
        4
    } else if content == "---" {
        return Err(ParseError::MissingClosingDelimiter);
    } else {
        return Ok(None);
    };

    let rest = &content[after_opening..];
    let closing = find_closing_delimiter(rest)?;
    let after_closing = &rest[closing..];
    let delimiter_len = if after_closing.starts_with("---\r\n") {
        5
    } else if after_closing.starts_with("---\n") {
        4
    } else {
        3
    };

    Ok(Some(Frontmatter {
        yaml: &rest[..closing],
        body: &rest[(closing + delimiter_len).min(rest.len())..],
        yaml_start: after_opening,
        yaml_end: after_opening + closing,
    }))
}

/// Finds the position of the closing `---` delimiter.
///
/// The closing delimiter must be at the start of a line and be exactly `---`
/// followed by a newline or EOF.
fn find_closing_delimiter(content: &str) -> Result<usize, ParseError> {
    let bytes = content.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if content[pos..].starts_with("---") {
            let after = pos + 3;
            if after >= bytes.len()
                || bytes[after] == b'\n'
                || (bytes[after] == b'\r' && bytes.get(after + 1) == Some(&b'\n'))
            {
                return Ok(pos);
            }
        }

        match content[pos..].find('\n') {
            Some(offset) => pos += offset + 1,
            None => break,
        }
    }

    Err(ParseError::MissingClosingDelimiter)
}

fn yaml_value(yaml: &str, key: &str) -> Result<Option<Value>, ParseError> {
    if yaml.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_yaml::from_str(yaml)?;
    Ok(value.get(key).cloned())
}

fn as_single_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Sequence(items) if items.len() == 1 => items[0].as_str().map(str::to_string),
        _ => None,
    }
}

/// Reads the `title` key.
pub fn title(content: &str) -> Result<Option<String>, ParseError> {
    let Some(fm) = split(content)? else {
        return Ok(None);
    };
    Ok(yaml_value(fm.yaml, "title")?
        .as_ref()
        .and_then(as_single_string)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

/// Formats a wiki link to a note stem.
pub fn wiki_link(stem: &str) -> String {
    format!("[[{}]]", stem)
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Points the `up:` field at `parent_stem`, or removes it when `None`.
///
/// Returns the rewritten content, or `None` when nothing changes: the link is
/// already correct, or the note has no frontmatter block to update.
pub fn set_up_link(content: &str, parent_stem: Option<&str>) -> Result<Option<String>, ParseError> {
    let Some(fm) = split(content)? else {
        return Ok(None);
    };
    let wanted = parent_stem.map(wiki_link);
    let current = yaml_value(fm.yaml, UP_KEY)?;
    let current_link = current.as_ref().and_then(as_single_string);

    match (&wanted, &current) {
        (None, None) => return Ok(None),
        (Some(w), Some(_)) if current_link.as_ref() == Some(w) => return Ok(None),
        _ => {}
    }

    let mut lines: Vec<&str> = fm.yaml.split_inclusive('\n').collect();
    let key_line = lines.iter().position(|l| is_key_line(l, UP_KEY));
    let replacement = wanted.map(|w| format!("{}: {}\n", UP_KEY, quote(&w)));

    let mut yaml = String::with_capacity(fm.yaml.len() + 32);
    match key_line {
        Some(start) => {
            let end = lines[start + 1..]
                .iter()
                .position(|l| !is_continuation_line(l))
                .map_or(lines.len(), |offset| start + 1 + offset);
            let tail = lines.split_off(end);
            lines.truncate(start);
            yaml.extend(lines);
            if let Some(r) = &replacement {
                yaml.push_str(r);
            }
            yaml.extend(tail);
        }
        None => {
            yaml.push_str(fm.yaml);
            if !yaml.is_empty() && !yaml.ends_with('\n') {
                yaml.push('\n');
            }
            if let Some(r) = &replacement {
                yaml.push_str(r);
            }
        }
    }

    let mut updated = String::with_capacity(content.len() + 32);
    updated.push_str(&content[..fm.yaml_start]);
    updated.push_str(&yaml);
    updated.push_str(&content[fm.yaml_end..]);
    Ok(Some(updated))
}

fn is_key_line(line: &str, key: &str) -> bool {
    line.strip_prefix(key)
        .is_some_and(|rest| rest.starts_with(':'))
}

/// Lines belonging to the previous key's value: indented, or a bare list item.
fn is_continuation_line(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t') || line.starts_with("- ")
}

/// Renders the frontmatter for a newly created note.
pub fn render_new(title: &str, parent_stem: Option<&str>) -> String {
    let mut out = String::from("---\n");
    out.push_str(&format!("title: {}\n", quote(title.trim())));
    if let Some(stem) = parent_stem {
        out.push_str(&format!("{}: {}\n", UP_KEY, quote(&wiki_link(stem))));
    }
    out.push_str("---\n");
    out
}
