//! Notes as the store sees them, and the on-disk filename grammar.

use crate::domain::ZettelId;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Extension every note file carries.
pub const NOTE_EXTENSION: &str = "md";

/// `<prefix?><17-digit timestamp><segment>*[<space><title>]`
static FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix>[a-z]+|[A-Z]+)?(?P<id>[0-9]{17}[0-9a-z]*)(?: (?P<title>.*))?$")
        .expect("filename pattern is valid")
});

/// The parts of a note's filename stem.
///
/// Filenames that do not match the grammar still produce a `NoteName`; they
/// simply carry no identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteName {
    stem: String,
    prefix: Option<String>,
    id: Option<ZettelId>,
    title: Option<String>,
}

impl NoteName {
    /// Parses a filename (with or without the `.md` extension).
    pub fn parse(filename: &str) -> Self {
        let stem = filename
            .strip_suffix(".md")
            .unwrap_or(filename)
            .to_string();

        let Some(caps) = FILENAME_RE.captures(&stem) else {
            return Self {
                stem,
                prefix: None,
                id: None,
                title: None,
            };
        };

        let id = caps.name("id").and_then(|m| m.as_str().parse().ok());
        let prefix = caps.name("prefix").map(|m| m.as_str().to_string());
        let title = caps
            .name("title")
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty());

        Self {
            stem,
            prefix: if id.is_some() { prefix } else { None },
            id,
            title,
        }
    }

    /// Renders a filename: `<prefix><id>[ <title>].md`.
    pub fn render(prefix: Option<&str>, id: &ZettelId, title: Option<&str>) -> String {
        let mut name = String::new();
        if let Some(prefix) = prefix {
            name.push_str(prefix);
        }
        name.push_str(&id.to_string());
        if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
            name.push(' ');
            name.push_str(title);
        }
        name.push('.');
        name.push_str(NOTE_EXTENSION);
        name
    }

    /// Returns the filename without extension.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Returns the legacy letter prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the parsed identifier, if the stem matches the grammar.
    pub fn id(&self) -> Option<&ZettelId> {
        self.id.as_ref()
    }

    /// Returns the human title embedded in the filename.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// Metadata supplied by the store for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteMetadata {
    /// Title from the note's frontmatter.
    pub title: Option<String>,
    /// File creation time, when the platform records one.
    pub created: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
}

impl NoteMetadata {
    pub fn new(modified: DateTime<Utc>) -> Self {
        Self {
            title: None,
            created: None,
            modified,
        }
    }
}

/// A note file owned by a store.
///
/// `path` is relative to the store root and includes the filename.
#[derive(Clone, PartialEq, Eq)]
pub struct Note {
    path: PathBuf,
    name: NoteName,
    metadata: NoteMetadata,
}

impl Note {
    pub fn new(path: impl Into<PathBuf>, metadata: NoteMetadata) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name: NoteName::parse(&filename),
            path,
            metadata,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the folder containing the note, relative to the store root.
    pub fn folder(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn name(&self) -> &NoteName {
        &self.name
    }

    pub fn stem(&self) -> &str {
        self.name.stem()
    }

    pub fn id(&self) -> Option<&ZettelId> {
        self.name.id()
    }

    pub fn metadata(&self) -> &NoteMetadata {
        &self.metadata
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.metadata.modified
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.metadata.created
    }

    /// Display title: frontmatter title, else filename title, else the stem.
    pub fn title(&self) -> &str {
        self.metadata
            .title
            .as_deref()
            .or(self.name.title())
            .unwrap_or(self.name.stem())
    }

    /// Filename this note would carry under a different identifier.
    ///
    /// The legacy prefix and the filename title are kept.
    pub fn filename_for(&self, id: &ZettelId) -> String {
        NoteName::render(self.name.prefix(), id, self.name.title())
    }

    /// Returns a copy of this note living at `path`.
    pub fn moved_to(&self, path: impl Into<PathBuf>) -> Self {
        Self::new(path, self.metadata.clone())
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("path", &self.path)
            .field("id", &self.name.id())
            .field("title", &self.title())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn note(path: &str) -> Note {
        let modified = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Note::new(path, NoteMetadata::new(modified))
    }

    #[test]
    fn parse_bare_identifier() {
        let name = NoteName::parse("20240101000000000a1.md");
        assert_eq!(name.id().unwrap().to_string(), "20240101000000000a1");
        assert_eq!(name.prefix(), None);
        assert_eq!(name.title(), None);
        assert_eq!(name.stem(), "20240101000000000a1");
    }

    #[test]
    fn parse_identifier_with_title() {
        let name = NoteName::parse("20240101000000000b Graph theory basics.md");
        assert_eq!(name.id().unwrap().to_string(), "20240101000000000b");
        assert_eq!(name.title(), Some("Graph theory basics"));
    }

    #[test]
    fn parse_legacy_prefix() {
        let name = NoteName::parse("z20240101000000000c2 Old note.md");
        assert_eq!(name.prefix(), Some("z"));
        assert_eq!(name.id().unwrap().to_string(), "20240101000000000c2");

        let upper = NoteName::parse("ZK20240101000000000.md");
        assert_eq!(upper.prefix(), Some("ZK"));
    }

    #[test]
    fn mixed_case_prefix_is_not_an_identifier() {
        let name = NoteName::parse("Zk20240101000000000.md");
        assert_eq!(name.id(), None);
        assert_eq!(name.prefix(), None);
    }

    #[test]
    fn unrelated_filename_has_no_identifier() {
        let name = NoteName::parse("Meeting notes.md");
        assert_eq!(name.id(), None);
        assert_eq!(name.stem(), "Meeting notes");
    }

    #[test]
    fn uppercase_in_tail_without_space_is_not_an_identifier() {
        assert_eq!(NoteName::parse("20240101000000000aB.md").id(), None);
    }

    #[test]
    fn render_round_trips_prefix_and_title() {
        let id: ZettelId = "20240101000000000a1".parse().unwrap();
        let filename = NoteName::render(Some("z"), &id, Some("Title here"));
        assert_eq!(filename, "z20240101000000000a1 Title here.md");

        let parsed = NoteName::parse(&filename);
        assert_eq!(parsed.prefix(), Some("z"));
        assert_eq!(parsed.id(), Some(&id));
        assert_eq!(parsed.title(), Some("Title here"));
    }

    #[test]
    fn filename_for_keeps_prefix_and_title() {
        let n = note("cards/x20240101000000000a Draft.md");
        let new_id: ZettelId = "20240101000000000c".parse().unwrap();
        assert_eq!(n.filename_for(&new_id), "x20240101000000000c Draft.md");
        assert_eq!(n.folder(), Path::new("cards"));
    }

    #[test]
    fn title_falls_back_to_filename() {
        let n = note("20240101000000000a Draft.md");
        assert_eq!(n.title(), "Draft");

        let bare = note("20240101000000000a.md");
        assert_eq!(bare.title(), "20240101000000000a");

        let mut titled = note("20240101000000000a Draft.md");
        titled.metadata.title = Some("From frontmatter".into());
        assert_eq!(titled.title(), "From frontmatter");
    }
}
