//! Builder for note files with sensible defaults.

#![allow(dead_code)]

/// A note file to place in a test vault.
#[derive(Debug, Clone)]
pub struct TestNote {
    id: String,
    prefix: Option<String>,
    title: Option<String>,
    up: Option<String>,
    frontmatter: bool,
    body: String,
}

impl TestNote {
    /// A note with identifier `id` and a minimal frontmatter block.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prefix: None,
            title: None,
            up: None,
            frontmatter: true,
            body: String::new(),
        }
    }

    /// Puts `title` in the filename after the identifier.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets the `up:` link to the stem of a parent note.
    pub fn up(mut self, parent_stem: impl Into<String>) -> Self {
        self.up = Some(parent_stem.into());
        self
    }

    /// Writes the body only, without a frontmatter block.
    pub fn bare(mut self) -> Self {
        self.frontmatter = false;
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn stem(&self) -> String {
        let mut stem = format!("{}{}", self.prefix.as_deref().unwrap_or(""), self.id);
        if let Some(title) = &self.title {
            stem.push(' ');
            stem.push_str(title);
        }
        stem
    }

    pub fn filename(&self) -> String {
        format!("{}.md", self.stem())
    }

    pub fn content(&self) -> String {
        if !self.frontmatter {
            return self.body.clone();
        }
        let mut out = String::from("---\n");
        if let Some(title) = &self.title {
            out.push_str(&format!("title: {title}\n"));
        }
        if let Some(up) = &self.up {
            out.push_str(&format!("up: \"[[{up}]]\"\n"));
        }
        out.push_str("---\n");
        out.push_str(&self.body);
        out
    }
}
