//! Frontmatter parsing and editing

pub mod frontmatter;
