//! On-demand derivation of note trees from identifiers alone.
//!
//! Nothing here is cached: every function is a pure view over the listing it
//! is handed, so results are stale as soon as the store changes.

use crate::domain::{Note, ZettelId};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::fmt;

/// True if `id` has no hierarchy segments.
pub fn is_root(id: &ZettelId) -> bool {
    id.is_root()
}

/// Depth of `id`: the number of segments, 0 for a root.
pub fn calculate_level(id: &ZettelId) -> usize {
    id.depth()
}

/// True if `child` extends `parent` by exactly one segment.
pub fn is_direct_child(parent: &ZettelId, child: &ZettelId) -> bool {
    parent.is_parent_of(child)
}

/// Notes carrying a parseable identifier, skipping the rest.
///
/// In strict mode identifiers that break segment alternation are skipped too.
pub(crate) fn addressable(notes: &[Note], strict: bool) -> Vec<(&Note, &ZettelId)> {
    notes
        .iter()
        .filter_map(|note| match note.id() {
            None => {
                tracing::trace!(path = %note.path().display(), "not a zettel filename");
                None
            }
            Some(id) if strict && !id.is_well_formed() => {
                tracing::warn!(
                    path = %note.path().display(),
                    id = %id,
                    "skipping identifier with non-alternating segments"
                );
                None
            }
            Some(id) => Some((note, id)),
        })
        .collect()
}

/// Finds the children of `parent` in identifier order.
///
/// With `direct_only` only notes exactly one segment below `parent` are
/// returned; otherwise every descendant is.
pub fn find_children<'a>(parent: &ZettelId, notes: &'a [Note], direct_only: bool) -> Vec<&'a Note> {
    let mut children: Vec<(&Note, &ZettelId)> = addressable(notes, false)
        .into_iter()
        .filter(|(_, id)| {
            if direct_only {
                parent.is_parent_of(id)
            } else {
                parent.is_ancestor_of(id)
            }
        })
        .collect();
    children.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.path().cmp(b.0.path())));
    children.into_iter().map(|(note, _)| note).collect()
}

/// Finds every root note, optionally only those with at least one descendant.
pub fn find_all_roots(notes: &[Note], with_children_only: bool) -> Vec<&Note> {
    let zettels = addressable(notes, false);
    let mut roots: Vec<(&Note, &ZettelId)> = zettels
        .iter()
        .filter(|(_, id)| id.is_root())
        .filter(|(_, root)| {
            !with_children_only || zettels.iter().any(|(_, other)| root.is_ancestor_of(other))
        })
        .copied()
        .collect();
    roots.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.path().cmp(b.0.path())));
    roots.into_iter().map(|(note, _)| note).collect()
}

/// Predicate deciding whether a node (and its subtree) joins a sequence.
pub type NodeFilter = Box<dyn Fn(&Note) -> bool>;

/// Options for [`build_sequence`].
#[derive(Default)]
pub struct BuildOptions {
    /// Deepest level (relative to the root, which is 0) to include.
    pub max_depth: Option<usize>,
    /// Nodes rejected by the filter are left out along with their subtrees.
    pub filter: Option<NodeFilter>,
    /// Skip identifiers whose segment kinds do not alternate.
    pub strict: bool,
}

impl BuildOptions {
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn filter(mut self, filter: impl Fn(&Note) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOptions")
            .field("max_depth", &self.max_depth)
            .field("filter", &self.filter.is_some())
            .field("strict", &self.strict)
            .finish()
    }
}

/// One note in a derived tree.
#[derive(Debug, Clone)]
pub struct SequenceNode {
    pub note: Note,
    /// Depth below the sequence root; the root is 0.
    pub level: usize,
    pub children: Vec<SequenceNode>,
}

impl SequenceNode {
    /// Finds the node for `id` in this subtree.
    pub fn find(&self, id: &ZettelId) -> Option<&SequenceNode> {
        if self.note.id() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    fn flatten_into(&self, out: &mut Vec<FlatNode>) {
        out.push(FlatNode {
            note: self.note.clone(),
            level: self.level,
        });
        for child in &self.children {
            child.flatten_into(out);
        }
    }
}

/// A node of the depth-first flattened view.
#[derive(Debug, Clone)]
pub struct FlatNode {
    pub note: Note,
    pub level: usize,
}

/// Aggregates over all members of a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceMeta {
    pub total_notes: usize,
    pub max_depth: usize,
    /// Parsed from the root's timestamp.
    pub created: Option<NaiveDateTime>,
    /// Latest modification over all members.
    pub modified: Option<DateTime<Utc>>,
}

/// A root note with its derived descendants.
#[derive(Debug, Clone)]
pub struct Sequence {
    pub root: SequenceNode,
    pub meta: SequenceMeta,
    /// Every node, depth first, root first.
    pub nodes: Vec<FlatNode>,
}

impl Sequence {
    pub fn contains(&self, id: &ZettelId) -> bool {
        self.root.find(id).is_some()
    }
}

/// Builds the tree below `root` from the flat listing.
///
/// The root is always included. Children are attached recursively in
/// identifier order, honouring `options.max_depth` and `options.filter`.
/// Returns `None` if `root` has no identifier.
pub fn build_sequence(root: &Note, notes: &[Note], options: &BuildOptions) -> Option<Sequence> {
    let root_id = root.id()?;
    let zettels = addressable(notes, options.strict);

    let mut by_parent: HashMap<ZettelId, Vec<(&Note, &ZettelId)>> = HashMap::new();
    for &(note, id) in &zettels {
        if !root_id.is_ancestor_of(id) {
            continue;
        }
        if let Some(parent) = id.parent() {
            by_parent.entry(parent).or_default().push((note, id));
        }
    }
    for children in by_parent.values_mut() {
        children.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.path().cmp(b.0.path())));
    }

    let tree = attach(root, root_id, 0, &by_parent, options);

    let mut nodes = Vec::new();
    tree.flatten_into(&mut nodes);
    let meta = SequenceMeta {
        total_notes: nodes.len(),
        max_depth: nodes.iter().map(|n| n.level).max().unwrap_or(0),
        created: root_id.created_at(),
        modified: nodes.iter().map(|n| n.note.modified()).max(),
    };

    Some(Sequence {
        root: tree,
        meta,
        nodes,
    })
}

fn attach(
    note: &Note,
    id: &ZettelId,
    level: usize,
    by_parent: &HashMap<ZettelId, Vec<(&Note, &ZettelId)>>,
    options: &BuildOptions,
) -> SequenceNode {
    let within_depth = options.max_depth.is_none_or(|max| level < max);
    let children = match by_parent.get(id) {
        Some(children) if within_depth => children
            .iter()
            .filter(|(child, _)| options.filter.as_ref().is_none_or(|f| f(*child)))
            .map(|(child, child_id)| attach(child, child_id, level + 1, by_parent, options))
            .collect(),
        _ => Vec::new(),
    };

    SequenceNode {
        note: note.clone(),
        level,
        children,
    }
}

/// Builds a sequence for every root note.
pub fn find_all_sequences(
    notes: &[Note],
    options: &BuildOptions,
    with_children_only: bool,
) -> Vec<Sequence> {
    find_all_roots(notes, with_children_only)
        .into_iter()
        .filter_map(|root| build_sequence(root, notes, options))
        .collect()
}
