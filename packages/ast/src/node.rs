//! Node model for transcribed documents.
//!
//! Every node kind carries only the metadata that applies to it, so
//! consumers discriminate with a match instead of probing optional fields.
//! Ids arriving from external payloads may be missing or duplicated;
//! [`normalize_tree`] repairs them before any index is built.

use crate::id::IdGenerator;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Stable node identifier.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Document-level metadata, edited through the metadata mutation path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentMeta {
    pub title: Option<String>,
    pub speaker: Option<String>,
    pub primary_passage: Option<String>,
    pub tags: Vec<String>,
}

/// An aside spoken inside a quoted passage ("and this is key, church...").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interjection {
    pub text: String,
    /// Char offset into the quoted text where the aside occurs.
    pub offset: usize,
}

/// Reference metadata carried by passage nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PassageRef {
    /// Explicit normalized reference string, e.g. `"John 3:16-17"`.
    pub normalized: Option<String>,
    pub book: Option<String>,
    pub chapter: Option<u32>,
    pub verse_start: Option<u32>,
    pub verse_end: Option<u32>,
    pub is_biblical: bool,
    /// Set once a user has confirmed the detected reference.
    pub verified: bool,
    pub interjections: Vec<Interjection>,
    /// Raw text the reference was detected from, kept as a fallback.
    pub original_text: Option<String>,
    /// Char offsets of the quote within the surrounding transcript text.
    pub start_offset: Option<usize>,
    pub end_offset: Option<usize>,
}

/// Discriminant for node lookup results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Root,
    Text,
    Paragraph,
    Heading,
    Passage,
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    /// Textual leaf.
    Text {
        #[serde(default)]
        id: NodeId,
        #[serde(default)]
        text: String,
    },

    Paragraph {
        #[serde(default)]
        id: NodeId,
        #[serde(default)]
        children: Vec<Node>,
    },

    Heading {
        #[serde(default)]
        id: NodeId,
        #[serde(default = "default_heading_level")]
        level: u8,
        #[serde(default)]
        children: Vec<Node>,
    },

    /// A quoted excerpt with reference metadata.
    Passage {
        #[serde(default)]
        id: NodeId,
        #[serde(default)]
        reference: PassageRef,
        #[serde(default)]
        children: Vec<Node>,
    },
}

fn default_heading_level() -> u8 {
    1
}

impl Node {
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Text { id, .. }
            | Node::Paragraph { id, .. }
            | Node::Heading { id, .. }
            | Node::Passage { id, .. } => id,
        }
    }

    pub fn set_id(&mut self, new_id: NodeId) {
        match self {
            Node::Text { id, .. }
            | Node::Paragraph { id, .. }
            | Node::Heading { id, .. }
            | Node::Passage { id, .. } => *id = new_id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Text { .. } => NodeKind::Text,
            Node::Paragraph { .. } => NodeKind::Paragraph,
            Node::Heading { .. } => NodeKind::Heading,
            Node::Passage { .. } => NodeKind::Passage,
        }
    }

    /// Children of a container node, `None` for leaves.
    pub fn children(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Text { .. } => None,
            Node::Paragraph { children, .. }
            | Node::Heading { children, .. }
            | Node::Passage { children, .. } => Some(children),
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Text { .. } => None,
            Node::Paragraph { children, .. }
            | Node::Heading { children, .. }
            | Node::Passage { children, .. } => Some(children),
        }
    }

    /// Concatenated textual leaf content, recursing through containers.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text { text, .. } => out.push_str(text),
            Node::Paragraph { children, .. }
            | Node::Heading { children, .. }
            | Node::Passage { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    fn find<'a>(&'a self, target: &NodeId) -> Option<&'a Node> {
        if self.id() == target {
            return Some(self);
        }
        self.children()?.iter().find_map(|child| child.find(target))
    }

    fn find_mut<'a>(&'a mut self, target: &NodeId) -> Option<&'a mut Node> {
        if self.id() == target {
            return Some(self);
        }
        self.children_mut()?
            .iter_mut()
            .find_map(|child| child.find_mut(target))
    }
}

/// The tree root. Owned exclusively by the current document state and
/// replaced wholesale on structural edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentRootNode {
    pub id: NodeId,
    pub children: Vec<Node>,
    pub meta: DocumentMeta,
}

impl DocumentRootNode {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            children: Vec::new(),
            meta: DocumentMeta::default(),
        }
    }

    /// Find a node by id anywhere under the root.
    pub fn find(&self, target: &NodeId) -> Option<&Node> {
        self.children.iter().find_map(|child| child.find(target))
    }

    pub fn find_mut(&mut self, target: &NodeId) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(target))
    }

    /// Full transcript text, block children separated by blank lines.
    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .map(|child| child.plain_text())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Repair identity on a tree that arrived from an external payload.
///
/// Assigns a fresh id to every node missing one and re-keys duplicates so
/// that each id occurs at most once. Malformed nodes are normalized rather
/// than dropped; a partial document must remain navigable. Heading levels
/// are clamped to 1..=6.
///
/// Returns the number of nodes repaired.
pub fn normalize_tree(root: &mut DocumentRootNode, ids: &mut IdGenerator) -> usize {
    let mut seen = HashSet::new();
    let mut repaired = 0;

    if root.id.is_empty() {
        root.id = ids.next_id();
        repaired += 1;
    }
    seen.insert(root.id.clone());

    for child in &mut root.children {
        repaired += normalize_node(child, ids, &mut seen);
    }
    repaired
}

fn normalize_node(node: &mut Node, ids: &mut IdGenerator, seen: &mut HashSet<NodeId>) -> usize {
    let mut repaired = 0;

    if node.id().is_empty() || seen.contains(node.id()) {
        node.set_id(ids.next_id());
        repaired += 1;
    }
    seen.insert(node.id().clone());

    if let Node::Heading { level, .. } = node {
        let clamped = (*level).clamp(1, 6);
        if clamped != *level {
            *level = clamped;
            repaired += 1;
        }
    }

    if let Some(children) = node.children_mut() {
        for child in children {
            repaired += normalize_node(child, ids, seen);
        }
    }
    repaired
}
