//! The external editor's document schema, mirrored for serialization.
//!
//! Every view node is `{ type, attrs?, content?, text? }`. The bridge
//! embeds AST identity and passage metadata in `attrs`, so round trips
//! through the editor can recover them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// View node type names.
pub mod kind {
    pub const DOC: &str = "doc";
    pub const PARAGRAPH: &str = "paragraph";
    pub const HEADING: &str = "heading";
    pub const BLOCKQUOTE: &str = "blockquote";
    pub const TEXT: &str = "text";
}

/// Attribute names the bridge reads and writes.
pub mod attr {
    /// AST node id carried on each mapped view node.
    pub const NODE_ID: &str = "nodeId";
    /// Serialized passage reference on blockquote nodes.
    pub const REFERENCE: &str = "reference";
    pub const LEVEL: &str = "level";
    pub const TITLE: &str = "title";
    pub const SPEAKER: &str = "speaker";
    pub const PRIMARY_PASSAGE: &str = "primaryPassage";
    pub const TAGS: &str = "tags";
}

/// Root of a rich-text document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextDoc {
    #[serde(rename = "type", default = "doc_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<RichTextNode>,
}

fn doc_kind() -> String {
    kind::DOC.to_string()
}

impl RichTextDoc {
    pub fn new() -> Self {
        Self {
            kind: doc_kind(),
            attrs: Map::new(),
            content: Vec::new(),
        }
    }
}

impl Default for RichTextDoc {
    fn default() -> Self {
        Self::new()
    }
}

/// One node of the view tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<RichTextNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RichTextNode {
    pub fn container(node_kind: &str) -> Self {
        Self {
            kind: node_kind.to_string(),
            attrs: Map::new(),
            content: Vec::new(),
            text: None,
        }
    }

    pub fn text(content: &str) -> Self {
        Self {
            kind: kind::TEXT.to_string(),
            attrs: Map::new(),
            content: Vec::new(),
            text: Some(content.to_string()),
        }
    }

    pub fn set_attr(&mut self, name: &str, value: Value) {
        self.attrs.insert(name.to_string(), value);
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Embedded AST node id, if the view kept one.
    pub fn node_id(&self) -> Option<&str> {
        self.attrs.get(attr::NODE_ID)?.as_str()
    }
}
