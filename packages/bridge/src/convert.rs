//! AST ⇄ rich-text conversion.
//!
//! Both directions are pure. Identity preservation: every mapped view
//! node carries its AST id in `attrs.nodeId`; on the way back, an id is
//! kept when it matches the supplied root hint, otherwise the node is
//! treated as newly inserted and gets a fresh id. A view id that is
//! absent from the hint, or already claimed by an earlier view node,
//! never survives — that is what keeps merges free of id collisions.

use crate::richtext::{attr, kind, RichTextDoc, RichTextNode};
use pulpit_ast::{
    DocumentMeta, DocumentRootNode, IdGenerator, Node, NodeId, NodeIndex, PassageRef,
};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("unknown rich text node type: {0}")]
    UnknownNodeType(String),

    #[error("malformed rich text document: {0}")]
    Malformed(String),

    #[error("invalid attribute {attr} on {kind} node: {detail}")]
    InvalidAttribute {
        kind: String,
        attr: String,
        detail: String,
    },
}

/// Conversion options.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Carry AST node ids as view attributes and honor them on the way back.
    pub preserve_ids: bool,
    /// Carry document metadata and passage references as attributes.
    pub include_metadata: bool,
    /// Keep interjections inside serialized passage references.
    pub include_interjections: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            preserve_ids: true,
            include_metadata: true,
            include_interjections: true,
        }
    }
}

/// Convert the AST into the editor's native tree.
pub fn ast_to_rich_text(
    root: &DocumentRootNode,
    options: &BridgeOptions,
) -> Result<RichTextDoc, ConversionError> {
    let mut doc = RichTextDoc::new();

    if options.preserve_ids {
        doc.attrs.insert(
            attr::NODE_ID.to_string(),
            Value::String(root.id.to_string()),
        );
    }
    if options.include_metadata {
        write_meta_attrs(&root.meta, &mut doc.attrs);
    }

    doc.content = root
        .children
        .iter()
        .map(|node| node_to_view(node, options))
        .collect::<Result<_, _>>()?;
    Ok(doc)
}

fn node_to_view(node: &Node, options: &BridgeOptions) -> Result<RichTextNode, ConversionError> {
    let mut view = match node {
        Node::Text { text, .. } => RichTextNode::text(text),

        Node::Paragraph { children, .. } => {
            let mut view = RichTextNode::container(kind::PARAGRAPH);
            view.content = convert_children(children, options)?;
            view
        }

        Node::Heading {
            level, children, ..
        } => {
            let mut view = RichTextNode::container(kind::HEADING);
            view.set_attr(attr::LEVEL, Value::from(*level));
            view.content = convert_children(children, options)?;
            view
        }

        Node::Passage {
            reference,
            children,
            ..
        } => {
            let mut view = RichTextNode::container(kind::BLOCKQUOTE);
            if options.include_metadata {
                let mut reference = reference.clone();
                if !options.include_interjections {
                    reference.interjections.clear();
                }
                let value = serde_json::to_value(&reference)
                    .map_err(|err| ConversionError::Malformed(err.to_string()))?;
                view.set_attr(attr::REFERENCE, value);
            }
            view.content = convert_children(children, options)?;
            view
        }
    };

    if options.preserve_ids {
        view.set_attr(attr::NODE_ID, Value::String(node.id().to_string()));
    }
    Ok(view)
}

fn convert_children(
    children: &[Node],
    options: &BridgeOptions,
) -> Result<Vec<RichTextNode>, ConversionError> {
    children
        .iter()
        .map(|child| node_to_view(child, options))
        .collect()
}

fn write_meta_attrs(meta: &DocumentMeta, attrs: &mut serde_json::Map<String, Value>) {
    if let Some(title) = &meta.title {
        attrs.insert(attr::TITLE.to_string(), Value::String(title.clone()));
    }
    if let Some(speaker) = &meta.speaker {
        attrs.insert(attr::SPEAKER.to_string(), Value::String(speaker.clone()));
    }
    if let Some(primary) = &meta.primary_passage {
        attrs.insert(
            attr::PRIMARY_PASSAGE.to_string(),
            Value::String(primary.clone()),
        );
    }
    if !meta.tags.is_empty() {
        attrs.insert(
            attr::TAGS.to_string(),
            Value::Array(meta.tags.iter().cloned().map(Value::String).collect()),
        );
    }
}

/// Convert the editor's tree back into an AST.
///
/// With `existing_root_hint`, view nodes whose embedded id matches a node
/// in the hint keep that id; everything else is treated as newly inserted
/// and minted a fresh id from `ids`. Without a hint, embedded ids are
/// trusted as-is (the plain round-trip case).
pub fn rich_text_to_ast(
    doc: &RichTextDoc,
    options: &BridgeOptions,
    existing_root_hint: Option<&DocumentRootNode>,
    ids: &mut IdGenerator,
) -> Result<DocumentRootNode, ConversionError> {
    if doc.kind != kind::DOC {
        return Err(ConversionError::Malformed(format!(
            "expected a {} root, found {}",
            kind::DOC,
            doc.kind
        )));
    }

    let hint_index = existing_root_hint.map(NodeIndex::build);
    let mut claimed: HashSet<NodeId> = HashSet::new();

    let root_id = match existing_root_hint {
        Some(hint) => hint.id.clone(),
        None => match doc.attrs.get(attr::NODE_ID).and_then(Value::as_str) {
            Some(embedded) if options.preserve_ids => NodeId::from(embedded),
            _ => ids.next_id(),
        },
    };
    claimed.insert(root_id.clone());

    let mut root = DocumentRootNode::new(root_id);
    if options.include_metadata {
        root.meta = read_meta_attrs(&doc.attrs);
    }
    for view in &doc.content {
        root.children
            .push(view_to_node(view, options, hint_index.as_ref(), &mut claimed, ids)?);
    }
    Ok(root)
}

fn view_to_node(
    view: &RichTextNode,
    options: &BridgeOptions,
    hint_index: Option<&NodeIndex>,
    claimed: &mut HashSet<NodeId>,
    ids: &mut IdGenerator,
) -> Result<Node, ConversionError> {
    let id = assign_id(view, options, hint_index, claimed, ids);

    match view.kind.as_str() {
        kind::TEXT => {
            let text = view
                .text
                .clone()
                .ok_or_else(|| ConversionError::Malformed("text node without text".to_string()))?;
            Ok(Node::Text { id, text })
        }

        kind::PARAGRAPH => Ok(Node::Paragraph {
            id,
            children: convert_views(&view.content, options, hint_index, claimed, ids)?,
        }),

        kind::HEADING => {
            let level = match view.attr(attr::LEVEL) {
                None => 1,
                Some(value) => value.as_u64().ok_or_else(|| ConversionError::InvalidAttribute {
                    kind: view.kind.clone(),
                    attr: attr::LEVEL.to_string(),
                    detail: format!("expected a number, found {}", value),
                })? as u8,
            };
            Ok(Node::Heading {
                id,
                level,
                children: convert_views(&view.content, options, hint_index, claimed, ids)?,
            })
        }

        kind::BLOCKQUOTE => {
            let reference = match view.attr(attr::REFERENCE) {
                None => PassageRef::default(),
                Some(value) => serde_json::from_value(value.clone()).map_err(|err| {
                    ConversionError::InvalidAttribute {
                        kind: view.kind.clone(),
                        attr: attr::REFERENCE.to_string(),
                        detail: err.to_string(),
                    }
                })?,
            };
            Ok(Node::Passage {
                id,
                reference,
                children: convert_views(&view.content, options, hint_index, claimed, ids)?,
            })
        }

        other => Err(ConversionError::UnknownNodeType(other.to_string())),
    }
}

fn convert_views(
    views: &[RichTextNode],
    options: &BridgeOptions,
    hint_index: Option<&NodeIndex>,
    claimed: &mut HashSet<NodeId>,
    ids: &mut IdGenerator,
) -> Result<Vec<Node>, ConversionError> {
    views
        .iter()
        .map(|view| view_to_node(view, options, hint_index, claimed, ids))
        .collect()
}

fn assign_id(
    view: &RichTextNode,
    options: &BridgeOptions,
    hint_index: Option<&NodeIndex>,
    claimed: &mut HashSet<NodeId>,
    ids: &mut IdGenerator,
) -> NodeId {
    if options.preserve_ids {
        if let Some(embedded) = view.node_id() {
            let candidate = NodeId::from(embedded);
            let known = hint_index.map_or(true, |index| index.contains(&candidate));
            if known && !claimed.contains(&candidate) {
                claimed.insert(candidate.clone());
                return candidate;
            }
        }
    }
    let fresh = ids.next_id();
    claimed.insert(fresh.clone());
    fresh
}

fn read_meta_attrs(attrs: &serde_json::Map<String, Value>) -> DocumentMeta {
    DocumentMeta {
        title: attrs
            .get(attr::TITLE)
            .and_then(Value::as_str)
            .map(str::to_string),
        speaker: attrs
            .get(attr::SPEAKER)
            .and_then(Value::as_str)
            .map(str::to_string),
        primary_passage: attrs
            .get(attr::PRIMARY_PASSAGE)
            .and_then(Value::as_str)
            .map(str::to_string),
        tags: attrs
            .get(attr::TAGS)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_root() -> DocumentRootNode {
        let mut root = DocumentRootNode::new(NodeId::from("doc-1"));
        root.meta = DocumentMeta {
            title: Some("God So Loved".to_string()),
            speaker: Some("Pastor Lee".to_string()),
            primary_passage: Some("John 3:16".to_string()),
            tags: vec!["gospel".to_string(), "love".to_string()],
        };
        root.children.push(Node::Heading {
            id: NodeId::from("h-1"),
            level: 2,
            children: vec![Node::Text {
                id: NodeId::from("t-1"),
                text: "Introduction".to_string(),
            }],
        });
        root.children.push(Node::Passage {
            id: NodeId::from("q-1"),
            reference: PassageRef {
                book: Some("John".to_string()),
                chapter: Some(3),
                verse_start: Some(16),
                is_biblical: true,
                interjections: vec![pulpit_ast::Interjection {
                    text: "church, listen".to_string(),
                    offset: 10,
                }],
                ..PassageRef::default()
            },
            children: vec![Node::Text {
                id: NodeId::from("t-2"),
                text: "For God so loved the world".to_string(),
            }],
        });
        root
    }

    #[test]
    fn test_round_trip_preserves_identity_and_content() {
        let root = sample_root();
        let options = BridgeOptions::default();

        let view = ast_to_rich_text(&root, &options).unwrap();
        let mut ids = IdGenerator::new("/round-trip");
        let back = rich_text_to_ast(&view, &options, None, &mut ids).unwrap();

        assert_eq!(back, root);
    }

    #[test]
    fn test_hint_preserves_known_ids_and_mints_fresh_ones() {
        let root = sample_root();
        let options = BridgeOptions::default();

        let mut view = ast_to_rich_text(&root, &options).unwrap();
        // The editor inserts a brand-new paragraph with no embedded id
        let mut inserted = RichTextNode::container(kind::PARAGRAPH);
        inserted.content.push(RichTextNode::text("Let us pray."));
        view.content.push(inserted);

        let mut ids = IdGenerator::new("/doc");
        let back = rich_text_to_ast(&view, &options, Some(&root), &mut ids).unwrap();

        assert_eq!(back.id, root.id);
        assert_eq!(back.children[0].id(), &NodeId::from("h-1"));
        assert_eq!(back.children[1].id(), &NodeId::from("q-1"));
        // The inserted paragraph got a generated id
        assert!(back.children[2].id().as_str().starts_with(ids.seed()));
    }

    #[test]
    fn test_unmatched_embedded_id_is_replaced() {
        let root = sample_root();
        let options = BridgeOptions::default();

        let mut view = ast_to_rich_text(&root, &options).unwrap();
        // A stale id from some other document must not leak through
        view.content[0].set_attr(attr::NODE_ID, Value::String("alien-7".to_string()));

        let mut ids = IdGenerator::new("/doc");
        let back = rich_text_to_ast(&view, &options, Some(&root), &mut ids).unwrap();

        assert_ne!(back.children[0].id(), &NodeId::from("alien-7"));
    }

    #[test]
    fn test_duplicate_embedded_ids_do_not_collide() {
        let root = sample_root();
        let options = BridgeOptions::default();

        let mut view = ast_to_rich_text(&root, &options).unwrap();
        let copied = view.content[0].clone();
        view.content.push(copied);

        let mut ids = IdGenerator::new("/doc");
        let back = rich_text_to_ast(&view, &options, Some(&root), &mut ids).unwrap();

        let first = back.children[0].id().clone();
        let last = back.children[2].id().clone();
        assert_ne!(first, last);
    }

    #[test]
    fn test_unknown_node_type_is_rejected_whole() {
        let mut view = RichTextDoc::new();
        view.content.push(RichTextNode::container(kind::PARAGRAPH));
        view.content.push(RichTextNode::container("table"));

        let mut ids = IdGenerator::new("/doc");
        let err = rich_text_to_ast(&view, &BridgeOptions::default(), None, &mut ids).unwrap_err();

        assert_eq!(err, ConversionError::UnknownNodeType("table".to_string()));
    }

    #[test]
    fn test_malformed_reference_is_rejected() {
        let mut quote = RichTextNode::container(kind::BLOCKQUOTE);
        quote.set_attr(attr::REFERENCE, Value::String("not an object".to_string()));
        let mut view = RichTextDoc::new();
        view.content.push(quote);

        let mut ids = IdGenerator::new("/doc");
        let err = rich_text_to_ast(&view, &BridgeOptions::default(), None, &mut ids).unwrap_err();

        assert!(matches!(err, ConversionError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_interjections_can_be_stripped() {
        let root = sample_root();
        let options = BridgeOptions {
            include_interjections: false,
            ..BridgeOptions::default()
        };

        let view = ast_to_rich_text(&root, &options).unwrap();
        let reference: PassageRef =
            serde_json::from_value(view.content[1].attr(attr::REFERENCE).unwrap().clone())
                .unwrap();
        assert!(reference.interjections.is_empty());
    }

    #[test]
    fn test_metadata_round_trips_through_doc_attrs() {
        let root = sample_root();
        let options = BridgeOptions::default();

        let view = ast_to_rich_text(&root, &options).unwrap();
        assert_eq!(view.attrs[attr::TITLE], "God So Loved");

        let mut ids = IdGenerator::new("/doc");
        let back = rich_text_to_ast(&view, &options, None, &mut ids).unwrap();
        assert_eq!(back.meta, root.meta);
    }
}
