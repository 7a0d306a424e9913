//! Derived passage views and reference-string handling.
//!
//! [`PassageIndex`] and [`ExtractedPassages`] are caches over the tree:
//! regenerated atomically with every node-index rebuild, never edited
//! independently. Both traverse in pre-order so entries follow document
//! reading order.

use crate::index::NodeIndex;
use crate::node::{DocumentRootNode, Interjection, Node, NodeId, PassageRef};
use serde::{Deserialize, Serialize};

/// Flat list entry for one passage node, denormalized for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageEntry {
    pub node_id: NodeId,
    pub reference: Option<String>,
    pub display_text: String,
    pub is_biblical: bool,
    pub verified: bool,
}

/// The flat list of passage nodes in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassageIndex {
    entries: Vec<PassageEntry>,
}

impl PassageIndex {
    /// Build from a root, keyed off the node index for ordering.
    pub fn build(root: &DocumentRootNode, index: &NodeIndex) -> Self {
        let mut entries = Vec::new();
        for id in index.ids() {
            let Some(node) = index.resolve(root, id) else {
                continue;
            };
            let Node::Passage { reference, .. } = node else {
                continue;
            };
            entries.push(PassageEntry {
                node_id: id.clone(),
                reference: derive_reference(reference),
                display_text: node.plain_text(),
                is_biblical: reference.is_biblical,
                verified: reference.verified,
            });
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[PassageEntry] {
        &self.entries
    }

    pub fn get(&self, node_id: &NodeId) -> Option<&PassageEntry> {
        self.entries.iter().find(|entry| &entry.node_id == node_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fully projected passage, the shape handed to export and preview panes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPassage {
    pub node_id: NodeId,
    pub reference: Option<String>,
    pub text: String,
    pub book: Option<String>,
    pub chapter: Option<u32>,
    pub verse_start: Option<u32>,
    pub verse_end: Option<u32>,
    pub verified: bool,
    pub interjections: Vec<Interjection>,
}

/// Cached extraction of every passage subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedPassages {
    passages: Vec<ExtractedPassage>,
}

impl ExtractedPassages {
    pub fn build(root: &DocumentRootNode, index: &NodeIndex) -> Self {
        let mut passages = Vec::new();
        for id in index.ids() {
            let Some(node) = index.resolve(root, id) else {
                continue;
            };
            let Node::Passage { reference, .. } = node else {
                continue;
            };
            passages.push(ExtractedPassage {
                node_id: id.clone(),
                reference: derive_reference(reference),
                text: node.plain_text(),
                book: reference.book.clone(),
                chapter: reference.chapter,
                verse_start: reference.verse_start,
                verse_end: reference.verse_end,
                verified: reference.verified,
                interjections: reference.interjections.clone(),
            });
        }
        Self { passages }
    }

    pub fn passages(&self) -> &[ExtractedPassage] {
        &self.passages
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

/// Derive the display reference for a passage.
///
/// Priority: explicit normalized string, then a synthesized
/// `"Book C:V[-V]"` when book and chapter are known, then the raw
/// original text, then `None`.
pub fn derive_reference(reference: &PassageRef) -> Option<String> {
    if let Some(normalized) = &reference.normalized {
        if !normalized.is_empty() {
            return Some(normalized.clone());
        }
    }

    if let (Some(book), Some(chapter)) = (&reference.book, reference.chapter) {
        return Some(match (reference.verse_start, reference.verse_end) {
            (Some(start), Some(end)) if end != start => {
                format!("{} {}:{}-{}", book, chapter, start, end)
            }
            (Some(start), _) => format!("{} {}:{}", book, chapter, start),
            (None, _) => format!("{} {}", book, chapter),
        });
    }

    reference
        .original_text
        .clone()
        .filter(|text| !text.is_empty())
}

/// Best-effort parse of a hand-edited reference like `"1 John 3:16-18"`.
///
/// Accepts only the `"Book C:V[-V]"` shape; anything else returns `None`
/// and callers keep the input as original text. Not a guaranteed inverse
/// of [`derive_reference`]; the two policies are maintained independently.
pub fn parse_reference(input: &str) -> Option<PassageRef> {
    let trimmed = input.trim();
    let (book_part, chapter_verse) = trimmed.rsplit_once(' ')?;
    let book = book_part.trim();
    if book.is_empty() {
        return None;
    }

    let (chapter_str, verse_str) = chapter_verse.split_once(':')?;
    let chapter: u32 = chapter_str.parse().ok()?;

    let (verse_start, verse_end) = match verse_str.split_once('-') {
        Some((start, end)) => (start.parse().ok()?, Some(end.parse::<u32>().ok()?)),
        None => (verse_str.parse().ok()?, None),
    };

    Some(PassageRef {
        normalized: Some(trimmed.to_string()),
        book: Some(book.to_string()),
        chapter: Some(chapter),
        verse_start: Some(verse_start),
        verse_end,
        is_biblical: true,
        ..PassageRef::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;

    fn passage(id: &str, reference: PassageRef, text: &str) -> Node {
        Node::Passage {
            id: NodeId::from(id),
            reference,
            children: vec![Node::Text {
                id: NodeId::from(format!("{}-text", id)),
                text: text.to_string(),
            }],
        }
    }

    fn biblical(book: &str, chapter: u32, start: u32, end: Option<u32>) -> PassageRef {
        PassageRef {
            book: Some(book.to_string()),
            chapter: Some(chapter),
            verse_start: Some(start),
            verse_end: end,
            is_biblical: true,
            ..PassageRef::default()
        }
    }

    #[test]
    fn test_reference_single_verse() {
        let reference = biblical("John", 3, 16, None);
        assert_eq!(derive_reference(&reference).unwrap(), "John 3:16");
    }

    #[test]
    fn test_reference_verse_range() {
        let reference = biblical("John", 3, 16, Some(17));
        assert_eq!(derive_reference(&reference).unwrap(), "John 3:16-17");
    }

    #[test]
    fn test_reference_collapses_degenerate_range() {
        let reference = biblical("John", 3, 16, Some(16));
        assert_eq!(derive_reference(&reference).unwrap(), "John 3:16");
    }

    #[test]
    fn test_reference_normalized_wins() {
        let mut reference = biblical("John", 3, 16, None);
        reference.normalized = Some("Jn 3:16".to_string());
        assert_eq!(derive_reference(&reference).unwrap(), "Jn 3:16");
    }

    #[test]
    fn test_reference_original_text_fallback() {
        let reference = PassageRef {
            original_text: Some("see the gospel".to_string()),
            ..PassageRef::default()
        };
        assert_eq!(derive_reference(&reference).unwrap(), "see the gospel");
    }

    #[test]
    fn test_reference_absent() {
        assert_eq!(derive_reference(&PassageRef::default()), None);
    }

    #[test]
    fn test_parse_reference_range() {
        let parsed = parse_reference("1 John 3:16-18").unwrap();
        assert_eq!(parsed.book.as_deref(), Some("1 John"));
        assert_eq!(parsed.chapter, Some(3));
        assert_eq!(parsed.verse_start, Some(16));
        assert_eq!(parsed.verse_end, Some(18));
        assert!(parsed.is_biblical);
    }

    #[test]
    fn test_parse_reference_compatible_subset_round_trips() {
        let parsed = parse_reference("John 3:16-17").unwrap();
        assert_eq!(derive_reference(&parsed).unwrap(), "John 3:16-17");
    }

    #[test]
    fn test_parse_reference_rejects_free_form() {
        assert!(parse_reference("see the gospel").is_none());
        assert!(parse_reference("John three sixteen").is_none());
        assert!(parse_reference("").is_none());
    }

    #[test]
    fn test_passage_index_in_reading_order() {
        let mut root = DocumentRootNode::new(NodeId::from("root"));
        root.children.push(passage(
            "q-1",
            biblical("John", 3, 16, None),
            "For God so loved the world",
        ));
        root.children.push(Node::Paragraph {
            id: NodeId::from("p-1"),
            children: vec![],
        });
        root.children.push(passage(
            "q-2",
            biblical("Romans", 8, 1, Some(2)),
            "There is therefore now no condemnation",
        ));

        let index = NodeIndex::build(&root);
        let passages = PassageIndex::build(&root, &index);

        assert_eq!(passages.len(), 2);
        assert_eq!(passages.entries()[0].node_id.as_str(), "q-1");
        assert_eq!(passages.entries()[1].node_id.as_str(), "q-2");
        assert_eq!(
            passages.entries()[1].reference.as_deref(),
            Some("Romans 8:1-2")
        );
        assert_eq!(
            passages.entries()[0].display_text,
            "For God so loved the world"
        );
    }

    #[test]
    fn test_extracted_matches_passage_index() {
        let mut root = DocumentRootNode::new(NodeId::from("root"));
        root.children.push(passage(
            "q-1",
            biblical("John", 3, 16, None),
            "For God so loved the world",
        ));

        let index = NodeIndex::build(&root);
        let passages = PassageIndex::build(&root, &index);
        let extracted = ExtractedPassages::build(&root, &index);

        assert_eq!(extracted.len(), passages.len());
        let projection = &extracted.passages()[0];
        assert_eq!(projection.reference.as_deref(), Some("John 3:16"));
        assert_eq!(projection.book.as_deref(), Some("John"));
        assert_eq!(projection.text, "For God so loved the world");
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut root = DocumentRootNode::new(NodeId::from("root"));
        root.children
            .push(passage("q-1", biblical("John", 3, 16, None), "quote"));

        let index = NodeIndex::build(&root);
        let first = PassageIndex::build(&root, &index);
        let second = PassageIndex::build(&root, &index);
        assert_eq!(first, second);

        let extracted_first = ExtractedPassages::build(&root, &index);
        let extracted_second = ExtractedPassages::build(&root, &index);
        assert_eq!(extracted_first, extracted_second);
    }
}
