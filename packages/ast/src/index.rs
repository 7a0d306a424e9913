//! Node lookup index.
//!
//! Maps node ids to their location in the tree. The index is a lookup
//! structure, never an ownership relation: entries hold the child-index
//! path from the root, and [`NodeIndex::resolve`] walks that path against
//! whatever root the caller passes. Rebuilt whenever the root changes.

use crate::node::{DocumentRootNode, Node, NodeId, NodeKind};
use std::collections::HashMap;

/// Location of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Parent id; `None` only for the root entry.
    pub parent: Option<NodeId>,
    /// Child indices from the root down to this node; empty for the root.
    pub path: Vec<usize>,
}

impl IndexEntry {
    /// Position among the parent's children.
    pub fn sibling_index(&self) -> Option<usize> {
        self.path.last().copied()
    }
}

/// Id → location map over one tree, with pre-order id ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeIndex {
    entries: HashMap<NodeId, IndexEntry>,
    order: Vec<NodeId>,
    duplicates: Vec<NodeId>,
}

impl NodeIndex {
    /// Build the index from a root. Pure, single pre-order traversal, O(n).
    ///
    /// Trees are normalized before indexing, so a duplicate id here means
    /// identity stabilization failed upstream. The first occurrence wins
    /// and the offender is recorded in [`NodeIndex::duplicate_ids`].
    pub fn build(root: &DocumentRootNode) -> Self {
        let mut index = Self::default();

        index.insert(IndexEntry {
            id: root.id.clone(),
            kind: NodeKind::Root,
            parent: None,
            path: Vec::new(),
        });

        for (position, child) in root.children.iter().enumerate() {
            index.visit(child, &root.id, vec![position]);
        }

        debug_assert!(
            index.duplicates.is_empty(),
            "duplicate node ids survived normalization: {:?}",
            index.duplicates
        );
        index
    }

    fn visit(&mut self, node: &Node, parent: &NodeId, path: Vec<usize>) {
        self.insert(IndexEntry {
            id: node.id().clone(),
            kind: node.kind(),
            parent: Some(parent.clone()),
            path: path.clone(),
        });

        if let Some(children) = node.children() {
            for (position, child) in children.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(position);
                self.visit(child, node.id(), child_path);
            }
        }
    }

    fn insert(&mut self, entry: IndexEntry) {
        if self.entries.contains_key(&entry.id) {
            self.duplicates.push(entry.id);
            return;
        }
        self.order.push(entry.id.clone());
        self.entries.insert(entry.id.clone(), entry);
    }

    pub fn get(&self, id: &NodeId) -> Option<&IndexEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.entries.get(id)?.parent.as_ref()
    }

    pub fn kind_of(&self, id: &NodeId) -> Option<NodeKind> {
        self.entries.get(id).map(|entry| entry.kind)
    }

    /// Node ids in document reading order (pre-order), root first.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.order.iter()
    }

    /// Walk the stored path against `root` to borrow the node itself.
    /// Returns `None` for the root entry (the root is not a [`Node`]).
    pub fn resolve<'a>(&self, root: &'a DocumentRootNode, id: &NodeId) -> Option<&'a Node> {
        let entry = self.entries.get(id)?;
        let (first, rest) = entry.path.split_first()?;
        let mut node = root.children.get(*first)?;
        for position in rest {
            node = node.children()?.get(*position)?;
        }
        Some(node)
    }

    /// Ids that collided during the build. Non-empty indexes an upstream bug.
    pub fn duplicate_ids(&self) -> &[NodeId] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdGenerator;
    use crate::node::normalize_tree;

    fn sample_root() -> DocumentRootNode {
        let mut root = DocumentRootNode::new(NodeId::from("root"));
        root.children.push(Node::Heading {
            id: NodeId::from("h-1"),
            level: 1,
            children: vec![Node::Text {
                id: NodeId::from("t-1"),
                text: "Grace".to_string(),
            }],
        });
        root.children.push(Node::Paragraph {
            id: NodeId::from("p-1"),
            children: vec![Node::Text {
                id: NodeId::from("t-2"),
                text: "For by grace you have been saved".to_string(),
            }],
        });
        root
    }

    #[test]
    fn test_every_reachable_id_is_indexed_once() {
        let root = sample_root();
        let index = NodeIndex::build(&root);

        assert_eq!(index.len(), 5);
        for id in ["root", "h-1", "t-1", "p-1", "t-2"] {
            assert!(index.contains(&NodeId::from(id)), "missing {}", id);
        }
        assert!(index.duplicate_ids().is_empty());
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let root = sample_root();
        let first = NodeIndex::build(&root);
        let second = NodeIndex::build(&root);
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_walks_path() {
        let root = sample_root();
        let index = NodeIndex::build(&root);

        let node = index.resolve(&root, &NodeId::from("t-2")).unwrap();
        assert_eq!(node.plain_text(), "For by grace you have been saved");

        // Root entry exists but resolves to no Node
        assert!(index.get(&NodeId::from("root")).is_some());
        assert!(index.resolve(&root, &NodeId::from("root")).is_none());
    }

    #[test]
    fn test_pre_order_matches_reading_order() {
        let root = sample_root();
        let index = NodeIndex::build(&root);

        let order: Vec<&str> = index.ids().map(NodeId::as_str).collect();
        assert_eq!(order, vec!["root", "h-1", "t-1", "p-1", "t-2"]);
    }

    #[test]
    fn test_parent_and_sibling_position() {
        let root = sample_root();
        let index = NodeIndex::build(&root);

        assert_eq!(index.parent_of(&NodeId::from("p-1")), Some(&NodeId::from("root")));
        assert_eq!(index.get(&NodeId::from("p-1")).unwrap().sibling_index(), Some(1));
        assert_eq!(index.kind_of(&NodeId::from("h-1")), Some(NodeKind::Heading));
    }

    #[test]
    fn test_no_stale_entries_after_rebuild() {
        let mut root = sample_root();
        let before = NodeIndex::build(&root);
        assert!(before.contains(&NodeId::from("p-1")));

        root.children.pop();
        let after = NodeIndex::build(&root);

        assert!(!after.contains(&NodeId::from("p-1")));
        assert!(!after.contains(&NodeId::from("t-2")));
    }

    #[test]
    fn test_normalized_tree_never_collides() {
        let mut root = DocumentRootNode::new(NodeId::from("root"));
        for _ in 0..3 {
            root.children.push(Node::Paragraph {
                id: NodeId::from("same"),
                children: vec![],
            });
        }

        let mut ids = IdGenerator::new("/test");
        normalize_tree(&mut root, &mut ids);

        let index = NodeIndex::build(&root);
        assert!(index.duplicate_ids().is_empty());
        assert_eq!(index.len(), 4);
    }
}
