//! # Document Mutator
//!
//! The mutation surface of [`DocumentState`]. Every operation is pure:
//! old state in, new state out, with a recorded event. Nothing here ever
//! touches the rich-text view — pushing accepted changes back to a view
//! is the sync coordinator's job.
//!
//! ## Mutation Semantics
//!
//! ### Content replacement
//! - Whole-tree replacement coming back from the rich-text view
//! - The incoming root is re-keyed to the previous root's id, so history
//!   stays addressable across editor-generated id churn
//! - Equal trees are not an accepted mutation; the state is returned as-is
//!
//! ### Boundary change
//! - Structural edit of a passage: new quoted text, new offsets, and
//!   sibling paragraphs absorbed into the quote
//! - Rejected with `InvalidBoundary` unless offsets are in range and the
//!   named paragraphs are contiguous siblings of the quote
//!
//! ### Undo / redo
//! - Replay of recorded `before` / `after` payloads; the log itself is
//!   append-only and never rewritten

use crate::errors::MutateError;
use crate::events::{Actor, Event, EventKind, Snapshot};
use crate::state::DocumentState;
use chrono::Utc;
use pulpit_ast::{
    normalize_tree, DocumentMeta, DocumentRootNode, IdGenerator, Node, NodeId, NodeKind,
    PassageRef,
};
use std::collections::HashSet;

impl DocumentState {
    /// Replace the document tree with one produced by an external editor.
    ///
    /// `ids` is the generator snapshot the bridge advanced while assigning
    /// fresh ids to newly inserted nodes; it becomes the state's generator.
    pub fn apply_content_replacement(
        &self,
        new_root: DocumentRootNode,
        ids: IdGenerator,
        actor: Actor,
    ) -> Result<DocumentState, MutateError> {
        let mut incoming = new_root;
        let mut ids = ids;

        // Identity stabilization at the mutation boundary: the incoming
        // tree keeps the previous root id even when the editor minted a
        // new one, so historical references to the root stay valid.
        incoming.id = self.root.id.clone();
        normalize_tree(&mut incoming, &mut ids);

        if incoming == self.root {
            return Ok(self.clone());
        }

        let mut next = self.clone();
        next.ids = ids;
        next.commit(
            EventKind::ContentReplaced,
            self.root.id.clone(),
            Snapshot::Tree {
                root: self.root.clone(),
            },
            Snapshot::Tree {
                root: incoming.clone(),
            },
            incoming,
            actor,
        )
    }

    /// Re-draw a quote's boundary: new quoted text, new offsets, and the
    /// named sibling paragraphs merged into the passage node.
    pub fn apply_boundary_change(
        &self,
        quote_id: &NodeId,
        new_start_offset: usize,
        new_end_offset: usize,
        new_content: &str,
        paragraphs_to_merge: &[NodeId],
        actor: Actor,
    ) -> Result<DocumentState, MutateError> {
        let quote_entry = self
            .node_index
            .get(quote_id)
            .ok_or_else(|| MutateError::NodeNotFound(quote_id.clone()))?;
        if quote_entry.kind != NodeKind::Passage {
            return Err(MutateError::NotAPassage(quote_id.clone()));
        }

        let content_len = new_content.chars().count();
        if new_end_offset < new_start_offset || new_end_offset > content_len {
            return Err(MutateError::InvalidBoundary(format!(
                "offsets {}..{} out of range for quoted text of length {}",
                new_start_offset, new_end_offset, content_len
            )));
        }

        let parent_id = quote_entry
            .parent
            .clone()
            .ok_or_else(|| MutateError::NodeNotFound(quote_id.clone()))?;

        // The merged paragraphs must be paragraph siblings of the quote
        // and, together with it, form one contiguous run.
        let mut run: Vec<usize> = vec![quote_entry.sibling_index().unwrap_or(0)];
        for paragraph_id in paragraphs_to_merge {
            let entry = self
                .node_index
                .get(paragraph_id)
                .ok_or_else(|| MutateError::NodeNotFound(paragraph_id.clone()))?;
            if entry.kind != NodeKind::Paragraph {
                return Err(MutateError::InvalidBoundary(format!(
                    "{} is not a paragraph",
                    paragraph_id
                )));
            }
            if entry.parent.as_ref() != Some(&parent_id) {
                return Err(MutateError::InvalidBoundary(format!(
                    "{} is not a sibling of {}",
                    paragraph_id, quote_id
                )));
            }
            run.push(entry.sibling_index().unwrap_or(0));
        }
        run.sort_unstable();
        run.dedup();
        if run.len() != paragraphs_to_merge.len() + 1
            || run.windows(2).any(|pair| pair[1] != pair[0] + 1)
        {
            return Err(MutateError::InvalidBoundary(
                "merged paragraphs are not contiguous with the quote".to_string(),
            ));
        }

        let mut ids = self.ids.clone();
        let mut next_root = self.root.clone();

        let merged: HashSet<&NodeId> = paragraphs_to_merge.iter().collect();
        {
            let siblings = sibling_list_mut(&mut next_root, &parent_id)
                .ok_or_else(|| MutateError::NodeNotFound(parent_id.clone()))?;
            siblings.retain(|node| !merged.contains(node.id()));
        }

        match next_root.find_mut(quote_id) {
            Some(Node::Passage {
                reference,
                children,
                ..
            }) => {
                *children = vec![Node::Text {
                    id: ids.next_id(),
                    text: new_content.to_string(),
                }];
                reference.start_offset = Some(new_start_offset);
                reference.end_offset = Some(new_end_offset);
            }
            _ => return Err(MutateError::NotAPassage(quote_id.clone())),
        }

        let mut next = self.clone();
        next.ids = ids;
        next.commit(
            EventKind::BoundaryChanged,
            quote_id.clone(),
            Snapshot::Tree {
                root: self.root.clone(),
            },
            Snapshot::Tree {
                root: next_root.clone(),
            },
            next_root,
            actor,
        )
    }

    /// Update document-level metadata (title, speaker, passage, tags).
    pub fn apply_document_metadata(
        &self,
        meta: DocumentMeta,
        actor: Actor,
    ) -> Result<DocumentState, MutateError> {
        if meta == self.root.meta {
            return Ok(self.clone());
        }

        let mut next_root = self.root.clone();
        next_root.meta = meta.clone();

        let next = self.clone();
        next.commit(
            EventKind::MetadataChanged,
            self.root.id.clone(),
            Snapshot::DocumentMeta {
                meta: self.root.meta.clone(),
            },
            Snapshot::DocumentMeta { meta },
            next_root,
            actor,
        )
    }

    /// Update one passage's reference metadata (hand-edited reference,
    /// interjections, verification flag).
    pub fn apply_passage_metadata(
        &self,
        node_id: &NodeId,
        reference: PassageRef,
        actor: Actor,
    ) -> Result<DocumentState, MutateError> {
        let previous = match self.root.find(node_id) {
            Some(Node::Passage { reference, .. }) => reference.clone(),
            Some(_) => return Err(MutateError::NotAPassage(node_id.clone())),
            None => return Err(MutateError::NodeNotFound(node_id.clone())),
        };
        if previous == reference {
            return Ok(self.clone());
        }

        let mut next_root = self.root.clone();
        match next_root.find_mut(node_id) {
            Some(Node::Passage {
                reference: slot, ..
            }) => *slot = reference.clone(),
            _ => return Err(MutateError::NodeNotFound(node_id.clone())),
        }

        let next = self.clone();
        next.commit(
            EventKind::MetadataChanged,
            node_id.clone(),
            Snapshot::PassageMeta {
                reference: previous,
            },
            Snapshot::PassageMeta { reference },
            next_root,
            actor,
        )
    }

    /// Mark a passage's detected reference as user-confirmed.
    pub fn verify_passage(
        &self,
        node_id: &NodeId,
        actor: Actor,
    ) -> Result<DocumentState, MutateError> {
        let mut reference = match self.root.find(node_id) {
            Some(Node::Passage { reference, .. }) => reference.clone(),
            Some(_) => return Err(MutateError::NotAPassage(node_id.clone())),
            None => return Err(MutateError::NodeNotFound(node_id.clone())),
        };
        reference.verified = true;
        self.apply_passage_metadata(node_id, reference, actor)
    }

    /// Revert the most recent mutation by replaying its `before` payload.
    pub fn undo(&self) -> Result<DocumentState, MutateError> {
        let mut next = self.clone();
        let event_id = next.undo_stack.pop().ok_or(MutateError::NothingToUndo)?;
        let event = self
            .find_event(&event_id)
            .ok_or_else(|| MutateError::EventNotFound(event_id.clone()))?
            .clone();

        next.root = event.before.apply(&self.root, &event.target_node_id)?;
        next.version = event.resulting_version.saturating_sub(1);
        next.redo_stack.push(event_id);
        next.rebuild_indices()?;
        next.last_modified = Utc::now();
        Ok(next)
    }

    /// Re-apply the most recently undone mutation via its `after` payload.
    pub fn redo(&self) -> Result<DocumentState, MutateError> {
        let mut next = self.clone();
        let event_id = next.redo_stack.pop().ok_or(MutateError::NothingToRedo)?;
        let event = self
            .find_event(&event_id)
            .ok_or_else(|| MutateError::EventNotFound(event_id.clone()))?
            .clone();

        next.root = event.after.apply(&self.root, &event.target_node_id)?;
        next.version = event.resulting_version;
        next.undo_stack.push(event_id);
        next.rebuild_indices()?;
        next.last_modified = Utc::now();
        Ok(next)
    }

    fn commit(
        mut self,
        kind: EventKind,
        target: NodeId,
        before: Snapshot,
        after: Snapshot,
        new_root: DocumentRootNode,
        actor: Actor,
    ) -> Result<DocumentState, MutateError> {
        self.root = new_root;
        self.version += 1;
        let id = self.next_event_id();
        self.event_log.push(Event {
            id: id.clone(),
            kind,
            target_node_id: target,
            before,
            after,
            resulting_version: self.version,
            actor,
        });
        self.undo_stack.push(id);
        self.redo_stack.clear();
        self.rebuild_indices()?;
        self.last_modified = Utc::now();
        Ok(self)
    }
}

fn sibling_list_mut<'a>(
    root: &'a mut DocumentRootNode,
    parent_id: &NodeId,
) -> Option<&'a mut Vec<Node>> {
    if &root.id == parent_id {
        return Some(&mut root.children);
    }
    root.find_mut(parent_id)?.children_mut()
}
