//! # Document State
//!
//! The versioned container that owns a document's tree and everything
//! derived from it. A `DocumentState` is created when a transcription
//! completes or a saved document is reloaded; it is replaced — never
//! mutated — on every accepted edit, undo, or redo.

use crate::errors::MutateError;
use crate::events::{Event, EventId};
use chrono::{DateTime, Utc};
use pulpit_ast::{
    normalize_tree, DocumentRootNode, ExtractedPassages, IdGenerator, NodeIndex, PassageIndex,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Versioned document state.
///
/// The node, passage, and extracted indices are derived caches: they are
/// skipped during serialization and rebuilt on load via
/// [`DocumentState::rehydrate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    pub version: u64,
    pub root: DocumentRootNode,

    #[serde(skip)]
    pub node_index: NodeIndex,
    #[serde(skip)]
    pub passage_index: PassageIndex,
    #[serde(skip)]
    pub extracted: ExtractedPassages,

    /// Append-only, never reordered.
    pub event_log: Vec<Event>,
    /// Event ids eligible for inversion, most recent last.
    pub undo_stack: Vec<EventId>,
    /// Event ids undone and eligible for replay; cleared by new mutations.
    pub redo_stack: Vec<EventId>,

    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,

    pub(crate) ids: IdGenerator,
    pub(crate) event_seq: u64,
}

impl DocumentState {
    /// Create version 0 from a freshly transcribed or constructed tree.
    ///
    /// The tree is normalized first (missing ids assigned, duplicates
    /// re-keyed), so indexing cannot conflict.
    pub fn new(mut root: DocumentRootNode, mut ids: IdGenerator) -> Self {
        normalize_tree(&mut root, &mut ids);

        let node_index = NodeIndex::build(&root);
        let passage_index = PassageIndex::build(&root, &node_index);
        let extracted = ExtractedPassages::build(&root, &node_index);
        let now = Utc::now();

        Self {
            version: 0,
            root,
            node_index,
            passage_index,
            extracted,
            event_log: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            created_at: now,
            last_modified: now,
            ids,
            event_seq: 0,
        }
    }

    /// Rebuild the derived indices after deserialization.
    pub fn rehydrate(&mut self) -> Result<(), MutateError> {
        self.rebuild_indices()
    }

    /// Snapshot of the id generator, for minting ids outside the mutator
    /// (the bridge assigns fresh ids to newly inserted view nodes).
    pub fn id_generator(&self) -> IdGenerator {
        self.ids.clone()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn find_event(&self, id: &EventId) -> Option<&Event> {
        self.event_log.iter().find(|event| &event.id == id)
    }

    /// Copy of this state with the event log trimmed to its most recent
    /// `keep_last` entries, for persisted storage size. Stack ids whose
    /// events were dropped are removed; undo depth shrinks accordingly.
    pub fn truncate_log(&self, keep_last: usize) -> DocumentState {
        let mut next = self.clone();
        if next.event_log.len() > keep_last {
            let excess = next.event_log.len() - keep_last;
            next.event_log.drain(..excess);
        }

        let retained: HashSet<EventId> =
            next.event_log.iter().map(|event| event.id.clone()).collect();
        next.undo_stack.retain(|id| retained.contains(id));
        next.redo_stack.retain(|id| retained.contains(id));
        next
    }

    pub(crate) fn rebuild_indices(&mut self) -> Result<(), MutateError> {
        let node_index = NodeIndex::build(&self.root);
        if let Some(duplicate) = node_index.duplicate_ids().first() {
            return Err(MutateError::IdentityConflict(duplicate.clone()));
        }
        self.passage_index = PassageIndex::build(&self.root, &node_index);
        self.extracted = ExtractedPassages::build(&self.root, &node_index);
        self.node_index = node_index;
        Ok(())
    }

    pub(crate) fn next_event_id(&mut self) -> EventId {
        self.event_seq += 1;
        EventId::new(format!("{}-e{}", self.ids.seed(), self.event_seq))
    }
}
