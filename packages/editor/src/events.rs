//! # Change Events
//!
//! Typed, invertible records of every accepted mutation.
//!
//! ## Design
//!
//! - Each event carries a `before` and an `after` snapshot of exactly the
//!   slice of state it changed
//! - Applying `after` to the root at `resulting_version - 1` reproduces the
//!   root at `resulting_version`; applying `before` goes the other way —
//!   this round trip is the undo contract
//! - Events are immutable once appended to the log

use crate::errors::MutateError;
use pulpit_ast::{DocumentMeta, DocumentRootNode, Node, NodeId, PassageRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one event in a document's log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who caused a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Actor {
    User,
    /// Transcription seeding, programmatic edits, anything not typed in.
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    ContentReplaced,
    BoundaryChanged,
    MetadataChanged,
}

/// The slice of state an event captured, before or after the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Snapshot {
    /// Whole-tree snapshot; used for content and boundary changes.
    Tree { root: DocumentRootNode },
    /// Document-level metadata only.
    DocumentMeta { meta: DocumentMeta },
    /// Reference metadata of one passage node.
    PassageMeta { reference: PassageRef },
}

impl Snapshot {
    /// Reconstruct the root this snapshot describes, starting from the
    /// adjacent version's root.
    pub fn apply(
        &self,
        current: &DocumentRootNode,
        target: &NodeId,
    ) -> Result<DocumentRootNode, MutateError> {
        match self {
            Snapshot::Tree { root } => Ok(root.clone()),
            Snapshot::DocumentMeta { meta } => {
                let mut next = current.clone();
                next.meta = meta.clone();
                Ok(next)
            }
            Snapshot::PassageMeta { reference } => {
                let mut next = current.clone();
                match next.find_mut(target) {
                    Some(Node::Passage {
                        reference: slot, ..
                    }) => {
                        *slot = reference.clone();
                        Ok(next)
                    }
                    Some(_) => Err(MutateError::NotAPassage(target.clone())),
                    None => Err(MutateError::NodeNotFound(target.clone())),
                }
            }
        }
    }
}

/// One accepted mutation, as recorded in the append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub kind: EventKind,
    pub target_node_id: NodeId,
    pub before: Snapshot,
    pub after: Snapshot,
    /// Version of the state this event produced.
    pub resulting_version: u64,
    pub actor: Actor,
}
