//! Error types for document mutation

use crate::events::EventId;
use pulpit_ast::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutateError {
    #[error("invalid boundary: {0}")]
    InvalidBoundary(String),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    /// Two nodes resolved to the same id after a merge. Must not occur;
    /// asserted in debug builds when the index is rebuilt.
    #[error("identity conflict: node id {0} occurs more than once")]
    IdentityConflict(NodeId),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("node {0} is not a passage")]
    NotAPassage(NodeId),

    #[error("event not in log: {0}")]
    EventNotFound(EventId),
}
