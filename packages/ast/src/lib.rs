//! # Pulpit AST
//!
//! The document tree for transcribed sermons: node model, stable node
//! identity, the id → node lookup index, and the derived passage views.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ ast: tree + identity + derived indices      │
//! │  - Node model (tagged union per node kind)  │
//! │  - Id generation + tree normalization       │
//! │  - NodeIndex (id → path lookup, never owns) │
//! │  - PassageIndex / extracted passage cache   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: DocumentState + mutations + history │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **AST is source of truth**: the rich-text view is a derived surface
//! 2. **Stable identity**: a logical node keeps its id across re-renders
//! 3. **Indices are caches**: rebuilt from the root, never edited directly

mod id;
mod index;
mod node;
mod passage;

pub use id::{document_seed, IdGenerator};
pub use index::{IndexEntry, NodeIndex};
pub use node::{
    normalize_tree, DocumentMeta, DocumentRootNode, Interjection, Node, NodeId, NodeKind,
    PassageRef,
};
pub use passage::{
    derive_reference, parse_reference, ExtractedPassage, ExtractedPassages, PassageEntry,
    PassageIndex,
};
