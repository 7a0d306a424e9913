//! # Pulpit Editor
//!
//! Versioned, event-sourced document state for transcribed sermons.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ ast: tree + identity + derived indices      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: DocumentState lifecycle             │
//! │  - Apply mutations with validation          │
//! │  - Invertible event log (audit + undo/redo) │
//! │  - Atomic index rebuild per accepted edit   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ bridge/workspace: view sync + persistence   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **States are immutable**: every accepted mutation returns a new
//!    `DocumentState`; the previous one is untouched
//! 2. **Events are invertible**: applying an event's `before` payload from
//!    the state it produced reconstructs the prior root exactly
//! 3. **The log is append-only**: undo and redo replay recorded payloads,
//!    they never rewrite history
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pulpit_ast::{DocumentRootNode, IdGenerator};
//! use pulpit_editor::{Actor, DocumentState};
//!
//! let state = DocumentState::new(root, IdGenerator::new("/sermons/easter.wav"));
//!
//! // Apply an edited tree coming back from the rich-text view
//! let state = state.apply_content_replacement(edited_root, ids, Actor::User)?;
//!
//! // Revert it
//! let state = state.undo()?;
//! ```

mod errors;
mod events;
mod mutator;
mod state;

pub use errors::MutateError;
pub use events::{Actor, Event, EventId, EventKind, Snapshot};
pub use state::DocumentState;
