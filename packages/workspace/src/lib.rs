//! # Pulpit Workspace
//!
//! The coordination layer between the document engine and its external
//! collaborators: the rich-text view, the out-of-process transcription
//! engine, persisted history, and the export boundary.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   local edits    ┌──────────────────────────┐
//! │ rich-text    │ ───────────────► │ SyncCoordinator          │
//! │ view         │ ◄─────────────── │  debounce + echo guard   │
//! └──────────────┘  external pushes └──────────────────────────┘
//!                                               │
//!                                               ▼
//!                                   ┌──────────────────────────┐
//!                                   │ DocumentController       │
//!                                   │  one live DocumentState  │
//!                                   └──────────────────────────┘
//!                                        ▲              │
//!                    seeds               │              ▼
//! ┌──────────────────────────┐   ┌──────────────┐ ┌──────────┐
//! │ transcription engine     │   │ history      │ │ export   │
//! └──────────────────────────┘   └──────────────┘ └──────────┘
//! ```
//!
//! Everything runs on one thread; "concurrency" is interleaved timer and
//! engine callbacks, which is why the coordinator is an explicit state
//! machine rather than a pile of flags.

mod controller;
mod driver;
mod engine;
mod export;
mod history;
mod sync;

pub use controller::DocumentController;
pub use driver::DebounceDriver;
pub use engine::{
    document_from_text, seed_document_state, EngineError, ProgressEvent, SessionStatus,
    TranscriptionEngine, TranscriptionOutcome, TranscriptionRequest, TranscriptionSession,
};
pub use export::{build_export, ExportRequest};
pub use history::{HistoryEntry, HistoryError, HistoryStore, SermonDocument};
pub use sync::{SyncCoordinator, SyncError, SyncState, ViewAdapter};
