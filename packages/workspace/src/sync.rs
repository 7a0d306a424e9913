//! # Sync Coordinator
//!
//! Decides, at any instant, which of the two document representations is
//! authoritative, and prevents the classic feedback loop where a
//! programmatic view update is mistaken for a fresh user edit.
//!
//! ## State machine
//!
//! - `Idle` — representations agree, nothing in flight
//! - `PendingLocalSync` — a view edit is debounced and waiting to be
//!   committed to the AST; more edits before the deadline reset the timer
//!   and replace the payload (last write wins)
//! - `PendingExternalSync` — an AST change that did not originate from the
//!   view's own pending edit (undo, redo, a structural mutation) is being
//!   pushed into the view
//!
//! The coordinator is clock-explicit: callers pass `Instant`s, so the
//! machine is deterministic under test. [`crate::DebounceDriver`] supplies
//! the timer in the interactive path.

use pulpit_ast::DocumentRootNode;
use pulpit_bridge::{ast_to_rich_text, BridgeOptions, ConversionError, RichTextDoc};
use pulpit_editor::MutateError;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("mutation failed: {0}")]
    Mutate(#[from] MutateError),

    #[error("view rejected update: {0}")]
    View(String),

    #[error("no document is active")]
    NoActiveDocument,
}

/// Handle to the active rich-text view, injected at construction.
///
/// Implementations must deliver any edit-observed callback caused by
/// `push_document` synchronously within the call, so the coordinator's
/// echo guard is still raised when it arrives.
pub trait ViewAdapter {
    fn push_document(&mut self, doc: &RichTextDoc) -> Result<(), SyncError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    PendingLocalSync,
    PendingExternalSync,
}

struct PendingEdit {
    payload: RichTextDoc,
    deadline: Instant,
}

/// Per-document synchronization protocol.
pub struct SyncCoordinator<V: ViewAdapter> {
    view: V,
    state: SyncState,
    debounce: Duration,
    pending: Option<PendingEdit>,
    /// Monotonic counter over external AST changes; stale pushes compare
    /// against `last_pushed` and are dropped.
    external_version: u64,
    last_pushed: u64,
    suppress_echo: bool,
    options: BridgeOptions,
}

impl<V: ViewAdapter> SyncCoordinator<V> {
    pub fn new(view: V, debounce: Duration, options: BridgeOptions) -> Self {
        Self {
            view,
            state: SyncState::Idle,
            debounce,
            pending: None,
            external_version: 0,
            last_pushed: 0,
            suppress_echo: false,
            options,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_suppressing(&self) -> bool {
        self.suppress_echo
    }

    pub fn has_pending_edit(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending local edit is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|edit| edit.deadline)
    }

    /// A view edit arrived. Starts or resets the debounce window and
    /// replaces any pending payload (coalescing keeps only the latest).
    pub fn observe_local_edit(&mut self, payload: RichTextDoc, now: Instant) {
        if self.suppress_echo {
            tracing::debug!("suppressed echo of programmatic view update");
            return;
        }
        self.pending = Some(PendingEdit {
            payload,
            deadline: now + self.debounce,
        });
        self.state = SyncState::PendingLocalSync;
        tracing::debug!("local edit pending, debounce reset");
    }

    /// Hand back the coalesced payload once its deadline has passed.
    /// Returns `None` while the window is still open or nothing is pending.
    pub fn take_due_edit(&mut self, now: Instant) -> Option<RichTextDoc> {
        let due = self
            .pending
            .as_ref()
            .map(|edit| edit.deadline <= now)
            .unwrap_or(false);
        if !due {
            return None;
        }
        self.state = SyncState::Idle;
        self.pending.take().map(|edit| edit.payload)
    }

    /// Register an external AST change and get its sync version.
    pub fn begin_external(&mut self) -> u64 {
        self.external_version += 1;
        self.external_version
    }

    /// Push an externally-changed AST into the view.
    ///
    /// Returns `Ok(false)` without touching the view when `version` is
    /// stale (an older queued push must not clobber a newer one). Any
    /// pending local edit is discarded: it predates the external change.
    pub fn push_external(
        &mut self,
        root: &DocumentRootNode,
        version: u64,
    ) -> Result<bool, SyncError> {
        if version <= self.last_pushed {
            tracing::warn!(
                version,
                last_pushed = self.last_pushed,
                "dropping stale external sync"
            );
            return Ok(false);
        }

        let doc = ast_to_rich_text(root, &self.options)?;

        if self.pending.take().is_some() {
            tracing::debug!("pending local edit superseded by external change");
        }

        self.state = SyncState::PendingExternalSync;
        self.suppress_echo = true;
        let result = self.view.push_document(&doc);
        self.suppress_echo = false;
        self.state = SyncState::Idle;

        result?;
        self.last_pushed = version;
        Ok(true)
    }

    /// Document switched or closed: drop any pending edit outright.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!("pending local edit cancelled");
        }
        self.state = SyncState::Idle;
    }
}
