//! # Document Controller
//!
//! Owns the single live [`DocumentState`] per open document and performs
//! the atomic reference replace after every accepted mutation. Mutations
//! are pure (old state in, new state out), so no locking is needed: this
//! controller is the only writer, and interleaved callbacks always see a
//! complete state.
//!
//! Routing rules:
//! - a committed **local** edit is never pushed back to the view that
//!   produced it
//! - undo, redo, boundary edits, and metadata edits are **external** to
//!   the view and are pushed through the sync coordinator

use crate::export::{build_export, ExportRequest};
use crate::sync::{SyncCoordinator, SyncError, ViewAdapter};
use pulpit_ast::{DocumentMeta, NodeId, PassageRef};
use pulpit_bridge::{rich_text_to_ast, BridgeOptions, ExportFormat, RichTextDoc};
use pulpit_editor::{Actor, DocumentState, MutateError};
use std::time::{Duration, Instant};

struct ActiveDocument {
    key: String,
    state: DocumentState,
}

pub struct DocumentController<V: ViewAdapter> {
    coordinator: SyncCoordinator<V>,
    options: BridgeOptions,
    current: Option<ActiveDocument>,
}

impl<V: ViewAdapter> DocumentController<V> {
    pub fn new(view: V, debounce: Duration, options: BridgeOptions) -> Self {
        Self {
            coordinator: SyncCoordinator::new(view, debounce, options.clone()),
            options,
            current: None,
        }
    }

    pub fn active_key(&self) -> Option<&str> {
        self.current.as_ref().map(|active| active.key.as_str())
    }

    pub fn state(&self) -> Option<&DocumentState> {
        self.current.as_ref().map(|active| &active.state)
    }

    pub fn can_undo(&self) -> bool {
        self.state().map(DocumentState::can_undo).unwrap_or(false)
    }

    pub fn can_redo(&self) -> bool {
        self.state().map(DocumentState::can_redo).unwrap_or(false)
    }

    /// When the coordinator's pending edit is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.coordinator.next_deadline()
    }

    /// Make `state` the live document. Any pending debounce for the
    /// previous document is cancelled outright; nothing partial commits.
    pub fn open_document(
        &mut self,
        key: impl Into<String>,
        state: DocumentState,
    ) -> Result<(), SyncError> {
        let key = key.into();
        self.coordinator.cancel();
        let root = state.root.clone();
        self.current = Some(ActiveDocument {
            key: key.clone(),
            state,
        });
        tracing::info!(document = %key, "document opened");

        let version = self.coordinator.begin_external();
        self.coordinator.push_external(&root, version)?;
        Ok(())
    }

    pub fn close_document(&mut self) {
        self.coordinator.cancel();
        if let Some(active) = self.current.take() {
            tracing::info!(document = %active.key, "document closed");
        }
    }

    /// Entry point for the view's edit-observed callback.
    pub fn observe_view_edit(&mut self, payload: RichTextDoc, now: Instant) {
        if self.current.is_none() {
            tracing::warn!("view edit with no active document, dropped");
            return;
        }
        self.coordinator.observe_local_edit(payload, now);
    }

    /// Commit the debounced local edit if its window has elapsed.
    ///
    /// Conversion or mutation failures are logged and dropped; the
    /// last-known-good state stays live. Returns whether a commit landed.
    pub fn commit_due_edit(&mut self, now: Instant) -> bool {
        let Some(payload) = self.coordinator.take_due_edit(now) else {
            return false;
        };
        let Some(active) = self.current.as_mut() else {
            return false;
        };

        let mut ids = active.state.id_generator();
        let root =
            match rich_text_to_ast(&payload, &self.options, Some(&active.state.root), &mut ids) {
                Ok(root) => root,
                Err(err) => {
                    tracing::warn!(error = %err, "dropping unconvertible view edit");
                    return false;
                }
            };

        match active.state.apply_content_replacement(root, ids, Actor::User) {
            Ok(next) => {
                // Atomic replace; no push back to the originating view
                active.state = next;
                tracing::debug!(version = active.state.version, "local edit committed");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "dropping rejected view edit");
                false
            }
        }
    }

    /// Undo the most recent mutation. An empty stack is a silent no-op
    /// (the UI disables the button); other failures propagate.
    pub fn undo(&mut self) -> Result<bool, SyncError> {
        self.apply_external(|state| state.undo(), Some(MutateError::NothingToUndo))
    }

    pub fn redo(&mut self) -> Result<bool, SyncError> {
        self.apply_external(|state| state.redo(), Some(MutateError::NothingToRedo))
    }

    /// Re-draw a quote boundary. A rejected boundary surfaces as an error
    /// and leaves the live state untouched.
    pub fn change_quote_boundary(
        &mut self,
        quote_id: &NodeId,
        new_start_offset: usize,
        new_end_offset: usize,
        new_content: &str,
        paragraphs_to_merge: &[NodeId],
    ) -> Result<(), SyncError> {
        self.apply_external(
            |state| {
                state.apply_boundary_change(
                    quote_id,
                    new_start_offset,
                    new_end_offset,
                    new_content,
                    paragraphs_to_merge,
                    Actor::User,
                )
            },
            None,
        )?;
        Ok(())
    }

    pub fn update_document_metadata(&mut self, meta: DocumentMeta) -> Result<(), SyncError> {
        self.apply_external(
            |state| state.apply_document_metadata(meta.clone(), Actor::User),
            None,
        )?;
        Ok(())
    }

    pub fn update_passage_metadata(
        &mut self,
        node_id: &NodeId,
        reference: PassageRef,
    ) -> Result<(), SyncError> {
        self.apply_external(
            |state| state.apply_passage_metadata(node_id, reference.clone(), Actor::User),
            None,
        )?;
        Ok(())
    }

    pub fn verify_passage(&mut self, node_id: &NodeId) -> Result<(), SyncError> {
        self.apply_external(|state| state.verify_passage(node_id, Actor::User), None)?;
        Ok(())
    }

    /// Build the export payload for the live document.
    pub fn export(&self, format: ExportFormat) -> Result<ExportRequest, SyncError> {
        let state = self.state().ok_or(SyncError::NoActiveDocument)?;
        Ok(build_export(state, format))
    }

    /// Run a mutation that did not originate from the view, replace the
    /// live state, and push the result into the view. `silent` names the
    /// one error treated as a no-op rather than a failure.
    fn apply_external<F>(
        &mut self,
        mutate: F,
        silent: Option<MutateError>,
    ) -> Result<bool, SyncError>
    where
        F: Fn(&DocumentState) -> Result<DocumentState, MutateError>,
    {
        let active = self.current.as_mut().ok_or(SyncError::NoActiveDocument)?;

        let next = match mutate(&active.state) {
            Ok(next) => next,
            Err(err) if Some(&err) == silent.as_ref() => {
                tracing::debug!(error = %err, "no-op");
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        };

        // A mutation the engine did not accept (equal tree, equal
        // metadata) leaves the version alone; nothing to sync.
        if next.version == active.state.version && next.root == active.state.root {
            return Ok(false);
        }

        active.state = next;
        let root = active.state.root.clone();
        let version = self.coordinator.begin_external();
        if let Err(err) = self.coordinator.push_external(&root, version) {
            // The state replace already happened and stays; the view will
            // catch up on the next successful push.
            tracing::warn!(error = %err, "external sync dropped");
        }
        Ok(true)
    }
}
