//! Persisted transcription history.
//!
//! Each entry stores the flat transcript plus, for sermons, the canonical
//! document-state snapshot (root, version, event log). Derived indices
//! are not stored; they are rebuilt on load. The event log is truncated
//! at save time to bound file size.

use chrono::{DateTime, Utc};
use pulpit_editor::DocumentState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("history io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history entry is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored document state is unusable: {0}")]
    State(#[from] pulpit_editor::MutateError),
}

/// Wrapper around the canonical document-state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SermonDocument {
    pub document_state: DocumentState,
}

/// One transcription in the persisted history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub file_name: String,
    pub file_path: String,
    pub date: DateTime<Utc>,
    pub full_text: String,
    pub is_sermon: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sermon_document: Option<SermonDocument>,
}

impl HistoryEntry {
    /// Snapshot a live sermon state for storage, keeping at most
    /// `keep_events` log entries.
    pub fn from_state(
        id: impl Into<String>,
        file_name: impl Into<String>,
        file_path: impl Into<String>,
        state: &DocumentState,
        keep_events: usize,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            file_path: file_path.into(),
            date: Utc::now(),
            full_text: state.root.plain_text(),
            is_sermon: true,
            sermon_document: Some(SermonDocument {
                document_state: state.truncate_log(keep_events),
            }),
        }
    }

    /// Bring the stored state back to life: clone, rebuild indices.
    pub fn restore_state(&self) -> Result<Option<DocumentState>, HistoryError> {
        let Some(sermon) = &self.sermon_document else {
            return Ok(None);
        };
        let mut state = sermon.document_state.clone();
        state.rehydrate()?;
        Ok(Some(state))
    }
}

/// JSON-file-backed history list.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all entries; a missing file is an empty history.
    pub fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let raw = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    /// Append one entry, newest last.
    pub fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let mut entries = self.load()?;
        entries.push(entry);
        self.save(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulpit_ast::{DocumentMeta, DocumentRootNode, IdGenerator, Node, NodeId};
    use pulpit_editor::Actor;

    fn sermon_state() -> DocumentState {
        let mut root = DocumentRootNode::default();
        root.children.push(Node::Paragraph {
            id: NodeId::default(),
            children: vec![Node::Text {
                id: NodeId::default(),
                text: "For God so loved the world".to_string(),
            }],
        });
        DocumentState::new(root, IdGenerator::new("/sermons/easter.wav"))
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));

        assert!(store.load().unwrap().is_empty());

        let state = sermon_state();
        let entry = HistoryEntry::from_state(
            "rec-1",
            "easter.wav",
            "/sermons/easter.wav",
            &state,
            100,
        );
        store.append(entry.clone()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "rec-1");
        assert_eq!(loaded[0].full_text, "For God so loved the world");
        assert!(loaded[0].is_sermon);
    }

    #[test]
    fn test_restored_state_has_working_history() {
        let mut state = sermon_state();
        for round in 0..5 {
            state = state
                .apply_document_metadata(
                    DocumentMeta {
                        title: Some(format!("Draft {}", round)),
                        ..DocumentMeta::default()
                    },
                    Actor::User,
                )
                .unwrap();
        }

        // Truncation keeps only the most recent two events
        let entry =
            HistoryEntry::from_state("rec-1", "easter.wav", "/sermons/easter.wav", &state, 2);
        let restored = entry.restore_state().unwrap().unwrap();

        assert_eq!(restored.version, 5);
        assert_eq!(restored.event_log.len(), 2);
        assert_eq!(restored.undo_stack.len(), 2);
        // Indices were rebuilt on restore
        assert!(!restored.node_index.is_empty());

        let undone = restored.undo().unwrap();
        assert_eq!(undone.root.meta.title.as_deref(), Some("Draft 3"));
    }

    #[test]
    fn test_entry_json_layout_is_camel_case() {
        let entry = HistoryEntry::from_state(
            "rec-1",
            "easter.wav",
            "/sermons/easter.wav",
            &sermon_state(),
            10,
        );
        let json = serde_json::to_value(&entry).unwrap();

        assert!(json.get("fileName").is_some());
        assert!(json.get("filePath").is_some());
        assert!(json.get("fullText").is_some());
        assert!(json.get("isSermon").is_some());
        assert!(json["sermonDocument"].get("documentState").is_some());
    }
}
