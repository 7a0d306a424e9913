//! # Transcription Engine Boundary
//!
//! Typed contract with the out-of-process transcription engine. The
//! engine is an external collaborator: it takes a media file, streams
//! progress, and returns plain text plus — for sermons — a
//! document-state-shaped payload that seeds the editor.

use crate::history::SermonDocument;
use pulpit_ast::{DocumentRootNode, IdGenerator, Node, NodeId};
use pulpit_editor::DocumentState;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("transcription failed: {0}")]
    Engine(String),

    #[error("a transcription is already running")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionRequest {
    pub file_path: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub advanced_settings: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionOutcome {
    pub success: bool,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sermon_document: Option<SermonDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
}

/// Streamed while the engine works a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub stage_id: String,
    /// 0.0 ..= 1.0 within the current stage.
    pub stage_progress: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The engine process contract. `cancel` must not resolve until the
/// engine has actually stopped; callers await it before going idle.
#[allow(async_fn_in_trait)]
pub trait TranscriptionEngine {
    async fn transcribe(
        &mut self,
        request: TranscriptionRequest,
        progress: mpsc::UnboundedSender<ProgressEvent>,
    ) -> Result<TranscriptionOutcome, EngineError>;

    async fn cancel(&mut self) -> Result<(), EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Running,
    Cancelling,
}

/// Lifecycle wrapper around one engine instance.
pub struct TranscriptionSession<E> {
    engine: E,
    status: SessionStatus,
}

impl<E: TranscriptionEngine> TranscriptionSession<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            status: SessionStatus::Idle,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub async fn run(
        &mut self,
        request: TranscriptionRequest,
        progress: mpsc::UnboundedSender<ProgressEvent>,
    ) -> Result<TranscriptionOutcome, EngineError> {
        if self.status != SessionStatus::Idle {
            return Err(EngineError::Busy);
        }
        self.status = SessionStatus::Running;
        tracing::info!(file = %request.file_path, model = %request.model, "transcription started");

        let outcome = self.engine.transcribe(request, progress).await;
        self.status = SessionStatus::Idle;

        match &outcome {
            Ok(result) if result.cancelled => tracing::info!("transcription cancelled"),
            Ok(result) if result.success => tracing::info!("transcription completed"),
            Ok(result) => {
                tracing::warn!(error = ?result.error, "transcription reported failure")
            }
            Err(err) => tracing::warn!(error = %err, "transcription errored"),
        }
        outcome
    }

    /// Ask the engine to stop. The status stays `Cancelling` until the
    /// engine's acknowledgment resolves.
    pub async fn cancel(&mut self) -> Result<(), EngineError> {
        if self.status == SessionStatus::Idle {
            return Ok(());
        }
        self.status = SessionStatus::Cancelling;
        let result = self.engine.cancel().await;
        self.status = SessionStatus::Idle;
        result
    }
}

/// Seed a fresh document state from an engine outcome, if it carried a
/// sermon payload. Version 0, empty event log; the payload's tree is the
/// starting root.
pub fn seed_document_state(outcome: &TranscriptionOutcome) -> Option<DocumentState> {
    let sermon = outcome.sermon_document.as_ref()?;
    let persisted = &sermon.document_state;
    Some(DocumentState::new(
        persisted.root.clone(),
        persisted.id_generator(),
    ))
}

/// Seed a document state from bare transcript text (non-sermon runs or
/// engines without structural output): one paragraph per blank-separated
/// block.
pub fn document_from_text(text: &str, source_key: &str) -> DocumentState {
    let ids = IdGenerator::new(source_key);
    let mut root = DocumentRootNode::default();

    for block in text.split("\n\n") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        root.children.push(Node::Paragraph {
            id: NodeId::default(),
            children: vec![Node::Text {
                id: NodeId::default(),
                text: block.to_string(),
            }],
        });
    }
    DocumentState::new(root, ids)
}
