//! Export boundary: pair a deterministic rendering with a format tag.
//!
//! The host owns file dialogs and writing; this side only guarantees the
//! body is a pure function of the current tree.

use pulpit_bridge::{render_for, ExportFormat};
use pulpit_editor::DocumentState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub body: String,
}

pub fn build_export(state: &DocumentState, format: ExportFormat) -> ExportRequest {
    ExportRequest {
        format,
        body: render_for(&state.root, format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulpit_ast::{DocumentRootNode, IdGenerator, Node, NodeId};

    fn state() -> DocumentState {
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
    fn test_export_is_deterministic() {
        let state = state();
        let first = build_export(&state, ExportFormat::Pdf);
        let second = build_export(&state, ExportFormat::Pdf);
        assert_eq!(first, second);
        assert!(first.body.contains("<article>"));
    }

    #[test]
    fn test_txt_export_is_plain() {
        let request = build_export(&state(), ExportFormat::Txt);
        assert_eq!(request.body, "For God so loved the world");
    }
}
