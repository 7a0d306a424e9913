//! End-to-end flow: view edits through the coordinator into the engine,
//! external changes back into the view.

use pulpit_ast::{DocumentMeta, DocumentRootNode, IdGenerator, Node, NodeId, PassageRef};
use pulpit_bridge::{ast_to_rich_text, BridgeOptions, ExportFormat, RichTextDoc, RichTextNode};
use pulpit_editor::DocumentState;
use pulpit_workspace::{DocumentController, SyncError, ViewAdapter};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct SharedView {
    pushed: Rc<RefCell<Vec<RichTextDoc>>>,
}

impl ViewAdapter for SharedView {
    fn push_document(&mut self, doc: &RichTextDoc) -> Result<(), SyncError> {
        self.pushed.borrow_mut().push(doc.clone());
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn text(content: &str) -> Node {
    Node::Text {
        id: NodeId::default(),
        text: content.to_string(),
    }
}

fn paragraph(content: &str) -> Node {
    Node::Paragraph {
        id: NodeId::default(),
        children: vec![text(content)],
    }
}

fn sermon_state(key: &str) -> DocumentState {
    let mut root = DocumentRootNode::default();
    root.children.push(paragraph("Turn with me to John chapter three."));
    root.children.push(Node::Passage {
        id: NodeId::default(),
        reference: PassageRef {
            book: Some("John".to_string()),
            chapter: Some(3),
            verse_start: Some(16),
            is_biblical: true,
            ..PassageRef::default()
        },
        children: vec![text("For God so loved the world")],
    });
    root.children.push(paragraph("that he gave his only Son."));
    DocumentState::new(root, IdGenerator::new(key))
}

fn controller() -> (DocumentController<SharedView>, Rc<RefCell<Vec<RichTextDoc>>>) {
    init_tracing();
    let pushed = Rc::new(RefCell::new(Vec::new()));
    let view = SharedView {
        pushed: pushed.clone(),
    };
    (
        DocumentController::new(view, Duration::from_millis(300), BridgeOptions::default()),
        pushed,
    )
}

/// Re-render of the current state as the view would hold it, with one
/// extra paragraph typed at the end.
fn edited_payload(state: &DocumentState, appended: &str) -> RichTextDoc {
    let mut doc = ast_to_rich_text(&state.root, &BridgeOptions::default()).unwrap();
    let mut paragraph = RichTextNode::container(pulpit_bridge::kind::PARAGRAPH);
    paragraph.content.push(RichTextNode::text(appended));
    doc.content.push(paragraph);
    doc
}

#[test]
fn open_document_renders_into_view() {
    let (mut controller, pushed) = controller();

    controller
        .open_document("doc-1", sermon_state("/sermons/a.wav"))
        .unwrap();

    assert_eq!(pushed.borrow().len(), 1);
    assert_eq!(controller.active_key(), Some("doc-1"));
    assert_eq!(controller.state().unwrap().version, 0);
}

#[test]
fn coalesced_edits_commit_once_without_echo() {
    let (mut controller, pushed) = controller();
    controller
        .open_document("doc-1", sermon_state("/sermons/a.wav"))
        .unwrap();
    let start = Instant::now();

    let first = edited_payload(controller.state().unwrap(), "First thought.");
    let second = edited_payload(controller.state().unwrap(), "Second thought.");
    controller.observe_view_edit(first, start);
    controller.observe_view_edit(second, start + Duration::from_millis(100));

    // Window still open: nothing commits
    assert!(!controller.commit_due_edit(start + Duration::from_millis(350)));
    assert_eq!(controller.state().unwrap().version, 0);

    // Window elapsed: exactly one mutation, from the second payload
    assert!(controller.commit_due_edit(start + Duration::from_millis(401)));
    let state = controller.state().unwrap();
    assert_eq!(state.version, 1);
    assert_eq!(state.root.children.len(), 4);
    assert_eq!(
        state.root.children[3].plain_text(),
        "Second thought."
    );

    // The view that produced the edit gets no push back
    assert_eq!(pushed.borrow().len(), 1);

    // Nothing left pending
    assert!(!controller.commit_due_edit(start + Duration::from_secs(5)));
}

#[test]
fn undo_and_redo_push_external_updates() {
    let (mut controller, pushed) = controller();
    controller
        .open_document("doc-1", sermon_state("/sermons/a.wav"))
        .unwrap();
    let start = Instant::now();

    let payload = edited_payload(controller.state().unwrap(), "Let us pray.");
    controller.observe_view_edit(payload, start);
    assert!(controller.commit_due_edit(start + Duration::from_millis(301)));
    assert_eq!(pushed.borrow().len(), 1);
    assert!(controller.can_undo());

    assert!(controller.undo().unwrap());
    assert_eq!(controller.state().unwrap().version, 0);
    assert_eq!(pushed.borrow().len(), 2);
    assert!(controller.can_redo());

    assert!(controller.redo().unwrap());
    assert_eq!(controller.state().unwrap().version, 1);
    assert_eq!(pushed.borrow().len(), 3);

    // Empty stack: silent no-op, no push, no error
    assert!(!controller.redo().unwrap());
    assert_eq!(pushed.borrow().len(), 3);
}

#[test]
fn switching_documents_cancels_pending_edit() {
    let (mut controller, _pushed) = controller();
    controller
        .open_document("doc-1", sermon_state("/sermons/a.wav"))
        .unwrap();
    let start = Instant::now();

    let payload = edited_payload(controller.state().unwrap(), "Doomed edit.");
    controller.observe_view_edit(payload, start);

    controller
        .open_document("doc-2", sermon_state("/sermons/b.wav"))
        .unwrap();

    // The first document's pending edit never lands anywhere
    assert!(!controller.commit_due_edit(start + Duration::from_secs(5)));
    assert_eq!(controller.state().unwrap().version, 0);
    assert_eq!(controller.active_key(), Some("doc-2"));
}

#[test]
fn rejected_boundary_keeps_previous_state() {
    let (mut controller, pushed) = controller();
    controller
        .open_document("doc-1", sermon_state("/sermons/a.wav"))
        .unwrap();
    let quote_id = controller.state().unwrap().passage_index.entries()[0]
        .node_id
        .clone();

    let result = controller.change_quote_boundary(&quote_id, 9, 2, "short", &[]);

    assert!(matches!(result, Err(SyncError::Mutate(_))));
    assert_eq!(controller.state().unwrap().version, 0);
    assert_eq!(pushed.borrow().len(), 1);
}

#[test]
fn boundary_merge_flows_back_to_view() {
    let (mut controller, pushed) = controller();
    controller
        .open_document("doc-1", sermon_state("/sermons/a.wav"))
        .unwrap();

    let state = controller.state().unwrap();
    let quote_id = state.passage_index.entries()[0].node_id.clone();
    let following = state.root.children[2].id().clone();

    let content = "For God so loved the world, that he gave his only Son.";
    controller
        .change_quote_boundary(&quote_id, 0, content.chars().count(), content, &[following])
        .unwrap();

    let state = controller.state().unwrap();
    assert_eq!(state.version, 1);
    assert_eq!(state.passage_index.get(&quote_id).unwrap().display_text, content);
    assert_eq!(pushed.borrow().len(), 2);
}

#[test]
fn metadata_updates_and_export() {
    let (mut controller, _pushed) = controller();
    controller
        .open_document("doc-1", sermon_state("/sermons/a.wav"))
        .unwrap();

    controller
        .update_document_metadata(DocumentMeta {
            title: Some("God So Loved".to_string()),
            speaker: Some("Pastor Lee".to_string()),
            ..DocumentMeta::default()
        })
        .unwrap();

    let quote_id = controller.state().unwrap().passage_index.entries()[0]
        .node_id
        .clone();
    controller.verify_passage(&quote_id).unwrap();
    assert!(controller.state().unwrap().passage_index.get(&quote_id).unwrap().verified);

    let request = controller.export(ExportFormat::Md).unwrap();
    assert!(request.body.starts_with("# God So Loved"));
    assert!(request.body.contains("> For God so loved the world"));

    controller.close_document();
    assert!(controller.export(ExportFormat::Md).is_err());
}
