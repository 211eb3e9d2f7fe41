use shapeshift::assistant::{Assistant, TransportError};
use shapeshift::html_renderer::HtmlRenderer;
use shapeshift::reducer::OutcomeStatus;
use shapeshift::session::{EMPTY_RESPONSE_ACK, MALFORMED_ACK, RESET_ACK, TRANSPORT_ACK};
use shapeshift::storage::{FileStore, MemoryStore, SnapshotStore, StorageError};
use shapeshift::{Document, SectionType, Session};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;

enum Reply {
    Text(&'static str),
    Empty,
    Status(u16),
}

/// Plays back canned replies and records every prompt it was sent
struct ScriptedAssistant {
    replies: RefCell<VecDeque<Reply>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedAssistant {
    fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            prompts: RefCell::new(Vec::new()),
        }
    }
}

impl Assistant for ScriptedAssistant {
    fn generate(&self, prompt: &str) -> Result<String, TransportError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        match self.replies.borrow_mut().pop_front() {
            Some(Reply::Text(text)) => Ok(text.to_string()),
            Some(Reply::Empty) | None => Err(TransportError::EmptyResponse),
            Some(Reply::Status(status)) => Err(TransportError::Status {
                status,
                body: "quota exceeded".to_string(),
            }),
        }
    }
}

/// Accepts saves until `broken` is set, then fails every save
#[derive(Default)]
struct BrittleStore {
    inner: MemoryStore,
    broken: Cell<bool>,
}

impl SnapshotStore for BrittleStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        self.inner.load()
    }

    fn save(&self, snapshot: &str) -> Result<(), StorageError> {
        if self.broken.get() {
            return Err(StorageError::IoError {
                path: PathBuf::from("website.json"),
                source: io::Error::new(io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.save(snapshot)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.inner.clear()
    }
}

fn memory_session() -> Session<MemoryStore, HtmlRenderer> {
    Session::bootstrap(MemoryStore::new(), HtmlRenderer).unwrap()
}

#[test]
fn test_turn_adds_section_after_hero() {
    let assistant = ScriptedAssistant::new(vec![Reply::Text(
        "Here you go:\n```json\n{\"action\": \"addSection\", \"type\": \"text\", \
         \"position\": \"after:default-hero\", \
         \"content\": {\"title\": \"New\", \"text\": \"Body\"}}\n```",
    )]);
    let mut session = memory_session();

    let report = session.run_turn(&assistant, "Add a text section after the hero");

    let doc = session.document();
    assert_eq!(doc.sections.len(), 5);
    let added = &doc.sections[2];
    assert_eq!(added.section_type, SectionType::Text);
    assert_eq!(added.content["title"], "New");
    assert!(added.id.starts_with("text-"));
    assert!(Document::default().section(&added.id).is_none());
    assert_eq!(
        report.acknowledgements,
        vec![format!("Added a new text section (ID: {}).", added.id)]
    );
    assert!(report.rendered);
    assert!(session.last_render().contains(&format!("id=\"{}\"", added.id)));

    let prompts = assistant.prompts.borrow();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("\"default-hero\""));
    assert!(prompts[0].ends_with("User request: Add a text section after the hero"));
}

#[test]
fn test_each_instruction_sees_previous_ones() {
    let assistant = ScriptedAssistant::new(vec![Reply::Text(
        r##"[
            {"action": "updateSection", "id": "default-hero", "content": {"title": "Fresh Bread"}},
            {"action": "orderSections", "order": ["default-footer", "default-hero", "missing"]},
            {"action": "removeSection", "id": "default-about"},
            {"action": "inform", "message": "Done!"}
        ]"##,
    )]);
    let mut session = memory_session();

    let report = session.run_turn(&assistant, "bakery theme");

    let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            OutcomeStatus::Applied,
            OutcomeStatus::Applied,
            OutcomeStatus::Applied,
            OutcomeStatus::Informed,
        ]
    );
    assert_eq!(report.acknowledgements.last().unwrap(), "Done!");
    assert!(report.warnings.iter().any(|w| w.contains("missing")));

    let doc = session.document();
    assert_eq!(
        doc.section_ids(),
        vec!["default-footer", "default-hero", "default-header"]
    );
    let hero = doc.section("default-hero").unwrap();
    assert_eq!(hero.content["title"], "Fresh Bread");
    assert_eq!(
        hero.content["subtitle"],
        Document::default().section("default-hero").unwrap().content["subtitle"]
    );

    let saved = Document::from_json(&session.store().snapshot().unwrap()).unwrap();
    assert_eq!(&saved, doc);
}

#[test]
fn test_transport_failure_leaves_document_alone() {
    let assistant = ScriptedAssistant::new(vec![Reply::Status(429)]);
    let mut session = memory_session();
    let rendered = session.last_render().to_string();

    let report = session.run_turn(&assistant, "make it pink");

    assert_eq!(report.acknowledgements, vec![TRANSPORT_ACK.to_string()]);
    assert!(report.warnings[0].contains("429"));
    assert!(!report.rendered);
    assert_eq!(session.document(), &Document::default());
    assert_eq!(session.last_render(), rendered);
}

#[test]
fn test_empty_response() {
    let assistant = ScriptedAssistant::new(vec![Reply::Empty]);
    let mut session = memory_session();
    let report = session.run_turn(&assistant, "hello");
    assert_eq!(report.acknowledgements, vec![EMPTY_RESPONSE_ACK.to_string()]);
}

#[test]
fn test_malformed_reply_applies_nothing() {
    let assistant = ScriptedAssistant::new(vec![Reply::Text(
        "```json\n{\"action\": \"removeSection\", \"id\": \"default-hero\",}\n```",
    )]);
    let mut session = memory_session();

    let report = session.run_turn(&assistant, "remove the hero");

    assert_eq!(report.acknowledgements[0], MALFORMED_ACK);
    assert!(report.acknowledgements[1].starts_with("Raw response: "));
    assert!(session.document().contains("default-hero"));
}

#[test]
fn test_reset_after_changes_matches_default() {
    let mut session = memory_session();
    session.process_response(
        r##"[
            {"action": "updateGlobalStyles", "styles": {"--primary-color": "#ff0000"}},
            {"action": "addSection", "type": "footer", "position": "top"},
            {"action": "removeSection", "id": "default-header"}
        ]"##,
    );
    assert_ne!(session.document(), &Document::default());

    let report = session.reset();

    assert_eq!(report.acknowledgements, vec![RESET_ACK.to_string()]);
    assert_eq!(session.document(), &Document::default());
    let saved = session.store().snapshot().unwrap();
    assert_eq!(Document::from_json(&saved).unwrap(), Document::default());
}

#[test]
fn test_render_is_idempotent() {
    let mut session = memory_session();
    let first = session.last_render().to_string();
    session.render_and_persist().unwrap();
    assert_eq!(session.last_render(), first);

    let report = session.process_response(r#"{"action": "inform", "message": "ok"}"#);
    assert!(report.rendered);
    assert_eq!(session.last_render(), first);
}

#[test]
fn test_duplicate_id_snapshot_falls_back_to_default() {
    let mut doc = Document::default();
    doc.sections[1].id = "default-header".to_string();
    let raw = serde_json::to_string(&doc).unwrap();

    let session = Session::bootstrap(MemoryStore::with_snapshot(raw), HtmlRenderer).unwrap();

    assert_eq!(session.document(), &Document::default());
}

#[test]
fn test_file_store_survives_restart() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let path = temp.path().join(".shapeshift/website.json");

    {
        let mut session = Session::bootstrap(FileStore::new(&path), HtmlRenderer)?;
        let report = session.process_response(
            r##"{"action": "updateGlobalStyles", "styles": {"--font-family": "Georgia, serif"}}"##,
        );
        assert!(report.changed());
    }

    let session = Session::bootstrap(FileStore::new(&path), HtmlRenderer)?;
    assert_eq!(
        session.document().global_styles["--font-family"],
        "Georgia, serif"
    );
    assert!(session.last_render().contains("--font-family: Georgia, serif;"));

    session.store().clear()?;
    assert!(!path.exists());
    Ok(())
}

#[test]
fn test_failed_save_is_a_warning_and_turn_completes() {
    let mut session = Session::bootstrap(BrittleStore::default(), HtmlRenderer).unwrap();
    let saved_before = session.store().inner.snapshot();
    session.store().broken.set(true);

    let report = session.process_response(
        r##"{"action": "updateGlobalStyles", "styles": {"--primary-color": "#ff0000"}}"##,
    );

    assert_eq!(
        report.acknowledgements,
        vec!["Applied global style changes.".to_string()]
    );
    assert!(report.rendered);
    assert!(report.changed());
    assert_eq!(
        session.document().global_styles["--primary-color"],
        "#ff0000"
    );
    assert!(session.last_render().contains("--primary-color: #ff0000;"));
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("disk full"));
    assert_eq!(session.store().inner.snapshot(), saved_before);
}

#[test]
fn test_failed_save_on_reset_is_a_warning() {
    let mut session = Session::bootstrap(BrittleStore::default(), HtmlRenderer).unwrap();
    session.store().broken.set(true);

    let report = session.reset();

    assert_eq!(report.acknowledgements, vec![RESET_ACK.to_string()]);
    assert!(report.warnings.iter().any(|w| w.contains("disk full")));
    assert_eq!(session.document(), &Document::default());
}
