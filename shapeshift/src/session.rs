//! One editing session: the owned document plus its render/persist cycle
//!
//! A [`Session`] is the only owner of the [`Document`]. Each user turn goes
//! prompt -> assistant -> parse -> reduce (per instruction) -> render -> save,
//! and always ends with a [`TurnReport`] holding at least one acknowledgement.
//! Nothing that goes wrong inside a turn is returned as an error.

use crate::assistant::{Assistant, TransportError};
use crate::document_model::{Document, DocumentError};
use crate::html_renderer::{render_page, SectionRenderer};
use crate::instruction::{self, ParseError};
use crate::prompt;
use crate::reducer::{self, Outcome};
use crate::storage::{SnapshotStore, StorageError};
use thiserror::Error;

/// Acknowledgement after a reset
pub const RESET_ACK: &str = "Website has been reset to its default state.";

/// Acknowledgement when the reply is not valid JSON
pub const MALFORMED_ACK: &str = "I received a response, but it wasn't in the expected format. \
Could you please rephrase your request?";

/// Acknowledgement when the round trip to the backend fails
pub const TRANSPORT_ACK: &str = "Oops! Something went wrong while talking to the AI. \
Please check your API key or try again later.";

/// Acknowledgement when the backend answers without any text
pub const EMPTY_RESPONSE_ACK: &str =
    "I couldn't get a clear response from the AI. Please try again.";

/// Acknowledgement for a reply holding an empty instruction array
pub const EMPTY_BATCH_ACK: &str = "No changes were requested.";

/// Default `<title>` when none is configured
pub const DEFAULT_PAGE_TITLE: &str = "ShapeShift AI";

/// Errors outside the turn boundary: bootstrapping and explicit re-renders
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Everything the user should see after one turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Chat messages, in order; never empty
    pub acknowledgements: Vec<String>,
    /// Diagnostics worth showing but not worth a chat message
    pub warnings: Vec<String>,
    /// Per-instruction results, empty when no batch was applied
    pub outcomes: Vec<Outcome>,
    /// Whether the render/persist cycle ran
    pub rendered: bool,
}

impl TurnReport {
    fn message(acknowledgement: impl Into<String>) -> Self {
        Self {
            acknowledgements: vec![acknowledgement.into()],
            ..Self::default()
        }
    }

    fn from_outcomes(outcomes: Vec<Outcome>) -> Self {
        let mut report = Self::default();
        for outcome in &outcomes {
            report.acknowledgements.push(outcome.acknowledgement.clone());
            report.warnings.extend(outcome.warnings.iter().cloned());
        }
        if report.acknowledgements.is_empty() {
            report.acknowledgements.push(EMPTY_BATCH_ACK.to_string());
        }
        report.outcomes = outcomes;
        report
    }

    /// True if any instruction modified the document
    pub fn changed(&self) -> bool {
        self.outcomes.iter().any(Outcome::changed)
    }
}

/// The single document instance with its storage and renderer
pub struct Session<S: SnapshotStore, R: SectionRenderer> {
    document: Document,
    store: S,
    renderer: R,
    page_title: String,
    last_render: String,
}

impl<S: SnapshotStore, R: SectionRenderer> Session<S, R> {
    /// Start a session from the saved snapshot, or from the default document
    ///
    /// A snapshot that is missing, not valid JSON, or structurally invalid is
    /// replaced by the default document. The render/persist cycle runs once
    /// before returning.
    ///
    /// # Returns
    /// * `Ok(Session)` - Ready session with a current render
    /// * `Err(SessionError)` - The store could not be read or written
    pub fn bootstrap(store: S, renderer: R) -> Result<Self, SessionError> {
        let document = match store.load()? {
            Some(raw) => match Document::from_json(&raw) {
                Ok(document) => {
                    log::info!(
                        "Restored saved document with {} sections",
                        document.sections.len()
                    );
                    document
                }
                Err(e) => {
                    log::warn!("Ignoring unreadable snapshot ({}), using the default page", e);
                    Document::default()
                }
            },
            None => {
                log::info!("No saved document, starting from the default page");
                Document::default()
            }
        };

        let mut session = Self {
            document,
            store,
            renderer,
            page_title: DEFAULT_PAGE_TITLE.to_string(),
            last_render: String::new(),
        };
        session.render_and_persist()?;
        Ok(session)
    }

    /// Set the page title and refresh the cached render
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.page_title = title.into();
        self.last_render = render_page(&self.renderer, &self.document, &self.page_title);
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The page produced by the most recent render
    pub fn last_render(&self) -> &str {
        &self.last_render
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Render the current document, then save its snapshot
    ///
    /// The render is kept even if saving fails.
    pub fn render_and_persist(&mut self) -> Result<(), SessionError> {
        self.last_render = render_page(&self.renderer, &self.document, &self.page_title);
        let snapshot = self.document.to_json()?;
        self.store.save(&snapshot)?;
        log::debug!("Rendered and saved {} sections", self.document.sections.len());
        Ok(())
    }

    /// Apply one raw assistant reply
    ///
    /// A reply that is not valid JSON ends the turn with no changes and no
    /// render. Otherwise every instruction is applied in order and the
    /// render/persist cycle runs, even when nothing changed.
    pub fn process_response(&mut self, raw: &str) -> TurnReport {
        let values = match instruction::parse_response(raw) {
            Ok(values) => values,
            Err(e) => return Self::malformed(raw, &e),
        };

        let outcomes = reducer::apply_batch(&mut self.document, &values);
        let mut report = TurnReport::from_outcomes(outcomes);
        self.finish_turn(&mut report);
        report
    }

    /// Run one full turn: build the prompt, ask the assistant, apply the reply
    pub fn run_turn<A: Assistant + ?Sized>(
        &mut self,
        assistant: &A,
        user_message: &str,
    ) -> TurnReport {
        let prompt = match prompt::build_prompt(&self.document, user_message) {
            Ok(prompt) => prompt,
            Err(e) => {
                log::error!("Could not serialize the document for the prompt: {}", e);
                let mut report = TurnReport::message(TRANSPORT_ACK);
                report.warnings.push(e.to_string());
                return report;
            }
        };

        match assistant.generate(&prompt) {
            Ok(raw) => self.process_response(&raw),
            Err(TransportError::EmptyResponse) => {
                log::warn!("Assistant returned no text");
                TurnReport::message(EMPTY_RESPONSE_ACK)
            }
            Err(e) => {
                log::error!("Assistant request failed: {}", e);
                let mut report = TurnReport::message(TRANSPORT_ACK);
                report.warnings.push(e.to_string());
                report
            }
        }
    }

    /// Discard the saved snapshot and go back to the default document
    pub fn reset(&mut self) -> TurnReport {
        let mut report = TurnReport::message(RESET_ACK);
        if let Err(e) = self.store.clear() {
            log::warn!("Could not clear saved snapshot: {}", e);
            report.warnings.push(e.to_string());
        }
        self.document = Document::default();
        log::info!("Document reset to default");
        self.finish_turn(&mut report);
        report
    }

    fn finish_turn(&mut self, report: &mut TurnReport) {
        report.rendered = true;
        if let Err(e) = self.render_and_persist() {
            log::error!("Could not save the document: {}", e);
            report.warnings.push(e.to_string());
        }
    }

    fn malformed(raw: &str, error: &ParseError) -> TurnReport {
        log::warn!("{}", error);
        let mut report = TurnReport::message(MALFORMED_ACK);
        report
            .acknowledgements
            .push(format!("Raw response: {}", raw.trim()));
        report.warnings.push(error.to_string());
        report
    }
}
