//! Document model for the page being built
//!
//! A [`Document`] is an ordered list of [`Section`]s plus a flat map of
//! global style variables. The order of `sections` is the render order.
//! The whole structure round-trips through JSON, which is both the
//! persisted snapshot format and the context handed to the assistant.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Open key/value content of a section; shape depends on the section type
pub type Content = Map<String, Value>;

/// Style property name to value, kept in insertion order
pub type StyleMap = IndexMap<String, String>;

/// Errors that can occur when decoding a document snapshot
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Duplicate section id '{0}'")]
    DuplicateSectionId(String),
}

/// The closed set of section kinds the renderer knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionType {
    Header,
    Hero,
    Text,
    ImageGallery,
    Footer,
}

impl SectionType {
    /// All section types, in the order they are listed to the assistant
    pub const ALL: [SectionType; 5] = [
        SectionType::Header,
        SectionType::Hero,
        SectionType::Text,
        SectionType::ImageGallery,
        SectionType::Footer,
    ];

    /// Wire name used in instructions and snapshots
    pub fn as_str(self) -> &'static str {
        match self {
            SectionType::Header => "header",
            SectionType::Hero => "hero",
            SectionType::Text => "text",
            SectionType::ImageGallery => "image-gallery",
            SectionType::Footer => "footer",
        }
    }

    /// Look up a section type by its wire name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One content block on the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Stable identifier, unique within the document
    pub id: String,

    /// Section kind; selects the renderer
    #[serde(rename = "type")]
    pub section_type: SectionType,

    /// Type-dependent content fields
    #[serde(default)]
    pub content: Content,

    /// Styles scoped to this section
    #[serde(default)]
    pub styles: StyleMap,
}

impl Section {
    pub fn new(id: impl Into<String>, section_type: SectionType) -> Self {
        Self {
            id: id.into(),
            section_type,
            content: Content::new(),
            styles: StyleMap::new(),
        }
    }

    /// Shallow-merge content keys; keys not present in `update` are left alone
    pub fn merge_content(&mut self, update: &Content) {
        for (key, value) in update {
            self.content.insert(key.clone(), value.clone());
        }
    }

    /// Shallow-merge style properties, last write wins
    pub fn merge_styles(&mut self, update: &StyleMap) {
        merge_styles(&mut self.styles, update);
    }
}

/// The full page configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Sections in top-to-bottom order
    pub sections: Vec<Section>,

    /// Document-scope style variables
    #[serde(default)]
    pub global_styles: StyleMap,
}

impl Document {
    /// Index of the section with the given id
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    /// Look up a section by id
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Look up a section by id for mutation
    pub fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    /// Returns true if any section uses `id`
    pub fn contains(&self, id: &str) -> bool {
        self.position_of(id).is_some()
    }

    /// Section ids in render order
    pub fn section_ids(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.id.as_str()).collect()
    }

    /// Shallow-merge document-scope style variables
    pub fn merge_global_styles(&mut self, update: &StyleMap) {
        merge_styles(&mut self.global_styles, update);
    }

    /// Serialize to the snapshot format
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON for prompts and display
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode a snapshot, rejecting documents that break id uniqueness
    pub fn from_json(raw: &str) -> Result<Self, DocumentError> {
        let document: Document = serde_json::from_str(raw)?;
        document.check_unique_ids()?;
        Ok(document)
    }

    fn check_unique_ids(&self) -> Result<(), DocumentError> {
        let mut seen = HashSet::new();
        for section in &self.sections {
            if !seen.insert(section.id.as_str()) {
                return Err(DocumentError::DuplicateSectionId(section.id.clone()));
            }
        }
        Ok(())
    }
}

impl Default for Document {
    /// The built-in starting page, used on first run and on reset
    fn default() -> Self {
        let mut header = Section::new("default-header", SectionType::Header);
        header.content = content([
            ("title", Value::from("ShapeShift AI")),
            (
                "nav",
                Value::from(vec!["Home", "About", "Services", "Contact"]),
            ),
        ]);

        let mut hero = Section::new("default-hero", SectionType::Hero);
        hero.content = content([
            ("title", Value::from("Your Vision, Our Canvas")),
            (
                "subtitle",
                Value::from("Tell me what you want, and I'll build your website instantly."),
            ),
            ("buttonText", Value::from("Get Started")),
        ]);

        let mut about = Section::new("default-about", SectionType::Text);
        about.content = content([
            ("title", Value::from("About This Project")),
            (
                "text",
                Value::from(
                    "This is an AI-powered website builder. Interact with the chatbot to add \
                     sections, change styles, and customize your site. All changes are saved locally!",
                ),
            ),
        ]);

        let mut footer = Section::new("default-footer", SectionType::Footer);
        footer.content = content([(
            "text",
            Value::from("\u{a9} 2023 ShapeShift AI. All rights reserved."),
        )]);

        let global_styles = [
            ("--primary-color", "#007bff"),
            ("--secondary-color", "#6c757d"),
            ("--accent-color", "#28a745"),
            ("--background-color", "#f8f9fa"),
            ("--text-color", "#343a40"),
            ("--header-bg", "#343a40"),
            ("--header-text", "#ffffff"),
            ("--footer-bg", "#343a40"),
            ("--footer-text", "#ffffff"),
            ("--card-bg", "#ffffff"),
            ("--border-color", "#dee2e6"),
            ("--font-family", "'Poppins', sans-serif"),
            ("--chatbot-bg", "#ffffff"),
            ("--chatbot-border", "#e9ecef"),
            ("--bot-message-bg", "#e2f0ff"),
            ("--user-message-bg", "#d4edda"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            sections: vec![header, hero, about, footer],
            global_styles,
        }
    }
}

fn content<const N: usize>(fields: [(&str, Value); N]) -> Content {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn merge_styles(target: &mut StyleMap, update: &StyleMap) {
    for (key, value) in update {
        target.insert(key.clone(), value.clone());
    }
}
