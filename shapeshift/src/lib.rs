//! shapeshift - chat-driven single-page website builder
//!
//! A user describes changes in plain language, an assistant answers with
//! JSON instructions, and the instructions are applied to a small document
//! model (ordered sections plus global CSS variables) that is rendered to
//! HTML and persisted after every turn.
//!
//! The pieces, bottom-up:
//! - [`document_model`] - the document, its sections and the default page
//! - [`instruction`] - extracting and decoding instructions from a reply
//! - [`reducer`] - applying one instruction at a time, never failing
//! - [`html_renderer`] - turning a document into a page
//! - [`storage`] - where snapshots live between runs
//! - [`prompt`] and [`assistant`] - talking to the text-generation backend
//! - [`session`] - one owned document and the per-turn cycle

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::enum_variant_names)]

pub mod app_config;
pub mod assistant;
pub mod document_model;
pub mod html_renderer;
pub mod instruction;
pub mod prompt;
pub mod reducer;
pub mod session;
pub mod storage;

pub use document_model::{Document, Section, SectionType};
pub use session::{Session, TurnReport};
