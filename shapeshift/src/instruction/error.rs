//! Error types for instruction parsing and decoding

use super::InstructionAction;
use thiserror::Error;

/// Errors raised when the assistant's reply cannot be decoded at all
///
/// A parse error ends the turn: no instruction from that reply is applied.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The (possibly unfenced) payload is not valid JSON
    #[error("Assistant response is not valid JSON: {source}")]
    MalformedInstruction {
        /// The reply exactly as received
        raw: String,
        /// The text that was handed to the JSON decoder
        cleaned: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised when a single decoded JSON value is not a usable instruction
///
/// These never end the turn; the reducer turns them into a diagnostic
/// acknowledgement and moves on to the next instruction in the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstructionError {
    /// Batch element is not a JSON object
    #[error("Instruction must be a JSON object")]
    NotAnObject,

    /// Object has no `action` field
    #[error("Instruction has no 'action' field")]
    MissingAction,

    /// `action` does not name one of the supported actions
    #[error("Unknown action '{action}'")]
    UnknownAction {
        /// The action as given
        action: String,
    },

    /// `addSection` named a section type the renderer does not know
    #[error("Unknown section type '{section_type}'")]
    UnknownSectionType {
        /// The type as given
        section_type: String,
    },

    /// A required field is absent
    #[error("'{action}' requires a '{field}' field")]
    MissingField {
        action: InstructionAction,
        field: &'static str,
    },

    /// A field is present but has the wrong JSON type
    #[error("'{action}' field '{field}' must be {expected}")]
    InvalidField {
        action: InstructionAction,
        field: &'static str,
        expected: &'static str,
    },
}

impl InstructionError {
    /// True when the instruction could not even be identified
    pub fn is_unrecognized(&self) -> bool {
        matches!(
            self,
            Self::NotAnObject | Self::MissingAction | Self::UnknownAction { .. }
        )
    }
}
