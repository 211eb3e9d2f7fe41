//! Instructions produced by the assistant
//!
//! The assistant replies with loosely structured JSON. This module turns
//! that reply into typed [`Instruction`]s:
//! 1. [`parse_response`] strips code fences and decodes the JSON batch
//! 2. [`decode`] validates one batch element into an [`Instruction`]
//!
//! Decoding is strict about field types but lenient about values: style
//! values are coerced to strings and unknown positions fall back to the
//! bottom of the page, with a warning recorded for each adjustment.

use crate::document_model::{Content, SectionType, StyleMap};
use serde_json::{Map, Value};
use std::fmt;

// Submodules
mod error;
mod parser;

// Re-export public types
pub use error::{InstructionError, ParseError};
pub use parser::{extract_payload, parse_response};

/// The closed set of actions the assistant may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionAction {
    AddSection,
    UpdateSection,
    RemoveSection,
    UpdateGlobalStyles,
    OrderSections,
    Inform,
}

impl InstructionAction {
    pub const ALL: [InstructionAction; 6] = [
        InstructionAction::AddSection,
        InstructionAction::UpdateSection,
        InstructionAction::RemoveSection,
        InstructionAction::UpdateGlobalStyles,
        InstructionAction::OrderSections,
        InstructionAction::Inform,
    ];

    /// Wire name of the action
    pub fn as_str(self) -> &'static str {
        match self {
            InstructionAction::AddSection => "addSection",
            InstructionAction::UpdateSection => "updateSection",
            InstructionAction::RemoveSection => "removeSection",
            InstructionAction::UpdateGlobalStyles => "updateGlobalStyles",
            InstructionAction::OrderSections => "orderSections",
            InstructionAction::Inform => "inform",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }
}

impl fmt::Display for InstructionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where `addSection` should insert the new section
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Position {
    Top,
    #[default]
    Bottom,
    /// Immediately before the section with this id
    Before(String),
    /// Immediately after the section with this id
    After(String),
}

impl Position {
    /// Parse `top`, `bottom`, `before:<id>` or `after:<id>`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == "top" {
            Some(Position::Top)
        } else if raw == "bottom" {
            Some(Position::Bottom)
        } else if let Some(id) = raw.strip_prefix("before:") {
            Some(Position::Before(id.trim().to_string()))
        } else {
            raw.strip_prefix("after:")
                .map(|id| Position::After(id.trim().to_string()))
        }
    }
}

/// A validated instruction, ready for the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    AddSection {
        section_type: SectionType,
        position: Position,
        content: Content,
        styles: StyleMap,
    },
    UpdateSection {
        id: String,
        content: Option<Content>,
        styles: Option<StyleMap>,
    },
    RemoveSection {
        id: String,
    },
    UpdateGlobalStyles {
        /// `None` when the assistant omitted the map; reported as a no-op
        styles: Option<StyleMap>,
    },
    OrderSections {
        order: Vec<String>,
    },
    Inform {
        message: String,
    },
}

impl Instruction {
    pub fn action(&self) -> InstructionAction {
        match self {
            Instruction::AddSection { .. } => InstructionAction::AddSection,
            Instruction::UpdateSection { .. } => InstructionAction::UpdateSection,
            Instruction::RemoveSection { .. } => InstructionAction::RemoveSection,
            Instruction::UpdateGlobalStyles { .. } => InstructionAction::UpdateGlobalStyles,
            Instruction::OrderSections { .. } => InstructionAction::OrderSections,
            Instruction::Inform { .. } => InstructionAction::Inform,
        }
    }
}

/// An instruction together with the adjustments made while decoding it
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedInstruction {
    pub instruction: Instruction,
    pub warnings: Vec<String>,
}

/// Validate one batch element into a typed instruction
///
/// # Parameters
/// * `value` - One element of the batch returned by [`parse_response`]
///
/// # Returns
/// * `Ok(DecodedInstruction)` - The instruction and any coercion warnings
/// * `Err(InstructionError)` - The element is not a usable instruction
pub fn decode(value: &Value) -> Result<DecodedInstruction, InstructionError> {
    let object = value.as_object().ok_or(InstructionError::NotAnObject)?;
    let action = match object.get("action") {
        None | Some(Value::Null) => return Err(InstructionError::MissingAction),
        Some(Value::String(name)) => {
            InstructionAction::parse(name).ok_or_else(|| InstructionError::UnknownAction {
                action: name.clone(),
            })?
        }
        Some(other) => {
            return Err(InstructionError::UnknownAction {
                action: other.to_string(),
            })
        }
    };

    let mut fields = Fields {
        action,
        object,
        warnings: Vec::new(),
    };

    let instruction = match action {
        InstructionAction::AddSection => {
            let type_name = fields.required_str("type")?;
            let section_type = SectionType::parse(&type_name).ok_or(
                InstructionError::UnknownSectionType {
                    section_type: type_name,
                },
            )?;
            let position = match fields.optional_str("position")? {
                None => Position::Bottom,
                Some(raw) => Position::parse(&raw).unwrap_or_else(|| {
                    fields.warnings.push(format!(
                        "Unrecognized position '{}'; the section was placed at the bottom.",
                        raw
                    ));
                    Position::Bottom
                }),
            };
            Instruction::AddSection {
                section_type,
                position,
                content: fields.optional_object("content")?.unwrap_or_default(),
                styles: fields.optional_styles("styles")?.unwrap_or_default(),
            }
        }
        InstructionAction::UpdateSection => Instruction::UpdateSection {
            id: fields.required_str("id")?,
            content: fields.optional_object("content")?,
            styles: fields.optional_styles("styles")?,
        },
        InstructionAction::RemoveSection => Instruction::RemoveSection {
            id: fields.required_str("id")?,
        },
        InstructionAction::UpdateGlobalStyles => Instruction::UpdateGlobalStyles {
            styles: fields.optional_styles("styles")?,
        },
        InstructionAction::OrderSections => Instruction::OrderSections {
            order: fields.required_id_list("order")?,
        },
        InstructionAction::Inform => Instruction::Inform {
            message: fields.required_str("message")?,
        },
    };

    Ok(DecodedInstruction {
        instruction,
        warnings: fields.warnings,
    })
}

/// Typed field access over one instruction object
struct Fields<'a> {
    action: InstructionAction,
    object: &'a Map<String, Value>,
    warnings: Vec<String>,
}

impl<'a> Fields<'a> {
    /// Absent and `null` are treated the same
    fn get(&self, field: &str) -> Option<&'a Value> {
        self.object.get(field).filter(|v| !v.is_null())
    }

    fn invalid(&self, field: &'static str, expected: &'static str) -> InstructionError {
        InstructionError::InvalidField {
            action: self.action,
            field,
            expected,
        }
    }

    fn required_str(&self, field: &'static str) -> Result<String, InstructionError> {
        self.optional_str(field)?
            .ok_or(InstructionError::MissingField {
                action: self.action,
                field,
            })
    }

    fn optional_str(&self, field: &'static str) -> Result<Option<String>, InstructionError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.invalid(field, "a string")),
        }
    }

    fn optional_object(&self, field: &'static str) -> Result<Option<Content>, InstructionError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map.clone())),
            Some(_) => Err(self.invalid(field, "an object")),
        }
    }

    fn optional_styles(
        &mut self,
        field: &'static str,
    ) -> Result<Option<StyleMap>, InstructionError> {
        let Some(map) = self.optional_object(field)? else {
            return Ok(None);
        };
        let mut styles = StyleMap::new();
        for (name, value) in map {
            match style_value(&value) {
                Some(text) => {
                    styles.insert(name, text);
                }
                None => self.warnings.push(format!(
                    "Ignored style '{}': value must be a string or number.",
                    name
                )),
            }
        }
        Ok(Some(styles))
    }

    fn required_id_list(&mut self, field: &'static str) -> Result<Vec<String>, InstructionError> {
        let items = match self.get(field) {
            None => {
                return Err(InstructionError::MissingField {
                    action: self.action,
                    field,
                })
            }
            Some(Value::Array(items)) => items,
            Some(_) => return Err(self.invalid(field, "an array of section ids")),
        };
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(id) => ids.push(id.clone()),
                other => self
                    .warnings
                    .push(format!("Ignored non-string entry {} in '{}'.", other, field)),
            }
        }
        Ok(ids)
    }
}

/// Coerce a JSON style value to CSS text
fn style_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
