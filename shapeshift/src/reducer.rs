//! Applies instructions to the document
//!
//! The reducer never fails. Every instruction, including ones that cannot
//! be decoded or that reference missing sections, resolves to an
//! [`Outcome`] carrying a human-readable acknowledgement. Each instruction
//! either commits its whole change or leaves the document untouched.

use crate::document_model::{Content, Document, Section, SectionType, StyleMap};
use crate::instruction::{self, Instruction, InstructionAction, InstructionError, Position};
use itertools::Itertools;
use serde_json::Value;
use uuid::Uuid;

/// Acknowledgement used when an instruction cannot be identified
pub const NOT_UNDERSTOOD: &str =
    "I'm not sure how to interpret that instruction. Please try a different request.";

/// What happened when one instruction was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// The document was changed
    Applied,
    /// Valid instruction that required no change
    NoChange,
    /// An `inform` message was relayed
    Informed,
    /// The target section id does not exist
    ReferenceNotFound,
    /// The action is missing or unknown
    Unrecognized,
    /// A recognised action with missing or ill-typed fields
    Invalid,
}

/// Result of applying one instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The action, when it could be identified
    pub action: Option<InstructionAction>,
    pub status: OutcomeStatus,
    /// Message for the chat transcript
    pub acknowledgement: String,
    /// Non-fatal adjustments made along the way
    pub warnings: Vec<String>,
}

impl Outcome {
    fn new(action: InstructionAction, status: OutcomeStatus, acknowledgement: String) -> Self {
        Self {
            action: Some(action),
            status,
            acknowledgement,
            warnings: Vec::new(),
        }
    }

    fn rejected(error: &InstructionError) -> Self {
        let (action, status, acknowledgement) = match error {
            InstructionError::MissingField { action, .. }
            | InstructionError::InvalidField { action, .. } => (
                Some(*action),
                OutcomeStatus::Invalid,
                format!("I couldn't apply that instruction: {}.", error),
            ),
            InstructionError::UnknownSectionType { .. } => (
                Some(InstructionAction::AddSection),
                OutcomeStatus::Invalid,
                format!("I couldn't apply that instruction: {}.", error),
            ),
            InstructionError::NotAnObject
            | InstructionError::MissingAction
            | InstructionError::UnknownAction { .. } => {
                (None, OutcomeStatus::Unrecognized, NOT_UNDERSTOOD.to_string())
            }
        };
        Self {
            action,
            status,
            acknowledgement,
            warnings: vec![error.to_string()],
        }
    }

    /// True if the document was modified
    pub fn changed(&self) -> bool {
        self.status == OutcomeStatus::Applied
    }
}

/// Decode and apply one raw instruction value
///
/// # Parameters
/// * `document` - The document to update in place
/// * `value` - One element of a parsed assistant reply
///
/// # Returns
/// * `Outcome` - Acknowledgement and warnings; decode failures become diagnostics
pub fn apply_value(document: &mut Document, value: &Value) -> Outcome {
    match instruction::decode(value) {
        Ok(decoded) => {
            let mut outcome = reduce(document, &decoded.instruction);
            let mut warnings = decoded.warnings;
            warnings.append(&mut outcome.warnings);
            outcome.warnings = warnings;
            outcome
        }
        Err(error) => {
            log::warn!("Rejected instruction {}: {}", value, error);
            Outcome::rejected(&error)
        }
    }
}

/// Apply a batch in order, each instruction seeing the effects of the previous ones
pub fn apply_batch(document: &mut Document, values: &[Value]) -> Vec<Outcome> {
    values
        .iter()
        .map(|value| apply_value(document, value))
        .collect()
}

/// Apply one validated instruction
pub fn reduce(document: &mut Document, instruction: &Instruction) -> Outcome {
    let outcome = match instruction {
        Instruction::AddSection {
            section_type,
            position,
            content,
            styles,
        } => add_section(document, *section_type, position, content, styles),

        Instruction::UpdateSection {
            id,
            content,
            styles,
        } => update_section(document, id, content.as_ref(), styles.as_ref()),

        Instruction::RemoveSection { id } => remove_section(document, id),

        Instruction::UpdateGlobalStyles { styles } => match styles {
            Some(styles) => {
                document.merge_global_styles(styles);
                Outcome::new(
                    InstructionAction::UpdateGlobalStyles,
                    OutcomeStatus::Applied,
                    "Applied global style changes.".to_string(),
                )
            }
            None => Outcome::new(
                InstructionAction::UpdateGlobalStyles,
                OutcomeStatus::NoChange,
                "No global styles provided to update.".to_string(),
            ),
        },

        Instruction::OrderSections { order } => order_sections(document, order),

        Instruction::Inform { message } => Outcome::new(
            InstructionAction::Inform,
            OutcomeStatus::Informed,
            message.clone(),
        ),
    };

    match outcome.status {
        OutcomeStatus::Applied | OutcomeStatus::NoChange | OutcomeStatus::Informed => {
            log::info!("{}: {}", instruction.action(), outcome.acknowledgement)
        }
        _ => log::warn!("{}: {}", instruction.action(), outcome.acknowledgement),
    }
    for warning in &outcome.warnings {
        log::warn!("{}: {}", instruction.action(), warning);
    }

    outcome
}

fn add_section(
    document: &mut Document,
    section_type: SectionType,
    position: &Position,
    content: &Content,
    styles: &StyleMap,
) -> Outcome {
    let id = allocate_id(document, section_type);
    let mut section = Section::new(id.clone(), section_type);
    section.content = content.clone();
    section.styles = styles.clone();

    let (index, missing_target) = resolve_position(document, position);
    document.sections.insert(index, section);

    let mut acknowledgement = format!("Added a new {} section (ID: {}).", section_type, id);
    if let Some(target) = missing_target {
        acknowledgement.push_str(&format!(
            " Could not find a section with ID: {}, so it was placed at the bottom.",
            target
        ));
    }
    Outcome::new(
        InstructionAction::AddSection,
        OutcomeStatus::Applied,
        acknowledgement,
    )
}

/// Insertion index for `position`, plus the target id if it had to fall back
fn resolve_position<'p>(document: &Document, position: &'p Position) -> (usize, Option<&'p str>) {
    let bottom = document.sections.len();
    match position {
        Position::Top => (0, None),
        Position::Bottom => (bottom, None),
        Position::Before(target) => match document.position_of(target) {
            Some(index) => (index, None),
            None => (bottom, Some(target.as_str())),
        },
        Position::After(target) => match document.position_of(target) {
            Some(index) => (index + 1, None),
            None => (bottom, Some(target.as_str())),
        },
    }
}

/// A fresh id of the form `<type>-<hex>` not used by any current section
fn allocate_id(document: &Document, section_type: SectionType) -> String {
    loop {
        let suffix = Uuid::new_v4().simple().to_string();
        let id = format!("{}-{}", section_type, &suffix[..12]);
        if !document.contains(&id) {
            return id;
        }
    }
}

fn update_section(
    document: &mut Document,
    id: &str,
    content: Option<&Content>,
    styles: Option<&StyleMap>,
) -> Outcome {
    let Some(section) = document.section_mut(id) else {
        return Outcome::new(
            InstructionAction::UpdateSection,
            OutcomeStatus::ReferenceNotFound,
            format!("Could not find a section with ID: {} to update.", id),
        );
    };

    if content.is_none() && styles.is_none() {
        return Outcome::new(
            InstructionAction::UpdateSection,
            OutcomeStatus::NoChange,
            format!(
                "Section with ID: {} was left unchanged; no content or styles were provided.",
                id
            ),
        );
    }

    if let Some(content) = content {
        section.merge_content(content);
    }
    if let Some(styles) = styles {
        section.merge_styles(styles);
    }
    Outcome::new(
        InstructionAction::UpdateSection,
        OutcomeStatus::Applied,
        format!("Updated section with ID: {}.", id),
    )
}

fn remove_section(document: &mut Document, id: &str) -> Outcome {
    match document.position_of(id) {
        Some(index) => {
            document.sections.remove(index);
            Outcome::new(
                InstructionAction::RemoveSection,
                OutcomeStatus::Applied,
                format!("Removed section with ID: {}.", id),
            )
        }
        None => Outcome::new(
            InstructionAction::RemoveSection,
            OutcomeStatus::ReferenceNotFound,
            format!("Could not find a section with ID: {} to remove.", id),
        ),
    }
}

fn order_sections(document: &mut Document, order: &[String]) -> Outcome {
    let mut warnings = Vec::new();
    let mut placed = vec![false; document.sections.len()];
    let mut indices = Vec::with_capacity(document.sections.len());

    for id in order.iter().unique() {
        match document.position_of(id) {
            Some(index) => {
                placed[index] = true;
                indices.push(index);
            }
            None => warnings.push(format!("Ignored unknown section ID '{}' in order.", id)),
        }
    }
    indices.extend((0..placed.len()).filter(|&index| !placed[index]));

    let unchanged = indices.iter().enumerate().all(|(pos, &index)| pos == index);
    let mut outcome = if unchanged {
        Outcome::new(
            InstructionAction::OrderSections,
            OutcomeStatus::NoChange,
            "Sections are already in that order.".to_string(),
        )
    } else {
        let mut slots: Vec<Option<Section>> = std::mem::take(&mut document.sections)
            .into_iter()
            .map(Some)
            .collect();
        document.sections = indices
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect();
        Outcome::new(
            InstructionAction::OrderSections,
            OutcomeStatus::Applied,
            "Reordered sections.".to_string(),
        )
    };
    outcome.warnings = warnings;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(document: &mut Document, value: Value) -> Outcome {
        apply_value(document, &value)
    }

    #[test]
    fn test_add_section_after_target() {
        let mut doc = Document::default();
        let outcome = apply(
            &mut doc,
            json!({
                "action": "addSection",
                "type": "text",
                "position": "after:default-hero",
                "content": {"title": "New", "text": "Body"}
            }),
        );
        assert_eq!(outcome.status, OutcomeStatus::Applied);
        assert_eq!(doc.sections.len(), 5);
        let added = &doc.sections[2];
        assert_eq!(added.section_type, SectionType::Text);
        assert_eq!(added.content["title"], json!("New"));
        assert!(added.id.starts_with("text-"));
        assert!(outcome.acknowledgement.contains(&added.id));
    }

    #[test]
    fn test_add_section_positions() {
        let mut doc = Document::default();
        apply(&mut doc, json!({"action": "addSection", "type": "hero", "position": "top"}));
        assert_eq!(doc.sections[0].section_type, SectionType::Hero);
        assert_ne!(doc.sections[0].id, "default-hero");

        apply(
            &mut doc,
            json!({"action": "addSection", "type": "footer", "position": "before:default-footer"}),
        );
        assert_eq!(doc.sections[4].section_type, SectionType::Footer);
        assert_eq!(doc.sections[5].id, "default-footer");

        apply(&mut doc, json!({"action": "addSection", "type": "image-gallery"}));
        assert_eq!(
            doc.sections.last().map(|s| s.section_type),
            Some(SectionType::ImageGallery)
        );
    }

    #[test]
    fn test_add_section_missing_target_falls_back_to_bottom() {
        let mut doc = Document::default();
        let outcome = apply(
            &mut doc,
            json!({"action": "addSection", "type": "text", "position": "before:nope"}),
        );
        assert_eq!(outcome.status, OutcomeStatus::Applied);
        assert_eq!(doc.sections.len(), 5);
        assert_eq!(doc.sections[4].section_type, SectionType::Text);
        assert!(outcome.acknowledgement.contains("placed at the bottom"));
    }

    #[test]
    fn test_add_section_after_missing_target_falls_back_to_bottom() {
        let mut doc = Document::default();
        let outcome = apply(
            &mut doc,
            json!({"action": "addSection", "type": "hero", "position": "after:ghost"}),
        );
        assert_eq!(outcome.status, OutcomeStatus::Applied);
        assert_eq!(doc.sections.len(), 5);
        let added = &doc.sections[4];
        assert_eq!(added.section_type, SectionType::Hero);
        assert_eq!(
            outcome.acknowledgement,
            format!(
                "Added a new hero section (ID: {}). Could not find a section with ID: ghost, \
                 so it was placed at the bottom.",
                added.id
            )
        );
        assert_eq!(doc.sections[3].id, "default-footer");
    }

    #[test]
    fn test_add_section_ids_are_unique() {
        let mut doc = Document::default();
        for _ in 0..20 {
            apply(&mut doc, json!({"action": "addSection", "type": "text"}));
        }
        let ids: std::collections::HashSet<_> = doc.section_ids().into_iter().collect();
        assert_eq!(ids.len(), 24);
    }

    #[test]
    fn test_add_section_ignores_supplied_id() {
        let mut doc = Document::default();
        apply(
            &mut doc,
            json!({"action": "addSection", "type": "text", "id": "default-hero"}),
        );
        let heroes = doc.sections.iter().filter(|s| s.id == "default-hero").count();
        assert_eq!(heroes, 1);
    }

    #[test]
    fn test_update_section_merges_shallowly() {
        let mut doc = Document::default();
        let outcome = apply(
            &mut doc,
            json!({
                "action": "updateSection",
                "id": "default-hero",
                "content": {"title": "Fresh"},
                "styles": {"backgroundColor": "#000"}
            }),
        );
        assert_eq!(outcome.status, OutcomeStatus::Applied);
        let hero = doc.section("default-hero").unwrap();
        assert_eq!(hero.content["title"], json!("Fresh"));
        assert_eq!(hero.content["buttonText"], json!("Get Started"));
        assert_eq!(hero.styles["backgroundColor"], "#000");

        apply(
            &mut doc,
            json!({"action": "updateSection", "id": "default-hero", "styles": {"color": "#fff"}}),
        );
        let hero = doc.section("default-hero").unwrap();
        assert_eq!(hero.styles["backgroundColor"], "#000");
        assert_eq!(hero.styles["color"], "#fff");
    }

    #[test]
    fn test_update_missing_section_reports_miss() {
        let mut doc = Document::default();
        let before = doc.clone();
        let outcome = apply(
            &mut doc,
            json!({"action": "updateSection", "id": "ghost", "content": {"title": "x"}}),
        );
        assert_eq!(outcome.status, OutcomeStatus::ReferenceNotFound);
        assert_eq!(
            outcome.acknowledgement,
            "Could not find a section with ID: ghost to update."
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_remove_section() {
        let mut doc = Document::default();
        let outcome = apply(&mut doc, json!({"action": "removeSection", "id": "default-about"}));
        assert_eq!(outcome.status, OutcomeStatus::Applied);
        assert_eq!(
            doc.section_ids(),
            vec!["default-header", "default-hero", "default-footer"]
        );
    }

    #[test]
    fn test_remove_missing_section_is_noop() {
        let mut doc = Document::default();
        let before = doc.clone();
        let outcome = apply(&mut doc, json!({"action": "removeSection", "id": "ghost"}));
        assert_eq!(outcome.status, OutcomeStatus::ReferenceNotFound);
        assert_eq!(
            outcome.acknowledgement,
            "Could not find a section with ID: ghost to remove."
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_update_global_styles() {
        let mut doc = Document::default();
        let before = doc.global_styles.clone();
        apply(
            &mut doc,
            json!({"action": "updateGlobalStyles", "styles": {"--primary-color": "#ff0000"}}),
        );
        assert_eq!(doc.global_styles["--primary-color"], "#ff0000");
        for (key, value) in &before {
            if key != "--primary-color" {
                assert_eq!(&doc.global_styles[key], value);
            }
        }
        assert_eq!(doc.global_styles.len(), before.len());
    }

    #[test]
    fn test_update_global_styles_without_map() {
        let mut doc = Document::default();
        let outcome = apply(&mut doc, json!({"action": "updateGlobalStyles"}));
        assert_eq!(outcome.status, OutcomeStatus::NoChange);
        assert_eq!(outcome.acknowledgement, "No global styles provided to update.");
    }

    #[test]
    fn test_order_sections_full_permutation() {
        let mut doc = Document::default();
        let order = ["default-footer", "default-about", "default-hero", "default-header"];
        let outcome = apply(&mut doc, json!({"action": "orderSections", "order": order}));
        assert_eq!(outcome.status, OutcomeStatus::Applied);
        assert_eq!(doc.section_ids(), order.to_vec());
    }

    #[test]
    fn test_order_sections_partial_appends_rest() {
        let mut doc = Document::default();
        apply(
            &mut doc,
            json!({"action": "orderSections", "order": ["default-footer", "default-hero"]}),
        );
        assert_eq!(
            doc.section_ids(),
            vec!["default-footer", "default-hero", "default-header", "default-about"]
        );
    }

    #[test]
    fn test_order_sections_unknown_and_duplicate_ids() {
        let mut doc = Document::default();
        let outcome = apply(
            &mut doc,
            json!({
                "action": "orderSections",
                "order": ["default-about", "ghost", "default-about", "default-header"]
            }),
        );
        assert_eq!(
            doc.section_ids(),
            vec!["default-about", "default-header", "default-hero", "default-footer"]
        );
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("ghost"));
    }

    #[test]
    fn test_order_sections_same_order_is_no_change() {
        let mut doc = Document::default();
        let outcome = apply(
            &mut doc,
            json!({"action": "orderSections", "order": ["default-header"]}),
        );
        assert_eq!(outcome.status, OutcomeStatus::NoChange);
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn test_inform_relays_message() {
        let mut doc = Document::default();
        let outcome = apply(&mut doc, json!({"action": "inform", "message": "Hello there"}));
        assert_eq!(outcome.status, OutcomeStatus::Informed);
        assert_eq!(outcome.acknowledgement, "Hello there");
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn test_unknown_action_is_not_understood() {
        let mut doc = Document::default();
        let outcome = apply(&mut doc, json!({"action": "paintItBlack"}));
        assert_eq!(outcome.status, OutcomeStatus::Unrecognized);
        assert_eq!(outcome.action, None);
        assert_eq!(outcome.acknowledgement, NOT_UNDERSTOOD);
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn test_wrong_field_type_is_diagnostic() {
        let mut doc = Document::default();
        let outcome = apply(
            &mut doc,
            json!({"action": "updateSection", "id": "default-hero", "content": ["x"]}),
        );
        assert_eq!(outcome.status, OutcomeStatus::Invalid);
        assert_eq!(outcome.action, Some(InstructionAction::UpdateSection));
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn test_batch_applies_in_order_and_survives_bad_entries() {
        let mut doc = Document::default();
        let batch = vec![
            json!({"action": "removeSection", "id": "default-about"}),
            json!({"action": "bogus"}),
            json!({"action": "addSection", "type": "text", "position": "after:default-hero"}),
            json!({"action": "removeSection", "id": "default-about"}),
        ];
        let outcomes = apply_batch(&mut doc, &batch);
        let statuses: Vec<_> = outcomes.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![
                OutcomeStatus::Applied,
                OutcomeStatus::Unrecognized,
                OutcomeStatus::Applied,
                OutcomeStatus::ReferenceNotFound
            ]
        );
        assert_eq!(doc.sections.len(), 4);
        assert_eq!(doc.sections[2].section_type, SectionType::Text);
    }
}
