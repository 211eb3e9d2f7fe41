//! Extraction of instruction payloads from raw assistant replies

use super::error::ParseError;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static FENCE: OnceLock<Regex> = OnceLock::new();

/// Matches the first fenced block, with an optional language tag such as `json`
fn fence() -> &'static Regex {
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_+-]*\s*(.*?)\s*```").expect("fence pattern is valid")
    })
}

/// Return the text that should be handed to the JSON decoder
///
/// If the reply contains a fenced code block, only the trimmed body of the
/// first such block is returned and surrounding prose is discarded.
/// Otherwise the whole reply is returned, trimmed.
///
/// # Parameters
/// * `raw` - The assistant reply as received
///
/// # Returns
/// * `&str` - A slice of `raw` holding the candidate JSON text
pub fn extract_payload(raw: &str) -> &str {
    match fence().captures(raw).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str().trim(),
        None => raw.trim(),
    }
}

/// Decode an assistant reply into a batch of instruction values
///
/// A top-level array yields its elements in order; any other JSON value
/// yields a batch of one. Individual elements are not validated here.
///
/// # Parameters
/// * `raw` - The assistant reply as received
///
/// # Returns
/// * `Ok(Vec<Value>)` - The instruction values in application order
/// * `Err(ParseError)` - The payload is not valid JSON
pub fn parse_response(raw: &str) -> Result<Vec<Value>, ParseError> {
    let cleaned = extract_payload(raw);
    log::debug!("Assistant raw response: {}", raw);
    log::debug!("Assistant cleaned payload: {}", cleaned);

    let value: Value =
        serde_json::from_str(cleaned).map_err(|source| ParseError::MalformedInstruction {
            raw: raw.to_string(),
            cleaned: cleaned.to_string(),
            source,
        })?;

    Ok(match value {
        Value::Array(items) => items,
        other => vec![other],
    })
}
