use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Result, StudioError};

static FENCED_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```(?:json)?\s*(\{.*?\})\s*```").expect("valid fenced-block pattern")
});

static BRACED_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\{.*\})").expect("valid object pattern"));

/// Pull the single JSON object out of a model's free-form reply.
///
/// Tried in order: the whole trimmed reply, the first fenced code block,
/// then everything from the first `{` to the last `}`. The first tier that
/// matches decides; invalid JSON there is an error, not a reason to keep
/// looking.
pub fn extract_json(text: &str) -> Result<Map<String, Value>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(StudioError::JsonExtraction("Empty response".to_string()));
    }

    let candidate = if text.starts_with('{') && text.ends_with('}') {
        text
    } else if let Some(captures) = FENCED_OBJECT.captures(text) {
        captures.get(1).map_or(text, |m| m.as_str())
    } else if let Some(captures) = BRACED_OBJECT.captures(text) {
        captures.get(1).map_or(text, |m| m.as_str())
    } else {
        return Err(StudioError::JsonExtraction(
            "No JSON object found in model response".to_string(),
        ));
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StudioError::JsonExtraction(format!(
            "Expected a JSON object, got {}",
            other
        ))),
        Err(e) => Err(StudioError::JsonExtraction(e.to_string())),
    }
}
