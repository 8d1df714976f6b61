//! Pulls report handles and JSON payloads out of free-form agent text.
//!
//! The agent only announces results in prose, so these are pattern matches.
//! A paraphrased announcement is not recognised.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Announcement phrase that precedes a handle
pub const HANDLE_PHRASE: &str = "Report Data Handle";

static HANDLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Report Data Handle.*?`([^`\n]*)`").expect("valid handle pattern")
});

/// Opening of a json fence; the body is read by the JSON parser, not the regex
static JSON_FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json[ \t]*\r?\n?").expect("valid json fence pattern"));

/// Extract the handle announced as ``Report Data Handle: `value` ``.
///
/// Returns `None` when the phrase is missing, no back-ticked value follows,
/// or the value is blank.
pub fn extract_report_handle(text: &str) -> Option<String> {
    let caps = HANDLE_PATTERN.captures(text)?;
    let value = caps.get(1)?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// First fenced json block that parses as an object.
///
/// Parsing stops at the end of the first JSON value after the fence, so back
/// ticks inside string values (e.g. a report with code blocks) are kept.
pub fn extract_json_block(text: &str) -> Option<Value> {
    JSON_FENCE_OPEN.find_iter(text).find_map(|fence| {
        serde_json::Deserializer::from_str(&text[fence.end()..])
            .into_iter::<Value>()
            .next()?
            .ok()
            .filter(Value::is_object)
    })
}

/// String field from the first fenced json object
pub fn extract_json_field(text: &str, field: &str) -> Option<String> {
    extract_json_block(text)?
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}
