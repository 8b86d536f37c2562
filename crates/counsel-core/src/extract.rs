use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

// Greedy: first bracket through last bracket, newlines included. Model
// replies wrap JSON in prose and code fences; both fall away here.
static JSON_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("array pattern"));
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("object pattern"));

/// Slice out the outermost `[…]` span of a free-text reply, if any.
pub fn extract_json_array(text: &str) -> Option<&str> {
    JSON_ARRAY.find(text).map(|m| m.as_str())
}

/// Slice out the outermost `{…}` span of a free-text reply, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.find(text).map(|m| m.as_str())
}

/// Extract and deserialize a JSON array from a model reply.
/// Any failure (no brackets, invalid JSON, shape mismatch) is `None`;
/// callers substitute their fallback.
pub fn parse_json_array<T: DeserializeOwned>(text: &str) -> Option<Vec<T>> {
    let span = extract_json_array(text)?;
    serde_json::from_str(span).ok()
}

/// Extract and deserialize a JSON object from a model reply.
pub fn parse_json_object<T: DeserializeOwned>(text: &str) -> Option<T> {
    let span = extract_json_object(text)?;
    serde_json::from_str(span).ok()
}
