//! Parsing of JSON replies from the vision model.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use screenlens_shared::{Result, ScreenlensError};

/// Leading ```lang fence or trailing ``` fence around the whole reply.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z]*\n?|```$").expect("valid fence regex"));

/// Parse a model reply as JSON.
///
/// Tries the raw reply first; on failure strips one pair of surrounding code
/// fences and tries once more. A second failure is an
/// [`ScreenlensError::UpstreamFormat`].
pub fn parse_json_reply(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(value),
        Err(first) => {
            let cleaned = strip_fences(trimmed);
            serde_json::from_str(cleaned.trim()).map_err(|second| {
                ScreenlensError::upstream_format(format!(
                    "model reply is not JSON ({first}; after fence strip: {second}): {}",
                    preview(trimmed)
                ))
            })
        }
    }
}

fn strip_fences(raw: &str) -> String {
    FENCE_RE.replace_all(raw, "").into_owned()
}

/// First 200 chars of a reply, for error messages.
fn preview(raw: &str) -> String {
    raw.chars().take(200).collect()
}

/// Read a string field, defaulting to empty.
pub(crate) fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Read an array-of-strings field, dropping non-string items.
pub(crate) fn string_list_field(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
