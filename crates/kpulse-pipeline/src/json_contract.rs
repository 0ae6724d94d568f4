//! Pull a JSON object out of free-form model output.
//!
//! Models wrap their JSON in prose or markdown fences and sometimes emit
//! several brace groups. Candidates are scanned left to right with a
//! brace-depth counter that understands string literals and escapes; the
//! first candidate that parses as a JSON object wins.

use serde_json::{Map, Value};

/// First balanced `{...}` substring of `text` that parses as a JSON object.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find('{') {
        let start = search_from + rel;
        if let Some(end) = balanced_object_end(&text[start..]) {
            if let Ok(Value::Object(map)) = serde_json::from_str(&text[start..start + end]) {
                return Some(map);
            }
        }
        search_from = start + 1;
    }
    None
}

/// Byte length of the balanced object starting at `text[0] == '{'`.
fn balanced_object_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Non-blank string field, trimmed.
#[must_use]
pub fn required_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// First `limit` characters of `text`, for error messages.
#[must_use]
pub fn preview(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
