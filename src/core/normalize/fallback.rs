//! Rule 11: generic traversal for replies no known shape matched.

use serde_json::Value;

use super::shape::non_empty;

/// Nesting deeper than this is not flattened.
const MAX_FLATTEN_DEPTH: usize = 32;

/// Best-effort text for an unrecognized value. Always produces a non-empty string.
pub(super) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "Received an empty response (no content).".to_string(),
        Value::Object(_) | Value::Array(_) => {
            if let Some(text) = first_string_property(value) {
                return text.to_string();
            }
            let mut lines = Vec::new();
            flatten(value, "", 0, &mut lines);
            if !lines.is_empty() {
                return lines.join("\n");
            }
            let keys = own_keys(value);
            let keys = if keys.is_empty() {
                "(none)".to_string()
            } else {
                keys.join(", ")
            };
            format!("Received response object with keys: {}.", keys)
        }
        Value::String(s) if !s.is_empty() => s.clone(),
        other => format!(
            "Received response but could not extract text content. Response type: {}.",
            type_name(other)
        ),
    }
}

/// First own property (in key order, arrays by index) holding a non-empty string.
fn first_string_property(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => map.values().find_map(|v| non_empty(Some(v))),
        Value::Array(items) => items.iter().find_map(|v| non_empty(Some(v))),
        _ => None,
    }
}

/// `path.to.key: value` for every non-empty string leaf.
fn flatten(value: &Value, prefix: &str, depth: usize, out: &mut Vec<String>) {
    if depth > MAX_FLATTEN_DEPTH {
        return;
    }
    let mut visit = |key: &str, child: &Value| match child {
        Value::String(s) if !s.is_empty() => out.push(format!("{}{}: {}", prefix, key, s)),
        Value::Object(_) | Value::Array(_) => {
            flatten(child, &format!("{}{}.", prefix, key), depth + 1, out)
        }
        _ => {}
    };
    match value {
        Value::Object(map) => map.iter().for_each(|(k, v)| visit(k, v)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .for_each(|(i, v)| visit(&i.to_string(), v)),
        _ => {}
    }
}

fn own_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
