//! Screening of vision replies that look empty, truncated, or like leaked UI text.

use serde_json::Value;

use crate::core::normalize::{GatewayReply, normalize};

/// Replies shorter than this are treated as incomplete.
const MIN_REPLY_CHARS: usize = 10;

/// Lowercase fragments that mark a reply as unusable.
const REJECT_PATTERNS: [&str; 7] = [
    "i don't see",
    "no image",
    "cannot see",
    "tfiles>opencancel",
    "files>open",
    "cancel",
    "open",
];

/// Whether a vision reply carries a usable answer.
///
/// The first present candidate decides: plain string, `message.content`, `content`, `text`, then
/// the gateway's rendered string.
pub fn is_valid_response(reply: &GatewayReply) -> bool {
    if let Some(verdict) = screen_value(&reply.body) {
        return verdict;
    }
    match reply.rendered.as_deref() {
        Some(rendered) if !rendered.is_empty() => is_valid_text(rendered),
        _ => false,
    }
}

pub fn is_valid_text(text: &str) -> bool {
    if text.chars().count() < MIN_REPLY_CHARS {
        return false;
    }
    let lower = text.to_lowercase();
    !REJECT_PATTERNS.iter().any(|p| lower.contains(p))
}

/// `None` when the value holds no candidate at all.
fn screen_value(value: &Value) -> Option<bool> {
    match value {
        Value::String(s) if !s.is_empty() => Some(is_valid_text(s)),
        Value::Object(_) => {
            let candidate = [
                value.get("message").and_then(|m| m.get("content")),
                value.get("content"),
                value.get("text"),
            ]
            .into_iter()
            .flatten()
            .find(|v| is_present(v))?;
            Some(screen_value(candidate).unwrap_or(false))
        }
        _ => None,
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}

/// Display text for a reply that passed screening.
pub fn format_vision_reply(reply: &GatewayReply) -> String {
    if let Some(calls) = reply
        .body
        .get("message")
        .and_then(|m| m.get("tool_calls"))
        .and_then(Value::as_array)
        .filter(|calls| !calls.is_empty())
    {
        return format!(
            "AI wants to call a tool: {}",
            Value::Array(calls.clone())
        );
    }
    normalize(reply)
}
