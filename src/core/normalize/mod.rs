//! Reply normalization: recover display text from whatever shape the gateway returned.
//!
//! The gateway gives no guarantee about reply shape; it varies by model and provider. A reply is
//! decoded into a `ReplyShape` by trying each known shape in a fixed priority order (the order
//! is part of the contract, since one reply can satisfy several shapes) and falling back to a
//! generic traversal. [`normalize`] is total: every input yields a string.

mod fallback;
mod reply;
mod shape;

pub use reply::GatewayReply;
use shape::classify;

use serde_json::Value;

/// Display text for a reply. Never fails; unrecognized shapes degrade to a diagnostic string.
pub fn normalize(reply: &GatewayReply) -> String {
    let shape = classify(reply);
    let text = shape.render();
    if shape.is_degraded() {
        log::warn!(
            "Unrecognized reply shape, degraded to fallback text: {}",
            truncate_for_log(&reply.body.to_string())
        );
    } else {
        log::debug!("reply normalized via rule {}", shape.rule());
    }
    text
}

/// Text carried by one streaming fragment, if any.
///
/// Accepts `{"text": ...}` parts, OpenAI-style `choices[0].delta.content` chunks, and bare strings.
pub fn fragment_text(fragment: &Value) -> Option<&str> {
    if let Some(s) = fragment.as_str() {
        return (!s.is_empty()).then_some(s);
    }
    fragment
        .get("text")
        .and_then(Value::as_str)
        .or_else(|| {
            fragment
                .get("choices")?
                .get(0)?
                .get("delta")?
                .get("content")?
                .as_str()
        })
        .filter(|s| !s.is_empty())
}

fn truncate_for_log(s: &str) -> String {
    const MAX: usize = 512;
    if s.len() <= MAX {
        return s.to_string();
    }
    let mut end = MAX;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}
