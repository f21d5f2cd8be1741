//! Known reply shapes and the ordered matchers that recognize them.

use serde_json::Value;

use super::fallback;
use super::reply::GatewayReply;

/// A reply decoded into the first shape it matches.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyShape<'a> {
    /// 1. The reply is a string.
    Plain(&'a str),
    /// 2. `message.content` (chat-completion style).
    MessageContent(&'a str),
    /// 3. The gateway's own string conversion.
    Rendered(&'a str),
    /// 4. Array of blocks whose first element has `text`; every block contributes.
    TextBlocks(&'a [Value]),
    /// 5. Array whose first element is a `{"type": "text", "text": ...}` block; only it counts.
    FirstTextBlock(&'a str),
    /// 6. `content`.
    Content(&'a str),
    /// 7. `text`.
    Text(&'a str),
    /// 8. `choices[0].message.content` (OpenAI wrapper).
    ChoiceMessage(&'a str),
    /// 9. `data.content` or `data.text`.
    Data(&'a str),
    /// 10. `message` or `response` as a plain string.
    MessageOrResponse(&'a str),
    /// 11. Nothing matched; rendered by generic traversal.
    Unrecognized(&'a Value),
}

type Matcher = for<'a> fn(&'a GatewayReply) -> Option<ReplyShape<'a>>;

/// Priority order. First match wins.
const MATCHERS: [Matcher; 10] = [
    plain,
    message_content,
    rendered,
    text_blocks,
    first_text_block,
    content,
    text,
    choice_message,
    data,
    message_or_response,
];

/// Decode a reply into its shape.
pub fn classify(reply: &GatewayReply) -> ReplyShape<'_> {
    MATCHERS
        .iter()
        .find_map(|matcher| matcher(reply))
        .unwrap_or(ReplyShape::Unrecognized(&reply.body))
}

impl ReplyShape<'_> {
    /// 1-based rule number of the matched shape.
    pub fn rule(&self) -> u8 {
        match self {
            ReplyShape::Plain(_) => 1,
            ReplyShape::MessageContent(_) => 2,
            ReplyShape::Rendered(_) => 3,
            ReplyShape::TextBlocks(_) => 4,
            ReplyShape::FirstTextBlock(_) => 5,
            ReplyShape::Content(_) => 6,
            ReplyShape::Text(_) => 7,
            ReplyShape::ChoiceMessage(_) => 8,
            ReplyShape::Data(_) => 9,
            ReplyShape::MessageOrResponse(_) => 10,
            ReplyShape::Unrecognized(_) => 11,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ReplyShape::Unrecognized(_))
    }

    pub fn render(&self) -> String {
        match self {
            ReplyShape::TextBlocks(blocks) => blocks
                .iter()
                .map(|block| {
                    non_empty(block.get("text"))
                        .or_else(|| non_empty(block.get("content")))
                        .unwrap_or("")
                })
                .collect(),
            ReplyShape::Unrecognized(value) => fallback::describe(value),
            ReplyShape::Plain(s)
            | ReplyShape::MessageContent(s)
            | ReplyShape::Rendered(s)
            | ReplyShape::FirstTextBlock(s)
            | ReplyShape::Content(s)
            | ReplyShape::Text(s)
            | ReplyShape::ChoiceMessage(s)
            | ReplyShape::Data(s)
            | ReplyShape::MessageOrResponse(s) => (*s).to_string(),
        }
    }
}

/// A string field with content; empty strings count as absent.
pub(super) fn non_empty(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn plain(reply: &GatewayReply) -> Option<ReplyShape<'_>> {
    reply.body.as_str().map(ReplyShape::Plain)
}

fn message_content(reply: &GatewayReply) -> Option<ReplyShape<'_>> {
    non_empty(reply.body.get("message")?.get("content")).map(ReplyShape::MessageContent)
}

fn rendered(reply: &GatewayReply) -> Option<ReplyShape<'_>> {
    reply
        .rendered
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(ReplyShape::Rendered)
}

fn text_blocks(reply: &GatewayReply) -> Option<ReplyShape<'_>> {
    let blocks = reply.body.as_array()?;
    non_empty(blocks.first()?.get("text"))?;
    Some(ReplyShape::TextBlocks(blocks))
}

fn first_text_block(reply: &GatewayReply) -> Option<ReplyShape<'_>> {
    let first = reply.body.as_array()?.first()?;
    if first.get("type").and_then(Value::as_str) != Some("text") {
        return None;
    }
    non_empty(first.get("text")).map(ReplyShape::FirstTextBlock)
}

fn content(reply: &GatewayReply) -> Option<ReplyShape<'_>> {
    non_empty(reply.body.get("content")).map(ReplyShape::Content)
}

fn text(reply: &GatewayReply) -> Option<ReplyShape<'_>> {
    non_empty(reply.body.get("text")).map(ReplyShape::Text)
}

fn choice_message(reply: &GatewayReply) -> Option<ReplyShape<'_>> {
    let message = reply.body.get("choices")?.get(0)?.get("message")?;
    non_empty(message.get("content")).map(ReplyShape::ChoiceMessage)
}

fn data(reply: &GatewayReply) -> Option<ReplyShape<'_>> {
    let data = reply.body.get("data")?;
    non_empty(data.get("content"))
        .or_else(|| non_empty(data.get("text")))
        .map(ReplyShape::Data)
}

fn message_or_response(reply: &GatewayReply) -> Option<ReplyShape<'_>> {
    non_empty(reply.body.get("message"))
        .or_else(|| non_empty(reply.body.get("response")))
        .map(ReplyShape::MessageOrResponse)
}
