use serde_json::Value;

/// An opaque reply from the gateway.
///
/// `body` is whatever JSON came back. `rendered` is the gateway's own string conversion of the
/// reply, when it provides one; plain JSON replies leave it empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GatewayReply {
    pub body: Value,
    pub rendered: Option<String>,
}

impl GatewayReply {
    pub fn new(body: Value) -> Self {
        Self {
            body,
            rendered: None,
        }
    }

    #[cfg(test)]
    pub fn with_rendered(body: Value, rendered: impl Into<String>) -> Self {
        Self {
            body,
            rendered: Some(rendered.into()),
        }
    }
}

impl From<Value> for GatewayReply {
    fn from(body: Value) -> Self {
        Self::new(body)
    }
}

impl From<&str> for GatewayReply {
    fn from(text: &str) -> Self {
        Self::new(Value::String(text.to_string()))
    }
}

impl From<String> for GatewayReply {
    fn from(text: String) -> Self {
        Self::new(Value::String(text))
    }
}
