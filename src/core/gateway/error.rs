//! Gateway error type and mapping from transport/API errors.

/// A failed gateway call. Display strings keep the category words (rate limit, authentication,
/// network, model) that user-facing classification keys off.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("malformed gateway reply: {0}")]
    Malformed(String),
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    /// Worth retrying while waiting for the gateway at startup.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Network(_) | GatewayError::Unavailable(_))
    }

    /// Map an HTTP status plus response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let msg = extract_message(body).unwrap_or_else(|| format!("HTTP {}", status));
        match status {
            401 | 403 => GatewayError::Auth(msg),
            429 => GatewayError::RateLimited(msg),
            404 => GatewayError::ModelUnavailable(msg),
            502..=504 => GatewayError::Unavailable(msg),
            _ => GatewayError::Api(msg),
        }
    }
}

/// Map async-openai or reqwest errors into GatewayError by inspecting their message.
pub fn map_api_error<E: std::fmt::Display>(e: E) -> GatewayError {
    let s = e.to_string();
    let lower = s.to_lowercase();
    let detail = extract_message(&s).unwrap_or_else(|| s.clone());

    if lower.contains("401")
        || lower.contains("invalid_api_key")
        || lower.contains("incorrect api key")
        || lower.contains("unauthorized")
    {
        return GatewayError::Auth(detail);
    }
    if lower.contains("429") || lower.contains("rate limit") || lower.contains("rate_limit") {
        return GatewayError::RateLimited(detail);
    }
    if lower.contains("model_not_found") || lower.contains("does not exist") {
        return GatewayError::ModelUnavailable(detail);
    }
    if lower.contains("error sending request")
        || lower.contains("connection")
        || lower.contains("dns error")
        || lower.contains("timed out")
    {
        return GatewayError::Network(detail);
    }
    if lower.contains("failed to deserialize") || (lower.contains("json") && lower.contains("parse"))
    {
        return GatewayError::Malformed(detail);
    }
    GatewayError::Api(detail)
}

/// Pull `error.message` out of a JSON error body, when there is one.
fn extract_message(s: &str) -> Option<String> {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(s)
        && let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message").or(Some(e)))
            .and_then(|m| m.as_str())
    {
        return Some(msg.to_string());
    }
    if s.contains("\"error\"")
        && let Some((_, rest)) = s.split_once("\"message\":\"")
        && let Some((msg, _)) = rest.split_once('"')
    {
        return Some(msg.to_string());
    }
    None
}
