//! Turn failures and the messages shown for them.

use crate::core::gateway::GatewayError;
use crate::core::models::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(
        "{model} doesn't support image analysis. Please switch to a vision-capable model for image capabilities, or continue with text-only conversation."
    )]
    VisionUnsupported { model: String },
    #[error("{context} failed: {source}")]
    Backend {
        context: &'static str,
        source: GatewayError,
    },
    #[error("A request is already being processed")]
    Busy,
}

impl ChatError {
    pub fn backend(context: &'static str, source: GatewayError) -> Self {
        ChatError::Backend { context, source }
    }

    /// Message for the user. Backend faults are classified; everything else shows as-is.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Backend { .. } => classify_backend_error(&self.to_string()),
            other => other.to_string(),
        }
    }
}

/// "An error occurred. " followed by a hint picked by keyword, else the raw reason.
pub fn classify_backend_error(reason: &str) -> String {
    let lower = reason.to_lowercase();
    let hint = if lower.contains("rate limit") {
        "You've reached the rate limit. Please wait a moment before trying again."
    } else if lower.contains("authentication") {
        "Authentication failed. Check OMNICHAT_API_KEY and try again."
    } else if lower.contains("network") {
        "Network connection issue. Please check your internet connection."
    } else if lower.contains("model") {
        "The selected model is currently unavailable. Try switching to another model."
    } else if reason.is_empty() {
        "Please try again or contact support if the issue persists."
    } else {
        reason
    };
    format!("An error occurred. {}", hint)
}
