//! The AI gateway boundary: what the client needs from the external service.
//!
//! The gateway answers chat prompts (optionally as a stream of fragments), vision prompts with an
//! attached image, and text-to-image prompts. Reply bodies are opaque; see `core::normalize`.

mod error;
#[cfg(test)]
pub(crate) mod mock;
mod openai;

use std::time::Duration;

use futures::stream::BoxStream;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::models::{ModelDescriptor, ModelKind, ParameterOverrides};
pub use crate::core::normalize::GatewayReply;

pub use error::{GatewayError, map_api_error};
pub use openai::OpenAiGateway;

/// How long startup waits for the gateway to answer before giving up.
pub const STARTUP_WAIT: Duration = Duration::from_secs(10);
/// Delay between readiness pings during startup.
pub const PING_INTERVAL: Duration = Duration::from_millis(100);

/// Incremental reply fragments, in arrival order.
pub type FragmentStream = BoxStream<'static, Result<Value, GatewayError>>;

/// What a chat call produced. Streaming support is detected from the value, not from a flag.
pub enum ChatReply {
    Complete(GatewayReply),
    Stream(FragmentStream),
}

/// Handle to a generated image. `url` is either remote or a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageHandle {
    pub url: String,
    pub revised_prompt: Option<String>,
}

impl ImageHandle {
    pub fn is_inline(&self) -> bool {
        self.url.starts_with("data:")
    }
}

/// Per-call options: upstream model name, merged parameters, streaming request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestOptions {
    pub model: String,
    pub parameters: Map<String, Value>,
    pub stream: bool,
}

impl RequestOptions {
    /// Options for a model, with live overrides applied to chat models only.
    pub fn for_model(model: &ModelDescriptor, overrides: &ParameterOverrides) -> Self {
        let overrides = match model.kind {
            ModelKind::Chat => *overrides,
            ModelKind::ImageGeneration => ParameterOverrides::default(),
        };
        let mut parameters = model.call_parameters(&overrides);
        let upstream = parameters
            .remove("model")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| model.id.clone());
        Self {
            model: upstream,
            parameters,
            stream: false,
        }
    }
}

/// Entry points of the external AI gateway.
#[allow(async_fn_in_trait)]
pub trait Gateway {
    /// Plain chat. With `options.stream` set the gateway may answer with a fragment stream.
    async fn chat(&self, prompt: &str, options: &RequestOptions)
    -> Result<ChatReply, GatewayError>;

    /// Vision chat: prompt plus one image as a data URL. Never streamed.
    async fn chat_with_image(
        &self,
        prompt: &str,
        image_data_url: &str,
        options: &RequestOptions,
    ) -> Result<GatewayReply, GatewayError>;

    async fn generate_image(
        &self,
        prompt: &str,
        options: &RequestOptions,
    ) -> Result<ImageHandle, GatewayError>;

    /// Cheap reachability check used while waiting for the gateway at startup.
    async fn ping(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

/// Poll `ping` until the gateway answers or `timeout` elapses.
///
/// Only transient failures (network, unavailable) are retried; anything else is returned as-is.
pub async fn wait_until_ready<G: Gateway>(
    gateway: &G,
    timeout: Duration,
    interval: Duration,
) -> Result<(), GatewayError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        let last_error = match tokio::time::timeout(remaining, gateway.ping()).await {
            Ok(Ok(())) => {
                log::debug!("gateway ready");
                return Ok(());
            }
            Ok(Err(e)) if e.is_transient() => e,
            Ok(Err(e)) => return Err(e),
            Err(_) => GatewayError::Unavailable("ping timed out".to_string()),
        };
        if tokio::time::Instant::now() + interval >= deadline {
            return Err(GatewayError::Unavailable(format!(
                "gateway did not become available within {}s ({})",
                timeout.as_secs_f32(),
                last_error
            )));
        }
        log::debug!("gateway not ready yet: {}", last_error);
        tokio::time::sleep(interval).await;
    }
}
