//! Scripted gateway for tests: canned replies per entry point, and a record of every call.

use std::cell::{Cell, RefCell};

use futures::StreamExt;
use serde_json::Value;

use super::{ChatReply, Gateway, GatewayError, GatewayReply, ImageHandle, RequestOptions};

/// What a `chat` call with `stream = true` does.
#[derive(Clone)]
pub enum StreamScript {
    /// Establishing the stream fails.
    FailToOpen(GatewayError),
    /// A stream yielding these items in order.
    Fragments(Vec<Result<Value, GatewayError>>),
    /// The gateway ignores the streaming request and answers in one piece.
    NotStreaming(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Chat { prompt: String, model: String, stream: bool },
    Vision { prompt: String, image_data_url: String, model: String },
    Image { prompt: String, model: String },
}

#[derive(Default)]
pub struct MockGateway {
    stream: Option<StreamScript>,
    complete: Option<Result<GatewayReply, GatewayError>>,
    vision: Option<Result<GatewayReply, GatewayError>>,
    image: Option<Result<ImageHandle, GatewayError>>,
    ping_failures: usize,
    pings: Cell<usize>,
    yield_first: bool,
    calls: RefCell<Vec<Call>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stream(mut self, script: StreamScript) -> Self {
        self.stream = Some(script);
        self
    }

    pub fn with_complete(mut self, reply: Result<GatewayReply, GatewayError>) -> Self {
        self.complete = Some(reply);
        self
    }

    pub fn with_vision(mut self, reply: Result<GatewayReply, GatewayError>) -> Self {
        self.vision = Some(reply);
        self
    }

    pub fn with_image(mut self, handle: Result<ImageHandle, GatewayError>) -> Self {
        self.image = Some(handle);
        self
    }

    /// The first `n` pings fail with a network error.
    pub fn failing_pings(mut self, n: usize) -> Self {
        self.ping_failures = n;
        self
    }

    /// Every call yields to the scheduler once before answering.
    pub fn yielding(mut self) -> Self {
        self.yield_first = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn ping_count(&self) -> usize {
        self.pings.get()
    }

    async fn maybe_yield(&self) {
        if self.yield_first {
            tokio::task::yield_now().await;
        }
    }
}

fn unscripted(entry: &str) -> GatewayError {
    GatewayError::Api(format!("unscripted {} call", entry))
}

impl Gateway for MockGateway {
    async fn chat(
        &self,
        prompt: &str,
        options: &RequestOptions,
    ) -> Result<ChatReply, GatewayError> {
        self.calls.borrow_mut().push(Call::Chat {
            prompt: prompt.to_string(),
            model: options.model.clone(),
            stream: options.stream,
        });
        self.maybe_yield().await;

        if options.stream {
            return match self.stream.clone() {
                Some(StreamScript::FailToOpen(e)) => Err(e),
                Some(StreamScript::Fragments(items)) => {
                    Ok(ChatReply::Stream(futures::stream::iter(items).boxed()))
                }
                Some(StreamScript::NotStreaming(body)) => {
                    Ok(ChatReply::Complete(GatewayReply::new(body)))
                }
                None => Err(unscripted("streaming chat")),
            };
        }
        self.complete
            .clone()
            .unwrap_or_else(|| Err(unscripted("chat")))
            .map(ChatReply::Complete)
    }

    async fn chat_with_image(
        &self,
        prompt: &str,
        image_data_url: &str,
        options: &RequestOptions,
    ) -> Result<GatewayReply, GatewayError> {
        self.calls.borrow_mut().push(Call::Vision {
            prompt: prompt.to_string(),
            image_data_url: image_data_url.to_string(),
            model: options.model.clone(),
        });
        self.maybe_yield().await;
        self.vision
            .clone()
            .unwrap_or_else(|| Err(unscripted("vision")))
    }

    async fn generate_image(
        &self,
        prompt: &str,
        options: &RequestOptions,
    ) -> Result<ImageHandle, GatewayError> {
        self.calls.borrow_mut().push(Call::Image {
            prompt: prompt.to_string(),
            model: options.model.clone(),
        });
        self.maybe_yield().await;
        self.image
            .clone()
            .unwrap_or_else(|| Err(unscripted("image")))
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        let n = self.pings.get();
        self.pings.set(n + 1);
        if n < self.ping_failures {
            return Err(GatewayError::Network("not ready".to_string()));
        }
        Ok(())
    }
}
