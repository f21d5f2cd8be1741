//! Consumption of a streamed chat reply: ordered accumulation, size limit, partial results.

use futures::StreamExt;
use uuid::Uuid;

use crate::core::gateway::{FragmentStream, GatewayError};
use crate::core::normalize::fragment_text;

use super::Presenter;

/// Max content size (2MB) to prevent unbounded memory growth from malformed streams.
pub(super) const MAX_CONTENT_BYTES: usize = 2 * 1024 * 1024;

/// A stream that broke. `text` is whatever arrived before the fault.
pub(super) struct StreamFault {
    pub(super) id: Uuid,
    pub(super) text: String,
    pub(super) error: GatewayError,
}

impl StreamFault {
    /// Nothing was shown yet, so the turn can still be retried without streaming.
    pub(super) fn is_clean(&self) -> bool {
        self.text.is_empty()
    }
}

/// Drain `stream` under entry id `id`, reporting the running text after every fragment.
pub(super) async fn consume(
    id: Uuid,
    mut stream: FragmentStream,
    presenter: &mut dyn Presenter,
) -> Result<String, StreamFault> {
    let mut text = String::new();
    let mut fragments = 0usize;
    while let Some(item) = stream.next().await {
        let fragment = match item {
            Ok(fragment) => fragment,
            Err(error) => {
                log::warn!(
                    "stream {} failed after {} fragments: {}",
                    id,
                    fragments,
                    error
                );
                return Err(StreamFault { id, text, error });
            }
        };
        fragments += 1;
        let Some(part) = fragment_text(&fragment) else {
            continue;
        };
        if text.len() + part.len() > MAX_CONTENT_BYTES {
            log::warn!("stream {} exceeded {} bytes, truncating", id, MAX_CONTENT_BYTES);
            break;
        }
        text.push_str(part);
        presenter.on_streaming_update(id, &text);
    }
    log::debug!("stream {} finished: {} fragments, {} bytes", id, fragments, text.len());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use serde_json::{Value, json};

    #[derive(Default)]
    struct Updates(Vec<String>);

    impl Presenter for Updates {
        fn on_streaming_update(&mut self, _id: Uuid, text: &str) {
            self.0.push(text.to_string());
        }
    }

    fn fragments(items: Vec<Result<Value, GatewayError>>) -> FragmentStream {
        stream::iter(items).boxed()
    }

    #[tokio::test]
    async fn accumulates_in_arrival_order() {
        let mut updates = Updates::default();
        let text = consume(
            Uuid::new_v4(),
            fragments(vec![
                Ok(json!({"text": "Hel"})),
                Ok(json!({"choices": []})),
                Ok(json!({"choices": [{"delta": {"content": "lo"}}]})),
                Ok(json!("!")),
            ]),
            &mut updates,
        )
        .await
        .ok()
        .unwrap();
        assert_eq!(text, "Hello!");
        assert_eq!(updates.0, vec!["Hel", "Hello", "Hello!"]);
    }

    #[tokio::test]
    async fn fault_keeps_partial_text() {
        let mut updates = Updates::default();
        let fault = consume(
            Uuid::new_v4(),
            fragments(vec![
                Ok(json!({"text": "partial"})),
                Err(GatewayError::Network("reset".into())),
                Ok(json!({"text": "never"})),
            ]),
            &mut updates,
        )
        .await
        .err()
        .unwrap();
        assert_eq!(fault.text, "partial");
        assert!(!fault.is_clean());
        assert_eq!(fault.error, GatewayError::Network("reset".into()));
    }

    #[tokio::test]
    async fn oversized_stream_is_truncated() {
        let big = "x".repeat(MAX_CONTENT_BYTES);
        let mut updates = Updates::default();
        let text = consume(
            Uuid::new_v4(),
            fragments(vec![Ok(json!({"text": "ab"})), Ok(json!({"text": big}))]),
            &mut updates,
        )
        .await
        .ok()
        .unwrap();
        assert_eq!(text, "ab");
    }
}
