//! Routing of a validated turn to the matching gateway call.

use uuid::Uuid;

use crate::core::gateway::{ChatReply, Gateway, RequestOptions};
use crate::core::history::{ConversationEntry, EntryContent, Role};
use crate::core::models::{Backend, Capability, ModelDescriptor};
use crate::core::normalize::normalize;
use crate::core::uploads::UploadedImage;

use super::stream::{self, StreamFault};
use super::{ChatError, ConversationController, Presenter, TurnGuard, TurnState};

/// The assistant entry a dispatch produced.
pub(super) struct Reply {
    pub(super) entry: ConversationEntry,
    /// The entry id was announced through streaming updates.
    pub(super) streamed: bool,
}

impl Reply {
    fn complete(content: EntryContent) -> Self {
        Self {
            entry: ConversationEntry::assistant(content),
            streamed: false,
        }
    }

    fn text(text: String) -> Self {
        Self::complete(EntryContent::Text(text))
    }
}

/// Presenter for replies nobody watches arrive.
struct Silent;

impl Presenter for Silent {}

impl<G: Gateway> ConversationController<G> {
    #[allow(clippy::too_many_arguments)]
    pub(super) async fn dispatch(
        &self,
        model: &ModelDescriptor,
        text: &str,
        images: &[UploadedImage],
        options: RequestOptions,
        streaming_preferred: bool,
        guard: &TurnGuard<'_>,
        presenter: &mut dyn Presenter,
    ) -> Result<Reply, ChatError> {
        log::debug!("dispatching to {} for {}", model.backend.entry_point(), model.id);
        match model.backend {
            Backend::TextToImage => {
                let image = self
                    .gateway
                    .generate_image(text, &options)
                    .await
                    .map_err(|e| ChatError::backend("Image generation", e))?;
                presenter.on_image_generated(&image);
                Ok(Reply::complete(EntryContent::Image(image)))
            }
            Backend::Chat => match images.first() {
                Some(image) if self.registry.supports(&model.id, Capability::Vision) => {
                    if images.len() > 1 {
                        log::info!("{} images attached, analyzing the first", images.len());
                    }
                    let outcome = self
                        .vision
                        .analyze(&self.gateway, text, image, &options)
                        .await;
                    if outcome.degraded {
                        log::info!("vision analysis for {} fell back to the default reply", model.id);
                    }
                    Ok(Reply::text(outcome.text))
                }
                Some(_) => Err(ChatError::VisionUnsupported {
                    model: model.display_name.clone(),
                }),
                None if streaming_preferred
                    && self.registry.supports(&model.id, Capability::Streaming) =>
                {
                    self.chat_streaming(text, options, guard, presenter).await
                }
                None => self.chat_once(text, options).await,
            },
        }
    }

    async fn chat_once(&self, text: &str, mut options: RequestOptions) -> Result<Reply, ChatError> {
        options.stream = false;
        let reply = self
            .gateway
            .chat(text, &options)
            .await
            .map_err(|e| ChatError::backend("Chat", e))?;
        match reply {
            ChatReply::Complete(reply) => Ok(Reply::text(normalize(&reply))),
            ChatReply::Stream(fragments) => {
                let collected = stream::consume(Uuid::new_v4(), fragments, &mut Silent)
                    .await
                    .map_err(|fault| ChatError::backend("Chat", fault.error))?;
                Ok(Reply::text(collected))
            }
        }
    }

    /// Streamed chat. Failing to open the stream, or a stream that ends or faults before any text
    /// arrived, falls back to one non-streaming call.
    async fn chat_streaming(
        &self,
        text: &str,
        mut options: RequestOptions,
        guard: &TurnGuard<'_>,
        presenter: &mut dyn Presenter,
    ) -> Result<Reply, ChatError> {
        options.stream = true;
        let fragments = match self.gateway.chat(text, &options).await {
            Ok(ChatReply::Stream(fragments)) => fragments,
            Ok(ChatReply::Complete(reply)) => {
                log::debug!("streaming request answered in one piece");
                return Ok(Reply::text(normalize(&reply)));
            }
            Err(e) => {
                log::warn!("Streaming failed, using direct call: {}", e);
                return self.chat_once(text, options).await;
            }
        };

        guard.advance(TurnState::Streaming);
        let id = Uuid::new_v4();
        match stream::consume(id, fragments, presenter).await {
            Ok(collected) if collected.is_empty() => {
                log::warn!("Stream finished without text, using direct call");
                guard.advance(TurnState::Dispatching);
                self.chat_once(text, options).await
            }
            Ok(collected) => Ok(Reply {
                entry: ConversationEntry::with_id(id, Role::Assistant, EntryContent::Text(collected)),
                streamed: true,
            }),
            Err(fault) if fault.is_clean() => {
                log::warn!("Stream broke before any text, using direct call: {}", fault.error);
                guard.advance(TurnState::Dispatching);
                self.chat_once(text, options).await
            }
            Err(fault) => Err(self.finalize_partial(fault, presenter)),
        }
    }

    /// Keep what a broken stream delivered, close it, and hand back the error.
    fn finalize_partial(&self, fault: StreamFault, presenter: &mut dyn Presenter) -> ChatError {
        let StreamFault { id, text, error } = fault;
        if !text.is_empty() {
            self.append(
                ConversationEntry::with_id(id, Role::Assistant, EntryContent::Text(text)),
                presenter,
            );
        }
        presenter.on_streaming_complete(id);
        ChatError::backend("Streaming", error)
    }
}
