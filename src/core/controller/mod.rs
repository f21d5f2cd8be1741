//! Conversation controller: validates a user turn, routes it to the right backend call, and
//! records the exchange in history.
//!
//! One turn runs at a time. A send while a turn is in flight is rejected, not queued. State is
//! kept in `Cell`/`RefCell` because the controller lives on a single task; borrows are never held
//! across an await.

mod dispatch;
mod error;
mod presenter;
mod stream;

pub use error::ChatError;
pub use presenter::Presenter;

use std::cell::{Cell, Ref, RefCell};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::gateway::{Gateway, RequestOptions};
use crate::core::history::{self, ConversationEntry, EntryContent, History, UsageStats};
use crate::core::models::{ModelDescriptor, ModelRegistry, ParameterOverrides, ValidationError};
use crate::core::uploads::{PendingUploads, UploadedImage};
use crate::core::vision::VisionAdapter;

/// Where the current (or last) turn is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    Validating,
    Dispatching,
    Streaming,
    Completed,
    Failed,
}

impl TurnState {
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            TurnState::Validating | TurnState::Dispatching | TurnState::Streaming
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Completed(EntryContent),
    Failed(String),
    /// Another turn was in flight; nothing happened.
    Rejected,
}

/// Marks the controller busy for one turn. Dropping without `finish` records a failure.
struct TurnGuard<'a> {
    state: &'a Cell<TurnState>,
}

impl<'a> TurnGuard<'a> {
    fn enter(state: &'a Cell<TurnState>) -> Option<Self> {
        if state.get().is_busy() {
            return None;
        }
        state.set(TurnState::Validating);
        Some(Self { state })
    }

    fn advance(&self, next: TurnState) {
        self.state.set(next);
    }

    fn finish(self, terminal: TurnState) {
        self.state.set(terminal);
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if self.state.get().is_busy() {
            self.state.set(TurnState::Failed);
        }
    }
}

pub struct ConversationController<G> {
    registry: Arc<ModelRegistry>,
    gateway: G,
    vision: VisionAdapter,
    history: RefCell<History>,
    uploads: RefCell<PendingUploads>,
    active_model: RefCell<String>,
    overrides: Cell<ParameterOverrides>,
    state: Cell<TurnState>,
}

impl<G: Gateway> ConversationController<G> {
    /// Controller starting on `model_id`. Unknown ids are rejected.
    pub fn new(
        registry: Arc<ModelRegistry>,
        gateway: G,
        model_id: &str,
    ) -> Result<Self, ValidationError> {
        if registry.lookup(model_id).is_none() {
            return Err(ValidationError::UnknownModel(model_id.to_string()));
        }
        Ok(Self {
            registry,
            gateway,
            vision: VisionAdapter::default(),
            history: RefCell::new(History::default()),
            uploads: RefCell::new(PendingUploads::default()),
            active_model: RefCell::new(model_id.to_string()),
            overrides: Cell::new(ParameterOverrides::default()),
            state: Cell::new(TurnState::Idle),
        })
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    #[cfg(test)]
    pub fn state(&self) -> TurnState {
        self.state.get()
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.state.get().is_busy()
    }

    pub fn active_model(&self) -> String {
        self.active_model.borrow().clone()
    }

    pub fn active_descriptor(&self) -> Option<&ModelDescriptor> {
        self.registry.lookup(&self.active_model.borrow())
    }

    pub fn select_model(&self, id: &str) -> Result<&ModelDescriptor, ValidationError> {
        let model = self
            .registry
            .lookup(id)
            .ok_or_else(|| ValidationError::UnknownModel(id.to_string()))?;
        log::info!("active model: {}", model.id);
        *self.active_model.borrow_mut() = model.id.clone();
        Ok(model)
    }

    pub fn set_overrides(&self, overrides: ParameterOverrides) {
        self.overrides.set(overrides);
    }

    /// Queue an image for the next send. Returns true when it replaced one with the same name.
    pub fn attach(&self, image: UploadedImage) -> bool {
        self.uploads.borrow_mut().add(image)
    }

    pub fn detach(&self, name: &str) -> bool {
        self.uploads.borrow_mut().remove(name)
    }

    pub fn has_pending_uploads(&self) -> bool {
        !self.uploads.borrow().is_empty()
    }

    pub fn pending_uploads(&self) -> Vec<String> {
        self.uploads
            .borrow()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn history(&self) -> Ref<'_, History> {
        self.history.borrow()
    }

    pub fn clear_history(&self) {
        self.history.borrow_mut().clear();
    }

    pub fn usage_stats(&self) -> UsageStats {
        self.history.borrow().stats()
    }

    #[cfg(test)]
    pub fn export_json(&self) -> serde_json::Result<String> {
        history::export_json(&self.history.borrow())
    }

    pub fn export_to_dir(&self, dir: &Path) -> io::Result<PathBuf> {
        history::export_to_dir(&self.history.borrow(), dir)
    }

    /// Send `text` with the pending uploads. Uploads are consumed once the turn is dispatched;
    /// input rejected by validation keeps them.
    pub async fn send_pending(
        &self,
        text: &str,
        streaming_preferred: bool,
        presenter: &mut dyn Presenter,
    ) -> TurnOutcome {
        let images = self.uploads.borrow().snapshot();
        let (outcome, dispatched) = self
            .run_turn(text, images, streaming_preferred, presenter)
            .await;
        if dispatched {
            self.uploads.borrow_mut().take();
        }
        outcome
    }

    /// Run one user turn to completion.
    pub async fn send_user_turn(
        &self,
        text: &str,
        images: Vec<UploadedImage>,
        streaming_preferred: bool,
        presenter: &mut dyn Presenter,
    ) -> TurnOutcome {
        self.run_turn(text, images, streaming_preferred, presenter)
            .await
            .0
    }

    async fn run_turn(
        &self,
        text: &str,
        images: Vec<UploadedImage>,
        streaming_preferred: bool,
        presenter: &mut dyn Presenter,
    ) -> (TurnOutcome, bool) {
        let Some(guard) = TurnGuard::enter(&self.state) else {
            log::info!("{}", ChatError::Busy);
            return (TurnOutcome::Rejected, false);
        };

        let text = text.trim();
        let model = match self.validate(text, &images) {
            Ok(model) => model,
            Err(e) => {
                let message = e.user_message();
                log::info!("turn rejected: {}", message);
                presenter.on_error(&message);
                guard.finish(TurnState::Failed);
                return (TurnOutcome::Failed(message), false);
            }
        };

        let user_entry = ConversationEntry::user(
            text,
            images.iter().map(UploadedImage::image_ref).collect(),
        );
        self.append(user_entry, presenter);

        guard.advance(TurnState::Dispatching);
        let options = RequestOptions::for_model(model, &self.overrides.get());
        let result = self
            .dispatch(model, text, &images, options, streaming_preferred, &guard, presenter)
            .await;

        let outcome = match result {
            Ok(reply) => {
                let content = reply.entry.content.clone();
                let stream_id = reply.streamed.then_some(reply.entry.id);
                self.append(reply.entry, presenter);
                if let Some(id) = stream_id {
                    presenter.on_streaming_complete(id);
                }
                guard.finish(TurnState::Completed);
                TurnOutcome::Completed(content)
            }
            Err(e) => {
                match &e {
                    ChatError::VisionUnsupported { .. } => log::info!("{}", e),
                    _ => log::error!("{}", e),
                }
                let message = e.user_message();
                presenter.on_error(&message);
                guard.finish(TurnState::Failed);
                TurnOutcome::Failed(message)
            }
        };
        (outcome, true)
    }

    fn validate(&self, text: &str, images: &[UploadedImage]) -> Result<&ModelDescriptor, ChatError> {
        if text.is_empty() && images.is_empty() {
            return Err(ValidationError::EmptyInput.into());
        }
        let active = self.active_model();
        Ok(self
            .registry
            .validate_input(&active, !text.is_empty(), !images.is_empty())?)
    }

    fn append(&self, entry: ConversationEntry, presenter: &mut dyn Presenter) {
        let mut history = self.history.borrow_mut();
        history.push(entry);
        if let Some(entry) = history.last() {
            presenter.on_message_appended(entry);
        }
    }
}
