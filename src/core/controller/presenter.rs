use uuid::Uuid;

use crate::core::gateway::ImageHandle;
use crate::core::history::ConversationEntry;

/// Callbacks from the controller to whatever displays the conversation.
///
/// All methods default to no-ops so a presenter implements only what it shows.
pub trait Presenter {
    /// An entry was added to history (user input, assistant reply, or finalized stream).
    fn on_message_appended(&mut self, _entry: &ConversationEntry) {}

    /// Accumulated text of the in-flight streamed reply `id`.
    fn on_streaming_update(&mut self, _id: Uuid, _text: &str) {}

    /// Streamed reply `id` is finished; no more updates follow.
    fn on_streaming_complete(&mut self, _id: Uuid) {}

    /// A user-facing error message. Not part of history.
    fn on_error(&mut self, _message: &str) {}

    fn on_image_generated(&mut self, _image: &ImageHandle) {}
}
