//! Input validation against model capabilities, before any request is made.

use super::descriptor::{ModelDescriptor, ModelKind};
use super::registry::ModelRegistry;

/// Input rejected before it reaches the gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    #[error("Please enter a message or upload an image")]
    EmptyInput,
    #[error("{model} doesn't support image input")]
    ImagesUnsupported { model: String },
    #[error("Image generation requires a text prompt")]
    PromptRequired,
}

impl ModelRegistry {
    /// Check a prospective request. Order: unknown model, image support, prompt requirement.
    pub fn validate_input(
        &self,
        model_id: &str,
        has_text: bool,
        has_images: bool,
    ) -> Result<&ModelDescriptor, ValidationError> {
        let model = self
            .lookup(model_id)
            .ok_or_else(|| ValidationError::UnknownModel(model_id.to_string()))?;

        if has_images && !model.accepts_image_input() {
            return Err(ValidationError::ImagesUnsupported {
                model: model.display_name.clone(),
            });
        }

        if !has_text && model.kind == ModelKind::ImageGeneration {
            return Err(ValidationError::PromptRequired);
        }

        Ok(model)
    }
}
