//! Image analysis: prepare one attached image, ask the gateway about it, screen the answer.
//!
//! Analysis never fails from the caller's point of view. A gateway fault or a reply that does
//! not pass screening yields [`FALLBACK_MESSAGE`] with `degraded` set.

mod resize;
mod screen;

use resize::downscale;
pub use screen::{format_vision_reply, is_valid_response};

use crate::core::gateway::{Gateway, GatewayError, RequestOptions};
use crate::core::uploads::UploadedImage;

/// Data URLs longer than this are downscaled before sending (1 MiB).
pub const MAX_DATA_URL_LEN: usize = 1024 * 1024;

/// Prompt sent with an image when the user typed nothing.
pub const DEFAULT_VISION_PROMPT: &str = "What is in this image?";

pub const FALLBACK_MESSAGE: &str = "\
I apologize, but I'm having trouble analyzing the image properly. The vision service returned incomplete or invalid data.

This could be due to:
1. The image containing mostly UI elements or text that's hard to interpret
2. The image format or quality affecting analysis
3. A temporary issue with the vision service

Please try:
- Using a clearer image with distinct objects or scenes
- Ensuring the image is well-lit and in focus
- Using a different image format (JPG, PNG)
- Asking a more specific question about the image

If the issue persists, you can still ask me text-based questions!";

#[derive(Debug, thiserror::Error)]
pub enum VisionFailure {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("vision reply did not pass screening")]
    Screened,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisionOutcome {
    pub text: String,
    /// True when `text` is the fallback message.
    pub degraded: bool,
}

pub struct VisionAdapter {
    max_data_url_len: usize,
}

impl Default for VisionAdapter {
    fn default() -> Self {
        Self {
            max_data_url_len: MAX_DATA_URL_LEN,
        }
    }
}

impl VisionAdapter {
    #[cfg(test)]
    pub fn with_max_data_url_len(max_data_url_len: usize) -> Self {
        Self { max_data_url_len }
    }

    /// Data URL for the image, downscaled when too long. A failed downscale keeps the original.
    pub async fn prepare_image(&self, image: &UploadedImage) -> String {
        let url = image.to_data_url();
        if url.len() <= self.max_data_url_len {
            return url;
        }
        log::info!(
            "{} is {} KB as a data URL, downscaling",
            image.source_name,
            url.len() / 1024
        );
        match downscale(url.clone()).await {
            Ok(small) => small,
            Err(e) => {
                log::warn!("Downscaling {} failed, sending original: {}", image.source_name, e);
                url
            }
        }
    }

    pub async fn analyze<G: Gateway>(
        &self,
        gateway: &G,
        prompt: &str,
        image: &UploadedImage,
        options: &RequestOptions,
    ) -> VisionOutcome {
        match self.try_analyze(gateway, prompt, image, options).await {
            Ok(text) => VisionOutcome {
                text,
                degraded: false,
            },
            Err(e) => {
                log::warn!("Vision analysis failed: {}", e);
                VisionOutcome {
                    text: FALLBACK_MESSAGE.to_string(),
                    degraded: true,
                }
            }
        }
    }

    async fn try_analyze<G: Gateway>(
        &self,
        gateway: &G,
        prompt: &str,
        image: &UploadedImage,
        options: &RequestOptions,
    ) -> Result<String, VisionFailure> {
        let prompt = match prompt.trim() {
            "" => DEFAULT_VISION_PROMPT,
            p => p,
        };
        let data_url = self.prepare_image(image).await;
        let reply = gateway.chat_with_image(prompt, &data_url, options).await?;
        if !is_valid_response(&reply) {
            log::debug!("vision reply rejected: {:?}", reply.body);
            return Err(VisionFailure::Screened);
        }
        Ok(format_vision_reply(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gateway::GatewayReply;
    use crate::core::gateway::mock::{Call, MockGateway};
    use crate::core::uploads::tests::pixel;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    fn options() -> RequestOptions {
        RequestOptions {
            model: "gpt-4o".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn analyze_returns_screened_reply() {
        let gateway = MockGateway::new().with_vision(Ok(GatewayReply::new(json!({
            "message": {"content": "A single transparent pixel on nothing."}
        }))));
        let outcome = VisionAdapter::default()
            .analyze(&gateway, "What is this?", &pixel("p.png"), &options())
            .await;
        assert_eq!(outcome.text, "A single transparent pixel on nothing.");
        assert!(!outcome.degraded);

        let calls = gateway.calls();
        assert!(matches!(
            &calls[..],
            [Call::Vision { prompt, image_data_url, model }]
                if prompt == "What is this?"
                    && image_data_url.starts_with("data:image/png;base64,")
                    && model == "gpt-4o"
        ));
    }

    #[tokio::test]
    async fn rejected_reply_becomes_fallback() {
        let gateway = MockGateway::new().with_vision(Ok("cancel".into()));
        let outcome = VisionAdapter::default()
            .analyze(&gateway, "describe", &pixel("p.png"), &options())
            .await;
        assert_eq!(outcome.text, FALLBACK_MESSAGE);
        assert!(outcome.degraded);
    }

    #[tokio::test]
    async fn gateway_fault_becomes_fallback() {
        let gateway = MockGateway::new().with_vision(Err(GatewayError::Network("reset".into())));
        let outcome = VisionAdapter::default()
            .analyze(&gateway, "describe", &pixel("p.png"), &options())
            .await;
        assert!(outcome.degraded);
        assert!(outcome.text.starts_with("I apologize"));
    }

    #[tokio::test]
    async fn blank_prompt_gets_default() {
        let gateway = MockGateway::new().with_vision(Ok("A tiny see-through square.".into()));
        VisionAdapter::default()
            .analyze(&gateway, "   ", &pixel("p.png"), &options())
            .await;
        assert!(matches!(
            &gateway.calls()[..],
            [Call::Vision { prompt, .. }] if prompt == DEFAULT_VISION_PROMPT
        ));
    }

    #[tokio::test]
    async fn small_images_are_sent_unchanged() {
        let image = pixel("p.png");
        let url = VisionAdapter::default().prepare_image(&image).await;
        assert_eq!(url, image.to_data_url());
    }

    #[tokio::test]
    async fn large_images_are_downscaled() {
        let png = resize::tests::noisy_png(1400, 700);
        let image = UploadedImage::from_bytes("noise.png", png).unwrap();
        let url = VisionAdapter::default().prepare_image(&image).await;
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert!(url.len() < image.to_data_url().len());
    }

    #[tokio::test]
    async fn undecodable_large_image_is_sent_as_is() {
        let bogus = format!("data:image/png;base64,{}", STANDARD.encode(vec![7u8; 64]));
        let image = UploadedImage::from_data_url("bogus.png", bogus.clone()).unwrap();
        let url = VisionAdapter::with_max_data_url_len(16)
            .prepare_image(&image)
            .await;
        assert_eq!(url, bogus);
    }
}
