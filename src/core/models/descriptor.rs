//! Model descriptor types (no dependencies on the registry or the gateway).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a model produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Chat,
    ImageGeneration,
}

/// Gateway entry point a model is served through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Chat,
    TextToImage,
}

impl Backend {
    pub fn entry_point(self) -> &'static str {
        match self {
            Backend::Chat => "chat",
            Backend::TextToImage => "images/generations",
        }
    }
}

/// Fixed capability set attached to every model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(rename = "text")]
    pub accepts_text: bool,
    #[serde(rename = "images")]
    pub accepts_images: bool,
    #[serde(rename = "vision")]
    pub supports_vision: bool,
    #[serde(rename = "streaming")]
    pub supports_streaming: bool,
    #[serde(rename = "image_generation", default)]
    pub supports_image_generation: bool,
}

impl Capabilities {
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Text => self.accepts_text,
            Capability::Images => self.accepts_images,
            Capability::Vision => self.supports_vision,
            Capability::Streaming => self.supports_streaming,
            Capability::ImageGeneration => self.supports_image_generation,
        }
    }

    /// Short badge list for listings, e.g. "text, vision, streaming".
    pub fn summary(&self) -> String {
        Capability::ALL
            .iter()
            .filter(|c| self.has(**c))
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A single capability flag, used for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Text,
    Images,
    Vision,
    Streaming,
    ImageGeneration,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Text,
        Capability::Images,
        Capability::Vision,
        Capability::Streaming,
        Capability::ImageGeneration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Text => "text",
            Capability::Images => "images",
            Capability::Vision => "vision",
            Capability::Streaming => "streaming",
            Capability::ImageGeneration => "image-generation",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown capability '{}' (expected one of: text, images, vision, streaming, image-generation)",
                    s
                )
            })
    }
}

/// Live parameter values that override a model's defaults at call time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterOverrides {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

/// Immutable description of one model, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub display_name: String,
    pub kind: ModelKind,
    pub backend: Backend,
    pub capabilities: Capabilities,
    #[serde(default)]
    pub default_parameters: Map<String, Value>,
    #[serde(default)]
    pub description: String,
}

impl ModelDescriptor {
    /// True when the model takes image input at all (vision or plain image support).
    pub fn accepts_image_input(&self) -> bool {
        self.capabilities.supports_vision || self.capabilities.accepts_images
    }

    /// Model name sent to the gateway. Catalog ids are aliases; the `model` default wins.
    pub fn upstream_model(&self) -> &str {
        self.default_parameters
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.id)
    }

    /// Defaults overlaid with live overrides. Always carries `model`.
    pub fn call_parameters(&self, overrides: &ParameterOverrides) -> Map<String, Value> {
        let mut params = self.default_parameters.clone();
        params.insert(
            "model".to_string(),
            Value::String(self.upstream_model().to_string()),
        );
        if let Some(max_tokens) = overrides.max_tokens {
            params.insert("max_tokens".to_string(), Value::from(max_tokens));
        }
        if let Some(temperature) = overrides.temperature {
            params.insert("temperature".to_string(), Value::from(temperature));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nano() -> ModelDescriptor {
        serde_json::from_value(json!({
            "id": "gpt-4-nano",
            "display_name": "GPT-4.1 nano",
            "kind": "chat",
            "backend": "chat",
            "capabilities": {"text": true, "images": false, "vision": false, "streaming": true},
            "default_parameters": {"model": "gpt-4o-mini", "max_tokens": 1000, "temperature": 0.7}
        }))
        .unwrap()
    }

    #[test]
    fn capability_from_str_accepts_both_separators() {
        assert_eq!(
            "image_generation".parse::<Capability>().unwrap(),
            Capability::ImageGeneration
        );
        assert_eq!(
            "Image-Generation".parse::<Capability>().unwrap(),
            Capability::ImageGeneration
        );
        assert!("telepathy".parse::<Capability>().is_err());
    }

    #[test]
    fn upstream_model_uses_default_parameter() {
        assert_eq!(nano().upstream_model(), "gpt-4o-mini");
    }

    #[test]
    fn call_parameters_overlay_overrides() {
        let params = nano().call_parameters(&ParameterOverrides {
            max_tokens: Some(256),
            temperature: None,
        });
        assert_eq!(params["max_tokens"], json!(256));
        assert_eq!(params["temperature"], json!(0.7));
        assert_eq!(params["model"], json!("gpt-4o-mini"));
    }

    #[test]
    fn call_parameters_insert_model_when_missing() {
        let mut d = nano();
        d.default_parameters.clear();
        let params = d.call_parameters(&ParameterOverrides::default());
        assert_eq!(params["model"], json!("gpt-4-nano"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn summary_lists_enabled_flags() {
        assert_eq!(nano().capabilities.summary(), "text, streaming");
    }
}
