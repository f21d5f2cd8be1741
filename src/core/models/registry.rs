//! Model registry: the catalog embedded from `config/models.json`, validated on load.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::core::util;

use super::descriptor::{Backend, Capability, ModelDescriptor, ModelKind};

const BUILTIN_CATALOG: &str = include_str!("../../../config/models.json");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("model catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model catalog contains an entry with an empty id")]
    EmptyId,
    #[error("duplicate model id '{0}'")]
    DuplicateId(String),
    #[error("image generation model '{0}' must not accept image input")]
    ImageGenerationAcceptsImages(String),
    #[error("image generation model '{0}' must declare the image-generation capability")]
    ImageGenerationWithoutCapability(String),
    #[error("model '{id}' is a {kind:?} model but is served by the {backend:?} backend")]
    BackendMismatch {
        id: String,
        kind: ModelKind,
        backend: Backend,
    },
}

/// Lookup table from model id to descriptor. Immutable once built; preserves catalog order.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelDescriptor>,
}

impl ModelRegistry {
    /// Registry over the built-in catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let descriptors: Vec<ModelDescriptor> = serde_json::from_str(json)?;
        Self::from_descriptors(descriptors)
    }

    /// Build a registry, rejecting descriptors that break the kind/capability invariants.
    pub fn from_descriptors(descriptors: Vec<ModelDescriptor>) -> Result<Self, CatalogError> {
        let mut models = IndexMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            check_descriptor(&descriptor)?;
            if models.contains_key(&descriptor.id) {
                return Err(CatalogError::DuplicateId(descriptor.id));
            }
            models.insert(descriptor.id.clone(), descriptor);
        }
        log::debug!("model registry loaded with {} models", models.len());
        Ok(Self { models })
    }

    pub fn lookup(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.get(id)
    }

    /// False when the id is unknown.
    pub fn supports(&self, id: &str, capability: Capability) -> bool {
        self.lookup(id)
            .is_some_and(|m| m.capabilities.has(capability))
    }

    /// Every model with the capability, in catalog order.
    pub fn descriptors_by_capability(&self, capability: Capability) -> Vec<&ModelDescriptor> {
        self.models
            .values()
            .filter(|m| m.capabilities.has(capability))
            .collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[cfg(test)]
    pub fn is_chat_model(&self, id: &str) -> bool {
        self.lookup(id).is_some_and(|m| m.kind == ModelKind::Chat)
    }

    pub fn is_image_generation_model(&self, id: &str) -> bool {
        self.lookup(id)
            .is_some_and(|m| m.kind == ModelKind::ImageGeneration)
    }

    #[cfg(test)]
    pub fn backend(&self, id: &str) -> Option<Backend> {
        self.lookup(id).map(|m| m.backend)
    }

    /// Default parameters of a model; empty when the id is unknown.
    pub fn default_parameters(&self, id: &str) -> Map<String, Value> {
        self.lookup(id)
            .map(|m| m.default_parameters.clone())
            .unwrap_or_default()
    }

    /// Case-insensitive match on id or display name.
    pub fn filter(&self, query: &str) -> Vec<&ModelDescriptor> {
        util::filter_by_query(self.models.values(), query, |m| {
            [m.id.as_str(), m.display_name.as_str()]
        })
    }
}

fn check_descriptor(d: &ModelDescriptor) -> Result<(), CatalogError> {
    if d.id.trim().is_empty() {
        return Err(CatalogError::EmptyId);
    }
    let backend_matches = matches!(
        (d.kind, d.backend),
        (ModelKind::Chat, Backend::Chat) | (ModelKind::ImageGeneration, Backend::TextToImage)
    );
    if !backend_matches {
        return Err(CatalogError::BackendMismatch {
            id: d.id.clone(),
            kind: d.kind,
            backend: d.backend,
        });
    }
    if d.kind == ModelKind::ImageGeneration {
        if !d.capabilities.supports_image_generation {
            return Err(CatalogError::ImageGenerationWithoutCapability(d.id.clone()));
        }
        if d.capabilities.accepts_images {
            return Err(CatalogError::ImageGenerationAcceptsImages(d.id.clone()));
        }
    }
    Ok(())
}
