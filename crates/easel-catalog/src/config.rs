//! Catalog loading from configuration
//!
//! Deployments override or extend the built-in models with a JSON
//! catalog keyed by node kind:
//!
//! ```json
//! {
//!   "image": [
//!     {
//!       "id": "flux-dev",
//!       "label": "FLUX Dev",
//!       "supportedInputs": ["text-primitive", "text-transform"],
//!       "default": true
//!     }
//!   ]
//! }
//! ```

use serde::Deserialize;
use thiserror::Error;

use easel_graph::{ModelDescriptor, ModelRegistry, NodeKind};

/// Errors raised while loading a model catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog is not valid JSON or has the wrong shape
    #[error("Invalid model catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// A descriptor is missing an id
    #[error("Model descriptor at {kind:?} index {index} has an empty id")]
    EmptyId { kind: NodeKind, index: usize },

    /// A descriptor declares no supported inputs and can never be offered
    #[error("Model '{id}' declares no supported inputs")]
    NoInputs { id: String },
}

/// On-disk catalog shape: one descriptor list per generative node kind
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    text: Vec<ModelDescriptor>,
    #[serde(default)]
    image: Vec<ModelDescriptor>,
    #[serde(default)]
    video: Vec<ModelDescriptor>,
    #[serde(default)]
    agent: Vec<ModelDescriptor>,
}

/// Build a registry from a JSON catalog
///
/// The result registers models in file order, so the catalog controls
/// picker order and the [`easel_graph::pick_default`] tie-break.
pub fn registry_from_json(json: &str) -> Result<ModelRegistry, CatalogError> {
    let file: CatalogFile = serde_json::from_str(json)?;
    let mut registry = ModelRegistry::new();

    for (kind, models) in [
        (NodeKind::Text, file.text),
        (NodeKind::Image, file.image),
        (NodeKind::Video, file.video),
        (NodeKind::Agent, file.agent),
    ] {
        for (index, descriptor) in models.into_iter().enumerate() {
            if descriptor.id.is_empty() {
                return Err(CatalogError::EmptyId { kind, index });
            }
            if descriptor.supported_inputs.is_empty() {
                return Err(CatalogError::NoInputs { id: descriptor.id });
            }
            registry.register(kind, descriptor);
        }
    }
    Ok(registry)
}
