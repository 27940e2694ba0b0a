//! Model registry and filtering
//!
//! Generation models are registered per node kind with the connection
//! types they accept. [`ModelRegistry::filter_models`] classifies a node's
//! upstream context and returns the models that declare support for it;
//! [`pick_default`] selects the entry a fresh node starts on. An empty
//! filter result is a real state ("no compatible model") and is never
//! papered over with a fallback id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::classify::{classify, ConnectionType};
use crate::types::{CanvasGraph, ModelId, NodeKind};

/// A generation model and the upstream contexts it accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Identifier sent to the provider adapter
    pub id: ModelId,
    /// Human-readable name shown in pickers
    pub label: String,
    /// Connection types this model can generate from
    pub supported_inputs: Vec<ConnectionType>,
    /// Whether this model is the preferred default for its kind
    #[serde(default)]
    pub default: bool,
    /// Fan-in cap: how many image inputs the model accepts at once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_images: Option<usize>,
}

impl ModelDescriptor {
    /// Create a descriptor with the given id and label
    pub fn new(id: impl Into<ModelId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            supported_inputs: Vec::new(),
            default: false,
            max_images: None,
        }
    }

    /// Declare the connection types this model supports
    pub fn supports(mut self, inputs: impl IntoIterator<Item = ConnectionType>) -> Self {
        self.supported_inputs = inputs.into_iter().collect();
        self
    }

    /// Mark this model as the default for its kind
    pub fn default_model(mut self) -> Self {
        self.default = true;
        self
    }

    /// Set the image fan-in cap
    pub fn max_images(mut self, limit: usize) -> Self {
        self.max_images = Some(limit);
        self
    }

    /// Whether this model accepts the given upstream context
    pub fn accepts_input(&self, input: ConnectionType) -> bool {
        self.supported_inputs.contains(&input)
    }
}

/// Registry of generation models, keyed by node kind
///
/// Loaded once at startup from the built-in catalog or from
/// configuration, then shared immutably. Registration order is
/// preserved: it is the order pickers display and the tie-break
/// [`pick_default`] falls back on.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    by_kind: HashMap<NodeKind, Vec<ModelDescriptor>>,
}

impl ModelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model for a node kind
    ///
    /// A descriptor with an id already registered for that kind replaces
    /// the earlier entry in place, keeping its position.
    pub fn register(&mut self, kind: NodeKind, descriptor: ModelDescriptor) {
        let models = self.by_kind.entry(kind).or_default();
        match models.iter_mut().find(|m| m.id == descriptor.id) {
            Some(existing) => *existing = descriptor,
            None => models.push(descriptor),
        }
    }

    /// All models registered for a node kind, in registration order
    pub fn models_for(&self, kind: NodeKind) -> &[ModelDescriptor] {
        self.by_kind.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Look up a model by kind and id
    pub fn find(&self, kind: NodeKind, model_id: &str) -> Option<&ModelDescriptor> {
        self.models_for(kind).iter().find(|m| m.id == model_id)
    }

    /// The image fan-in cap a node's selected model declares, if any
    ///
    /// `None` when the node has no model selected, the id is unknown to
    /// the registry, or the model declares no cap.
    pub fn image_cap(&self, kind: NodeKind, model_id: Option<&str>) -> Option<usize> {
        model_id
            .and_then(|id| self.find(kind, id))
            .and_then(|m| m.max_images)
    }

    /// Total number of registered models across all kinds
    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    /// Whether the registry holds no models
    pub fn is_empty(&self) -> bool {
        self.by_kind.values().all(Vec::is_empty)
    }

    /// The models a node may offer given its current upstream context
    ///
    /// Classifies the node, then returns every model registered for its
    /// kind that supports that connection type, in registration order.
    /// Unknown nodes and non-generative kinds yield an empty list.
    pub fn filter_models<'a>(
        &'a self,
        graph: &CanvasGraph,
        node_id: &str,
    ) -> Vec<&'a ModelDescriptor> {
        let Some(node) = graph.find_node(node_id) else {
            return Vec::new();
        };
        let input = classify(graph, node_id);
        self.models_for(node.kind())
            .iter()
            .filter(|m| m.accepts_input(input))
            .collect()
    }
}

/// Pick the default model from a filtered list
///
/// The entry flagged `default` wins; otherwise the first entry. An empty
/// list yields `None`, which callers must surface as an explicit
/// "no compatible model" state.
pub fn pick_default<'a>(filtered: &[&'a ModelDescriptor]) -> Option<&'a ModelDescriptor> {
    filtered
        .iter()
        .find(|m| m.default)
        .or_else(|| filtered.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::types::GeneratedContent;

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        registry.register(
            NodeKind::Image,
            ModelDescriptor::new("text-to-image", "Text to Image")
                .supports([
                    ConnectionType::None,
                    ConnectionType::TextPrimitive,
                    ConnectionType::TextTransform,
                ])
                .default_model(),
        );
        registry.register(
            NodeKind::Image,
            ModelDescriptor::new("image-edit", "Image Edit")
                .supports([ConnectionType::ImagePrimitive, ConnectionType::ImageTransform])
                .max_images(4),
        );
        registry
    }

    #[test]
    fn test_filter_follows_classification() {
        let registry = registry();
        let graph = GraphBuilder::new()
            .text("prompt", (0.0, 0.0))
            .image("target", (200.0, 0.0))
            .edge("prompt", "target")
            .build();

        let filtered = registry.filter_models(&graph, "target");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "text-to-image");
    }

    #[test]
    fn test_image_input_switches_model_set() {
        let registry = registry();
        let graph = GraphBuilder::new()
            .image("source", (0.0, 0.0))
            .with_generated(GeneratedContent::Image {
                url: "https://cdn.example/a.png".into(),
            })
            .image("target", (200.0, 0.0))
            .edge("source", "target")
            .build();

        let filtered = registry.filter_models(&graph, "target");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "image-edit");
    }

    #[test]
    fn test_pick_default_prefers_flag_then_order() {
        let registry = registry();
        let a = registry.find(NodeKind::Image, "text-to-image").unwrap();
        let b = registry.find(NodeKind::Image, "image-edit").unwrap();

        assert_eq!(pick_default(&[b, a]).unwrap().id, "text-to-image");
        assert_eq!(pick_default(&[b]).unwrap().id, "image-edit");
        assert!(pick_default(&[]).is_none());
    }

    #[test]
    fn test_empty_filter_is_explicit() {
        let mut registry = ModelRegistry::new();
        registry.register(
            NodeKind::Video,
            ModelDescriptor::new("text-to-video", "Text to Video")
                .supports([ConnectionType::TextPrimitive]),
        );

        // A video node with no inputs has nothing compatible to offer.
        let graph = GraphBuilder::new().video("v", (0.0, 0.0)).build();
        assert!(registry.filter_models(&graph, "v").is_empty());
    }

    #[test]
    fn test_reregister_replaces_in_place() {
        let mut registry = registry();
        registry.register(
            NodeKind::Image,
            ModelDescriptor::new("text-to-image", "Text to Image v2")
                .supports([ConnectionType::None]),
        );
        assert_eq!(registry.models_for(NodeKind::Image).len(), 2);
        assert_eq!(
            registry.models_for(NodeKind::Image)[0].label,
            "Text to Image v2"
        );
    }

    #[test]
    fn test_image_cap_requires_known_model() {
        let registry = registry();
        assert_eq!(registry.image_cap(NodeKind::Image, Some("image-edit")), Some(4));
        assert_eq!(registry.image_cap(NodeKind::Image, Some("text-to-image")), None);
        assert_eq!(registry.image_cap(NodeKind::Image, Some("unknown")), None);
        assert_eq!(registry.image_cap(NodeKind::Image, None), None);
    }

    #[test]
    fn test_descriptor_serde() {
        let descriptor = ModelDescriptor::new("image-edit", "Image Edit")
            .supports([ConnectionType::ImageTransform])
            .max_images(2);
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["supportedInputs"][0], "image-transform");
        assert_eq!(json["maxImages"], 2);
        assert_eq!(json["default"], false);

        let restored: ModelDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(restored, descriptor);
    }
}
