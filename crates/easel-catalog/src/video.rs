//! Built-in video models
//!
//! Video nodes only accept prompt inputs, so every model here generates
//! from text.

use easel_graph::{ConnectionType, ModelDescriptor, ModelRegistry, NodeKind};

pub(crate) fn register(registry: &mut ModelRegistry) {
    let prompt_inputs = [
        ConnectionType::None,
        ConnectionType::TextPrimitive,
        ConnectionType::TextTransform,
    ];
    registry.register(
        NodeKind::Video,
        ModelDescriptor::new("ltx-video", "LTX Video")
            .supports(prompt_inputs)
            .default_model(),
    );
    registry.register(
        NodeKind::Video,
        ModelDescriptor::new("wan-2.1", "Wan 2.1").supports(prompt_inputs),
    );
}
