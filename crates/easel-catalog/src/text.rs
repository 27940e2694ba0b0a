//! Built-in text and agent models

use easel_graph::{ConnectionType, ModelDescriptor, ModelRegistry, NodeKind};

const PROMPT_INPUTS: [ConnectionType; 3] = [
    ConnectionType::None,
    ConnectionType::TextPrimitive,
    ConnectionType::TextTransform,
];

pub(crate) fn register(registry: &mut ModelRegistry) {
    registry.register(
        NodeKind::Text,
        ModelDescriptor::new("qwen-2.5-7b", "Qwen 2.5 7B")
            .supports(PROMPT_INPUTS)
            .default_model(),
    );
    registry.register(
        NodeKind::Text,
        ModelDescriptor::new("llama-3.1-8b", "Llama 3.1 8B").supports(PROMPT_INPUTS),
    );
    // Vision model: describes upstream images and videos as text.
    registry.register(
        NodeKind::Text,
        ModelDescriptor::new("qwen-vl-7b", "Qwen VL 7B").supports([
            ConnectionType::ImagePrimitive,
            ConnectionType::ImageTransform,
            ConnectionType::VideoPrimitive,
            ConnectionType::VideoTransform,
        ]),
    );

    // Agent nodes run on the same instruction-following models.
    registry.register(
        NodeKind::Agent,
        ModelDescriptor::new("qwen-2.5-7b", "Qwen 2.5 7B")
            .supports(PROMPT_INPUTS)
            .default_model(),
    );
    registry.register(
        NodeKind::Agent,
        ModelDescriptor::new("llama-3.1-8b", "Llama 3.1 8B").supports(PROMPT_INPUTS),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_model_is_filtered_out_without_media_input() {
        let mut registry = ModelRegistry::new();
        register(&mut registry);

        let graph = easel_graph::GraphBuilder::new().text("t", (0.0, 0.0)).build();
        let filtered = registry.filter_models(&graph, "t");
        assert!(filtered.iter().all(|m| m.id != "qwen-vl-7b"));
        assert!(filtered.iter().any(|m| m.id == "qwen-2.5-7b"));
    }
}
