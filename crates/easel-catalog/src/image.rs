//! Built-in image models

use easel_graph::{ConnectionType, ModelDescriptor, ModelRegistry, NodeKind};

const TEXT_TO_IMAGE: [ConnectionType; 3] = [
    ConnectionType::None,
    ConnectionType::TextPrimitive,
    ConnectionType::TextTransform,
];

const IMAGE_TO_IMAGE: [ConnectionType; 2] = [
    ConnectionType::ImagePrimitive,
    ConnectionType::ImageTransform,
];

pub(crate) fn register(registry: &mut ModelRegistry) {
    registry.register(
        NodeKind::Image,
        ModelDescriptor::new("flux-schnell", "FLUX Schnell")
            .supports(TEXT_TO_IMAGE)
            .default_model(),
    );
    registry.register(
        NodeKind::Image,
        ModelDescriptor::new("flux-dev", "FLUX Dev").supports(TEXT_TO_IMAGE),
    );
    registry.register(
        NodeKind::Image,
        ModelDescriptor::new("flux-kontext", "FLUX Kontext")
            .supports(IMAGE_TO_IMAGE)
            .max_images(4),
    );
    registry.register(
        NodeKind::Image,
        ModelDescriptor::new("sdxl-refine", "SDXL Refiner")
            .supports(IMAGE_TO_IMAGE)
            .max_images(1),
    );
}
