//! Upstream classification
//!
//! A node's incoming neighbors determine which generation models it may
//! offer. [`classify`] reduces those neighbors to a single
//! [`ConnectionType`] tag that the model filter and the UI key off.
//! It is a pure function of the current graph and is recomputed after
//! every mutation, never cached.

use serde::{Deserialize, Serialize};

use crate::types::{CanvasGraph, Node, NodeKind};

/// Summary of a node's upstream context
///
/// `Primitive` means the upstream node holds user-authored content with no
/// generation result yet; `Transform` means generated content is present
/// and the downstream call will operate on a prior output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionType {
    /// No incoming connections
    None,
    TextPrimitive,
    TextTransform,
    ImagePrimitive,
    ImageTransform,
    VideoPrimitive,
    VideoTransform,
}

/// Classify a node by its incoming neighbors.
///
/// Image inputs take priority over text and agent inputs, which take
/// priority over video inputs: when an image is wired in alongside a
/// prompt, image-to-image models are the ones that apply. Within a
/// category the first incomer in edge order decides between primitive
/// and transform. Agent incomers always count as generated text.
pub fn classify(graph: &CanvasGraph, node_id: &str) -> ConnectionType {
    let incomers: Vec<&Node> = graph.incoming_nodes(node_id).collect();
    if incomers.is_empty() {
        return ConnectionType::None;
    }

    if let Some(image) = incomers.iter().find(|n| n.kind() == NodeKind::Image) {
        return if image.has_generated() {
            ConnectionType::ImageTransform
        } else {
            ConnectionType::ImagePrimitive
        };
    }

    if let Some(prompt) = incomers
        .iter()
        .find(|n| matches!(n.kind(), NodeKind::Text | NodeKind::Agent))
    {
        return match prompt.kind() {
            NodeKind::Agent => ConnectionType::TextTransform,
            _ if prompt.has_generated() => ConnectionType::TextTransform,
            _ => ConnectionType::TextPrimitive,
        };
    }

    if let Some(video) = incomers.iter().find(|n| n.kind() == NodeKind::Video) {
        return if video.has_generated() {
            ConnectionType::VideoTransform
        } else {
            ConnectionType::VideoPrimitive
        };
    }

    // Only drop and file incomers remain; fall back to the last one.
    match incomers.last() {
        Some(node) => classify_single(node),
        None => ConnectionType::None,
    }
}

/// Classify one node in isolation by its own kind and generated state
fn classify_single(node: &Node) -> ConnectionType {
    match node.kind() {
        NodeKind::Image if node.has_generated() => ConnectionType::ImageTransform,
        NodeKind::Image => ConnectionType::ImagePrimitive,
        NodeKind::Agent => ConnectionType::TextTransform,
        NodeKind::Text if node.has_generated() => ConnectionType::TextTransform,
        NodeKind::Text => ConnectionType::TextPrimitive,
        NodeKind::Video if node.has_generated() => ConnectionType::VideoTransform,
        NodeKind::Video => ConnectionType::VideoPrimitive,
        NodeKind::Drop | NodeKind::File => ConnectionType::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::types::{GeneratedContent, MediaKind};

    fn generated_image() -> GeneratedContent {
        GeneratedContent::Image {
            url: "https://cdn.example/out.png".into(),
        }
    }

    fn generated_text() -> GeneratedContent {
        GeneratedContent::Text {
            text: "a red fox".into(),
        }
    }

    #[test]
    fn test_no_incomers_is_none_regardless_of_own_data() {
        let graph = GraphBuilder::new()
            .image("a", (0.0, 0.0))
            .with_generated(generated_image())
            .build();
        assert_eq!(classify(&graph, "a"), ConnectionType::None);
    }

    #[test]
    fn test_unknown_node_is_none() {
        let graph = GraphBuilder::new().build();
        assert_eq!(classify(&graph, "ghost"), ConnectionType::None);
    }

    #[test]
    fn test_text_primitive_and_transform() {
        let graph = GraphBuilder::new()
            .text("plain", (0.0, 0.0))
            .text("generated", (0.0, 100.0))
            .with_generated(generated_text())
            .image("t1", (200.0, 0.0))
            .image("t2", (200.0, 100.0))
            .edge("plain", "t1")
            .edge("generated", "t2")
            .build();

        assert_eq!(classify(&graph, "t1"), ConnectionType::TextPrimitive);
        assert_eq!(classify(&graph, "t2"), ConnectionType::TextTransform);
    }

    #[test]
    fn test_agent_is_always_text_transform() {
        let graph = GraphBuilder::new()
            .agent("a", (0.0, 0.0))
            .image("b", (200.0, 0.0))
            .edge("a", "b")
            .build();
        assert_eq!(classify(&graph, "b"), ConnectionType::TextTransform);
    }

    #[test]
    fn test_image_takes_priority_over_text() {
        let graph = GraphBuilder::new()
            .text("prompt", (0.0, 0.0))
            .image("source", (0.0, 100.0))
            .image("target", (200.0, 50.0))
            .edge("prompt", "target")
            .edge("source", "target")
            .build();

        // The prompt edge is older, but the image incomer still decides.
        assert_eq!(classify(&graph, "target"), ConnectionType::ImagePrimitive);
    }

    #[test]
    fn test_first_image_incomer_decides_transform() {
        let graph = GraphBuilder::new()
            .image("first", (0.0, 0.0))
            .with_generated(generated_image())
            .image("second", (0.0, 100.0))
            .image("target", (200.0, 50.0))
            .edge("first", "target")
            .edge("second", "target")
            .build();

        assert_eq!(classify(&graph, "target"), ConnectionType::ImageTransform);
    }

    #[test]
    fn test_video_classification() {
        let graph = GraphBuilder::new()
            .video("raw", (0.0, 0.0))
            .video("rendered", (0.0, 100.0))
            .with_generated(GeneratedContent::Video {
                url: "https://cdn.example/out.mp4".into(),
            })
            .text("t1", (200.0, 0.0))
            .text("t2", (200.0, 100.0))
            .edge("raw", "t1")
            .edge("rendered", "t2")
            .build();

        assert_eq!(classify(&graph, "t1"), ConnectionType::VideoPrimitive);
        assert_eq!(classify(&graph, "t2"), ConnectionType::VideoTransform);
    }

    #[test]
    fn test_text_beats_video() {
        let graph = GraphBuilder::new()
            .video("clip", (0.0, 0.0))
            .text("prompt", (0.0, 100.0))
            .video("target", (200.0, 50.0))
            .edge("clip", "target")
            .edge("prompt", "target")
            .build();

        assert_eq!(classify(&graph, "target"), ConnectionType::TextPrimitive);
    }

    #[test]
    fn test_file_only_incomer_falls_back_to_none() {
        let graph = GraphBuilder::new()
            .file(
                "upload",
                (0.0, 0.0),
                "ref.png",
                "https://cdn.example/ref.png",
                MediaKind::Image,
            )
            .image("target", (200.0, 0.0))
            .edge("upload", "target")
            .build();

        assert_eq!(classify(&graph, "target"), ConnectionType::None);
    }

    #[test]
    fn test_file_incomer_is_skipped_when_media_is_wired() {
        let graph = GraphBuilder::new()
            .file(
                "upload",
                (0.0, 0.0),
                "ref.png",
                "https://cdn.example/ref.png",
                MediaKind::Image,
            )
            .text("prompt", (0.0, 100.0))
            .image("target", (200.0, 50.0))
            .edge("upload", "target")
            .edge("prompt", "target")
            .build();

        assert_eq!(classify(&graph, "target"), ConnectionType::TextPrimitive);
    }

    #[test]
    fn test_classify_is_pure() {
        let graph = GraphBuilder::new()
            .text("a", (0.0, 0.0))
            .image("b", (200.0, 0.0))
            .edge("a", "b")
            .build();

        let first = classify(&graph, "b");
        let second = classify(&graph, "b");
        assert_eq!(first, second);
    }

    #[test]
    fn test_connection_type_wire_names() {
        let json = serde_json::to_value(ConnectionType::ImageTransform).unwrap();
        assert_eq!(json, "image-transform");
        let json = serde_json::to_value(ConnectionType::None).unwrap();
        assert_eq!(json, "none");
    }
}
