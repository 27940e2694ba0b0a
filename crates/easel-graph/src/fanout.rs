//! Variation fan-out
//!
//! One generation request for K variations becomes K results: the first
//! lands in the originating node, and each further success materializes
//! a sibling node beside it with the origin's incoming wiring mirrored.
//! [`fan_out`] computes that change as a purely additive [`FanOut`]
//! delta; applying it against the live graph is
//! [`CanvasGraph::apply_fan_out`](crate::types::CanvasGraph), so a
//! delta computed from a stale snapshot still merges into whatever the
//! graph has become.

use chrono::Utc;
use rand::Rng;

use crate::types::{fresh_id, Edge, GeneratedContent, Node, NodeData, NodeId};

/// Horizontal spacing between an origin node and its fan-out siblings,
/// in canvas units (one node card plus a gutter)
pub const SIBLING_SPACING: f64 = 460.0;

/// One successful generation result
#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    /// Which of the K requested slots this result fills (0-based)
    pub slot: usize,
    /// The generated content
    pub content: GeneratedContent,
    /// The seed the slot was generated with, if the node pins seeds
    pub seed: Option<String>,
}

/// One failed generation slot
#[derive(Debug, Clone, PartialEq)]
pub struct VariationFailure {
    /// Which slot failed
    pub slot: usize,
    /// Provider-reported reason
    pub error: String,
}

/// The outcome of a batch of K generation calls for one node
///
/// Partial failure is data, not an error: failed slots ride alongside
/// the successes. Cancelled slots appear in neither list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariationBatch {
    pub succeeded: Vec<Variation>,
    pub failed: Vec<VariationFailure>,
}

impl VariationBatch {
    /// A batch where every slot succeeded, slots numbered in order
    pub fn all_succeeded(
        contents: impl IntoIterator<Item = GeneratedContent>,
        seeds: &[Option<String>],
    ) -> Self {
        Self {
            succeeded: contents
                .into_iter()
                .enumerate()
                .map(|(slot, content)| Variation {
                    slot,
                    content,
                    seed: seeds.get(slot).cloned().flatten(),
                })
                .collect(),
            failed: Vec::new(),
        }
    }
}

/// An additive graph delta produced by [`fan_out`]
///
/// Nothing outside the origin node and its new siblings is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct FanOut {
    /// The node the generation was requested on
    pub origin_id: NodeId,
    /// Replacement data for the origin, when slot 0 succeeded
    pub origin_data: Option<NodeData>,
    /// New sibling nodes, one per successful slot past the first
    pub siblings: Vec<Node>,
    /// Mirrored incoming edges for the siblings
    pub edges: Vec<Edge>,
    /// Slots that produced no node: provider failures plus any result
    /// whose content kind did not match the origin
    pub failed: Vec<VariationFailure>,
}

impl FanOut {
    /// Whether this delta changes anything at all
    pub fn is_empty(&self) -> bool {
        self.origin_data.is_none() && self.siblings.is_empty() && self.edges.is_empty()
    }
}

/// Assign per-slot seeds for a K-variation request
///
/// An unset (or empty) user seed leaves every slot unseeded, fully
/// random at the provider. A pinned seed goes to slot 0 verbatim so the
/// user's exact output reproduces, and every other slot draws its own
/// random seed so the variations still diversify.
pub fn assign_seeds(user_seed: Option<&str>, k: usize) -> Vec<Option<String>> {
    match user_seed {
        None | Some("") => vec![None; k],
        Some(pinned) => {
            let mut rng = rand::rng();
            (0..k)
                .map(|slot| {
                    if slot == 0 {
                        Some(pinned.to_string())
                    } else {
                        Some(rng.random::<u32>().to_string())
                    }
                })
                .collect()
        }
    }
}

/// Turn a variation batch into an additive graph delta
///
/// Slot 0 becomes the origin's new data; slot i >= 1 becomes a sibling
/// of the same kind at `origin.x + SIBLING_SPACING * i` on the same row,
/// carrying the origin's model, instructions, and provider params, with
/// every incoming edge of the origin mirrored onto it. A missing or
/// failed slot 0 leaves the origin untouched; siblings keep their slot
/// offsets either way, so which position a variation lands at is stable
/// under partial failure.
pub fn fan_out(origin: &Node, batch: VariationBatch, incoming: &[Edge]) -> FanOut {
    let now = Utc::now();
    let mut origin_data = None;
    let mut siblings = Vec::new();
    let mut edges = Vec::new();
    let mut failed = batch.failed;

    for variation in batch.succeeded {
        let Some(data) = origin
            .data
            .with_generated(variation.content, variation.seed, now)
        else {
            // A result of the wrong media kind must never land on a node.
            failed.push(VariationFailure {
                slot: variation.slot,
                error: "generated content does not match the node kind".into(),
            });
            continue;
        };

        if variation.slot == 0 {
            origin_data = Some(data);
            continue;
        }

        let sibling = Node {
            id: fresh_id(),
            data,
            position: (
                origin.position.x + SIBLING_SPACING * variation.slot as f64,
                origin.position.y,
            )
                .into(),
            origin: origin.origin,
        };
        for edge in incoming {
            edges.push(Edge {
                id: fresh_id(),
                source: edge.source.clone(),
                target: sibling.id.clone(),
                source_handle: edge.source_handle.clone(),
                target_handle: edge.target_handle.clone(),
                kind: edge.kind,
            });
        }
        siblings.push(sibling);
    }

    if !failed.is_empty() {
        log::debug!(
            "fan-out for node {}: {} slot(s) failed",
            origin.id,
            failed.len()
        );
    }

    FanOut {
        origin_id: origin.id.clone(),
        origin_data,
        siblings,
        edges,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::types::{EdgeKind, GenerativeData};

    fn origin_at(x: f64, y: f64) -> Node {
        let data = GenerativeData {
            instructions: "a red fox".into(),
            model: Some("text-to-image".into()),
            ..GenerativeData::default()
        };
        Node::new("origin", NodeData::Image(data), (x, y))
    }

    fn image(url: &str) -> GeneratedContent {
        GeneratedContent::Image { url: url.into() }
    }

    fn incoming_from(source: &str) -> Vec<Edge> {
        vec![Edge {
            id: "e1".into(),
            source: source.into(),
            target: "origin".into(),
            source_handle: Some("out".into()),
            target_handle: Some("in".into()),
            kind: EdgeKind::Persistent,
        }]
    }

    #[test]
    fn test_unseeded_request_stays_unseeded() {
        assert_eq!(assign_seeds(None, 4), vec![None, None, None, None]);
        assert_eq!(assign_seeds(Some(""), 2), vec![None, None]);
    }

    #[test]
    fn test_pinned_seed_reproduces_slot_zero_only() {
        let seeds = assign_seeds(Some("42"), 3);
        assert_eq!(seeds[0].as_deref(), Some("42"));

        for seed in &seeds[1..] {
            let drawn = seed.as_deref().expect("sibling slots must be seeded");
            assert_ne!(drawn, "42");
            drawn.parse::<u32>().expect("drawn seeds are numeric");
        }
        assert_ne!(seeds[1], seeds[2]);
    }

    #[test]
    fn test_single_variation_updates_origin_in_place() {
        let origin = origin_at(100.0, 50.0);
        let batch = VariationBatch::all_succeeded([image("https://cdn.example/0.png")], &[None]);
        let delta = fan_out(&origin, batch, &[]);

        assert_eq!(delta.origin_id, "origin");
        assert!(delta.origin_data.as_ref().unwrap().has_generated());
        assert!(delta.siblings.is_empty());
        assert!(delta.edges.is_empty());
        assert!(delta.failed.is_empty());
    }

    #[test]
    fn test_three_variations_fan_out_on_the_same_row() {
        let origin = origin_at(100.0, 50.0);
        let incoming = incoming_from("p");
        let batch = VariationBatch::all_succeeded(
            [
                image("https://cdn.example/0.png"),
                image("https://cdn.example/1.png"),
                image("https://cdn.example/2.png"),
            ],
            &assign_seeds(None, 3),
        );
        let delta = fan_out(&origin, batch, &incoming);

        assert!(delta.origin_data.is_some());
        assert_eq!(delta.siblings.len(), 2);
        assert_eq!(
            delta.siblings[0].position.x,
            100.0 + SIBLING_SPACING
        );
        assert_eq!(
            delta.siblings[1].position.x,
            100.0 + 2.0 * SIBLING_SPACING
        );
        for sibling in &delta.siblings {
            assert_eq!(sibling.position.y, 50.0);
            assert_eq!(sibling.origin, origin.origin);
            assert_eq!(sibling.data.model(), Some("text-to-image"));
            assert_eq!(
                sibling.data.generative().unwrap().instructions,
                "a red fox"
            );
        }

        // One mirrored edge per sibling, same source and handles.
        assert_eq!(delta.edges.len(), 2);
        for (edge, sibling) in delta.edges.iter().zip(&delta.siblings) {
            assert_eq!(edge.source, "p");
            assert_eq!(edge.target, sibling.id);
            assert_eq!(edge.source_handle.as_deref(), Some("out"));
            assert_eq!(edge.target_handle.as_deref(), Some("in"));
            assert_eq!(edge.kind, EdgeKind::Persistent);
        }
    }

    #[test]
    fn test_failed_slot_zero_leaves_origin_untouched() {
        let origin = origin_at(0.0, 0.0);
        let batch = VariationBatch {
            succeeded: vec![
                Variation {
                    slot: 1,
                    content: image("https://cdn.example/1.png"),
                    seed: None,
                },
                Variation {
                    slot: 2,
                    content: image("https://cdn.example/2.png"),
                    seed: None,
                },
            ],
            failed: vec![VariationFailure {
                slot: 0,
                error: "rate limited".into(),
            }],
        };
        let delta = fan_out(&origin, batch, &[]);

        assert!(delta.origin_data.is_none());
        assert_eq!(delta.siblings.len(), 2);
        assert_eq!(delta.failed.len(), 1);
        // Slot identity is preserved: the surviving siblings keep their
        // own offsets instead of compacting leftward.
        assert_eq!(delta.siblings[0].position.x, SIBLING_SPACING);
        assert_eq!(delta.siblings[1].position.x, 2.0 * SIBLING_SPACING);
    }

    #[test]
    fn test_mismatched_content_kind_is_rejected_into_failed() {
        let origin = origin_at(0.0, 0.0);
        let batch = VariationBatch::all_succeeded(
            [GeneratedContent::Text {
                text: "not an image".into(),
            }],
            &[None],
        );
        let delta = fan_out(&origin, batch, &[]);

        assert!(delta.origin_data.is_none());
        assert!(delta.is_empty());
        assert_eq!(delta.failed.len(), 1);
        assert_eq!(delta.failed[0].slot, 0);
    }

    #[test]
    fn test_fan_out_never_touches_unrelated_graph_parts() {
        // Apply a K=2 delta and verify the pre-existing structure survives
        // byte for byte.
        let mut graph = GraphBuilder::new()
            .text("p", (0.0, 0.0))
            .image("origin", (100.0, 50.0))
            .image("bystander", (0.0, 500.0))
            .edge("p", "origin")
            .build();
        let before_nodes = graph.nodes.clone();
        let before_edges = graph.edges.clone();

        let origin = graph.find_node("origin").unwrap().clone();
        let incoming: Vec<Edge> = graph.incoming_edges("origin").cloned().collect();
        let batch = VariationBatch::all_succeeded(
            [
                image("https://cdn.example/0.png"),
                image("https://cdn.example/1.png"),
            ],
            &assign_seeds(None, 2),
        );
        let delta = fan_out(&origin, batch, &incoming);
        graph.apply_fan_out(delta).unwrap();

        assert_eq!(graph.nodes.len(), before_nodes.len() + 1);
        assert_eq!(graph.edges.len(), before_edges.len() + 1);
        for node in &before_nodes {
            if node.id != "origin" {
                assert_eq!(graph.find_node(&node.id), Some(node));
            }
        }
        for edge in &before_edges {
            assert_eq!(graph.find_edge(&edge.id), Some(edge));
        }
    }
}
