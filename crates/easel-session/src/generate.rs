//! Generation driver
//!
//! Turns "generate K variations for this node" into K concurrent calls
//! against an external [`Generator`], under one abort token per node,
//! and merges the outcome back into the session as an additive fan-out.
//! Providers are collaborators: this crate ships no concrete backend,
//! only the trait and the request shape the adapter layer fills in.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use thiserror::Error;

use easel_graph::{
    assign_seeds, fan_out, CanvasEvent, CanvasGraph, Edge, GeneratedContent, GraphError, ModelId,
    NodeId, NodeKind, Variation, VariationBatch, VariationFailure,
};

use crate::session::{CanvasSession, SessionError};

/// Upstream content gathered for a generation call
///
/// The request-side complement of classification: where the classifier
/// summarizes what kind of inputs a node has, this collects their actual
/// content for the provider adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedInputs {
    /// Prompt text from the node's text or agent incomer, if any
    pub prompt: Option<String>,
    /// Image URLs from image incomers and image file uploads, in edge order
    pub image_urls: Vec<String>,
    /// Video URLs from video incomers and video file uploads, in edge order
    pub video_urls: Vec<String>,
}

/// Gather upstream content for a node from the current snapshot
///
/// The prompt comes from the first text or agent incomer: its generated
/// text when present, its instructions otherwise. Media URLs come from
/// incomers with generated content and from file uploads.
pub fn collect_inputs(graph: &CanvasGraph, node_id: &str) -> CollectedInputs {
    let mut inputs = CollectedInputs::default();

    for incomer in graph.incoming_nodes(node_id) {
        match incomer.kind() {
            NodeKind::Text | NodeKind::Agent if inputs.prompt.is_none() => {
                let data = incomer.data.generative();
                inputs.prompt = match data.and_then(|d| d.generated.as_ref()) {
                    Some(GeneratedContent::Text { text }) => Some(text.clone()),
                    _ => data.map(|d| d.instructions.clone()),
                };
            }
            NodeKind::Image => {
                if let Some(GeneratedContent::Image { url }) =
                    incomer.data.generative().and_then(|d| d.generated.as_ref())
                {
                    inputs.image_urls.push(url.clone());
                }
            }
            NodeKind::Video => {
                if let Some(GeneratedContent::Video { url }) =
                    incomer.data.generative().and_then(|d| d.generated.as_ref())
                {
                    inputs.video_urls.push(url.clone());
                }
            }
            NodeKind::File => {
                if let easel_graph::NodeData::File(file) = &incomer.data {
                    match file.media {
                        easel_graph::MediaKind::Image => inputs.image_urls.push(file.url.clone()),
                        easel_graph::MediaKind::Video => inputs.video_urls.push(file.url.clone()),
                        easel_graph::MediaKind::Text => {}
                    }
                }
            }
            _ => {}
        }
    }
    inputs
}

/// One generation call, as handed to the provider adapter
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// The node the result will land on
    pub node_id: NodeId,
    /// Which of the K variation slots this call fills
    pub slot: usize,
    /// The selected model
    pub model: ModelId,
    /// The node's own instructions
    pub instructions: String,
    /// Upstream content
    pub inputs: CollectedInputs,
    /// Seed for this slot, per the fan-out seed policy
    pub seed: Option<String>,
    /// Opaque provider parameters from the node
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// Provider-side generation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// The provider reported a failure for this call
    #[error("Generation failed: {0}")]
    Provider(String),

    /// The provider observed the abort and stopped
    #[error("Generation cancelled")]
    Cancelled,
}

/// An external generation backend
///
/// Implementations live outside this repository (HTTP adapters, local
/// runtimes); tests script one.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Run one generation call
    async fn generate(&self, request: GenerationRequest)
        -> Result<GeneratedContent, GenerateError>;
}

/// What a finished generation changed
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutReport {
    /// Whether slot 0 landed on the origin node
    pub origin_updated: bool,
    /// Ids of the sibling nodes created for slots past the first
    pub sibling_ids: Vec<NodeId>,
    /// Slots that failed, reported alongside the successes
    pub failed: Vec<VariationFailure>,
}

impl CanvasSession {
    /// Generate `count` variations for a node and fan the results out
    ///
    /// Uses the node's selected model, falling back to the default among
    /// the models its upstream context currently supports; an empty
    /// filter result refuses with [`SessionError::NoCompatibleModel`].
    /// Starting a generation aborts any previous one on the same node.
    /// Slots run concurrently; a slot failure is reported in the
    /// returned [`FanOutReport`], never raised. An abort observed after
    /// the calls finish discards everything and returns
    /// [`SessionError::Cancelled`].
    pub async fn generate_variations(
        &self,
        generator: Arc<dyn Generator>,
        node_id: &str,
        count: usize,
    ) -> Result<FanOutReport, SessionError> {
        let snapshot = self.snapshot().await;
        let origin = snapshot
            .find_node(node_id)
            .ok_or_else(|| SessionError::UnknownNode(node_id.to_string()))?
            .clone();
        let data = origin
            .data
            .generative()
            .ok_or_else(|| GraphError::NotGenerative(node_id.to_string()))?;

        let model = match data.model.clone() {
            Some(model) => model,
            None => {
                let filtered = self.registry().filter_models(&snapshot, node_id);
                easel_graph::pick_default(&filtered)
                    .ok_or_else(|| SessionError::NoCompatibleModel(node_id.to_string()))?
                    .id
                    .clone()
            }
        };

        let k = count.max(1);
        let seeds = assign_seeds(data.seed.as_deref(), k);
        let inputs = collect_inputs(&snapshot, node_id);
        let incoming: Vec<Edge> = snapshot.incoming_edges(node_id).cloned().collect();
        let token = self.begin_generation(node_id);

        self.emit(CanvasEvent::GenerationStarted {
            node_id: node_id.to_string(),
            variations: k,
        });
        log::info!("generating {} variation(s) for node {} with {}", k, node_id, model);

        let calls = (0..k).map(|slot| {
            let request = GenerationRequest {
                node_id: node_id.to_string(),
                slot,
                model: model.clone(),
                instructions: data.instructions.clone(),
                inputs: inputs.clone(),
                seed: seeds[slot].clone(),
                params: data.params.clone(),
            };
            let generator = generator.clone();
            async move { (slot, generator.generate(request).await) }
        });
        let outcomes = join_all(calls).await;

        self.finish_generation(node_id, &token);
        if token.load(Ordering::Acquire) {
            // An aborted request contributes nothing: neither success
            // nor failure reaches the fan-out.
            log::info!("generation for node {} aborted, discarding results", node_id);
            return Err(SessionError::Cancelled);
        }

        let mut batch = VariationBatch::default();
        for (slot, outcome) in outcomes {
            match outcome {
                Ok(content) => batch.succeeded.push(Variation {
                    slot,
                    content,
                    seed: seeds[slot].clone(),
                }),
                Err(GenerateError::Cancelled) => {}
                Err(GenerateError::Provider(error)) => {
                    batch.failed.push(VariationFailure { slot, error });
                }
            }
        }

        let mut delta = fan_out(&origin, batch, &incoming);
        let failed = std::mem::take(&mut delta.failed);
        let applied = self.apply_fan_out(delta).await?;

        for failure in &failed {
            self.emit(CanvasEvent::GenerationFailed {
                node_id: node_id.to_string(),
                slot: failure.slot,
                error: failure.error.clone(),
            });
        }
        self.emit(CanvasEvent::VariationsApplied {
            node_id: node_id.to_string(),
            sibling_ids: applied.sibling_ids.clone(),
            failed: failed.len(),
        });

        Ok(FanOutReport {
            origin_updated: applied.origin_updated,
            sibling_ids: applied.sibling_ids,
            failed,
        })
    }
}
