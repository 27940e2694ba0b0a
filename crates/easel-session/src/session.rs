//! The canvas editing session
//!
//! One [`CanvasSession`] per open canvas. All mutations go through its
//! `tokio::sync::RwLock`, producing the next snapshot atomically and
//! bumping a monotonic revision the persistence collaborator debounces
//! on. Events are emitted to the configured sink after each change.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::RwLock;

use easel_graph::{
    AppliedFanOut, CanvasEvent, CanvasGraph, Connected, ConnectionDenied, ConnectionType, Edge,
    EventSink, FanOut, GraphError, ModelDescriptor, ModelId, ModelRegistry, Node, NodeData,
    NodeId, NullEventSink, Pasted, Position, ProposedConnection,
};

/// Errors surfaced by session operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operation referenced a node the session does not have
    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    /// No registered model supports the node's current upstream context
    ///
    /// An explicit state: the session never substitutes an incompatible
    /// model to keep generating.
    #[error("No compatible model for node {0}")]
    NoCompatibleModel(NodeId),

    /// The generation was aborted before its results could land
    #[error("Generation cancelled")]
    Cancelled,

    /// A structural graph error
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The proposed connection was rejected
    #[error(transparent)]
    Denied(#[from] ConnectionDenied),
}

/// The editing session owning one canvas graph
pub struct CanvasSession {
    graph: RwLock<CanvasGraph>,
    registry: Arc<ModelRegistry>,
    sink: Arc<dyn EventSink>,
    revision: AtomicU64,
    /// One abort token per node with a generation in flight
    pub(crate) inflight: Mutex<HashMap<NodeId, Arc<AtomicBool>>>,
}

impl CanvasSession {
    /// Create a session over an empty canvas
    pub fn new(registry: Arc<ModelRegistry>, sink: Arc<dyn EventSink>) -> Self {
        Self::with_graph(CanvasGraph::new(), registry, sink)
    }

    /// Create a session over an existing canvas (e.g., a loaded project)
    pub fn with_graph(
        graph: CanvasGraph,
        registry: Arc<ModelRegistry>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            graph: RwLock::new(graph),
            registry,
            sink,
            revision: AtomicU64::new(0),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// A session that discards events, for tests and headless use
    pub fn detached(registry: Arc<ModelRegistry>) -> Self {
        Self::new(registry, Arc::new(NullEventSink))
    }

    /// The model registry this session filters against
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// A full copy of the current graph
    pub async fn snapshot(&self) -> CanvasGraph {
        self.graph.read().await.clone()
    }

    /// Monotonic change counter, bumped on every mutation
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub(crate) fn emit(&self, event: CanvasEvent) {
        if let Err(e) = self.sink.send(event) {
            log::warn!("canvas event dropped: {}", e);
        }
    }

    fn bump(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    fn emit_pruned(&self, target_id: &str, pruned: &[Edge]) {
        if !pruned.is_empty() {
            self.emit(CanvasEvent::EdgesPruned {
                target_id: target_id.to_string(),
                edge_ids: pruned.iter().map(|e| e.id.clone()).collect(),
            });
        }
    }

    /// Add a node, returning its fresh id
    pub async fn add_node(&self, data: NodeData, position: impl Into<Position>) -> NodeId {
        let id = self.graph.write().await.add_node(data, position);
        self.bump();
        self.emit(CanvasEvent::NodeAdded { node_id: id.clone() });
        id
    }

    /// Duplicate a node beside its original
    pub async fn duplicate_node(&self, id: &str) -> Result<NodeId, SessionError> {
        let copy_id = self.graph.write().await.duplicate_node(id)?;
        self.bump();
        self.emit(CanvasEvent::NodeAdded {
            node_id: copy_id.clone(),
        });
        Ok(copy_id)
    }

    /// Delete a node and its wiring; aborts any generation in flight on it
    pub async fn remove_node(&self, id: &str) -> Result<(), SessionError> {
        self.abort_generation(id);
        self.graph.write().await.remove_node(id)?;
        self.bump();
        self.emit(CanvasEvent::NodeRemoved {
            node_id: id.to_string(),
        });
        Ok(())
    }

    /// Validate and add a connection
    pub async fn connect(&self, proposed: ProposedConnection) -> Result<Connected, SessionError> {
        let source = proposed.source.clone();
        let target = proposed.target.clone();
        let connected = {
            let mut graph = self.graph.write().await;
            graph.clear_drop_pickers();
            graph.connect(&self.registry, proposed)?
        };
        self.bump();
        self.emit(CanvasEvent::EdgeAdded {
            edge_id: connected.edge_id.clone(),
            source,
            target: target.clone(),
        });
        self.emit_pruned(&target, &connected.pruned);
        Ok(connected)
    }

    /// Remove an edge
    pub async fn disconnect(&self, edge_id: &str) -> Result<(), SessionError> {
        self.graph.write().await.disconnect(edge_id)?;
        self.bump();
        self.emit(CanvasEvent::EdgeRemoved {
            edge_id: edge_id.to_string(),
        });
        Ok(())
    }

    /// Select or clear a node's model, pruning excess image inputs
    pub async fn set_model(
        &self,
        node_id: &str,
        model: Option<ModelId>,
    ) -> Result<Vec<Edge>, SessionError> {
        let pruned = self
            .graph
            .write()
            .await
            .set_model(&self.registry, node_id, model.clone())?;
        self.bump();
        self.emit(CanvasEvent::ModelChanged {
            node_id: node_id.to_string(),
            model,
        });
        self.emit_pruned(node_id, &pruned);
        Ok(pruned)
    }

    /// Paste a copied subgraph at an offset
    pub async fn paste(&self, nodes: &[Node], edges: &[Edge], offset: (f64, f64)) -> Pasted {
        let pasted = self
            .graph
            .write()
            .await
            .paste(&self.registry, nodes, edges, offset);
        self.bump();
        for node_id in &pasted.node_ids {
            self.emit(CanvasEvent::NodeAdded {
                node_id: node_id.clone(),
            });
        }
        pasted
    }

    /// Classify a node's upstream context against the current snapshot
    pub async fn classify_node(&self, node_id: &str) -> ConnectionType {
        easel_graph::classify(&*self.graph.read().await, node_id)
    }

    /// The models a node may currently offer
    pub async fn filter_models(&self, node_id: &str) -> Vec<ModelDescriptor> {
        self.registry
            .filter_models(&*self.graph.read().await, node_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Merge a fan-out delta into the current graph
    pub(crate) async fn apply_fan_out(
        &self,
        fan_out: FanOut,
    ) -> Result<AppliedFanOut, SessionError> {
        let applied = self.graph.write().await.apply_fan_out(fan_out)?;
        self.bump();
        Ok(applied)
    }

    /// Abort the generation in flight on a node, if any
    pub fn abort_generation(&self, node_id: &str) {
        if let Some(token) = self.inflight.lock().remove(node_id) {
            log::info!("aborting generation for node {}", node_id);
            token.store(true, Ordering::Release);
        }
    }

    /// Register a fresh abort token for a node, aborting any predecessor
    pub(crate) fn begin_generation(&self, node_id: &str) -> Arc<AtomicBool> {
        let token = Arc::new(AtomicBool::new(false));
        if let Some(previous) = self
            .inflight
            .lock()
            .insert(node_id.to_string(), token.clone())
        {
            previous.store(true, Ordering::Release);
        }
        token
    }

    /// Drop a node's abort token if it is still the current one
    pub(crate) fn finish_generation(&self, node_id: &str, token: &Arc<AtomicBool>) {
        let mut inflight = self.inflight.lock();
        if inflight
            .get(node_id)
            .is_some_and(|current| Arc::ptr_eq(current, token))
        {
            inflight.remove(node_id);
        }
    }
}
