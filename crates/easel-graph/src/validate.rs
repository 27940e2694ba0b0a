//! Connection legality rules
//!
//! [`check_connection`] decides whether a proposed edge may be added,
//! evaluating the rules in a fixed order and reporting the first one
//! that fails as its own [`ConnectionDenied`] variant, so the UI can
//! explain a rejection. Rejection is an expected outcome, not an error:
//! the functions here are total and never panic.
//!
//! The check runs on every drag-connect frame, so the cycle walk builds
//! its adjacency view once per call and allocates nothing else.

use std::collections::{HashMap, HashSet};

use crate::models::ModelRegistry;
use crate::types::{CanvasGraph, Edge, NodeId, NodeKind};

/// A candidate edge, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedConnection {
    pub source: NodeId,
    pub target: NodeId,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

impl ProposedConnection {
    /// Propose a connection between two nodes
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    /// Set the port discriminators
    pub fn with_handles(
        mut self,
        source_handle: Option<String>,
        target_handle: Option<String>,
    ) -> Self {
        self.source_handle = source_handle;
        self.target_handle = target_handle;
        self
    }
}

/// Why a proposed connection was rejected
///
/// One variant per rule, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionDenied {
    /// An endpoint references a node that is not in the graph
    UnknownEndpoint(NodeId),

    /// A drop picker can never be a source
    DropSource,

    /// A file may only feed text, image, or video nodes
    FileSourceTarget { target: NodeKind },

    /// A file never receives connections
    FileTarget,

    /// The target's selected model already has all the image inputs it takes
    ImageFanInFull { limit: usize },

    /// A video node only accepts text or agent sources
    VideoSource { source: NodeKind },

    /// The target already has a text or agent prompt wired in
    PromptSlotTaken { existing: NodeId },

    /// A node cannot connect to itself
    SelfLoop,

    /// Adding the edge would close a cycle
    WouldCycle,
}

// Hand-written rather than derived via thiserror: the `source` field on
// `VideoSource` is message payload mandated by the spec, but thiserror
// unconditionally treats any field named `source` as the error source.
impl std::fmt::Display for ConnectionDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownEndpoint(id) => {
                write!(f, "Connection endpoint '{id}' does not exist")
            }
            Self::DropSource => write!(f, "A drop picker cannot be a connection source"),
            Self::FileSourceTarget { target } => {
                write!(f, "A file cannot feed a {target:?} node")
            }
            Self::FileTarget => write!(f, "A file node cannot receive connections"),
            Self::ImageFanInFull { limit } => {
                write!(f, "The selected model accepts at most {limit} image input(s)")
            }
            Self::VideoSource { source } => {
                write!(f, "A video node cannot take a {source:?} input")
            }
            Self::PromptSlotTaken { existing: _ } => {
                write!(f, "This node already has a prompt input")
            }
            Self::SelfLoop => write!(f, "A node cannot connect to itself"),
            Self::WouldCycle => write!(f, "Connection would create a cycle"),
        }
    }
}

impl std::error::Error for ConnectionDenied {}

/// Check whether a proposed connection may be added
///
/// Rules run in order; the first failure is returned. `Ok(())` means the
/// edge is legal against the current snapshot.
pub fn check_connection(
    graph: &CanvasGraph,
    registry: &ModelRegistry,
    proposed: &ProposedConnection,
) -> Result<(), ConnectionDenied> {
    let source = graph
        .find_node(&proposed.source)
        .ok_or_else(|| ConnectionDenied::UnknownEndpoint(proposed.source.clone()))?;
    let target = graph
        .find_node(&proposed.target)
        .ok_or_else(|| ConnectionDenied::UnknownEndpoint(proposed.target.clone()))?;

    // Rule 1: a drop picker only ever receives.
    if source.kind() == NodeKind::Drop {
        return Err(ConnectionDenied::DropSource);
    }

    // Rule 2: files feed content nodes and receive nothing.
    if source.kind() == NodeKind::File
        && !matches!(
            target.kind(),
            NodeKind::Text | NodeKind::Image | NodeKind::Video
        )
    {
        return Err(ConnectionDenied::FileSourceTarget {
            target: target.kind(),
        });
    }
    if target.kind() == NodeKind::File {
        return Err(ConnectionDenied::FileTarget);
    }

    // Rule 3: image fan-in cap declared by the target's selected model.
    // No model selected (or an id the registry does not know) means no
    // cap yet; the cap is enforced on model selection instead.
    if source.kind() == NodeKind::Image && target.kind() == NodeKind::Image {
        if let Some(limit) = registry.image_cap(target.kind(), target.data.model()) {
            if image_fan_in(graph, &target.id) >= limit {
                return Err(ConnectionDenied::ImageFanInFull { limit });
            }
        }
    }

    // Rule 4: video nodes are driven by prompts only.
    if target.kind() == NodeKind::Video
        && !matches!(source.kind(), NodeKind::Text | NodeKind::Agent)
    {
        return Err(ConnectionDenied::VideoSource {
            source: source.kind(),
        });
    }

    // Rule 5: one prompt input per node, text or agent but never both.
    if matches!(source.kind(), NodeKind::Text | NodeKind::Agent)
        && matches!(
            target.kind(),
            NodeKind::Text | NodeKind::Image | NodeKind::Video | NodeKind::Agent
        )
    {
        if let Some(existing) = graph
            .incoming_nodes(&target.id)
            .find(|n| matches!(n.kind(), NodeKind::Text | NodeKind::Agent))
        {
            return Err(ConnectionDenied::PromptSlotTaken {
                existing: existing.id.clone(),
            });
        }
    }

    // Rule 6: no self-loops.
    if proposed.source == proposed.target {
        return Err(ConnectionDenied::SelfLoop);
    }

    // Rule 7: no cycles.
    if creates_cycle(graph, &proposed.source, &proposed.target) {
        return Err(ConnectionDenied::WouldCycle);
    }

    Ok(())
}

/// Boolean view of [`check_connection`], for drag-feedback call sites
pub fn can_connect(
    graph: &CanvasGraph,
    registry: &ModelRegistry,
    proposed: &ProposedConnection,
) -> bool {
    check_connection(graph, registry, proposed).is_ok()
}

/// Count image edges into a target, transient edges included
///
/// Transient edges count so a mid-drag picker connection can never push
/// the provider past its limit at generation time.
pub fn image_fan_in(graph: &CanvasGraph, target_id: &str) -> usize {
    graph
        .incoming_edges(target_id)
        .filter(|e| {
            graph
                .find_node(&e.source)
                .is_some_and(|n| n.kind() == NodeKind::Image)
        })
        .count()
}

/// The image edges into a target, oldest first
pub(crate) fn image_edges_into<'a>(graph: &'a CanvasGraph, target_id: &'a str) -> Vec<&'a Edge> {
    graph
        .incoming_edges(target_id)
        .filter(|e| {
            graph
                .find_node(&e.source)
                .is_some_and(|n| n.kind() == NodeKind::Image)
        })
        .collect()
}

/// Would adding `source -> target` close a cycle?
///
/// Walks the target's outgoing reachability over the edge set as it
/// would be after the insert; reaching the source means the new edge
/// completes a loop. Iterative DFS over an adjacency view.
fn creates_cycle(graph: &CanvasGraph, source: &str, target: &str) -> bool {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::with_capacity(graph.nodes.len());
    for edge in &graph.edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }
    adjacency.entry(source).or_default().push(target);

    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = vec![target];

    while let Some(current) = stack.pop() {
        if current == source {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(next) = adjacency.get(current) {
            stack.extend(next.iter().copied());
        }
    }

    false
}
