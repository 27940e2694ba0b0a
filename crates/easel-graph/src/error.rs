//! Error types for the graph engine

use thiserror::Error;

use crate::types::{EdgeId, NodeId, NodeKind};

/// Result type alias using GraphError
pub type Result<T> = std::result::Result<T, GraphError>;

/// Structural errors raised by graph mutations
///
/// Connection-legality failures are not errors; they are reported through
/// [`crate::validate::ConnectionDenied`] so callers can tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A mutation referenced a node that is not in the graph
    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    /// A mutation referenced an edge that is not in the graph
    #[error("Edge not found: {0}")]
    UnknownEdge(EdgeId),

    /// Inserting a node whose id is already taken
    #[error("A node with id '{0}' already exists")]
    DuplicateNode(NodeId),

    /// Inserting an edge whose id is already taken
    #[error("An edge with id '{0}' already exists")]
    DuplicateEdge(EdgeId),

    /// The operation needs a node of a specific kind
    #[error("Node '{node_id}' is a {found:?} node, expected {expected:?}")]
    KindMismatch {
        node_id: NodeId,
        expected: NodeKind,
        found: NodeKind,
    },

    /// The operation needs a node that carries generative data
    #[error("Node '{0}' does not hold generative data")]
    NotGenerative(NodeId),

    /// A drop picker can only materialize into a concrete node kind
    #[error("A drop picker cannot resolve to another drop node")]
    DropResolve,
}
