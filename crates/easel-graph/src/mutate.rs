//! Graph mutation surface
//!
//! The operations a canvas editor performs: add, duplicate and delete
//! nodes, validated connects, model switches, the transient drop-picker
//! flow, paste, and applying fan-out deltas. Every mutation that can
//! change a node's incoming-image count or its cap ends with
//! [`CanvasGraph::enforce_image_fan_in`], so the fan-in invariant holds
//! as a postcondition of the surface rather than of individual call
//! sites.

use crate::error::{GraphError, Result};
use crate::fanout::FanOut;
use crate::models::ModelRegistry;
use crate::types::{
    fresh_id, CanvasGraph, Edge, EdgeKind, ModelId, Node, NodeData, NodeId, NodeKind, Position,
};
use crate::validate::{check_connection, image_edges_into, ConnectionDenied, ProposedConnection};

/// Offset applied to a duplicated node so it lands beside its original
const DUPLICATE_OFFSET: (f64, f64) = (40.0, 40.0);

/// A successful connect: the new edge plus anything pruned to stay
/// under the target's image fan-in cap
#[derive(Debug, Clone, PartialEq)]
pub struct Connected {
    pub edge_id: String,
    pub pruned: Vec<Edge>,
}

/// The result of pasting a copied subgraph
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pasted {
    /// Fresh ids of the pasted nodes, in input order
    pub node_ids: Vec<NodeId>,
    /// Fresh ids of the pasted edges that passed validation
    pub edge_ids: Vec<String>,
    /// Edges pruned by fan-in reconciliation on the pasted targets
    pub pruned: Vec<Edge>,
}

/// The visible outcome of merging a [`FanOut`] delta
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppliedFanOut {
    /// Whether the origin node's data was replaced
    pub origin_updated: bool,
    /// Ids of the sibling nodes that landed
    pub sibling_ids: Vec<NodeId>,
    /// Mirrored edges skipped because their source no longer exists
    pub skipped_edges: usize,
}

impl CanvasGraph {
    /// Add a node with a freshly minted id, returning the id
    pub fn add_node(&mut self, data: NodeData, position: impl Into<Position>) -> NodeId {
        let node = Node::create(data, position);
        let id = node.id.clone();
        log::debug!("add node {} ({:?})", id, node.kind());
        self.nodes.push(node);
        id
    }

    /// Insert a pre-built node, rejecting duplicate ids
    pub fn insert_node(&mut self, node: Node) -> Result<()> {
        if self.contains_node(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Insert a pre-built edge, rejecting structural corruption
    ///
    /// Guards ids and endpoints only; connection legality is
    /// [`check_connection`]'s job.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<()> {
        if self.contains_edge(&edge.id) {
            return Err(GraphError::DuplicateEdge(edge.id));
        }
        if !self.contains_node(&edge.source) {
            return Err(GraphError::UnknownNode(edge.source));
        }
        if !self.contains_node(&edge.target) {
            return Err(GraphError::UnknownNode(edge.target));
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Duplicate a node: same data, fresh id, offset position, no edges
    pub fn duplicate_node(&mut self, id: &str) -> Result<NodeId> {
        let original = self
            .find_node(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        let copy = Node {
            id: fresh_id(),
            data: original.data.clone(),
            position: Position::new(
                original.position.x + DUPLICATE_OFFSET.0,
                original.position.y + DUPLICATE_OFFSET.1,
            ),
            origin: original.origin,
        };
        let copy_id = copy.id.clone();
        log::debug!("duplicate node {} -> {}", id, copy_id);
        self.nodes.push(copy);
        Ok(copy_id)
    }

    /// Remove a node and every edge touching it
    pub fn remove_node(&mut self, id: &str) -> Result<Node> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        let node = self.nodes.remove(index);
        self.edges.retain(|e| e.source != id && e.target != id);
        log::debug!("remove node {}", id);
        Ok(node)
    }

    /// Remove an edge by id
    pub fn disconnect(&mut self, edge_id: &str) -> Result<Edge> {
        let index = self
            .edges
            .iter()
            .position(|e| e.id == edge_id)
            .ok_or_else(|| GraphError::UnknownEdge(edge_id.to_string()))?;
        Ok(self.edges.remove(index))
    }

    /// Validate and add a connection
    ///
    /// On success the new persistent edge is appended and the target's
    /// image fan-in is reconciled; any pruned edges are returned so the
    /// caller can report them.
    pub fn connect(
        &mut self,
        registry: &ModelRegistry,
        proposed: ProposedConnection,
    ) -> std::result::Result<Connected, ConnectionDenied> {
        check_connection(self, registry, &proposed)?;

        let edge = Edge {
            id: fresh_id(),
            source: proposed.source,
            target: proposed.target.clone(),
            source_handle: proposed.source_handle,
            target_handle: proposed.target_handle,
            kind: EdgeKind::Persistent,
        };
        let edge_id = edge.id.clone();
        log::debug!("connect {} -> {}", edge.source, edge.target);
        self.edges.push(edge);

        let pruned = self.enforce_image_fan_in(registry, &proposed.target);
        Ok(Connected { edge_id, pruned })
    }

    /// Select (or clear) a node's generation model
    ///
    /// Switching to a model with a lower image cap prunes existing
    /// excess edges rather than blocking the switch; the pruned edges
    /// are returned.
    pub fn set_model(
        &mut self,
        registry: &ModelRegistry,
        node_id: &str,
        model: Option<ModelId>,
    ) -> Result<Vec<Edge>> {
        let node = self
            .find_node_mut(node_id)
            .ok_or_else(|| GraphError::UnknownNode(node_id.to_string()))?;
        let data = node
            .data
            .generative_mut()
            .ok_or_else(|| GraphError::NotGenerative(node_id.to_string()))?;
        data.model = model;
        Ok(self.enforce_image_fan_in(registry, node_id))
    }

    /// Prune image edges into a target beyond its model's fan-in cap
    ///
    /// The postcondition every mutation ends with: when the target's
    /// selected model declares `max_images`, only the newest `max_images`
    /// image edges survive; the oldest excess ones are removed and
    /// returned. Targets with no model, an unknown model id, or an
    /// uncapped model are left alone.
    pub fn enforce_image_fan_in(&mut self, registry: &ModelRegistry, target_id: &str) -> Vec<Edge> {
        let Some(target) = self.find_node(target_id) else {
            return Vec::new();
        };
        let Some(limit) = registry.image_cap(target.kind(), target.data.model()) else {
            return Vec::new();
        };

        let image_edges = image_edges_into(self, target_id);
        if image_edges.len() <= limit {
            return Vec::new();
        }

        let excess: Vec<String> = image_edges[..image_edges.len() - limit]
            .iter()
            .map(|e| e.id.clone())
            .collect();
        let mut pruned = Vec::with_capacity(excess.len());
        self.edges.retain(|e| {
            if excess.contains(&e.id) {
                pruned.push(e.clone());
                false
            } else {
                true
            }
        });
        log::info!(
            "pruned {} image edge(s) into {} (cap {})",
            pruned.len(),
            target_id,
            limit
        );
        pruned
    }

    /// Spawn a drop picker at the end of a connect-drag
    ///
    /// Creates a placeholder drop node at `position` and a transient
    /// edge from `source` into it. The pair lives until the picker is
    /// resolved or cancelled.
    pub fn spawn_drop_picker(
        &mut self,
        registry: &ModelRegistry,
        source: &str,
        position: impl Into<Position>,
    ) -> std::result::Result<(NodeId, String), ConnectionDenied> {
        let picker = Node::create(NodeData::Drop, position);
        let picker_id = picker.id.clone();
        self.nodes.push(picker);

        let proposed = ProposedConnection::new(source, picker_id.clone());
        if let Err(denied) = check_connection(self, registry, &proposed) {
            self.nodes.retain(|n| n.id != picker_id);
            return Err(denied);
        }

        let edge = Edge {
            id: fresh_id(),
            source: source.to_string(),
            target: picker_id.clone(),
            source_handle: None,
            target_handle: None,
            kind: EdgeKind::Transient,
        };
        let edge_id = edge.id.clone();
        self.edges.push(edge);
        Ok((picker_id, edge_id))
    }

    /// Resolve a drop picker into a concrete node
    ///
    /// The picker node becomes a node of the chosen kind in place (same
    /// id, same position). Its transient edges are re-validated against
    /// the full rule set with the real target kind: passing edges become
    /// persistent, failing ones are removed. Fan-in is reconciled on the
    /// resolved node.
    pub fn resolve_drop_picker(
        &mut self,
        registry: &ModelRegistry,
        picker_id: &str,
        data: NodeData,
    ) -> Result<Vec<Edge>> {
        if data.kind() == NodeKind::Drop {
            return Err(GraphError::DropResolve);
        }
        let node = self
            .find_node_mut(picker_id)
            .ok_or_else(|| GraphError::UnknownNode(picker_id.to_string()))?;
        if node.kind() != NodeKind::Drop {
            return Err(GraphError::KindMismatch {
                node_id: picker_id.to_string(),
                expected: NodeKind::Drop,
                found: node.kind(),
            });
        }
        node.data = data;

        let transient: Vec<Edge> = self
            .edges
            .iter()
            .filter(|e| e.target == picker_id && e.kind == EdgeKind::Transient)
            .cloned()
            .collect();
        for edge in transient {
            // Validate against the graph without the pending edge, as a
            // fresh connect would see it.
            self.edges.retain(|e| e.id != edge.id);
            let proposed = ProposedConnection::new(edge.source.clone(), picker_id)
                .with_handles(edge.source_handle.clone(), edge.target_handle.clone());
            if check_connection(self, registry, &proposed).is_ok() {
                self.edges.push(Edge {
                    kind: EdgeKind::Persistent,
                    ..edge
                });
            } else {
                log::debug!(
                    "dropped pending edge {} -> {} at picker resolve",
                    edge.source,
                    picker_id
                );
            }
        }
        Ok(self.enforce_image_fan_in(registry, picker_id))
    }

    /// Cancel a drop picker, removing it and its transient wiring
    pub fn cancel_drop_picker(&mut self, picker_id: &str) -> Result<()> {
        let node = self
            .find_node(picker_id)
            .ok_or_else(|| GraphError::UnknownNode(picker_id.to_string()))?;
        if node.kind() != NodeKind::Drop {
            return Err(GraphError::KindMismatch {
                node_id: picker_id.to_string(),
                expected: NodeKind::Drop,
                found: node.kind(),
            });
        }
        self.nodes.retain(|n| n.id != picker_id);
        self.edges
            .retain(|e| e.source != picker_id && e.target != picker_id);
        Ok(())
    }

    /// Remove every drop picker and transient edge
    ///
    /// Called when a new connect-drag starts: at most one picker flow is
    /// live at a time.
    pub fn clear_drop_pickers(&mut self) {
        self.nodes.retain(|n| n.kind() != NodeKind::Drop);
        let dangling: Vec<String> = self
            .edges
            .iter()
            .filter(|e| {
                e.kind == EdgeKind::Transient
                    || !self.contains_node(&e.source)
                    || !self.contains_node(&e.target)
            })
            .map(|e| e.id.clone())
            .collect();
        self.edges.retain(|e| !dangling.contains(&e.id));
    }

    /// Paste a copied subgraph
    ///
    /// Every node gets a fresh id at its position shifted by `offset`.
    /// Edges between pasted nodes are remapped to the fresh ids and
    /// re-validated one by one; edges that fail are skipped without
    /// aborting the paste. Edges referencing nodes outside the copied
    /// set are ignored.
    pub fn paste(
        &mut self,
        registry: &ModelRegistry,
        nodes: &[Node],
        edges: &[Edge],
        offset: (f64, f64),
    ) -> Pasted {
        let mut pasted = Pasted::default();
        let mut id_map: std::collections::HashMap<&str, NodeId> =
            std::collections::HashMap::with_capacity(nodes.len());

        for node in nodes {
            let copy = Node {
                id: fresh_id(),
                data: node.data.clone(),
                position: Position::new(node.position.x + offset.0, node.position.y + offset.1),
                origin: node.origin,
            };
            id_map.insert(node.id.as_str(), copy.id.clone());
            pasted.node_ids.push(copy.id.clone());
            self.nodes.push(copy);
        }

        for edge in edges {
            let (Some(source), Some(target)) = (
                id_map.get(edge.source.as_str()),
                id_map.get(edge.target.as_str()),
            ) else {
                continue;
            };
            let proposed = ProposedConnection::new(source.clone(), target.clone())
                .with_handles(edge.source_handle.clone(), edge.target_handle.clone());
            match self.connect(registry, proposed) {
                Ok(connected) => {
                    pasted.edge_ids.push(connected.edge_id);
                    pasted.pruned.extend(connected.pruned);
                }
                Err(denied) => {
                    log::debug!(
                        "paste skipped edge {} -> {}: {}",
                        edge.source,
                        edge.target,
                        denied
                    );
                }
            }
        }
        pasted
    }

    /// Merge a fan-out delta into the graph
    ///
    /// An additive merge against whatever the graph currently is: the
    /// origin's data is replaced if the delta carries one, siblings and
    /// mirrored edges are appended. The origin having been deleted
    /// mid-flight fails the whole merge closed; a mirrored edge whose
    /// source has vanished is skipped while the siblings still land.
    pub fn apply_fan_out(&mut self, fan_out: FanOut) -> Result<AppliedFanOut> {
        let mut applied = AppliedFanOut::default();

        {
            let origin = self
                .find_node_mut(&fan_out.origin_id)
                .ok_or_else(|| GraphError::UnknownNode(fan_out.origin_id.clone()))?;
            if let Some(data) = fan_out.origin_data {
                origin.data = data;
                applied.origin_updated = true;
            }
        }

        for sibling in fan_out.siblings {
            applied.sibling_ids.push(sibling.id.clone());
            self.insert_node(sibling)?;
        }
        for edge in fan_out.edges {
            if !self.contains_node(&edge.source) {
                log::warn!(
                    "fan-out edge {} -> {} skipped: source no longer exists",
                    edge.source,
                    edge.target
                );
                applied.skipped_edges += 1;
                continue;
            }
            self.insert_edge(edge)?;
        }

        log::debug!(
            "applied fan-out for {}: {} sibling(s)",
            fan_out.origin_id,
            applied.sibling_ids.len()
        );
        Ok(applied)
    }
}
