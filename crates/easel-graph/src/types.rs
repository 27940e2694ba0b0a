//! Core types for canvas graphs
//!
//! These types define the structure of a content canvas: typed nodes,
//! directed edges, and the graph container with its accessors. Node
//! payloads are a tagged union per kind, so "has generated content" is an
//! explicit state rather than a convention on loosely typed maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Unique identifier for a generation model
pub type ModelId = String;

/// Mint a fresh opaque id for nodes and edges
pub(crate) fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

/// The kind of content a node holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Text content, authored or generated
    Text,
    /// Image content
    Image,
    /// Video content
    Video,
    /// An agent that produces text from its inputs
    Agent,
    /// Transient placeholder shown while the user picks a node kind
    Drop,
    /// An uploaded file referenced by URL
    File,
}

/// Media category of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Text,
    Image,
    Video,
}

/// Content produced by a generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratedContent {
    /// Generated text
    Text { text: String },
    /// Generated image, referenced by URL
    Image { url: String },
    /// Generated video, referenced by URL
    Video { url: String },
}

impl GeneratedContent {
    /// The media kind of this content
    pub fn media(&self) -> MediaKind {
        match self {
            Self::Text { .. } => MediaKind::Text,
            Self::Image { .. } => MediaKind::Image,
            Self::Video { .. } => MediaKind::Video,
        }
    }
}

/// Payload shared by all generative node kinds (text, image, video, agent)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerativeData {
    /// User-authored prompt or editing instructions
    #[serde(default)]
    pub instructions: String,

    /// The selected generation model, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelId>,

    /// User-pinned seed; empty or absent means fully random per call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,

    /// Result of the most recent generation call, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<GeneratedContent>,

    /// When generated content last landed on this node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Opaque provider parameters, passed through untouched
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// Payload of an uploaded file node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// Original file name
    pub name: String,
    /// Where the uploaded file lives
    pub url: String,
    /// Which media category the file belongs to
    pub media: MediaKind,
}

/// Type-specific node payload
///
/// The variant is the single source of truth for a node's kind; see
/// [`Node::kind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeData {
    Text(GenerativeData),
    Image(GenerativeData),
    Video(GenerativeData),
    Agent(GenerativeData),
    Drop,
    File(FileData),
}

impl NodeData {
    /// An empty text payload
    pub fn text() -> Self {
        Self::Text(GenerativeData::default())
    }

    /// An empty image payload
    pub fn image() -> Self {
        Self::Image(GenerativeData::default())
    }

    /// An empty video payload
    pub fn video() -> Self {
        Self::Video(GenerativeData::default())
    }

    /// An empty agent payload
    pub fn agent() -> Self {
        Self::Agent(GenerativeData::default())
    }

    /// A file payload for an uploaded file
    pub fn file(name: impl Into<String>, url: impl Into<String>, media: MediaKind) -> Self {
        Self::File(FileData {
            name: name.into(),
            url: url.into(),
            media,
        })
    }

    /// The node kind this payload belongs to
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Text(_) => NodeKind::Text,
            Self::Image(_) => NodeKind::Image,
            Self::Video(_) => NodeKind::Video,
            Self::Agent(_) => NodeKind::Agent,
            Self::Drop => NodeKind::Drop,
            Self::File(_) => NodeKind::File,
        }
    }

    /// The generative payload, for kinds that carry one
    pub fn generative(&self) -> Option<&GenerativeData> {
        match self {
            Self::Text(data) | Self::Image(data) | Self::Video(data) | Self::Agent(data) => {
                Some(data)
            }
            Self::Drop | Self::File(_) => None,
        }
    }

    /// Mutable access to the generative payload
    pub fn generative_mut(&mut self) -> Option<&mut GenerativeData> {
        match self {
            Self::Text(data) | Self::Image(data) | Self::Video(data) | Self::Agent(data) => {
                Some(data)
            }
            Self::Drop | Self::File(_) => None,
        }
    }

    /// Whether a generation result has landed on this payload
    pub fn has_generated(&self) -> bool {
        self.generative().is_some_and(|data| data.generated.is_some())
    }

    /// The selected model id, if one is set
    pub fn model(&self) -> Option<&str> {
        self.generative().and_then(|data| data.model.as_deref())
    }

    /// Whether this payload can accept the given generated content
    ///
    /// Text and agent nodes take generated text; image and video nodes take
    /// their own media. Drop and file nodes never take generated content.
    pub fn accepts(&self, content: &GeneratedContent) -> bool {
        matches!(
            (self, content),
            (Self::Text(_), GeneratedContent::Text { .. })
                | (Self::Agent(_), GeneratedContent::Text { .. })
                | (Self::Image(_), GeneratedContent::Image { .. })
                | (Self::Video(_), GeneratedContent::Video { .. })
        )
    }

    /// A copy of this payload with a generation result written into it
    ///
    /// Returns `None` when the content kind does not match the payload,
    /// so a bad write can never corrupt a node.
    pub fn with_generated(
        &self,
        content: GeneratedContent,
        seed: Option<String>,
        at: DateTime<Utc>,
    ) -> Option<NodeData> {
        if !self.accepts(&content) {
            return None;
        }
        let mut data = self.clone();
        if let Some(generative) = data.generative_mut() {
            generative.generated = Some(content);
            generative.seed = seed;
            generative.updated_at = Some(at);
        }
        Some(data)
    }
}

/// Position on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create a position from coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Anchor offset used when laying a node out relative to its position
///
/// `(0.0, 0.5)` anchors at the vertical center of the left edge.
pub const ORIGIN_CENTER_LEFT: (f64, f64) = (0.0, 0.5);

fn default_origin() -> (f64, f64) {
    ORIGIN_CENTER_LEFT
}

/// A node instance on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Type-specific payload; also determines the node kind
    pub data: NodeData,
    /// Position on the canvas
    pub position: Position,
    /// Anchor offset relative to the node's bounding box
    #[serde(default = "default_origin")]
    pub origin: (f64, f64),
}

impl Node {
    /// Create a node with an explicit id
    pub fn new(id: impl Into<NodeId>, data: NodeData, position: impl Into<Position>) -> Self {
        Self {
            id: id.into(),
            data,
            position: position.into(),
            origin: ORIGIN_CENTER_LEFT,
        }
    }

    /// Create a node with a freshly minted id
    pub fn create(data: NodeData, position: impl Into<Position>) -> Self {
        Self::new(fresh_id(), data, position)
    }

    /// The kind of this node, derived from its payload
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Whether a generation result has landed on this node
    pub fn has_generated(&self) -> bool {
        self.data.has_generated()
    }
}

/// Whether an edge survives the current interaction gesture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// A committed connection
    #[default]
    Persistent,
    /// A pending connection into a drop picker, removed when the gesture ends
    Transient,
}

/// A directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
    /// Source port discriminator, if the source has more than one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Target port discriminator, if the target has more than one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    /// Whether this edge outlives the current gesture
    #[serde(default)]
    pub kind: EdgeKind,
}

/// Viewport state of the canvas editor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// A complete canvas graph
///
/// Edge-array order is meaningful: edges append in creation order, and both
/// classification and fan-in pruning iterate oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasGraph {
    /// Nodes on the canvas
    pub nodes: Vec<Node>,
    /// Edges connecting nodes
    pub edges: Vec<Edge>,
    /// Editor viewport
    #[serde(default)]
    pub viewport: Viewport,
}

impl CanvasGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by ID (mutable)
    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Find an edge by ID
    pub fn find_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Check if a node with this ID exists
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Check if an edge with this ID exists
    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.iter().any(|e| e.id == id)
    }

    /// Get edges coming into a node, oldest first
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Get edges going out of a node, oldest first
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Get the nodes with an edge into `node_id`, in edge order
    ///
    /// Edges whose source node no longer exists are skipped.
    pub fn incoming_nodes<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.incoming_edges(node_id)
            .filter_map(move |e| self.find_node(&e.source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_follows_data() {
        let node = Node::new("n1", NodeData::image(), (0.0, 0.0));
        assert_eq!(node.kind(), NodeKind::Image);
        assert_eq!(node.origin, ORIGIN_CENTER_LEFT);

        let file = Node::new(
            "n2",
            NodeData::file("shot.png", "https://cdn.example/shot.png", MediaKind::Image),
            (10.0, 10.0),
        );
        assert_eq!(file.kind(), NodeKind::File);
        assert!(file.data.generative().is_none());
    }

    #[test]
    fn test_with_generated_rejects_kind_mismatch() {
        let data = NodeData::image();
        let text = GeneratedContent::Text {
            text: "hello".into(),
        };
        assert!(data.with_generated(text, None, Utc::now()).is_none());

        let image = GeneratedContent::Image {
            url: "https://cdn.example/out.png".into(),
        };
        let written = data
            .with_generated(image.clone(), Some("7".into()), Utc::now())
            .unwrap();
        assert!(written.has_generated());
        assert_eq!(written.generative().unwrap().seed.as_deref(), Some("7"));
    }

    #[test]
    fn test_agent_accepts_generated_text() {
        let data = NodeData::agent();
        let text = GeneratedContent::Text {
            text: "plan".into(),
        };
        assert!(data.accepts(&text));
        assert!(!data.accepts(&GeneratedContent::Image {
            url: "x".into()
        }));
    }

    #[test]
    fn test_create_mints_distinct_ids() {
        let a = Node::create(NodeData::text(), (0.0, 0.0));
        let b = Node::create(NodeData::text(), (0.0, 0.0));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_incoming_nodes_in_edge_order() {
        let mut graph = CanvasGraph::new();
        graph.nodes.push(Node::new("a", NodeData::text(), (0.0, 0.0)));
        graph.nodes.push(Node::new("b", NodeData::image(), (0.0, 100.0)));
        graph.nodes.push(Node::new("c", NodeData::image(), (200.0, 0.0)));
        graph.edges.push(Edge {
            id: "e1".into(),
            source: "b".into(),
            target: "c".into(),
            source_handle: None,
            target_handle: None,
            kind: EdgeKind::Persistent,
        });
        graph.edges.push(Edge {
            id: "e2".into(),
            source: "a".into(),
            target: "c".into(),
            source_handle: None,
            target_handle: None,
            kind: EdgeKind::Persistent,
        });

        let incomers: Vec<&str> = graph.incoming_nodes("c").map(|n| n.id.as_str()).collect();
        assert_eq!(incomers, vec!["b", "a"]);
    }

    #[test]
    fn test_node_data_serde_tagged_by_kind() {
        let node = Node::new("n1", NodeData::text(), (1.0, 2.0));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["data"]["kind"], "text");

        let restored: Node = serde_json::from_value(json).unwrap();
        assert_eq!(restored, node);
    }

    #[test]
    fn test_edge_kind_defaults_to_persistent() {
        let json = serde_json::json!({
            "id": "e1",
            "source": "a",
            "target": "b"
        });
        let edge: Edge = serde_json::from_value(json).unwrap();
        assert_eq!(edge.kind, EdgeKind::Persistent);
        assert!(edge.source_handle.is_none());
    }

    #[test]
    fn test_graph_serde_roundtrip() {
        let mut graph = CanvasGraph::new();
        let mut data = GenerativeData {
            instructions: "a quiet harbor".into(),
            model: Some("sd-turbo".into()),
            ..GenerativeData::default()
        };
        data.params
            .insert("aspectRatio".into(), serde_json::json!("16:9"));
        graph
            .nodes
            .push(Node::new("a", NodeData::Image(data), (0.0, 0.0)));

        let json = serde_json::to_string(&graph).unwrap();
        let restored: CanvasGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, graph);
        assert_eq!(restored.viewport.zoom, 1.0);
    }
}
