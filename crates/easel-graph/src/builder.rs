//! Fluent builder for canvas graphs
//!
//! Provides a compact API for constructing graphs programmatically,
//! used heavily by tests and by callers that seed a canvas from code.
//! The builder does not validate: it writes exactly the nodes and edges
//! it is given, so tests can also construct graphs that the validator
//! would reject.

use crate::types::{
    CanvasGraph, Edge, EdgeKind, GeneratedContent, GenerativeData, MediaKind, ModelId, Node,
    NodeData, Viewport,
};

/// Fluent builder for constructing canvas graphs
///
/// # Example
///
/// ```
/// use easel_graph::GraphBuilder;
///
/// let graph = GraphBuilder::new()
///     .text("prompt", (0.0, 0.0))
///     .image("render", (200.0, 0.0))
///     .edge("prompt", "render")
///     .build();
/// assert_eq!(graph.nodes.len(), 2);
/// ```
pub struct GraphBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    viewport: Viewport,
    edge_counter: usize,
}

impl GraphBuilder {
    /// Create a new empty builder
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            viewport: Viewport::default(),
            edge_counter: 0,
        }
    }

    fn push(mut self, id: impl Into<String>, data: NodeData, position: (f64, f64)) -> Self {
        self.nodes.push(Node::new(id, data, position));
        self
    }

    /// Add a text node
    pub fn text(self, id: impl Into<String>, position: (f64, f64)) -> Self {
        self.push(id, NodeData::text(), position)
    }

    /// Add an image node
    pub fn image(self, id: impl Into<String>, position: (f64, f64)) -> Self {
        self.push(id, NodeData::image(), position)
    }

    /// Add a video node
    pub fn video(self, id: impl Into<String>, position: (f64, f64)) -> Self {
        self.push(id, NodeData::video(), position)
    }

    /// Add an agent node
    pub fn agent(self, id: impl Into<String>, position: (f64, f64)) -> Self {
        self.push(id, NodeData::agent(), position)
    }

    /// Add a drop picker node
    pub fn drop_picker(self, id: impl Into<String>, position: (f64, f64)) -> Self {
        self.push(id, NodeData::Drop, position)
    }

    /// Add a file node
    pub fn file(
        self,
        id: impl Into<String>,
        position: (f64, f64),
        name: impl Into<String>,
        url: impl Into<String>,
        media: MediaKind,
    ) -> Self {
        self.push(id, NodeData::file(name, url, media), position)
    }

    fn last_generative(&mut self) -> Option<&mut GenerativeData> {
        self.nodes.last_mut().and_then(|n| n.data.generative_mut())
    }

    /// Set generated content on the most recently added node
    ///
    /// Must follow a generative node; ignored otherwise.
    pub fn with_generated(mut self, content: GeneratedContent) -> Self {
        if let Some(data) = self.last_generative() {
            data.generated = Some(content);
        }
        self
    }

    /// Set the selected model on the most recently added node
    pub fn with_model(mut self, model: impl Into<ModelId>) -> Self {
        if let Some(data) = self.last_generative() {
            data.model = Some(model.into());
        }
        self
    }

    /// Set the pinned seed on the most recently added node
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        if let Some(data) = self.last_generative() {
            data.seed = Some(seed.into());
        }
        self
    }

    /// Set instructions on the most recently added node
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        if let Some(data) = self.last_generative() {
            data.instructions = instructions.into();
        }
        self
    }

    /// Add a persistent edge between two nodes (auto-generates the edge id)
    pub fn edge(self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.edge_of_kind(source, target, EdgeKind::Persistent)
    }

    /// Add a transient edge between two nodes
    pub fn transient_edge(self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.edge_of_kind(source, target, EdgeKind::Transient)
    }

    /// Add an edge of the given kind
    pub fn edge_of_kind(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        kind: EdgeKind,
    ) -> Self {
        self.edge_counter += 1;
        self.edges.push(Edge {
            id: format!("edge-{}", self.edge_counter),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            kind,
        });
        self
    }

    /// Set the viewport position and zoom
    pub fn viewport(mut self, x: f64, y: f64, zoom: f64) -> Self {
        self.viewport = Viewport { x, y, zoom };
        self
    }

    /// Build the graph
    pub fn build(self) -> CanvasGraph {
        CanvasGraph {
            nodes: self.nodes,
            edges: self.edges,
            viewport: self.viewport,
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;

    #[test]
    fn test_builder_nodes_and_edges() {
        let graph = GraphBuilder::new()
            .text("a", (0.0, 0.0))
            .with_instructions("a lighthouse at dusk")
            .image("b", (200.0, 0.0))
            .with_model("flux-dev")
            .edge("a", "b")
            .build();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.find_node("a").unwrap().kind(), NodeKind::Text);
        assert_eq!(
            graph.find_node("b").unwrap().data.model(),
            Some("flux-dev")
        );
        assert_eq!(graph.edges[0].kind, EdgeKind::Persistent);
    }

    #[test]
    fn test_builder_edge_ids_are_distinct() {
        let graph = GraphBuilder::new()
            .text("a", (0.0, 0.0))
            .image("b", (200.0, 0.0))
            .edge("a", "b")
            .edge("a", "b")
            .build();
        assert_ne!(graph.edges[0].id, graph.edges[1].id);
    }

    #[test]
    fn test_with_generated_ignored_on_file_node() {
        let graph = GraphBuilder::new()
            .file("f", (0.0, 0.0), "a.png", "https://cdn.example/a.png", MediaKind::Image)
            .with_generated(GeneratedContent::Image {
                url: "https://cdn.example/x.png".into(),
            })
            .build();
        assert!(!graph.find_node("f").unwrap().has_generated());
    }
}
