//! Easel Graph - the canvas workflow graph engine
//!
//! The in-memory model behind an Easel canvas: typed content nodes wired
//! into a directed acyclic graph, where a node either holds user-authored
//! content or derives content from its upstream neighbors through an
//! external generation call. This crate is the part with the invariants:
//!
//! - Connection legality: fan-in caps, type compatibility, single prompt
//!   slot, cycle prevention ([`validate`])
//! - Upstream classification driving which models a node may offer
//!   ([`classify`], [`models`])
//! - Variation fan-out: one generation request becoming N sibling nodes
//!   with replicated wiring ([`fanout`])
//! - The mutation surface the above are invoked from ([`mutate`])
//!
//! Everything here is pure, synchronous, and allocation-conscious; the
//! async session wrapper and generation drivers live in `easel-session`,
//! the model catalog in `easel-catalog`.

pub mod builder;
pub mod classify;
pub mod error;
pub mod events;
pub mod fanout;
pub mod models;
pub mod mutate;
pub mod types;
pub mod validate;

// Re-export the library surface
pub use builder::GraphBuilder;
pub use classify::{classify, ConnectionType};
pub use error::{GraphError, Result};
pub use events::{CanvasEvent, EventError, EventSink, NullEventSink, VecEventSink};
pub use fanout::{
    assign_seeds, fan_out, FanOut, Variation, VariationBatch, VariationFailure, SIBLING_SPACING,
};
pub use models::{pick_default, ModelDescriptor, ModelRegistry};
pub use mutate::{AppliedFanOut, Connected, Pasted};
pub use types::{
    CanvasGraph, Edge, EdgeId, EdgeKind, FileData, GeneratedContent, GenerativeData, MediaKind,
    ModelId, Node, NodeData, NodeId, NodeKind, Position, Viewport,
};
pub use validate::{can_connect, check_connection, image_fan_in, ConnectionDenied, ProposedConnection};
