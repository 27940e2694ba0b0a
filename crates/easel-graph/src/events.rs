//! Canvas event stream
//!
//! Events are emitted by the editing session to any consumer (the UI,
//! a test harness) after each mutation. The sink trait abstracts the
//! transport, so the engine does not care whether events cross a
//! channel, an IPC bridge, or land in a test vector.

use serde::{Deserialize, Serialize};

/// Trait for delivering canvas events
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g., the
    /// channel closed).
    fn send(&self, event: CanvasEvent) -> Result<(), EventError>;
}

/// Error when delivering an event fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted as the canvas changes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CanvasEvent {
    /// A node was added
    #[serde(rename_all = "camelCase")]
    NodeAdded { node_id: String },

    /// A node was removed
    #[serde(rename_all = "camelCase")]
    NodeRemoved { node_id: String },

    /// An edge was added
    #[serde(rename_all = "camelCase")]
    EdgeAdded {
        edge_id: String,
        source: String,
        target: String,
    },

    /// An edge was removed
    #[serde(rename_all = "camelCase")]
    EdgeRemoved { edge_id: String },

    /// Excess image edges were pruned to honor a fan-in cap
    #[serde(rename_all = "camelCase")]
    EdgesPruned {
        target_id: String,
        edge_ids: Vec<String>,
    },

    /// A node's selected model changed
    #[serde(rename_all = "camelCase")]
    ModelChanged {
        node_id: String,
        model: Option<String>,
    },

    /// Generation started for a node
    #[serde(rename_all = "camelCase")]
    GenerationStarted { node_id: String, variations: usize },

    /// One generation slot failed
    #[serde(rename_all = "camelCase")]
    GenerationFailed {
        node_id: String,
        slot: usize,
        error: String,
    },

    /// A generation's results landed on the canvas
    #[serde(rename_all = "camelCase")]
    VariationsApplied {
        node_id: String,
        sibling_ids: Vec<String>,
        failed: usize,
    },
}

/// A no-op sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: CanvasEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-backed sink that collects events, for tests
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<CanvasEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<CanvasEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: CanvasEvent) -> Result<(), EventError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
