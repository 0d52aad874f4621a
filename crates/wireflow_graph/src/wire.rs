// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wire (edge) definitions for the graph.

use crate::node::NodeId;
use crate::socket::{SinkRef, SourceRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireId(pub Uuid);

impl WireId {
    /// Create a new random wire ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WireId {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed wire from one source socket to one sink socket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    /// Unique wire ID
    pub id: WireId,
    /// Left endpoint
    pub source: SourceRef,
    /// Right endpoint
    pub sink: SinkRef,
}

impl Wire {
    /// Create a new wire
    pub fn new(source: SourceRef, sink: SinkRef) -> Self {
        Self {
            id: WireId::new(),
            source,
            sink,
        }
    }

    /// Check if this wire touches a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.source.node == node_id || self.sink.node == node_id
    }
}
