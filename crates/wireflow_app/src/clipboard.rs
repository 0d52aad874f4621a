// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node clipboard.
//!
//! Copied nodes are kept as a bincode-encoded [`GraphSnapshot`], so a paste
//! always builds fresh nodes no matter what happened to the originals.

use thiserror::Error;
use wireflow_graph::{Graph, GraphError, GraphSnapshot, NodeId};

/// Clipboard errors
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// Nothing has been copied
    #[error("clipboard is empty")]
    Empty,

    /// Encoding or decoding the buffer failed
    #[error("clipboard serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// The graph refused the pasted nodes
    #[error("paste failed: {0}")]
    Graph(#[from] GraphError),
}

/// Copy/paste buffer for node selections
#[derive(Debug, Clone)]
pub struct Clipboard {
    data: Option<Vec<u8>>,
    paste_count: u32,
    offset: f32,
}

impl Clipboard {
    /// Create an empty clipboard; successive pastes shift by `offset`
    pub fn new(offset: f32) -> Self {
        Self {
            data: None,
            paste_count: 0,
            offset,
        }
    }

    /// Copy nodes and the wires between them; returns how many nodes were copied
    pub fn copy(&mut self, graph: &Graph, ids: &[NodeId]) -> Result<usize, ClipboardError> {
        let snapshot = graph.snapshot_of(ids);
        if snapshot.is_empty() {
            return Err(ClipboardError::Empty);
        }
        let count = snapshot.nodes.len();
        self.data = Some(bincode::serialize(&snapshot)?);
        self.paste_count = 0;
        tracing::debug!(nodes = count, wires = snapshot.wires.len(), "copied");
        Ok(count)
    }

    /// Paste the copied nodes and select them; each paste lands further away
    pub fn paste(&mut self, graph: &mut Graph) -> Result<Vec<NodeId>, ClipboardError> {
        let data = self.data.as_ref().ok_or(ClipboardError::Empty)?;
        let snapshot: GraphSnapshot = bincode::deserialize(data)?;

        self.paste_count += 1;
        let shift = self.offset * self.paste_count as f32;
        let ids = graph.paste(&snapshot, [shift, shift])?;

        graph.clear_selection();
        for id in &ids {
            graph.select(*id, true)?;
        }
        Ok(ids)
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new(30.0)
    }
}
