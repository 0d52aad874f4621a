// SPDX-License-Identifier: MIT OR Apache-2.0
//! Serializable graph snapshots, used for saving and for copy/paste.
//!
//! Nodes are stored in graph order; wires refer to nodes by their position
//! in that list and to sockets by their kind-defined index.

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::node::{Node, NodeId, NodeKind, NodeSaveData};
use crate::socket::{SinkRef, SourceRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A saved node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node kind
    pub kind: NodeKind,
    /// Canvas position
    pub position: [f32; 2],
    /// Kind-specific state
    pub data: NodeSaveData,
}

/// A saved wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRecord {
    /// Index of the source's node in the node list
    pub source_node: usize,
    /// Source index on that node
    pub source_socket: usize,
    /// Index of the sink's node in the node list
    pub sink_node: usize,
    /// Sink index on that node
    pub sink_socket: usize,
}

/// Nodes and wires of a graph or of a selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes, in graph order
    pub nodes: Vec<NodeRecord>,
    /// Wires between those nodes
    pub wires: Vec<WireRecord>,
}

impl GraphSnapshot {
    /// Whether the snapshot holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Graph {
    /// Snapshot the whole graph
    pub fn snapshot(&self) -> GraphSnapshot {
        let ids: Vec<NodeId> = self.node_ids().collect();
        self.snapshot_of(&ids)
    }

    /// Snapshot some nodes, keeping only the wires that run between them
    pub fn snapshot_of(&self, ids: &[NodeId]) -> GraphSnapshot {
        let mut index = IndexMap::new();
        let mut nodes = Vec::with_capacity(ids.len());
        for id in ids {
            let Ok(entry) = self.entry(*id) else {
                continue;
            };
            if index.contains_key(id) {
                continue;
            }
            index.insert(*id, nodes.len());
            nodes.push(NodeRecord {
                kind: entry.kind(),
                position: entry.position,
                data: entry.node().save_data(),
            });
        }

        let wires = self
            .wires()
            .filter_map(|wire| {
                Some(WireRecord {
                    source_node: *index.get(&wire.source.node)?,
                    source_socket: wire.source.index,
                    sink_node: *index.get(&wire.sink.node)?,
                    sink_socket: wire.sink.index,
                })
            })
            .collect();

        GraphSnapshot { nodes, wires }
    }

    /// Build a graph from a snapshot
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Result<Self> {
        let mut graph = Self::new();
        graph.paste(snapshot, [0.0, 0.0])?;
        Ok(graph)
    }

    /// Insert a snapshot's nodes shifted by `offset`, then reconnect its wires.
    ///
    /// Every record is checked before anything is inserted. Wires the graph
    /// turns down are logged and skipped. Returns the new node IDs in
    /// snapshot order.
    pub fn paste(&mut self, snapshot: &GraphSnapshot, offset: [f32; 2]) -> Result<Vec<NodeId>> {
        let mut staged: Vec<(Box<dyn Node>, [f32; 2])> = Vec::with_capacity(snapshot.nodes.len());
        for (i, record) in snapshot.nodes.iter().enumerate() {
            let mut node = record.kind.create();
            node.load(record.data.clone()).map_err(|source| {
                GraphError::InvariantViolation(format!("node record {i}: {source}"))
            })?;
            let position = [record.position[0] + offset[0], record.position[1] + offset[1]];
            staged.push((node, position));
        }

        for (i, wire) in snapshot.wires.iter().enumerate() {
            let source = staged.get(wire.source_node).map(|(node, _)| node.sources().len());
            let sink = staged.get(wire.sink_node).map(|(node, _)| node.sinks().len());
            let in_range = matches!(source, Some(n) if wire.source_socket < n)
                && matches!(sink, Some(n) if wire.sink_socket < n);
            if !in_range {
                return Err(GraphError::InvariantViolation(format!(
                    "wire record {i} refers to a missing node or socket"
                )));
            }
        }

        let ids: Vec<NodeId> = staged
            .into_iter()
            .map(|(node, position)| self.add_boxed(node, position))
            .collect();

        for wire in &snapshot.wires {
            let source = SourceRef::new(ids[wire.source_node], wire.source_socket);
            let sink = SinkRef::new(ids[wire.sink_node], wire.sink_socket);
            match self.connect(source, sink) {
                Ok(_) => {}
                Err(err) if err.is_rejection() => {
                    tracing::warn!(?wire, error = %err, "skipping saved wire");
                }
                Err(err) => return Err(err),
            }
        }

        tracing::debug!(nodes = ids.len(), wires = snapshot.wires.len(), "pasted snapshot");
        Ok(ids)
    }
}
