// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and wires, and the propagation driver.

use crate::error::{GraphError, NodeError, Rejection, Result};
use crate::node::{Edit, Node, NodeId, NodeKind};
use crate::propagation::{Emission, Emitter, Signal};
use crate::socket::{SinkRef, SinkSocket, SourceRef, SourceSocket};
use crate::value::Value;
use crate::wire::{Wire, WireId};
use indexmap::IndexMap;
use std::any::Any;

/// A node placed in the graph, with its materialised sockets
#[derive(Debug)]
pub struct NodeEntry {
    node: Box<dyn Node>,
    /// Canvas position
    pub position: [f32; 2],
    /// Whether the node is part of the current selection
    pub selected: bool,
    sinks: Vec<SinkSocket>,
    sources: Vec<SourceSocket>,
}

impl NodeEntry {
    fn new(node: Box<dyn Node>, position: [f32; 2]) -> Self {
        let sinks = node.sinks().iter().copied().map(SinkSocket::new).collect();
        let sources = node.sources().iter().copied().map(SourceSocket::new).collect();
        Self {
            node,
            position,
            selected: false,
            sinks,
            sources,
        }
    }

    /// The node itself
    pub fn node(&self) -> &dyn Node {
        self.node.as_ref()
    }

    /// Kind of the node
    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    /// Sink sockets, in kind-defined order
    pub fn sinks(&self) -> &[SinkSocket] {
        &self.sinks
    }

    /// Source sockets, in kind-defined order
    pub fn sources(&self) -> &[SourceSocket] {
        &self.sources
    }
}

/// A dataflow graph
#[derive(Debug, Default)]
pub struct Graph {
    /// Nodes in insertion order
    nodes: IndexMap<NodeId, NodeEntry>,
    /// Wires between sockets
    wires: IndexMap<WireId, Wire>,
    /// Last local error per node
    diagnostics: IndexMap<NodeId, NodeError>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node of `kind` and add it to the graph
    pub fn add_node(&mut self, kind: NodeKind, position: [f32; 2]) -> NodeId {
        self.add_boxed(kind.create(), position)
    }

    /// Add an already constructed node
    pub fn add_boxed(&mut self, node: Box<dyn Node>, position: [f32; 2]) -> NodeId {
        let id = NodeId::new();
        tracing::debug!(node = ?id, kind = %node.kind(), "adding node");
        self.nodes.insert(id, NodeEntry::new(node, position));
        id
    }

    /// Remove a node, severing every wire attached to it first
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<Box<dyn Node>> {
        self.entry(node_id)?;
        let mut touching: Vec<&Wire> = self
            .wires
            .values()
            .filter(|wire| wire.involves_node(node_id))
            .collect();
        // outgoing first so the node's own resets have nowhere to go
        touching.sort_by_key(|wire| wire.sink.node == node_id);
        let touching: Vec<WireId> = touching.iter().map(|wire| wire.id).collect();

        for wire in touching {
            self.disconnect_wire(wire)?;
        }

        self.diagnostics.shift_remove(&node_id);
        let entry = self
            .nodes
            .shift_remove(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        tracing::debug!(node = ?node_id, kind = %entry.kind(), "removed node");
        Ok(entry.node)
    }

    /// Remove every node and wire
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.wires.clear();
        self.diagnostics.clear();
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&dyn Node> {
        self.nodes.get(&node_id).map(NodeEntry::node)
    }

    /// Get a node entry (node plus sockets) by ID
    pub fn entry(&self, node_id: NodeId) -> Result<&NodeEntry> {
        self.nodes.get(&node_id).ok_or(GraphError::NodeNotFound(node_id))
    }

    fn entry_mut(&mut self, node_id: NodeId) -> Result<&mut NodeEntry> {
        self.nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))
    }

    /// Downcast a node to its concrete type
    pub fn node_as<T: Any>(&self, node_id: NodeId) -> Option<&T> {
        self.nodes.get(&node_id)?.node.as_any().downcast_ref()
    }

    /// Mutably downcast a node to its concrete type.
    ///
    /// Changes made this way do not propagate; use [`Graph::edit`] for that.
    pub fn node_as_mut<T: Any>(&mut self, node_id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(&node_id)?.node.as_any_mut().downcast_mut()
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeEntry)> {
        self.nodes.iter().map(|(id, entry)| (*id, entry))
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Position of a node in the saved order
    pub fn node_index(&self, node_id: NodeId) -> Option<usize> {
        self.nodes.get_index_of(&node_id)
    }

    /// Move a node on the canvas
    pub fn set_position(&mut self, node_id: NodeId, position: [f32; 2]) -> Result<()> {
        self.entry_mut(node_id)?.position = position;
        Ok(())
    }

    /// Get a wire by ID
    pub fn wire(&self, wire_id: WireId) -> Option<&Wire> {
        self.wires.get(&wire_id)
    }

    /// Get all wires
    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.values()
    }

    /// Get the number of wires
    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    /// Wire currently driving a sink
    pub fn sink_wire(&self, sink: SinkRef) -> Option<WireId> {
        self.nodes.get(&sink.node)?.sinks.get(sink.index)?.wire()
    }

    /// Wires leaving a source, in connection order
    pub fn source_wires(&self, source: SourceRef) -> Vec<WireId> {
        self.nodes
            .get(&source.node)
            .and_then(|entry| entry.sources.get(source.index))
            .map(|socket| socket.wires().collect())
            .unwrap_or_default()
    }

    /// Last local error recorded against a node
    pub fn diagnostic(&self, node_id: NodeId) -> Option<&NodeError> {
        self.diagnostics.get(&node_id)
    }

    /// All recorded diagnostics
    pub fn diagnostics(&self) -> impl Iterator<Item = (NodeId, &NodeError)> {
        self.diagnostics.iter().map(|(id, err)| (*id, err))
    }

    /// Whether following `node`'s sources forward reaches the node owning `candidate`
    pub fn sources_reach(&self, node: NodeId, candidate: SourceRef) -> bool {
        if node == candidate.node {
            return true;
        }
        let Some(entry) = self.nodes.get(&node) else {
            return false;
        };
        entry
            .sources
            .iter()
            .flat_map(|socket| socket.wires())
            .filter_map(|wire| self.wires.get(&wire))
            .any(|wire| {
                self.nodes.get(&wire.sink.node).is_some_and(|next| {
                    next.node.recursion_check(wire.sink.node, candidate, self)
                })
            })
    }

    /// Connect a source to a sink.
    ///
    /// A sink already driven by another wire drops that wire first.
    pub fn connect(&mut self, source: SourceRef, sink: SinkRef) -> Result<WireId> {
        let source_type = self
            .entry(source.node)?
            .sources
            .get(source.index)
            .ok_or(GraphError::SocketOutOfRange {
                node: source.node,
                what: "source",
                index: source.index,
            })?
            .socket_type;
        let sink_entry = self.entry(sink.node)?;
        let sink_socket = sink_entry
            .sinks
            .get(sink.index)
            .ok_or(GraphError::SocketOutOfRange {
                node: sink.node,
                what: "sink",
                index: sink.index,
            })?;

        if !sink_entry.node.sink_enabled(sink.index) {
            return Err(Rejection::SinkDisabled.into());
        }
        if !sink_socket.socket_type.accepts(source_type) {
            return Err(Rejection::TypeMismatch {
                source_type,
                sink_type: sink_socket.socket_type,
            }
            .into());
        }
        if sink_entry.node.recursion_check(sink.node, source, self) {
            return Err(Rejection::Cycle.into());
        }

        if let Some(old) = sink_socket.wire() {
            tracing::debug!(wire = ?old, sink = ?sink, "replacing wire on connected sink");
            self.disconnect_wire(old)?;
        }

        let wire = Wire::new(source, sink);
        let id = wire.id;
        self.wires.insert(id, wire);
        self.entry_mut(sink.node)?.sinks[sink.index].attach(id);
        self.entry_mut(source.node)?.sources[source.index].attach(id);
        tracing::debug!(wire = ?id, ?source, ?sink, "connected");

        self.entry_mut(sink.node)?.node.on_connect_sink(sink.index);
        let mut out = Emitter::new(source.node);
        self.entry_mut(source.node)?
            .node
            .on_connect_source(source.index, id, &mut out);
        self.flush(out)?;
        Ok(id)
    }

    /// Disconnect whatever wire drives `sink`; returns the removed wire
    pub fn disconnect_sink(&mut self, sink: SinkRef) -> Result<Option<WireId>> {
        let wire = self
            .entry(sink.node)?
            .sinks
            .get(sink.index)
            .ok_or(GraphError::SocketOutOfRange {
                node: sink.node,
                what: "sink",
                index: sink.index,
            })?
            .wire();
        match wire {
            Some(wire) => {
                self.disconnect_wire(wire)?;
                Ok(Some(wire))
            }
            None => Ok(None),
        }
    }

    /// Remove a wire, resetting the input it was feeding
    pub fn disconnect_wire(&mut self, wire_id: WireId) -> Result<()> {
        let wire = self
            .wires
            .shift_remove(&wire_id)
            .ok_or(GraphError::WireNotFound(wire_id))?;

        if let Some(source) = self.nodes.get_mut(&wire.source.node) {
            if let Some(socket) = source.sources.get_mut(wire.source.index) {
                socket.detach(wire_id);
            }
            source.node.on_disconnect_source(wire.source.index);
        }

        let sink = wire.sink;
        let entry = self.entry_mut(sink.node)?;
        let slot = entry
            .sinks
            .get_mut(sink.index)
            .ok_or(GraphError::SocketOutOfRange {
                node: sink.node,
                what: "sink",
                index: sink.index,
            })?;
        if slot.wire() == Some(wire_id) {
            slot.detach();
        }
        tracing::debug!(wire = ?wire_id, source = ?wire.source, ?sink, "disconnected");

        let mut out = Emitter::new(sink.node);
        let result = entry.node.reset_input(sink.index, &mut out);
        self.settle(sink.node, result, out)?;
        self.entry_mut(sink.node)?.node.on_disconnect_sink(sink.index);
        Ok(())
    }

    /// Write a value straight into a sink, as if it arrived over a wire.
    ///
    /// Local errors from the target node are returned as well as recorded.
    pub fn set_value(&mut self, sink: SinkRef, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let entry = self.entry_mut(sink.node)?;
        let mut out = Emitter::new(sink.node);
        let result = entry.node.set_value(&value, sink.index, NodeId::nil(), &mut out);
        self.settle_direct(sink.node, result, out)
    }

    /// Reset a sink directly
    pub fn reset_input(&mut self, sink: SinkRef) -> Result<()> {
        let entry = self.entry_mut(sink.node)?;
        let mut out = Emitter::new(sink.node);
        let result = entry.node.reset_input(sink.index, &mut out);
        self.settle_direct(sink.node, result, out)
    }

    /// Apply a user edit to a node and propagate its effects
    pub fn edit(&mut self, node_id: NodeId, edit: Edit) -> Result<()> {
        tracing::trace!(node = ?node_id, ?edit, "edit");
        let entry = self.entry_mut(node_id)?;
        let mut out = Emitter::new(node_id);
        let result = entry.node.apply(edit, &mut out);
        self.settle_direct(node_id, result, out)
    }

    /// Advance every node's clock
    pub fn tick(&mut self, time: f32, delta: f32) -> Result<()> {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            let Some(entry) = self.nodes.get_mut(&id) else {
                continue;
            };
            let mut out = Emitter::new(id);
            entry.node.tick(time, delta, &mut out);
            self.flush(out)?;
        }
        Ok(())
    }

    /// Mark a node as selected or not
    pub fn select(&mut self, node_id: NodeId, selected: bool) -> Result<()> {
        self.entry_mut(node_id)?.selected = selected;
        Ok(())
    }

    /// Deselect everything
    pub fn clear_selection(&mut self) {
        for entry in self.nodes.values_mut() {
            entry.selected = false;
        }
    }

    /// Selected nodes, in insertion order
    pub fn selected_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, entry)| entry.selected)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Remove every selected node
    pub fn remove_selected(&mut self) -> Result<Vec<NodeId>> {
        let selected = self.selected_ids();
        for id in &selected {
            self.remove_node(*id)?;
        }
        Ok(selected)
    }

    /// Outcome of a node call made on behalf of propagation: local errors
    /// become diagnostics and the node's emissions are dropped.
    fn settle(
        &mut self,
        node: NodeId,
        result: std::result::Result<(), NodeError>,
        out: Emitter,
    ) -> Result<()> {
        match result {
            Ok(()) => {
                self.diagnostics.shift_remove(&node);
                self.flush(out)
            }
            Err(source) if source.is_invariant_violation() => {
                Err(GraphError::Node { node, source })
            }
            Err(source) => {
                tracing::warn!(node = ?node, error = %source, "node rejected input");
                self.diagnostics.insert(node, source);
                Ok(())
            }
        }
    }

    /// Like [`Graph::settle`], but the caller also gets the node's error
    fn settle_direct(
        &mut self,
        node: NodeId,
        result: std::result::Result<(), NodeError>,
        out: Emitter,
    ) -> Result<()> {
        let err = result.as_ref().err().cloned();
        self.settle(node, result, out)?;
        match err {
            Some(source) => Err(GraphError::Node { node, source }),
            None => Ok(()),
        }
    }

    /// Carry out everything a node recorded during one call
    fn flush(&mut self, out: Emitter) -> Result<()> {
        if out.is_empty() {
            return Ok(());
        }
        let node = out.node();
        let (detached, emissions) = out.into_parts();
        for sink in detached {
            self.disconnect_sink(SinkRef::new(node, sink))?;
        }
        for emission in emissions {
            self.deliver(node, emission)?;
        }
        Ok(())
    }

    fn deliver(&mut self, node: NodeId, emission: Emission) -> Result<()> {
        let socket = self
            .entry(node)?
            .sources
            .get(emission.source)
            .ok_or(GraphError::SocketOutOfRange {
                node,
                what: "source",
                index: emission.source,
            })?;
        let targets: Vec<WireId> = match emission.wire {
            Some(wire) if socket.has_wire(wire) => vec![wire],
            Some(wire) => {
                return Err(GraphError::InvariantViolation(format!(
                    "wire {wire:?} does not leave source {} of {node:?}",
                    emission.source
                )))
            }
            None => socket.wires().collect(),
        };

        for wire_id in targets {
            // an earlier delivery may have detached this wire
            let Some(wire) = self.wires.get(&wire_id) else {
                continue;
            };
            let sink = wire.sink;
            let target = self.entry_mut(sink.node)?;
            let mut out = Emitter::new(sink.node);
            let result = match &emission.signal {
                Signal::Value(value) => {
                    tracing::trace!(wire = ?wire_id, %value, "propagating value");
                    target
                        .node
                        .set_value(value, sink.index, emission.originator, &mut out)
                }
                Signal::Reset => {
                    tracing::trace!(wire = ?wire_id, "propagating reset");
                    target.node.reset_input(sink.index, &mut out)
                }
            };
            self.settle(sink.node, result, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{InputNode, OutputNode};
    use crate::socket::SocketType;

    fn field(text: &str) -> Edit {
        Edit::Field {
            field: 0,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_add_and_remove_node() {
        let mut graph = Graph::new();
        let a = graph.add_node(NodeKind::Input, [0.0, 0.0]);
        let b = graph.add_node(NodeKind::Output, [100.0, 0.0]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.entry(b).unwrap().sinks()[0].socket_type, SocketType::Generic);

        graph.remove_node(a).unwrap();
        assert_eq!(graph.node_count(), 1);
        assert!(graph.node(a).is_none());
        assert!(matches!(
            graph.remove_node(a),
            Err(GraphError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_type_mismatch_leaves_graph_untouched() {
        let mut graph = Graph::new();
        let file = graph.add_node(NodeKind::File, [0.0, 0.0]);
        let series = graph.add_node(NodeKind::TimeSeries, [100.0, 0.0]);

        let err = graph
            .connect(SourceRef::new(file, 0), SinkRef::new(series, 0))
            .unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(graph.wire_count(), 0);
        assert!(graph.sink_wire(SinkRef::new(series, 0)).is_none());
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut graph = Graph::new();
        let inverter = graph.add_node(NodeKind::Inverter, [0.0, 0.0]);
        let err = graph
            .connect(SourceRef::new(inverter, 0), SinkRef::new(inverter, 0))
            .unwrap_err();
        assert_eq!(err, GraphError::Rejected(Rejection::Cycle));
    }

    #[test]
    fn test_bad_socket_index() {
        let mut graph = Graph::new();
        let input = graph.add_node(NodeKind::Input, [0.0, 0.0]);
        let output = graph.add_node(NodeKind::Output, [0.0, 0.0]);
        let err = graph
            .connect(SourceRef::new(input, 3), SinkRef::new(output, 0))
            .unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_fan_out_reaches_every_sink() {
        let mut graph = Graph::new();
        let input = graph.add_node(NodeKind::Input, [0.0, 0.0]);
        let left = graph.add_node(NodeKind::Output, [100.0, 0.0]);
        let right = graph.add_node(NodeKind::Output, [100.0, 50.0]);
        graph.connect(SourceRef::new(input, 0), SinkRef::new(left, 0)).unwrap();
        graph.connect(SourceRef::new(input, 0), SinkRef::new(right, 0)).unwrap();
        assert_eq!(graph.source_wires(SourceRef::new(input, 0)).len(), 2);

        graph.edit(input, field("2.5")).unwrap();
        for id in [left, right] {
            let output = graph.node_as::<OutputNode>(id).unwrap();
            assert_eq!(output.value(), Some(&Value::Decimal(2.5)));
        }
    }

    #[test]
    fn test_remove_node_with_fan_in_and_fan_out() {
        let mut graph = Graph::new();
        let input = graph.add_node(NodeKind::Input, [0.0, 0.0]);
        let middle = graph.add_node(NodeKind::Inverter, [100.0, 0.0]);
        let left = graph.add_node(NodeKind::Output, [200.0, 0.0]);
        let right = graph.add_node(NodeKind::Output, [200.0, 50.0]);
        graph.connect(SourceRef::new(input, 0), SinkRef::new(middle, 0)).unwrap();
        graph.connect(SourceRef::new(middle, 0), SinkRef::new(left, 0)).unwrap();
        graph.connect(SourceRef::new(middle, 0), SinkRef::new(right, 0)).unwrap();
        graph.connect(SourceRef::new(input, 0), SinkRef::new(right, 0)).unwrap();
        graph.edit(input, field("2")).unwrap();

        graph.remove_node(middle).unwrap();
        assert_eq!(graph.wire_count(), 1);
        assert!(graph.wires().all(|wire| !wire.involves_node(middle)));
        assert_eq!(graph.node_as::<OutputNode>(left).unwrap().value(), None);
        assert_eq!(
            graph.node_as::<OutputNode>(right).unwrap().value(),
            Some(&Value::Decimal(2.0))
        );
    }

    #[test]
    fn test_local_error_becomes_diagnostic() {
        let mut graph = Graph::new();
        let file = graph.add_node(NodeKind::File, [0.0, 0.0]);
        let math = graph.add_node(NodeKind::Arithmetic, [100.0, 0.0]);
        let output = graph.add_node(NodeKind::Output, [100.0, 50.0]);
        graph.connect(SourceRef::new(file, 0), SinkRef::new(math, 0)).unwrap();
        graph.connect(SourceRef::new(file, 0), SinkRef::new(output, 0)).unwrap();

        graph
            .edit(file, Edit::FileChosen(Some("notes.txt".into())))
            .unwrap();

        assert!(matches!(
            graph.diagnostic(math),
            Some(NodeError::Parse { .. })
        ));
        let shown = graph.node_as::<OutputNode>(output).unwrap();
        assert_eq!(shown.value(), Some(&Value::Text("notes.txt".to_string())));
    }

    #[test]
    fn test_direct_edit_returns_node_error() {
        let mut graph = Graph::new();
        let input = graph.add_node(NodeKind::Input, [0.0, 0.0]);
        let err = graph.edit(input, field("abc")).unwrap_err();
        assert!(matches!(err, GraphError::Node { node, .. } if node == input));
        assert!(graph.diagnostic(input).is_some());

        graph.edit(input, field("1")).unwrap();
        assert!(graph.diagnostic(input).is_none());
        assert_eq!(graph.node_as::<InputNode>(input).unwrap().value(), Some(1.0));
    }

    #[test]
    fn test_selection() {
        let mut graph = Graph::new();
        let a = graph.add_node(NodeKind::Input, [0.0, 0.0]);
        let b = graph.add_node(NodeKind::Output, [0.0, 0.0]);
        graph.connect(SourceRef::new(a, 0), SinkRef::new(b, 0)).unwrap();
        graph.select(a, true).unwrap();
        assert_eq!(graph.selected_ids(), vec![a]);

        graph.remove_selected().unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.wire_count(), 0);
        assert!(graph.sink_wire(SinkRef::new(b, 0)).is_none());
    }
}
