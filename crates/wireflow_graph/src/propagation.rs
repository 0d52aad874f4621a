// SPDX-License-Identifier: MIT OR Apache-2.0
//! Outgoing signals recorded by a node during a single call.
//!
//! Nodes never reach into the graph. Whatever a node wants to push downstream
//! is recorded on an [`Emitter`], and the graph flushes it synchronously as
//! soon as the node method returns. This keeps propagation depth-first while
//! the node itself is no longer borrowed.

use crate::node::NodeId;
use crate::value::Value;
use crate::wire::WireId;

/// What travels down a wire
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// A freshly computed value
    Value(Value),
    /// The source no longer has a valid value
    Reset,
}

/// One signal leaving one of the node's sources
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    /// Source index on the emitting node
    pub source: usize,
    /// Restrict delivery to this wire, or fan out to all wires when `None`
    pub wire: Option<WireId>,
    /// Payload
    pub signal: Signal,
    /// Node that started the update chain
    pub originator: NodeId,
}

/// Per-call buffer of a node's outgoing signals
#[derive(Debug)]
pub struct Emitter {
    node: NodeId,
    emissions: Vec<Emission>,
    detached: Vec<usize>,
}

impl Emitter {
    /// Create an empty emitter for `node`
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            emissions: Vec::new(),
            detached: Vec::new(),
        }
    }

    /// The node this emitter belongs to
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Send a value on every wire of `source`, originating here
    pub fn emit(&mut self, source: usize, value: impl Into<Value>) {
        self.push(source, None, Signal::Value(value.into()), self.node);
    }

    /// Send a value on one specific wire of `source`
    pub fn emit_on(&mut self, source: usize, wire: WireId, value: impl Into<Value>) {
        self.push(source, Some(wire), Signal::Value(value.into()), self.node);
    }

    /// Pass a value along on behalf of an upstream originator
    pub fn forward(&mut self, source: usize, value: impl Into<Value>, originator: NodeId) {
        self.push(source, None, Signal::Value(value.into()), originator);
    }

    /// Tell everything downstream of `source` that its value is gone
    pub fn reset(&mut self, source: usize) {
        self.push(source, None, Signal::Reset, self.node);
    }

    /// Reset only what sits behind one specific wire of `source`
    pub fn reset_on(&mut self, source: usize, wire: WireId) {
        self.push(source, Some(wire), Signal::Reset, self.node);
    }

    /// Ask the graph to disconnect whatever wire feeds one of this node's sinks
    pub fn detach_sink(&mut self, sink: usize) {
        if !self.detached.contains(&sink) {
            self.detached.push(sink);
        }
    }

    /// Recorded emissions, in order
    pub fn emissions(&self) -> &[Emission] {
        &self.emissions
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.emissions.is_empty() && self.detached.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<usize>, Vec<Emission>) {
        (self.detached, self.emissions)
    }

    fn push(&mut self, source: usize, wire: Option<WireId>, signal: Signal, originator: NodeId) {
        self.emissions.push(Emission {
            source,
            wire,
            signal,
            originator,
        });
    }
}
