// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket definitions for node inputs (sinks) and outputs (sources).

use crate::node::NodeId;
use crate::wire::WireId;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared data type of a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketType {
    /// Integer value
    Integer,
    /// Floating point value
    Decimal,
    /// String value
    Text,
    /// Any type (sinks only make sense here)
    Generic,
}

impl SocketType {
    /// Check whether a sink of this type accepts a source of `source`
    pub fn accepts(&self, source: SocketType) -> bool {
        *self == source || *self == Self::Generic
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Text => "text",
            Self::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Address of a sink socket: owning node plus position in its sink list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SinkRef {
    /// Owning node
    pub node: NodeId,
    /// Index in the node's sink list
    pub index: usize,
}

impl SinkRef {
    /// Create a new sink reference
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

/// Address of a source socket: owning node plus position in its source list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// Owning node
    pub node: NodeId,
    /// Index in the node's source list
    pub index: usize,
}

impl SourceRef {
    /// Create a new source reference
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

/// An input socket; holds at most one incoming wire
#[derive(Debug, Clone)]
pub struct SinkSocket {
    /// Declared type
    pub socket_type: SocketType,
    wire: Option<WireId>,
}

impl SinkSocket {
    /// Create an unconnected sink
    pub fn new(socket_type: SocketType) -> Self {
        Self {
            socket_type,
            wire: None,
        }
    }

    /// The incoming wire, if any
    pub fn wire(&self) -> Option<WireId> {
        self.wire
    }

    /// Whether a wire is attached
    pub fn is_connected(&self) -> bool {
        self.wire.is_some()
    }

    pub(crate) fn attach(&mut self, wire: WireId) -> Option<WireId> {
        self.wire.replace(wire)
    }

    pub(crate) fn detach(&mut self) -> Option<WireId> {
        self.wire.take()
    }
}

/// An output socket; fans out to any number of wires
#[derive(Debug, Clone)]
pub struct SourceSocket {
    /// Declared type
    pub socket_type: SocketType,
    wires: IndexSet<WireId>,
}

impl SourceSocket {
    /// Create an unconnected source
    pub fn new(socket_type: SocketType) -> Self {
        Self {
            socket_type,
            wires: IndexSet::new(),
        }
    }

    /// Outgoing wires, in connection order
    pub fn wires(&self) -> impl Iterator<Item = WireId> + '_ {
        self.wires.iter().copied()
    }

    /// Whether this source feeds the given wire
    pub fn has_wire(&self, wire: WireId) -> bool {
        self.wires.contains(&wire)
    }

    /// Number of outgoing wires
    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    /// Whether any wire is attached
    pub fn is_connected(&self) -> bool {
        !self.wires.is_empty()
    }

    pub(crate) fn attach(&mut self, wire: WireId) {
        self.wires.insert(wire);
    }

    pub(crate) fn detach(&mut self, wire: WireId) -> bool {
        self.wires.shift_remove(&wire)
    }
}
