// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for values, nodes and graph operations.

use crate::node::{NodeId, NodeKind};
use crate::socket::SocketType;
use crate::value::ValueKind;
use crate::wire::WireId;

/// User-entered text could not be turned into a number
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// Not a number at all
    #[error("'{text}' is not a number")]
    Format {
        /// The offending text
        text: String,
    },

    /// A number, but too large to represent
    #[error("'{text}' is out of range")]
    Overflow {
        /// The offending text
        text: String,
    },
}

/// Error raised by a node while handling a value or an edit
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NodeError {
    /// The node has no handling for this value tag
    #[error("{node} node was provided a {tag} value but doesn't know what to do with it")]
    UnsupportedValueType {
        /// Receiving node kind
        node: NodeKind,
        /// Tag of the value received
        tag: ValueKind,
    },

    /// Text could not be parsed as a number
    #[error("{node} node: {source}")]
    Parse {
        /// Node kind reporting the error
        node: NodeKind,
        /// Underlying parse failure
        #[source]
        source: ValueError,
    },

    /// The node does not accept this kind of edit
    #[error("{node} node does not support {edit}")]
    UnsupportedEdit {
        /// Node kind
        node: NodeKind,
        /// Short description of the edit
        edit: &'static str,
    },

    /// A selection index outside the node's option list
    #[error("{node} node has no option {index}")]
    UnknownOption {
        /// Node kind
        node: NodeKind,
        /// Requested index
        index: usize,
    },

    /// A socket or field index that the node does not own
    #[error("{node} node does not own {what} {index}")]
    ForeignSocket {
        /// Node kind
        node: NodeKind,
        /// "sink", "source" or "field"
        what: &'static str,
        /// Offending index
        index: usize,
    },

    /// Save data belongs to another node kind
    #[error("{node} node cannot load {found} save data")]
    MismatchedSaveData {
        /// Node kind being loaded
        node: NodeKind,
        /// Label of the save data received
        found: &'static str,
    },
}

impl NodeError {
    /// Whether this error signals a programming error rather than bad input.
    ///
    /// Invariant violations abort the whole graph operation.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::UnknownOption { .. } | Self::ForeignSocket { .. } | Self::MismatchedSaveData { .. }
        )
    }
}

/// Why a connection attempt was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Sink does not accept the source's type
    #[error("cannot connect a {source_type} source to a {sink_type} sink")]
    TypeMismatch {
        /// Declared type of the source
        source_type: SocketType,
        /// Declared type of the sink
        sink_type: SocketType,
    },

    /// The sink's node already feeds the source
    #[error("connection would create a cycle")]
    Cycle,

    /// The sink is currently disabled by its node
    #[error("sink is disabled")]
    SinkDisabled,
}

/// Error from a graph operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Connection negotiation failed; discard the candidate wire
    #[error("connection rejected: {0}")]
    Rejected(Rejection),

    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Wire not found
    #[error("Wire not found: {0:?}")]
    WireNotFound(WireId),

    /// Socket index outside the node's socket list
    #[error("{node:?} has no {what} socket {index}")]
    SocketOutOfRange {
        /// Node addressed
        node: NodeId,
        /// "sink" or "source"
        what: &'static str,
        /// Offending index
        index: usize,
    },

    /// A structural invariant does not hold
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A node failed while handling a value or edit
    #[error("node {node:?} failed: {source}")]
    Node {
        /// Node that failed
        node: NodeId,
        /// What went wrong
        #[source]
        source: NodeError,
    },
}

impl GraphError {
    /// Whether this is an ordinary negotiation outcome of `connect`
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Whether this error must abort the operation that raised it
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            Self::Rejected(_) => false,
            Self::Node { source, .. } => source.is_invariant_violation(),
            Self::NodeNotFound(_)
            | Self::WireNotFound(_)
            | Self::SocketOutOfRange { .. }
            | Self::InvariantViolation(_) => true,
        }
    }
}

impl From<Rejection> for GraphError {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let parse = NodeError::Parse {
            node: NodeKind::Arithmetic,
            source: ValueError::Format {
                text: "x".to_string(),
            },
        };
        assert!(!parse.is_invariant_violation());

        let foreign = NodeError::ForeignSocket {
            node: NodeKind::Output,
            what: "sink",
            index: 3,
        };
        assert!(foreign.is_invariant_violation());

        let err = GraphError::Node {
            node: NodeId::new(),
            source: foreign,
        };
        assert!(err.is_invariant_violation());
        assert!(!err.is_rejection());
        assert!(GraphError::Rejected(Rejection::Cycle).is_rejection());
    }

    #[test]
    fn test_messages() {
        let err = NodeError::UnsupportedValueType {
            node: NodeKind::TimeSeries,
            tag: ValueKind::Text,
        };
        assert_eq!(
            err.to_string(),
            "Time Series node was provided a text value but doesn't know what to do with it"
        );
    }
}
