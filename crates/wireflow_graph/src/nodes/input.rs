// SPDX-License-Identifier: MIT OR Apache-2.0
//! Decimal entry field.

use super::{foreign, Term};
use crate::error::NodeError;
use crate::graph::Graph;
use crate::node::{Edit, Node, NodeId, NodeKind, NodeSaveData};
use crate::propagation::Emitter;
use crate::socket::{SocketType, SourceRef};
use crate::wire::WireId;
use std::any::Any;

const SOURCES: [SocketType; 1] = [SocketType::Decimal];

/// A number typed by the user, pushed down every outgoing wire
#[derive(Debug, Clone)]
pub struct InputNode {
    value: Term,
}

impl InputNode {
    /// Create an empty input
    pub fn new() -> Self {
        Self {
            value: Term::new(0.0),
        }
    }

    /// Current value, if one was entered
    pub fn value(&self) -> Option<f32> {
        self.value.value()
    }
}

impl Default for InputNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for InputNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Input
    }

    fn sinks(&self) -> &[SocketType] {
        &[]
    }

    fn sources(&self) -> &[SocketType] {
        &SOURCES
    }

    fn recursion_check(&self, _me: NodeId, _candidate: SourceRef, _graph: &Graph) -> bool {
        false
    }

    fn on_connect_source(&mut self, source: usize, wire: WireId, out: &mut Emitter) {
        match self.value.value() {
            Some(value) => out.emit_on(source, wire, value),
            None => out.reset_on(source, wire),
        }
    }

    fn apply(&mut self, edit: Edit, out: &mut Emitter) -> Result<(), NodeError> {
        match edit {
            Edit::Field { field: 0, text } => {
                if self.value.type_in(&text, NodeKind::Input)? {
                    out.emit(0, self.value.effective());
                } else {
                    out.reset(0);
                }
                Ok(())
            }
            Edit::Field { field, .. } => Err(foreign(NodeKind::Input, "field", field)),
            other => Err(NodeError::UnsupportedEdit {
                node: NodeKind::Input,
                edit: other.label(),
            }),
        }
    }

    fn display(&self) -> Option<String> {
        Some(self.value.text())
    }

    fn save_data(&self) -> NodeSaveData {
        NodeSaveData::Input {
            value: self.value.save(),
        }
    }

    fn load(&mut self, data: NodeSaveData) -> Result<(), NodeError> {
        match data {
            NodeSaveData::Input { value } => {
                self.value.load(value);
                Ok(())
            }
            other => Err(NodeError::MismatchedSaveData {
                node: NodeKind::Input,
                found: other.label(),
            }),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::Signal;
    use crate::value::Value;

    fn type_in(node: &mut InputNode, text: &str) -> (Result<(), NodeError>, Emitter) {
        let mut out = Emitter::new(NodeId::new());
        let result = node.apply(
            Edit::Field {
                field: 0,
                text: text.to_string(),
            },
            &mut out,
        );
        (result, out)
    }

    #[test]
    fn test_field_edits() {
        let mut node = InputNode::new();

        let (result, out) = type_in(&mut node, "4.25");
        assert!(result.is_ok());
        assert_eq!(out.emissions()[0].signal, Signal::Value(Value::Decimal(4.25)));

        let (result, out) = type_in(&mut node, "");
        assert!(result.is_ok());
        assert_eq!(out.emissions()[0].signal, Signal::Reset);
        assert_eq!(node.value(), None);

        let (result, out) = type_in(&mut node, "four");
        assert!(matches!(result, Err(NodeError::Parse { .. })));
        assert!(out.is_empty());
        assert_eq!(node.value(), None);
    }

    #[test]
    fn test_connect_pushes_only_down_new_wire() {
        let mut node = InputNode::new();
        type_in(&mut node, "3").0.unwrap();
        let wire = WireId::new();
        let mut out = Emitter::new(NodeId::new());
        node.on_connect_source(0, wire, &mut out);
        assert_eq!(out.emissions().len(), 1);
        assert_eq!(out.emissions()[0].wire, Some(wire));
    }

    #[test]
    fn test_save_round_trip() {
        let mut node = InputNode::new();
        type_in(&mut node, "-7.5").0.unwrap();
        let mut restored = InputNode::new();
        restored.load(node.save_data()).unwrap();
        assert_eq!(restored.value(), Some(-7.5));

        let mut empty = InputNode::new();
        empty.load(InputNode::new().save_data()).unwrap();
        assert_eq!(empty.value(), None);
    }
}
