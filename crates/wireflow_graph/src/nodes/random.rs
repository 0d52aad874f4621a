// SPDX-License-Identifier: MIT OR Apache-2.0
//! Random number source.

use crate::error::NodeError;
use crate::graph::Graph;
use crate::node::{Edit, Node, NodeId, NodeKind, NodeSaveData};
use crate::propagation::Emitter;
use crate::socket::{SocketType, SourceRef};
use crate::wire::WireId;
use std::any::Any;

const SOURCES: [SocketType; 1] = [SocketType::Decimal];

/// A uniform random number in `[0, 1)`, rerolled when its button is pressed
#[derive(Debug, Clone)]
pub struct RandomNode {
    current: f32,
}

impl RandomNode {
    /// Create a node holding a freshly rolled value
    pub fn new() -> Self {
        Self {
            current: rand::random::<f32>(),
        }
    }

    /// Current value
    pub fn current(&self) -> f32 {
        self.current
    }
}

impl Default for RandomNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for RandomNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Random
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
        out.emit_on(source, wire, self.current);
    }

    fn apply(&mut self, edit: Edit, out: &mut Emitter) -> Result<(), NodeError> {
        match edit {
            Edit::Press => {
                self.current = rand::random::<f32>();
                tracing::trace!(value = self.current, "rerolled");
                out.emit(0, self.current);
                Ok(())
            }
            other => Err(NodeError::UnsupportedEdit {
                node: NodeKind::Random,
                edit: other.label(),
            }),
        }
    }

    fn display(&self) -> Option<String> {
        Some(self.current.to_string())
    }

    fn save_data(&self) -> NodeSaveData {
        NodeSaveData::Random {
            current: self.current,
        }
    }

    fn load(&mut self, data: NodeSaveData) -> Result<(), NodeError> {
        match data {
            NodeSaveData::Random { current } => {
                self.current = current;
                Ok(())
            }
            other => Err(NodeError::MismatchedSaveData {
                node: NodeKind::Random,
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

    #[test]
    fn test_press_rerolls_in_range() {
        let mut node = RandomNode::new();
        for _ in 0..100 {
            let mut out = Emitter::new(NodeId::new());
            node.apply(Edit::Press, &mut out).unwrap();
            assert!((0.0..1.0).contains(&node.current()));
            assert_eq!(
                out.emissions()[0].signal,
                Signal::Value(Value::Decimal(node.current()))
            );
        }
    }

    #[test]
    fn test_save_round_trip() {
        let node = RandomNode::new();
        let mut restored = RandomNode::new();
        restored.load(node.save_data()).unwrap();
        assert_eq!(restored.current().to_bits(), node.current().to_bits());
    }

    #[test]
    fn test_rejects_field_edits() {
        let mut node = RandomNode::new();
        let mut out = Emitter::new(NodeId::new());
        let edit = Edit::Field {
            field: 0,
            text: "1".to_string(),
        };
        assert!(matches!(
            node.apply(edit, &mut out),
            Err(NodeError::UnsupportedEdit { .. })
        ));
    }
}
