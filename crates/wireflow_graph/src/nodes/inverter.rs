// SPDX-License-Identifier: MIT OR Apache-2.0
//! Negation.

use super::foreign;
use crate::error::NodeError;
use crate::node::{Node, NodeId, NodeKind};
use crate::propagation::Emitter;
use crate::socket::SocketType;
use crate::value::Value;
use crate::wire::WireId;
use std::any::Any;

const SOCKETS: [SocketType; 1] = [SocketType::Decimal];

/// Emits the negation of its input, passing the originator along
#[derive(Debug, Clone, Default)]
pub struct InverterNode {
    value: Option<f32>,
}

impl InverterNode {
    /// Create an inverter with no input yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Last negated value
    pub fn value(&self) -> Option<f32> {
        self.value
    }
}

impl Node for InverterNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Inverter
    }

    fn sinks(&self) -> &[SocketType] {
        &SOCKETS
    }

    fn sources(&self) -> &[SocketType] {
        &SOCKETS
    }

    fn set_value(
        &mut self,
        value: &Value,
        sink: usize,
        originator: NodeId,
        out: &mut Emitter,
    ) -> Result<(), NodeError> {
        if sink != 0 {
            return Err(foreign(NodeKind::Inverter, "sink", sink));
        }
        if originator == out.node() {
            return Ok(());
        }
        self.value = None;
        let input = value.to_decimal().map_err(|source| NodeError::Parse {
            node: NodeKind::Inverter,
            source,
        })?;
        match input {
            Some(x) => {
                self.value = Some(-x);
                out.forward(0, -x, originator);
            }
            None => out.reset(0),
        }
        Ok(())
    }

    fn reset_input(&mut self, sink: usize, out: &mut Emitter) -> Result<(), NodeError> {
        if sink != 0 {
            return Err(foreign(NodeKind::Inverter, "sink", sink));
        }
        self.value = None;
        out.reset(0);
        Ok(())
    }

    fn on_connect_source(&mut self, source: usize, wire: WireId, out: &mut Emitter) {
        if let Some(value) = self.value {
            out.emit_on(source, wire, value);
        }
    }

    fn display(&self) -> Option<String> {
        self.value.map(|v| v.to_string())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
