// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value display.

use super::foreign;
use crate::error::NodeError;
use crate::graph::Graph;
use crate::node::{Node, NodeId, NodeKind};
use crate::propagation::Emitter;
use crate::socket::{SocketType, SourceRef};
use crate::value::Value;
use std::any::Any;

const SINKS: [SocketType; 1] = [SocketType::Generic];

/// Text shown while nothing valid is connected
pub const UNDEFINED: &str = "undef";

/// Shows whatever arrives at its single generic sink
#[derive(Debug, Clone)]
pub struct OutputNode {
    value: Option<Value>,
    text: String,
    updates: usize,
}

impl OutputNode {
    /// Create an output showing nothing
    pub fn new() -> Self {
        Self {
            value: None,
            text: String::new(),
            updates: 0,
        }
    }

    /// Last value received
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Displayed text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of values and resets received
    pub fn updates(&self) -> usize {
        self.updates
    }
}

impl Default for OutputNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for OutputNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Output
    }

    fn sinks(&self) -> &[SocketType] {
        &SINKS
    }

    fn sources(&self) -> &[SocketType] {
        &[]
    }

    fn set_value(
        &mut self,
        value: &Value,
        sink: usize,
        _originator: NodeId,
        _out: &mut Emitter,
    ) -> Result<(), NodeError> {
        if sink != 0 {
            return Err(foreign(NodeKind::Output, "sink", sink));
        }
        self.text = value.to_string();
        self.value = Some(value.clone());
        self.updates += 1;
        Ok(())
    }

    fn reset_input(&mut self, sink: usize, _out: &mut Emitter) -> Result<(), NodeError> {
        if sink != 0 {
            return Err(foreign(NodeKind::Output, "sink", sink));
        }
        self.text = UNDEFINED.to_string();
        self.value = None;
        self.updates += 1;
        Ok(())
    }

    fn recursion_check(&self, _me: NodeId, _candidate: SourceRef, _graph: &Graph) -> bool {
        false
    }

    fn display(&self) -> Option<String> {
        Some(self.text.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
