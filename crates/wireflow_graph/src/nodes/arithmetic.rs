// SPDX-License-Identifier: MIT OR Apache-2.0
//! Two-term arithmetic.

use super::{foreign, Term};
use crate::error::NodeError;
use crate::node::{Edit, Node, NodeId, NodeKind, NodeSaveData};
use crate::propagation::Emitter;
use crate::socket::SocketType;
use crate::value::Value;
use crate::wire::WireId;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

const SINKS: [SocketType; 2] = [SocketType::Generic, SocketType::Generic];
const SOURCES: [SocketType; 1] = [SocketType::Decimal];

/// Arithmetic operation, in dropdown order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArithmeticOp {
    /// `a + b`
    #[default]
    Add,
    /// `a - b`
    Subtract,
    /// `a * b`
    Multiply,
    /// `a / b`
    Divide,
    /// `a % b`
    Modulo,
}

impl ArithmeticOp {
    /// All operations, in dropdown order
    pub const ALL: [ArithmeticOp; 5] = [
        ArithmeticOp::Add,
        ArithmeticOp::Subtract,
        ArithmeticOp::Multiply,
        ArithmeticOp::Divide,
        ArithmeticOp::Modulo,
    ];

    /// Operation at a dropdown index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Apply the operation. Division and modulo by zero follow IEEE 754.
    pub fn apply(&self, a: f32, b: f32) -> f32 {
        match self {
            ArithmeticOp::Add => a + b,
            ArithmeticOp::Subtract => a - b,
            ArithmeticOp::Multiply => a * b,
            ArithmeticOp::Divide => a / b,
            ArithmeticOp::Modulo => a % b,
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Subtract => "subtract",
            ArithmeticOp::Multiply => "multiply",
            ArithmeticOp::Divide => "divide",
            ArithmeticOp::Modulo => "modulo",
        };
        f.write_str(name)
    }
}

/// Combines two terms with an [`ArithmeticOp`].
///
/// Each term is typed into a field or driven by a wire; the field is
/// read-only while a wire is attached.
#[derive(Debug, Clone)]
pub struct ArithmeticNode {
    operation: ArithmeticOp,
    terms: [Term; 2],
}

impl ArithmeticNode {
    /// Create an adder with both terms unset
    pub fn new() -> Self {
        Self {
            operation: ArithmeticOp::default(),
            terms: [Term::new(0.0); 2],
        }
    }

    /// Selected operation
    pub fn operation(&self) -> ArithmeticOp {
        self.operation
    }

    /// Term at `index` (0 or 1)
    pub fn term(&self, index: usize) -> Option<&Term> {
        self.terms.get(index)
    }

    /// Result, when both terms are set
    pub fn result(&self) -> Option<f32> {
        match (self.terms[0].value(), self.terms[1].value()) {
            (Some(a), Some(b)) => Some(self.operation.apply(a, b)),
            _ => None,
        }
    }

    fn push_result(&self, out: &mut Emitter) {
        match self.result() {
            Some(result) => out.emit(0, result),
            None => out.reset(0),
        }
    }

    fn term_mut(&mut self, what: &'static str, index: usize) -> Result<&mut Term, NodeError> {
        self.terms
            .get_mut(index)
            .ok_or_else(|| foreign(NodeKind::Arithmetic, what, index))
    }
}

impl Default for ArithmeticNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for ArithmeticNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Arithmetic
    }

    fn sinks(&self) -> &[SocketType] {
        &SINKS
    }

    fn sources(&self) -> &[SocketType] {
        &SOURCES
    }

    fn set_value(
        &mut self,
        value: &Value,
        sink: usize,
        _originator: NodeId,
        out: &mut Emitter,
    ) -> Result<(), NodeError> {
        self.term_mut("sink", sink)?
            .receive(value, NodeKind::Arithmetic)?;
        self.push_result(out);
        Ok(())
    }

    fn reset_input(&mut self, sink: usize, out: &mut Emitter) -> Result<(), NodeError> {
        self.term_mut("sink", sink)?.clear();
        out.reset(0);
        Ok(())
    }

    fn on_connect_sink(&mut self, sink: usize) {
        if let Some(term) = self.terms.get_mut(sink) {
            term.set_wired(true);
        }
    }

    fn on_disconnect_sink(&mut self, sink: usize) {
        if let Some(term) = self.terms.get_mut(sink) {
            term.set_wired(false);
        }
    }

    fn on_connect_source(&mut self, source: usize, wire: WireId, out: &mut Emitter) {
        if let Some(result) = self.result() {
            out.emit_on(source, wire, result);
        }
    }

    fn apply(&mut self, edit: Edit, out: &mut Emitter) -> Result<(), NodeError> {
        match edit {
            Edit::Field { field, text } => {
                let term = self.term_mut("field", field)?;
                if term.is_wired() {
                    tracing::trace!(field, "ignoring edit of wired field");
                    return Ok(());
                }
                term.type_in(&text, NodeKind::Arithmetic)?;
                self.push_result(out);
                Ok(())
            }
            Edit::Select(index) => {
                self.operation = ArithmeticOp::from_index(index).ok_or(NodeError::UnknownOption {
                    node: NodeKind::Arithmetic,
                    index,
                })?;
                if let Some(result) = self.result() {
                    out.emit(0, result);
                }
                Ok(())
            }
            other => Err(NodeError::UnsupportedEdit {
                node: NodeKind::Arithmetic,
                edit: other.label(),
            }),
        }
    }

    fn display(&self) -> Option<String> {
        Some(format!(
            "{} {} {}",
            self.terms[0].text(),
            self.operation,
            self.terms[1].text()
        ))
    }

    fn save_data(&self) -> NodeSaveData {
        NodeSaveData::Arithmetic {
            operation: self.operation,
            first: self.terms[0].save(),
            second: self.terms[1].save(),
        }
    }

    fn load(&mut self, data: NodeSaveData) -> Result<(), NodeError> {
        match data {
            NodeSaveData::Arithmetic {
                operation,
                first,
                second,
            } => {
                self.operation = operation;
                self.terms[0].load(first);
                self.terms[1].load(second);
                Ok(())
            }
            other => Err(NodeError::MismatchedSaveData {
                node: NodeKind::Arithmetic,
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
