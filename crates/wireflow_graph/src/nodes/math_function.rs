// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unary and binary math functions.

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

/// Function applied by a [`MathFunctionNode`], in dropdown order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MathFunction {
    /// Sine
    #[default]
    Sin,
    /// Cosine
    Cos,
    /// Tangent
    Tan,
    /// Arcsine
    Asin,
    /// Arccosine
    Acos,
    /// Arctangent
    Atan,
    /// Degrees to radians
    DegToRad,
    /// Radians to degrees
    RadToDeg,
    /// `1` for non-negative input, `-1` otherwise
    Sign,
    /// Round to nearest, ties to even
    Round,
    /// `a` raised to `b`
    Pow,
    /// Smaller of the two
    Min,
    /// Larger of the two
    Max,
    /// Four-quadrant arctangent of `a / b`
    Atan2,
    /// `a + b`
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

impl MathFunction {
    /// All functions, in dropdown order
    pub const ALL: [MathFunction; 19] = [
        MathFunction::Sin,
        MathFunction::Cos,
        MathFunction::Tan,
        MathFunction::Asin,
        MathFunction::Acos,
        MathFunction::Atan,
        MathFunction::DegToRad,
        MathFunction::RadToDeg,
        MathFunction::Sign,
        MathFunction::Round,
        MathFunction::Pow,
        MathFunction::Min,
        MathFunction::Max,
        MathFunction::Atan2,
        MathFunction::Add,
        MathFunction::Subtract,
        MathFunction::Multiply,
        MathFunction::Divide,
        MathFunction::Modulo,
    ];

    /// Function at a dropdown index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Whether the function ignores its second term
    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            MathFunction::Sin
                | MathFunction::Cos
                | MathFunction::Tan
                | MathFunction::Asin
                | MathFunction::Acos
                | MathFunction::Atan
                | MathFunction::DegToRad
                | MathFunction::RadToDeg
                | MathFunction::Sign
                | MathFunction::Round
        )
    }

    /// Evaluate; `b` is ignored by unary functions
    pub fn evaluate(&self, a: f32, b: f32) -> f32 {
        match self {
            MathFunction::Sin => a.sin(),
            MathFunction::Cos => a.cos(),
            MathFunction::Tan => a.tan(),
            MathFunction::Asin => a.asin(),
            MathFunction::Acos => a.acos(),
            MathFunction::Atan => a.atan(),
            MathFunction::DegToRad => a.to_radians(),
            MathFunction::RadToDeg => a.to_degrees(),
            MathFunction::Sign => {
                if a >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            MathFunction::Round => a.round_ties_even(),
            MathFunction::Pow => a.powf(b),
            MathFunction::Min => a.min(b),
            MathFunction::Max => a.max(b),
            MathFunction::Atan2 => a.atan2(b),
            MathFunction::Add => a + b,
            MathFunction::Subtract => a - b,
            MathFunction::Multiply => a * b,
            MathFunction::Divide => a / b,
            MathFunction::Modulo => a % b,
        }
    }
}

impl fmt::Display for MathFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MathFunction::Sin => "sin",
            MathFunction::Cos => "cos",
            MathFunction::Tan => "tan",
            MathFunction::Asin => "asin",
            MathFunction::Acos => "acos",
            MathFunction::Atan => "atan",
            MathFunction::DegToRad => "deg2rad",
            MathFunction::RadToDeg => "rad2deg",
            MathFunction::Sign => "sign",
            MathFunction::Round => "round",
            MathFunction::Pow => "pow",
            MathFunction::Min => "min",
            MathFunction::Max => "max",
            MathFunction::Atan2 => "atan2",
            MathFunction::Add => "add",
            MathFunction::Subtract => "subtract",
            MathFunction::Multiply => "multiply",
            MathFunction::Divide => "divide",
            MathFunction::Modulo => "modulo",
        };
        f.write_str(name)
    }
}

/// Applies a [`MathFunction`] to one or two terms.
///
/// While a unary function is selected the second sink is disabled and any
/// wire on it is detached.
#[derive(Debug, Clone)]
pub struct MathFunctionNode {
    function: MathFunction,
    terms: [Term; 2],
}

impl MathFunctionNode {
    /// Create a node computing `sin` with no input
    pub fn new() -> Self {
        Self {
            function: MathFunction::default(),
            terms: [Term::new(0.0); 2],
        }
    }

    /// Selected function
    pub fn function(&self) -> MathFunction {
        self.function
    }

    /// Term at `index` (0 or 1)
    pub fn term(&self, index: usize) -> Option<&Term> {
        self.terms.get(index)
    }

    /// Result, when every term the function needs is set
    pub fn result(&self) -> Option<f32> {
        let a = self.terms[0].value()?;
        if self.function.is_unary() {
            return Some(self.function.evaluate(a, 0.0));
        }
        let b = self.terms[1].value()?;
        Some(self.function.evaluate(a, b))
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
            .ok_or_else(|| foreign(NodeKind::MathFunction, what, index))
    }
}

impl Default for MathFunctionNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for MathFunctionNode {
    fn kind(&self) -> NodeKind {
        NodeKind::MathFunction
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
            .receive(value, NodeKind::MathFunction)?;
        self.push_result(out);
        Ok(())
    }

    fn reset_input(&mut self, sink: usize, out: &mut Emitter) -> Result<(), NodeError> {
        self.term_mut("sink", sink)?.clear();
        self.push_result(out);
        Ok(())
    }

    fn sink_enabled(&self, sink: usize) -> bool {
        match sink {
            0 => true,
            1 => !self.function.is_unary(),
            _ => false,
        }
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
                term.type_in(&text, NodeKind::MathFunction)?;
                self.push_result(out);
                Ok(())
            }
            Edit::Select(index) => {
                self.function = MathFunction::from_index(index).ok_or(NodeError::UnknownOption {
                    node: NodeKind::MathFunction,
                    index,
                })?;
                if self.function.is_unary() && self.terms[1].is_wired() {
                    // resetting the detached sink pushes the new result
                    out.detach_sink(1);
                } else {
                    self.push_result(out);
                }
                Ok(())
            }
            other => Err(NodeError::UnsupportedEdit {
                node: NodeKind::MathFunction,
                edit: other.label(),
            }),
        }
    }

    fn display(&self) -> Option<String> {
        let first = self.terms[0].text();
        Some(if self.function.is_unary() {
            format!("{}({first})", self.function)
        } else {
            format!("{}({first}, {})", self.function, self.terms[1].text())
        })
    }

    fn save_data(&self) -> NodeSaveData {
        NodeSaveData::MathFunction {
            function: self.function,
            first: self.terms[0].save(),
            second: self.terms[1].save(),
        }
    }

    fn load(&mut self, data: NodeSaveData) -> Result<(), NodeError> {
        match data {
            NodeSaveData::MathFunction {
                function,
                first,
                second,
            } => {
                self.function = function;
                self.terms[0].load(first);
                self.terms[1].load(second);
                Ok(())
            }
            other => Err(NodeError::MismatchedSaveData {
                node: NodeKind::MathFunction,
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
