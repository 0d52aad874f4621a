// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node kinds.

mod arithmetic;
mod audio_generator;
mod clock;
mod file;
mod input;
mod inverter;
mod math_function;
mod output;
mod random;
mod time_series;

pub use arithmetic::{ArithmeticNode, ArithmeticOp};
pub use audio_generator::{AudioGeneratorNode, SAMPLE_RATE};
pub use clock::{ClockNode, DEFAULT_FREQUENCY};
pub use file::{FileFilter, FileNode};
pub use input::InputNode;
pub use inverter::InverterNode;
pub use math_function::{MathFunction, MathFunctionNode};
pub use output::{OutputNode, UNDEFINED};
pub use random::RandomNode;
pub use time_series::{TimeSeriesNode, PLOT_CAPACITY};

use crate::error::NodeError;
use crate::node::{FieldSave, NodeKind};
use crate::value::{parse_decimal, Value};

/// A decimal field that is either typed in or driven by a wire.
///
/// The value is `None` until something sets it; reads fall back to the
/// field's default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    value: Option<f32>,
    default: f32,
    wired: bool,
}

impl Term {
    /// Create an unset term with a fallback value
    pub const fn new(default: f32) -> Self {
        Self {
            value: None,
            default,
            wired: false,
        }
    }

    /// The set value, if any
    pub fn value(&self) -> Option<f32> {
        self.value
    }

    /// The set value, or the default
    pub fn effective(&self) -> f32 {
        self.value.unwrap_or(self.default)
    }

    /// Whether a value was supplied
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Whether a wire drives this term; the field is read-only while it does
    pub fn is_wired(&self) -> bool {
        self.wired
    }

    /// Text shown in the field
    pub fn text(&self) -> String {
        self.value.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    pub(crate) fn set_wired(&mut self, wired: bool) {
        self.wired = wired;
    }

    pub(crate) fn clear(&mut self) {
        self.value = None;
    }

    /// Take a value arriving over a wire. The term is unset first, so a
    /// failed parse leaves it unset. Returns whether a value was stored.
    pub(crate) fn receive(&mut self, value: &Value, node: NodeKind) -> Result<bool, NodeError> {
        self.value = None;
        self.value = value
            .to_decimal()
            .map_err(|source| NodeError::Parse { node, source })?;
        Ok(self.value.is_some())
    }

    /// Take text typed into the field
    pub(crate) fn type_in(&mut self, text: &str, node: NodeKind) -> Result<bool, NodeError> {
        self.value = None;
        self.value = parse_decimal(text).map_err(|source| NodeError::Parse { node, source })?;
        Ok(self.value.is_some())
    }

    pub(crate) fn save(&self) -> FieldSave {
        FieldSave {
            value: self.effective(),
            is_set: self.is_set(),
        }
    }

    pub(crate) fn load(&mut self, saved: FieldSave) {
        self.value = saved.is_set.then_some(saved.value);
    }
}

fn foreign(node: NodeKind, what: &'static str, index: usize) -> NodeError {
    NodeError::ForeignSocket { node, what, index }
}
