// SPDX-License-Identifier: MIT OR Apache-2.0
//! Periodic ramp driven by the frame clock.

use super::{foreign, Term};
use crate::error::NodeError;
use crate::node::{Edit, Node, NodeId, NodeKind, NodeSaveData};
use crate::propagation::Emitter;
use crate::socket::SocketType;
use crate::value::Value;
use std::any::Any;

const SOCKETS: [SocketType; 1] = [SocketType::Decimal];

/// Frequency used while none is set
pub const DEFAULT_FREQUENCY: f32 = 1.0;

/// Emits `time % (1 / frequency)` every tick
#[derive(Debug, Clone)]
pub struct ClockNode {
    frequency: Term,
}

impl ClockNode {
    /// Create a 1 Hz clock
    pub fn new() -> Self {
        Self {
            frequency: Term::new(DEFAULT_FREQUENCY),
        }
    }

    /// Frequency in use
    pub fn frequency(&self) -> f32 {
        self.frequency.effective()
    }

    /// Ramp value at `time`
    pub fn sample(&self, time: f32) -> f32 {
        time % (1.0 / self.frequency())
    }
}

impl Default for ClockNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for ClockNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Clock
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
        _originator: NodeId,
        _out: &mut Emitter,
    ) -> Result<(), NodeError> {
        if sink != 0 {
            return Err(foreign(NodeKind::Clock, "sink", sink));
        }
        self.frequency.receive(value, NodeKind::Clock)?;
        Ok(())
    }

    fn reset_input(&mut self, sink: usize, _out: &mut Emitter) -> Result<(), NodeError> {
        if sink != 0 {
            return Err(foreign(NodeKind::Clock, "sink", sink));
        }
        self.frequency.clear();
        Ok(())
    }

    fn on_connect_sink(&mut self, _sink: usize) {
        self.frequency.set_wired(true);
    }

    fn on_disconnect_sink(&mut self, _sink: usize) {
        self.frequency.set_wired(false);
    }

    fn apply(&mut self, edit: Edit, _out: &mut Emitter) -> Result<(), NodeError> {
        match edit {
            Edit::Field { field: 0, text } => {
                if !self.frequency.is_wired() {
                    self.frequency.type_in(&text, NodeKind::Clock)?;
                }
                Ok(())
            }
            Edit::Field { field, .. } => Err(foreign(NodeKind::Clock, "field", field)),
            other => Err(NodeError::UnsupportedEdit {
                node: NodeKind::Clock,
                edit: other.label(),
            }),
        }
    }

    fn tick(&mut self, time: f32, _delta: f32, out: &mut Emitter) {
        out.emit(0, self.sample(time));
    }

    fn display(&self) -> Option<String> {
        Some(format!("{} Hz", self.frequency()))
    }

    fn save_data(&self) -> NodeSaveData {
        NodeSaveData::Clock {
            frequency: self.frequency.save(),
        }
    }

    fn load(&mut self, data: NodeSaveData) -> Result<(), NodeError> {
        match data {
            NodeSaveData::Clock { frequency } => {
                self.frequency.load(frequency);
                Ok(())
            }
            other => Err(NodeError::MismatchedSaveData {
                node: NodeKind::Clock,
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
