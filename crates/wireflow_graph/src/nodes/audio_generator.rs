// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sine tone synthesis.

use super::{foreign, Term};
use crate::error::NodeError;
use crate::graph::Graph;
use crate::node::{Edit, Node, NodeId, NodeKind, NodeSaveData};
use crate::propagation::Emitter;
use crate::socket::{SocketType, SourceRef};
use crate::value::Value;
use std::any::Any;
use std::f64::consts::TAU;

const SINKS: [SocketType; 2] = [SocketType::Decimal, SocketType::Decimal];

/// Samples per second
pub const SAMPLE_RATE: u32 = 44_100;

const AMPLITUDE: usize = 0;
const FREQUENCY: usize = 1;

/// Synthesizes `sin(2π f t) * amplitude` into buffers handed over by the
/// audio device. Sink 0 is the amplitude, sink 1 the frequency in Hz.
#[derive(Debug, Clone)]
pub struct AudioGeneratorNode {
    terms: [Term; 2],
    position: u64,
}

impl AudioGeneratorNode {
    /// Create a full-scale 440 Hz generator
    pub fn new() -> Self {
        Self {
            terms: [Term::new(1.0), Term::new(440.0)],
            position: 0,
        }
    }

    /// Amplitude in use
    pub fn amplitude(&self) -> f32 {
        self.terms[AMPLITUDE].effective()
    }

    /// Frequency in use
    pub fn frequency(&self) -> f32 {
        self.terms[FREQUENCY].effective()
    }

    /// Sample index of the next rendered sample
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Fill `buffer` with the next samples
    pub fn render(&mut self, buffer: &mut [f32]) {
        // phase in f64; an f32 sample index stops counting past 2^24
        let step = TAU * f64::from(self.frequency()) / f64::from(SAMPLE_RATE);
        let amplitude = self.amplitude();
        for sample in buffer.iter_mut() {
            let phase = (step * self.position as f64) % TAU;
            *sample = phase.sin() as f32 * amplitude;
            self.position += 1;
        }
    }

    fn term_mut(&mut self, what: &'static str, index: usize) -> Result<&mut Term, NodeError> {
        self.terms
            .get_mut(index)
            .ok_or_else(|| foreign(NodeKind::AudioGenerator, what, index))
    }
}

impl Default for AudioGeneratorNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for AudioGeneratorNode {
    fn kind(&self) -> NodeKind {
        NodeKind::AudioGenerator
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
        self.term_mut("sink", sink)?
            .receive(value, NodeKind::AudioGenerator)?;
        Ok(())
    }

    fn reset_input(&mut self, sink: usize, _out: &mut Emitter) -> Result<(), NodeError> {
        self.term_mut("sink", sink)?.clear();
        Ok(())
    }

    fn recursion_check(&self, _me: NodeId, _candidate: SourceRef, _graph: &Graph) -> bool {
        false
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

    fn apply(&mut self, edit: Edit, _out: &mut Emitter) -> Result<(), NodeError> {
        match edit {
            Edit::Field { field, text } => {
                let term = self.term_mut("field", field)?;
                if !term.is_wired() {
                    term.type_in(&text, NodeKind::AudioGenerator)?;
                }
                Ok(())
            }
            other => Err(NodeError::UnsupportedEdit {
                node: NodeKind::AudioGenerator,
                edit: other.label(),
            }),
        }
    }

    fn display(&self) -> Option<String> {
        Some(format!("{} Hz x {}", self.frequency(), self.amplitude()))
    }

    fn save_data(&self) -> NodeSaveData {
        NodeSaveData::AudioGenerator {
            amplitude: self.terms[AMPLITUDE].save(),
            frequency: self.terms[FREQUENCY].save(),
        }
    }

    fn load(&mut self, data: NodeSaveData) -> Result<(), NodeError> {
        match data {
            NodeSaveData::AudioGenerator {
                amplitude,
                frequency,
            } => {
                self.terms[AMPLITUDE].load(amplitude);
                self.terms[FREQUENCY].load(frequency);
                Ok(())
            }
            other => Err(NodeError::MismatchedSaveData {
                node: NodeKind::AudioGenerator,
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

    #[test]
    fn test_defaults() {
        let node = AudioGeneratorNode::new();
        assert_eq!(node.amplitude(), 1.0);
        assert_eq!(node.frequency(), 440.0);
        assert_eq!(node.sinks(), &SINKS);
    }

    #[test]
    fn test_render_quarter_period() {
        let mut node = AudioGeneratorNode::new();
        let mut out = Emitter::new(NodeId::new());
        // 11025 Hz puts a peak on every fourth sample
        node.set_value(&Value::Decimal(11_025.0), FREQUENCY, NodeId::nil(), &mut out)
            .unwrap();
        node.set_value(&Value::Decimal(0.5), AMPLITUDE, NodeId::nil(), &mut out)
            .unwrap();

        let mut buffer = [0.0f32; 4];
        node.render(&mut buffer);
        assert!(buffer[0].abs() < 1e-6);
        assert!((buffer[1] - 0.5).abs() < 1e-5);
        assert!((buffer[3] + 0.5).abs() < 1e-5);
        assert_eq!(node.position(), 4);
    }

    #[test]
    fn test_render_stays_in_tune_after_long_playback() {
        let mut node = AudioGeneratorNode::new();
        let mut out = Emitter::new(NodeId::new());
        node.set_value(&Value::Decimal(11_025.0), FREQUENCY, NodeId::nil(), &mut out)
            .unwrap();

        // past 2^24 samples, about six minutes of audio
        let mut chunk = vec![0.0f32; 1 << 16];
        for _ in 0..257 {
            node.render(&mut chunk);
        }
        assert_eq!(node.position(), 257 << 16);

        let mut buffer = [0.0f32; 4];
        node.render(&mut buffer);
        assert!(buffer[0].abs() < 1e-4);
        assert!((buffer[1] - 1.0).abs() < 1e-4);
        assert!(buffer[2].abs() < 1e-4);
        assert!((buffer[3] + 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut node = AudioGeneratorNode::new();
        let mut out = Emitter::new(NodeId::new());
        node.set_value(&Value::Integer(220), FREQUENCY, NodeId::nil(), &mut out)
            .unwrap();
        node.reset_input(FREQUENCY, &mut out).unwrap();
        assert_eq!(node.frequency(), 440.0);
        assert!(node.reset_input(2, &mut out).unwrap_err().is_invariant_violation());
    }
}
