// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scrolling step plot.

use super::foreign;
use crate::error::NodeError;
use crate::graph::Graph;
use crate::node::{Node, NodeId, NodeKind};
use crate::propagation::Emitter;
use crate::socket::{SocketType, SourceRef};
use crate::value::Value;
use std::any::Any;
use std::collections::VecDeque;

const SINKS: [SocketType; 1] = [SocketType::Decimal];

/// Maximum number of plot points kept
pub const PLOT_CAPACITY: usize = 2048;

/// Plots incoming values as a step line that scrolls left over time.
///
/// Every value adds two points at `x = 0`: one holding the previous level
/// and one at the new level. Ticks move every point but the newest left
/// by the elapsed time.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesNode {
    points: VecDeque<[f32; 2]>,
}

impl TimeSeriesNode {
    /// Create an empty plot
    pub fn new() -> Self {
        Self::default()
    }

    /// Plot points, oldest first
    pub fn points(&self) -> impl Iterator<Item = [f32; 2]> + '_ {
        self.points.iter().copied()
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the plot is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn push(&mut self, point: [f32; 2]) {
        if self.points.len() == PLOT_CAPACITY {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }
}

impl Node for TimeSeriesNode {
    fn kind(&self) -> NodeKind {
        NodeKind::TimeSeries
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
            return Err(foreign(NodeKind::TimeSeries, "sink", sink));
        }
        let &Value::Decimal(level) = value else {
            return Err(NodeError::UnsupportedValueType {
                node: NodeKind::TimeSeries,
                tag: value.kind(),
            });
        };
        let previous = self.points.back().map_or(level, |p| p[1]);
        self.push([0.0, previous]);
        self.push([0.0, level]);
        Ok(())
    }

    fn reset_input(&mut self, sink: usize, _out: &mut Emitter) -> Result<(), NodeError> {
        if sink != 0 {
            return Err(foreign(NodeKind::TimeSeries, "sink", sink));
        }
        self.points.clear();
        Ok(())
    }

    fn recursion_check(&self, _me: NodeId, _candidate: SourceRef, _graph: &Graph) -> bool {
        false
    }

    fn tick(&mut self, _time: f32, delta: f32, _out: &mut Emitter) {
        let moving = self.points.len().saturating_sub(1);
        for point in self.points.iter_mut().take(moving) {
            point[0] -= delta;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
