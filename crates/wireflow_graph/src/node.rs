// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node contract and node kind definitions.

use crate::error::NodeError;
use crate::graph::Graph;
use crate::nodes::{
    ArithmeticNode, ArithmeticOp, AudioGeneratorNode, ClockNode, FileNode, InputNode,
    InverterNode, MathFunction, MathFunctionNode, OutputNode, RandomNode, TimeSeriesNode,
};
use crate::propagation::Emitter;
use crate::socket::{SocketType, SourceRef};
use crate::value::Value;
use crate::wire::WireId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The originator of writes that come from outside the graph
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Value producers (fields, generators)
    Input,
    /// Value consumers (displays, plots, speakers)
    Output,
    /// Math operations
    Math,
    /// Time-driven nodes
    Signal,
    /// Files and other utilities
    Utility,
}

/// Every node kind the editor can place on the canvas.
///
/// The kind fixes the node's socket layout, which is what makes socket
/// indices in saved graphs meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Decimal entry field
    Input,
    /// Negates its input
    Inverter,
    /// Displays whatever arrives
    Output,
    /// Uniform random number
    Random,
    /// Two-term arithmetic
    Arithmetic,
    /// Periodic ramp
    Clock,
    /// Scrolling plot
    TimeSeries,
    /// Trigonometry and friends
    MathFunction,
    /// Sine tone
    AudioGenerator,
    /// File picker
    File,
}

impl NodeKind {
    /// All kinds, in menu order
    pub fn all() -> &'static [NodeKind] {
        &[
            NodeKind::Input,
            NodeKind::Inverter,
            NodeKind::Output,
            NodeKind::Random,
            NodeKind::Arithmetic,
            NodeKind::Clock,
            NodeKind::TimeSeries,
            NodeKind::MathFunction,
            NodeKind::AudioGenerator,
            NodeKind::File,
        ]
    }

    /// Static description of this kind
    pub fn descriptor(&self) -> NodeDescriptor {
        match self {
            NodeKind::Input => NodeDescriptor {
                kind: *self,
                name: "Input",
                category: NodeCategory::Input,
                description: "A decimal number typed by the user",
                create: || Box::new(InputNode::new()),
            },
            NodeKind::Inverter => NodeDescriptor {
                kind: *self,
                name: "Inverter",
                category: NodeCategory::Math,
                description: "Negates the incoming value",
                create: || Box::new(InverterNode::new()),
            },
            NodeKind::Output => NodeDescriptor {
                kind: *self,
                name: "Output",
                category: NodeCategory::Output,
                description: "Shows the incoming value",
                create: || Box::new(OutputNode::new()),
            },
            NodeKind::Random => NodeDescriptor {
                kind: *self,
                name: "Random",
                category: NodeCategory::Input,
                description: "A random number between 0 and 1, rerolled on demand",
                create: || Box::new(RandomNode::new()),
            },
            NodeKind::Arithmetic => NodeDescriptor {
                kind: *self,
                name: "Arithmetic",
                category: NodeCategory::Math,
                description: "Adds, subtracts, multiplies, divides or takes the modulo of two terms",
                create: || Box::new(ArithmeticNode::new()),
            },
            NodeKind::Clock => NodeDescriptor {
                kind: *self,
                name: "Clock",
                category: NodeCategory::Signal,
                description: "Ramps from 0 to its period, over and over",
                create: || Box::new(ClockNode::new()),
            },
            NodeKind::TimeSeries => NodeDescriptor {
                kind: *self,
                name: "Time Series",
                category: NodeCategory::Output,
                description: "Plots incoming values against time",
                create: || Box::new(TimeSeriesNode::new()),
            },
            NodeKind::MathFunction => NodeDescriptor {
                kind: *self,
                name: "Math Function",
                category: NodeCategory::Math,
                description: "Applies a unary or binary math function",
                create: || Box::new(MathFunctionNode::new()),
            },
            NodeKind::AudioGenerator => NodeDescriptor {
                kind: *self,
                name: "Audio Generator",
                category: NodeCategory::Output,
                description: "Synthesizes a sine tone",
                create: || Box::new(AudioGeneratorNode::new()),
            },
            NodeKind::File => NodeDescriptor {
                kind: *self,
                name: "File",
                category: NodeCategory::Utility,
                description: "Chooses a file and passes its path along",
                create: || Box::new(FileNode::new()),
            },
        }
    }

    /// Instantiate a fresh node of this kind
    pub fn create(&self) -> Box<dyn Node> {
        (self.descriptor().create)()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

/// Node type definition
#[derive(Debug, Clone, Copy)]
pub struct NodeDescriptor {
    /// Kind described
    pub kind: NodeKind,
    /// Display name
    pub name: &'static str,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: &'static str,
    /// Constructor
    pub create: fn() -> Box<dyn Node>,
}

/// Registry of available node types
pub struct NodeRegistry {
    /// Registered node types by kind
    types: IndexMap<NodeKind, NodeDescriptor>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Create a registry holding every built-in kind
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for kind in NodeKind::all() {
            registry.register(kind.descriptor());
        }
        registry
    }

    /// Register a node type
    pub fn register(&mut self, descriptor: NodeDescriptor) {
        self.types.insert(descriptor.kind, descriptor);
    }

    /// Get a node type by kind
    pub fn get(&self, kind: NodeKind) -> Option<&NodeDescriptor> {
        self.types.get(&kind)
    }

    /// Look a node type up by its display name, ignoring case and spaces
    pub fn find(&self, name: &str) -> Option<&NodeDescriptor> {
        let wanted = normalize_name(name);
        self.types
            .values()
            .find(|descriptor| normalize_name(descriptor.name) == wanted)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.types.values()
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeDescriptor> {
        self.types.values().filter(move |t| t.category == category)
    }

    /// Create a node from a kind
    pub fn create_node(&self, kind: NodeKind) -> Option<Box<dyn Node>> {
        self.get(kind).map(|descriptor| (descriptor.create)())
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// A user-facing change made directly on a node's widgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Edit {
    /// Text typed into one of the node's fields
    Field {
        /// Field index, in the node's field order
        field: usize,
        /// New field contents
        text: String,
    },
    /// A dropdown option was picked
    Select(usize),
    /// The node's button was pressed
    Press,
    /// A file choice finished; `None` when cancelled
    FileChosen(Option<PathBuf>),
    /// The node's close/clear control was used
    Clear,
}

impl Edit {
    /// Short description for diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            Edit::Field { .. } => "field edits",
            Edit::Select(_) => "option selection",
            Edit::Press => "button presses",
            Edit::FileChosen(_) => "file choices",
            Edit::Clear => "clearing",
        }
    }
}

/// Saved state of a single decimal field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSave {
    /// Raw value (the default when unset)
    pub value: f32,
    /// Whether the value was supplied
    pub is_set: bool,
}

/// Per-kind serializable node state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeSaveData {
    /// Kinds without persistent state
    None,
    /// Input node
    Input {
        /// Entry field
        value: FieldSave,
    },
    /// Random node
    Random {
        /// Last rolled value
        current: f32,
    },
    /// Arithmetic node
    Arithmetic {
        /// Selected operation
        operation: ArithmeticOp,
        /// First term
        first: FieldSave,
        /// Second term
        second: FieldSave,
    },
    /// Math function node
    MathFunction {
        /// Selected function
        function: MathFunction,
        /// First term
        first: FieldSave,
        /// Second term
        second: FieldSave,
    },
    /// Clock node
    Clock {
        /// Frequency field
        frequency: FieldSave,
    },
    /// Audio generator node
    AudioGenerator {
        /// Amplitude field
        amplitude: FieldSave,
        /// Frequency field
        frequency: FieldSave,
    },
    /// File node
    File {
        /// Chosen path, empty when unset
        filename: String,
        /// Whether a file was chosen
        is_set: bool,
    },
}

impl NodeSaveData {
    /// Name of the variant, for diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            NodeSaveData::None => "empty",
            NodeSaveData::Input { .. } => "Input",
            NodeSaveData::Random { .. } => "Random",
            NodeSaveData::Arithmetic { .. } => "Arithmetic",
            NodeSaveData::MathFunction { .. } => "Math Function",
            NodeSaveData::Clock { .. } => "Clock",
            NodeSaveData::AudioGenerator { .. } => "Audio Generator",
            NodeSaveData::File { .. } => "File",
        }
    }
}

/// The contract every node kind implements.
///
/// All data moves left to right: a node receives values through
/// [`Node::set_value`] and pushes results through the [`Emitter`] it is
/// handed. Nothing ever pulls a value out of a node.
pub trait Node: fmt::Debug + Send + 'static {
    /// Kind of this node
    fn kind(&self) -> NodeKind;

    /// Declared sink types, in socket order
    fn sinks(&self) -> &[SocketType];

    /// Declared source types, in socket order
    fn sources(&self) -> &[SocketType];

    /// Deliver a value arriving at `sink`.
    ///
    /// `originator` is the node that started the update chain.
    fn set_value(
        &mut self,
        value: &Value,
        sink: usize,
        originator: NodeId,
        out: &mut Emitter,
    ) -> Result<(), NodeError> {
        let _ = (value, originator, out);
        Err(NodeError::ForeignSocket {
            node: self.kind(),
            what: "sink",
            index: sink,
        })
    }

    /// Invalidate whatever state `sink` was feeding
    fn reset_input(&mut self, sink: usize, out: &mut Emitter) -> Result<(), NodeError> {
        let _ = out;
        Err(NodeError::ForeignSocket {
            node: self.kind(),
            what: "sink",
            index: sink,
        })
    }

    /// Whether `candidate` can be reached by following this node's sources forward
    fn recursion_check(&self, me: NodeId, candidate: SourceRef, graph: &Graph) -> bool {
        graph.sources_reach(me, candidate)
    }

    /// Whether `sink` currently accepts wires
    fn sink_enabled(&self, sink: usize) -> bool {
        sink < self.sinks().len()
    }

    /// A wire now drives `sink`
    fn on_connect_sink(&mut self, _sink: usize) {}

    /// A new wire leaves `source`
    fn on_connect_source(&mut self, _source: usize, _wire: WireId, _out: &mut Emitter) {}

    /// The wire driving `sink` is gone
    fn on_disconnect_sink(&mut self, _sink: usize) {}

    /// One of the wires leaving `source` is gone
    fn on_disconnect_source(&mut self, _source: usize) {}

    /// Apply a user edit
    fn apply(&mut self, edit: Edit, out: &mut Emitter) -> Result<(), NodeError> {
        let _ = out;
        Err(NodeError::UnsupportedEdit {
            node: self.kind(),
            edit: edit.label(),
        })
    }

    /// Advance time; `time` is seconds since start, `delta` since the last tick
    fn tick(&mut self, _time: f32, _delta: f32, _out: &mut Emitter) {}

    /// Text the node currently shows, if it shows any
    fn display(&self) -> Option<String> {
        None
    }

    /// Serializable state
    fn save_data(&self) -> NodeSaveData {
        NodeSaveData::None
    }

    /// Restore state produced by [`Node::save_data`]
    fn load(&mut self, data: NodeSaveData) -> Result<(), NodeError> {
        match data {
            NodeSaveData::None => Ok(()),
            other => Err(NodeError::MismatchedSaveData {
                node: self.kind(),
                found: other.label(),
            }),
        }
    }

    /// Upcast for typed inspection
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed inspection
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
