// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dataflow engine for Wireflow.
//!
//! Nodes expose typed sinks (inputs) and sources (outputs). Wires join one
//! source to one sink; a source may feed many wires, a sink takes at most
//! one. Values are pushed: when a node produces a value, every node
//! downstream recomputes before the call that triggered it returns.
//!
//! ## Architecture
//!
//! - [`Graph`] owns every node and wire in arenas keyed by ID
//! - [`Node`] implementations record what they produce on an [`Emitter`],
//!   which the graph delivers depth-first
//! - Connections are negotiated: type check, cycle check, then attach
//! - [`GraphSnapshot`] serializes a graph or a selection for saving and
//!   copy/paste
//! - [`Dispatcher`] runs slow work off the graph thread and queues its
//!   results back

pub mod dispatch;
pub mod error;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod propagation;
pub mod snapshot;
pub mod socket;
pub mod value;
pub mod wire;

pub use dispatch::{DispatchError, DispatchHandle, Dispatcher, DispatcherConfig, FileChooser};
pub use error::{GraphError, NodeError, Rejection, Result, ValueError};
pub use graph::{Graph, NodeEntry};
pub use node::{Edit, Node, NodeCategory, NodeDescriptor, NodeId, NodeKind, NodeRegistry, NodeSaveData};
pub use propagation::{Emitter, Signal};
pub use snapshot::{GraphSnapshot, NodeRecord, WireRecord};
pub use socket::{SinkRef, SocketType, SourceRef};
pub use value::{Value, ValueKind};
pub use wire::{Wire, WireId};
