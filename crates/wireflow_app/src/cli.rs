// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line interface.
//!
//! Every command opens a document, applies one change and saves it again.
//! Nodes are addressed by their position in the document (`#0`, `#1`, ...),
//! as printed by `wireflow show`.

use crate::clipboard::{Clipboard, ClipboardError};
use crate::document::{Document, DocumentError, DOCUMENT_EXTENSION};
use crate::settings::{AppSettings, SettingsError};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use wireflow_graph::dispatch::open_file;
use wireflow_graph::nodes::{FileFilter, OutputNode, TimeSeriesNode};
use wireflow_graph::{
    DispatchError, Dispatcher, Edit, FileChooser, Graph, GraphError, NodeId, NodeKind,
    NodeRegistry, SinkRef, SourceRef, WireRecord,
};

/// Wireflow - node graph editor
///
/// Build dataflow graphs from typed nodes and wires; values recompute as soon
/// as anything upstream changes.
#[derive(Parser, Debug)]
#[command(name = "wireflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new document
    New {
        /// Document to create
        path: PathBuf,

        /// Fill the document with a small example graph
        #[arg(long)]
        demo: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print a document's nodes and wires.
    ///
    /// Diagnostics are not saved; they are printed by the command that
    /// caused them.
    Show {
        /// Document to show
        path: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the available node kinds
    Kinds,

    /// Add a node
    Add {
        /// Document to change
        path: PathBuf,

        /// Node kind, e.g. "arithmetic" or "math function"
        kind: String,

        /// Canvas X
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        x: f32,

        /// Canvas Y
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        y: f32,
    },

    /// Move a node on the canvas
    Move {
        /// Document to change
        path: PathBuf,

        /// Node number
        node: usize,

        /// Canvas X
        #[arg(allow_hyphen_values = true)]
        x: f32,

        /// Canvas Y
        #[arg(allow_hyphen_values = true)]
        y: f32,
    },

    /// Type text into a node's field
    Edit {
        /// Document to change
        path: PathBuf,

        /// Node number
        node: usize,

        /// Text to enter; an empty string clears the field
        #[arg(allow_hyphen_values = true)]
        text: String,

        /// Field number
        #[arg(long, default_value_t = 0)]
        field: usize,
    },

    /// Pick an option from a node's dropdown
    Select {
        /// Document to change
        path: PathBuf,

        /// Node number
        node: usize,

        /// Option number
        option: usize,
    },

    /// Press a node's button
    Press {
        /// Document to change
        path: PathBuf,

        /// Node number
        node: usize,

        /// File to hand to a File node; leaving it out cancels the choice
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Clear a node's current choice
    Clear {
        /// Document to change
        path: PathBuf,

        /// Node number
        node: usize,
    },

    /// Connect a source to a sink
    Connect {
        /// Document to change
        path: PathBuf,

        /// Node owning the source
        from: usize,

        /// Node owning the sink
        to: usize,

        /// Source number on `from`
        #[arg(long, default_value_t = 0)]
        source: usize,

        /// Sink number on `to`
        #[arg(long, default_value_t = 0)]
        sink: usize,
    },

    /// Remove the wire driving a sink
    Disconnect {
        /// Document to change
        path: PathBuf,

        /// Node owning the sink
        node: usize,

        /// Sink number
        #[arg(long, default_value_t = 0)]
        sink: usize,
    },

    /// Remove nodes and every wire touching them
    Remove {
        /// Document to change
        path: PathBuf,

        /// Node numbers
        #[arg(required = true)]
        nodes: Vec<usize>,
    },

    /// Copy nodes and paste them back, with the wires between them
    Duplicate {
        /// Document to change
        path: PathBuf,

        /// Node numbers
        #[arg(required = true)]
        nodes: Vec<usize>,

        /// Number of copies
        #[arg(long, default_value_t = 1)]
        times: u32,
    },

    /// Run the frame clock and print what the outputs show
    Tick {
        /// Document to run
        path: PathBuf,

        /// Seconds to simulate
        #[arg(long, default_value_t = 1.0)]
        seconds: f32,

        /// Frames per second
        #[arg(long, default_value_t = 60)]
        fps: u32,
    },
}

/// Command errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Document could not be read or written
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Settings could not be read or written
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Copy or paste failed
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    /// The graph refused the change
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Background work could not be started
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// JSON output failed
    #[error("could not encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// No node kind by that name
    #[error("unknown node kind '{0}'; run `wireflow kinds` for the list")]
    UnknownKind(String),

    /// Node number out of range
    #[error("no node #{index}; the document has {count} node(s)")]
    NoSuchNode {
        /// Requested number
        index: usize,
        /// Nodes in the document
        count: usize,
    },

    /// Refusing to overwrite a file
    #[error("{} already exists; pass --force to overwrite", .0.display())]
    Exists(PathBuf),
}

/// Execute a parsed command line
pub fn execute(cli: Cli) -> Result<(), CliError> {
    let settings_path = cli.config.or_else(AppSettings::default_path);
    let settings = match &settings_path {
        Some(path) => AppSettings::load_or_default(path)?,
        None => AppSettings::default(),
    };
    let mut session = Session {
        settings,
        settings_path,
    };

    match cli.command {
        Command::New { path, demo, force } => {
            let path = if path.extension().is_none() {
                path.with_extension(DOCUMENT_EXTENSION)
            } else {
                path
            };
            if path.exists() && !force {
                return Err(CliError::Exists(path));
            }
            let mut document = Document::new();
            if demo {
                build_demo(document.graph_mut())?;
            }
            session.save_as(&mut document, &path)?;
            println!(
                "created {} with {} node(s)",
                path.display(),
                document.graph().node_count()
            );
        }
        Command::Show { path, json } => {
            let document = session.open(&path)?;
            let report = GraphReport::new(&document);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print();
            }
        }
        Command::Kinds => {
            let registry = NodeRegistry::builtin();
            for descriptor in registry.types() {
                println!(
                    "{:<16} {:<10} {}",
                    descriptor.name,
                    format!("{:?}", descriptor.category),
                    descriptor.description
                );
            }
        }
        Command::Add { path, kind, x, y } => {
            let registry = NodeRegistry::builtin();
            let kind = registry
                .find(&kind)
                .map(|descriptor| descriptor.kind)
                .ok_or(CliError::UnknownKind(kind))?;
            let mut document = session.open(&path)?;
            let graph = document.graph_mut();
            let id = graph.add_node(kind, [x, y]);
            let index = graph.node_index(id).unwrap_or_default();
            session.save(&mut document)?;
            println!("added {kind} as #{index}");
        }
        Command::Move { path, node, x, y } => {
            modify(&mut session, &path, |graph| {
                let id = node_at(graph, node)?;
                graph.set_position(id, [x, y])?;
                Ok(())
            })?;
        }
        Command::Edit {
            path,
            node,
            text,
            field,
        } => {
            modify(&mut session, &path, |graph| {
                let id = node_at(graph, node)?;
                graph.edit(id, Edit::Field { field, text })?;
                Ok(())
            })?;
        }
        Command::Select { path, node, option } => {
            modify(&mut session, &path, |graph| {
                let id = node_at(graph, node)?;
                graph.edit(id, Edit::Select(option))?;
                Ok(())
            })?;
        }
        Command::Press { path, node, file } => {
            let config = session.settings.dispatcher_config();
            modify(&mut session, &path, |graph| {
                let id = node_at(graph, node)?;
                if graph.entry(id)?.kind() != NodeKind::File {
                    graph.edit(id, Edit::Press)?;
                    return Ok(());
                }
                let mut dispatcher = Dispatcher::new(config)?;
                let chooser = Arc::new(PresetChooser(file));
                if !open_file(graph, id, &dispatcher, chooser)? {
                    println!("#{node} already has a file; clear it first");
                }
                dispatcher.wait(graph);
                dispatcher.shutdown();
                Ok(())
            })?;
        }
        Command::Clear { path, node } => {
            modify(&mut session, &path, |graph| {
                let id = node_at(graph, node)?;
                graph.edit(id, Edit::Clear)?;
                Ok(())
            })?;
        }
        Command::Connect {
            path,
            from,
            to,
            source,
            sink,
        } => {
            modify(&mut session, &path, |graph| {
                let source = SourceRef::new(node_at(graph, from)?, source);
                let sink = SinkRef::new(node_at(graph, to)?, sink);
                graph.connect(source, sink)?;
                Ok(())
            })?;
        }
        Command::Disconnect { path, node, sink } => {
            modify(&mut session, &path, |graph| {
                let id = node_at(graph, node)?;
                if graph.disconnect_sink(SinkRef::new(id, sink))?.is_none() {
                    println!("#{node} sink {sink} was not connected");
                }
                Ok(())
            })?;
        }
        Command::Remove { path, nodes } => {
            modify(&mut session, &path, |graph| {
                let ids = nodes_at(graph, &nodes)?;
                for id in ids {
                    graph.remove_node(id)?;
                }
                Ok(())
            })?;
        }
        Command::Duplicate { path, nodes, times } => {
            let mut clipboard = Clipboard::new(session.settings.paste_offset);
            modify(&mut session, &path, |graph| {
                let ids = nodes_at(graph, &nodes)?;
                clipboard.copy(graph, &ids)?;
                for _ in 0..times {
                    let pasted = clipboard.paste(graph)?;
                    tracing::debug!(nodes = pasted.len(), "pasted copy");
                }
                Ok(())
            })?;
        }
        Command::Tick { path, seconds, fps } => {
            let mut document = session.open(&path)?;
            let frames = (seconds * fps as f32).round() as u32;
            let delta = 1.0 / fps.max(1) as f32;
            // the run is not saved; the document is left untouched
            let graph = document.graph_mut();
            for frame in 1..=frames {
                graph.tick(frame as f32 * delta, delta)?;
            }
            print_readouts(graph);
        }
    }
    Ok(())
}

struct Session {
    settings: AppSettings,
    settings_path: Option<PathBuf>,
}

impl Session {
    fn open(&mut self, path: &Path) -> Result<Document, CliError> {
        let document = Document::open(path)?;
        self.remember(path);
        Ok(document)
    }

    fn save(&mut self, document: &mut Document) -> Result<(), CliError> {
        if !document.is_dirty() {
            return Ok(());
        }
        document.save()?;
        if let Some(path) = document.path().map(Path::to_path_buf) {
            self.remember(&path);
        }
        Ok(())
    }

    fn save_as(&mut self, document: &mut Document, path: &Path) -> Result<(), CliError> {
        document.save_as(path)?;
        self.remember(path);
        Ok(())
    }

    fn remember(&mut self, path: &Path) {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.settings.add_to_recent(path);
        if let Some(settings_path) = &self.settings_path {
            if let Err(err) = self.settings.save(settings_path) {
                tracing::warn!(path = %settings_path.display(), error = %err, "could not save settings");
            }
        }
    }
}

/// Open a document, change its graph, then save it
fn modify(
    session: &mut Session,
    path: &Path,
    change: impl FnOnce(&mut Graph) -> Result<(), CliError>,
) -> Result<(), CliError> {
    let mut document = session.open(path)?;
    change(document.graph_mut())?;
    session.save(&mut document)?;
    for (id, err) in document.graph().diagnostics() {
        let index = document.graph().node_index(id).unwrap_or_default();
        println!("#{index}: {err}");
    }
    Ok(())
}

fn node_at(graph: &Graph, index: usize) -> Result<NodeId, CliError> {
    graph.node_ids().nth(index).ok_or(CliError::NoSuchNode {
        index,
        count: graph.node_count(),
    })
}

fn nodes_at(graph: &Graph, indices: &[usize]) -> Result<Vec<NodeId>, CliError> {
    indices.iter().map(|index| node_at(graph, *index)).collect()
}

/// Two inputs summed into an output, and a clock driving a plot
fn build_demo(graph: &mut Graph) -> Result<(), GraphError> {
    let first = graph.add_node(NodeKind::Input, [0.0, 0.0]);
    let second = graph.add_node(NodeKind::Input, [0.0, 120.0]);
    let sum = graph.add_node(NodeKind::Arithmetic, [200.0, 60.0]);
    let output = graph.add_node(NodeKind::Output, [400.0, 60.0]);
    let clock = graph.add_node(NodeKind::Clock, [0.0, 280.0]);
    let plot = graph.add_node(NodeKind::TimeSeries, [200.0, 280.0]);

    graph.connect(SourceRef::new(first, 0), SinkRef::new(sum, 0))?;
    graph.connect(SourceRef::new(second, 0), SinkRef::new(sum, 1))?;
    graph.connect(SourceRef::new(sum, 0), SinkRef::new(output, 0))?;
    graph.connect(SourceRef::new(clock, 0), SinkRef::new(plot, 0))?;

    for (node, text) in [(first, "3"), (second, "4")] {
        graph.edit(
            node,
            Edit::Field {
                field: 0,
                text: text.to_string(),
            },
        )?;
    }
    Ok(())
}

fn print_readouts(graph: &Graph) {
    for (index, (id, entry)) in graph.nodes().enumerate() {
        if let Some(output) = graph.node_as::<OutputNode>(id) {
            println!("#{index} {}: {}", entry.kind(), output.text());
        } else if let Some(plot) = graph.node_as::<TimeSeriesNode>(id) {
            let last = plot.points().last().map_or(0.0, |p| p[1]);
            println!("#{index} {}: {} point(s), last {last}", entry.kind(), plot.len());
        }
    }
}

/// Hands a File node the path given on the command line
struct PresetChooser(Option<PathBuf>);

impl FileChooser for PresetChooser {
    fn choose(&self, filters: &[FileFilter]) -> Option<PathBuf> {
        let path = self.0.clone()?;
        if filters.iter().any(|filter| filter.matches(&path)) {
            Some(path)
        } else {
            tracing::warn!(path = %path.display(), "file does not match any filter");
            None
        }
    }
}

#[derive(Debug, Serialize)]
struct NodeReport {
    index: usize,
    kind: String,
    position: [f32; 2],
    display: Option<String>,
}

#[derive(Debug, Serialize)]
struct GraphReport {
    title: String,
    nodes: Vec<NodeReport>,
    wires: Vec<WireRecord>,
}

impl GraphReport {
    fn new(document: &Document) -> Self {
        let graph = document.graph();
        let nodes = graph
            .nodes()
            .enumerate()
            .map(|(index, (_, entry))| NodeReport {
                index,
                kind: entry.kind().to_string(),
                position: entry.position,
                display: entry.node().display(),
            })
            .collect();
        Self {
            title: document.title(),
            nodes,
            wires: graph.snapshot().wires,
        }
    }

    fn print(&self) {
        println!("{}", self.title);
        for node in &self.nodes {
            let display = node.display.as_deref().unwrap_or("");
            println!(
                "  #{:<3} {:<16} ({}, {})  {display}",
                node.index, node.kind, node.position[0], node.position[1]
            );
        }
        if !self.wires.is_empty() {
            println!("wires:");
            for wire in &self.wires {
                println!(
                    "  #{}.{} -> #{}.{}",
                    wire.source_node, wire.source_socket, wire.sink_node, wire.sink_socket
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wireflow_graph::nodes::FileNode;
    use wireflow_graph::Value;

    struct Scratch {
        dir: PathBuf,
    }

    impl Scratch {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("wireflow-cli-{}", uuid::Uuid::new_v4()));
            std::fs::create_dir_all(&dir).unwrap();
            Self { dir }
        }

        fn doc(&self) -> PathBuf {
            self.dir.join("graph.wflow")
        }

        fn run(&self, args: &[&str]) -> Result<(), CliError> {
            let config = self.dir.join("settings.ron");
            let mut argv = vec![
                "wireflow".to_string(),
                "--config".to_string(),
                config.display().to_string(),
            ];
            argv.extend(args.iter().map(|arg| (*arg).to_string()));
            execute(Cli::parse_from(argv))
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    fn output_value(document: &Document, index: usize) -> Option<Value> {
        let id = document.graph().node_ids().nth(index).unwrap();
        document
            .graph()
            .node_as::<OutputNode>(id)
            .unwrap()
            .value()
            .cloned()
    }

    #[test]
    fn test_demo_document() {
        let scratch = Scratch::new();
        let doc = scratch.doc();
        let path = doc.to_str().unwrap();
        scratch.run(&["new", path, "--demo"]).unwrap();
        assert!(matches!(
            scratch.run(&["new", path]),
            Err(CliError::Exists(_))
        ));

        let document = Document::open(&doc).unwrap();
        assert_eq!(document.graph().node_count(), 6);
        assert_eq!(output_value(&document, 3), Some(Value::Decimal(7.0)));

        scratch.run(&["show", path]).unwrap();
        scratch.run(&["show", path, "--json"]).unwrap();
        scratch.run(&["tick", path, "--seconds", "0.5"]).unwrap();

        let settings = AppSettings::load(&scratch.dir.join("settings.ron")).unwrap();
        assert!(!settings.recent_files.is_empty());
    }

    #[test]
    fn test_build_and_rewire() {
        let scratch = Scratch::new();
        let doc = scratch.doc();
        let path = doc.to_str().unwrap();
        scratch.run(&["new", path]).unwrap();
        scratch.run(&["add", path, "input"]).unwrap();
        scratch.run(&["add", path, "Inverter", "--x", "-40"]).unwrap();
        scratch.run(&["add", path, "output"]).unwrap();
        assert!(matches!(
            scratch.run(&["add", path, "teleporter"]),
            Err(CliError::UnknownKind(_))
        ));

        scratch.run(&["connect", path, "0", "1"]).unwrap();
        scratch.run(&["connect", path, "1", "2"]).unwrap();
        scratch.run(&["edit", path, "0", "-2.5"]).unwrap();
        let document = Document::open(&doc).unwrap();
        assert_eq!(output_value(&document, 2), Some(Value::Decimal(2.5)));
        assert_eq!(
            document.graph().entry(document.graph().node_ids().nth(1).unwrap()).unwrap().position,
            [-40.0, 0.0]
        );

        scratch.run(&["duplicate", path, "0", "1", "--times", "2"]).unwrap();
        let document = Document::open(&doc).unwrap();
        assert_eq!(document.graph().node_count(), 7);
        assert_eq!(document.graph().wire_count(), 4);

        scratch.run(&["disconnect", path, "2"]).unwrap();
        let document = Document::open(&doc).unwrap();
        assert_eq!(output_value(&document, 2), None);

        scratch.run(&["remove", path, "0", "1"]).unwrap();
        let document = Document::open(&doc).unwrap();
        assert_eq!(document.graph().node_count(), 5);
        assert!(matches!(
            scratch.run(&["remove", path, "9"]),
            Err(CliError::NoSuchNode { index: 9, count: 5 })
        ));
    }

    #[test]
    fn test_edit_errors_are_reported() {
        let scratch = Scratch::new();
        let doc = scratch.doc();
        let path = doc.to_str().unwrap();
        scratch.run(&["new", path]).unwrap();
        scratch.run(&["add", path, "arithmetic"]).unwrap();
        let err = scratch.run(&["edit", path, "0", "seven"]).unwrap_err();
        assert!(matches!(err, CliError::Graph(GraphError::Node { .. })));
        assert!(scratch.run(&["select", path, "0", "3"]).is_ok());
        assert!(scratch.run(&["select", path, "0", "42"]).is_err());
    }

    #[test]
    fn test_move_node() {
        let scratch = Scratch::new();
        let doc = scratch.doc();
        let path = doc.to_str().unwrap();
        scratch.run(&["new", path]).unwrap();
        scratch.run(&["add", path, "clock"]).unwrap();
        scratch.run(&["move", path, "0", "120", "-35.5"]).unwrap();

        let document = Document::open(&doc).unwrap();
        let id = document.graph().node_ids().next().unwrap();
        assert_eq!(document.graph().entry(id).unwrap().position, [120.0, -35.5]);
        assert!(matches!(
            scratch.run(&["move", path, "3", "0", "0"]),
            Err(CliError::NoSuchNode { index: 3, count: 1 })
        ));
    }

    #[test]
    fn test_report_lists_nodes_and_wires_only() {
        let mut document = Document::new();
        build_demo(document.graph_mut()).unwrap();
        let json = serde_json::to_value(GraphReport::new(&document)).unwrap();

        assert_eq!(json["nodes"].as_array().unwrap().len(), 6);
        assert_eq!(json["wires"].as_array().unwrap().len(), 4);
        let node = json["nodes"][0].as_object().unwrap();
        assert!(!node.contains_key("diagnostic"));
        assert_eq!(json["nodes"][3]["display"], "7");
    }

    #[test]
    fn test_press_file_node() {
        let scratch = Scratch::new();
        let doc = scratch.doc();
        let path = doc.to_str().unwrap();
        scratch.run(&["new", path]).unwrap();
        scratch.run(&["add", path, "file"]).unwrap();
        scratch.run(&["add", path, "output"]).unwrap();
        scratch.run(&["connect", path, "0", "1"]).unwrap();

        // no file given: the choice is cancelled
        scratch.run(&["press", path, "0"]).unwrap();
        let document = Document::open(&doc).unwrap();
        let file = document.graph().node_ids().next().unwrap();
        assert!(document.graph().node_as::<FileNode>(file).unwrap().filename().is_none());

        scratch.run(&["press", path, "0", "--file", "levels.csv"]).unwrap();
        let document = Document::open(&doc).unwrap();
        assert_eq!(
            output_value(&document, 1),
            Some(Value::Text("levels.csv".to_string()))
        );

        scratch.run(&["clear", path, "0"]).unwrap();
        let document = Document::open(&doc).unwrap();
        assert_eq!(output_value(&document, 1), None);
    }
}
