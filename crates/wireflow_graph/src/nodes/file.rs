// SPDX-License-Identifier: MIT OR Apache-2.0
//! File picker.

use crate::error::NodeError;
use crate::graph::Graph;
use crate::node::{Edit, Node, NodeId, NodeKind, NodeSaveData};
use crate::propagation::Emitter;
use crate::socket::{SocketType, SourceRef};
use crate::wire::WireId;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::path::{Path, PathBuf};

const SOURCES: [SocketType; 1] = [SocketType::Text];

/// A named group of file extensions offered by the file dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    /// Label shown in the dialog
    pub name: String,
    /// Extensions without the leading dot; `*` matches anything
    pub extensions: Vec<String>,
}

impl FileFilter {
    /// Create a filter
    pub fn new(name: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            name: name.into(),
            extensions: extensions.iter().map(|e| (*e).to_string()).collect(),
        }
    }

    /// Whether `path` passes this filter
    pub fn matches(&self, path: &Path) -> bool {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        self.extensions.iter().any(|wanted| {
            wanted == "*" || extension.as_deref() == Some(wanted.to_lowercase().as_str())
        })
    }
}

/// Lets the user pick a file and passes its path on as text.
///
/// Choosing happens outside the graph thread and is started by
/// [`crate::dispatch::open_file`]; the node only tracks whether a choice is
/// in flight so a second request is ignored.
#[derive(Debug, Clone)]
pub struct FileNode {
    filename: Option<PathBuf>,
    choosing: bool,
    filters: Vec<FileFilter>,
}

impl FileNode {
    /// Create a node with no file and the default filters
    pub fn new() -> Self {
        Self {
            filename: None,
            choosing: false,
            filters: vec![
                FileFilter::new("Data files", &["csv", "txt", "json", "ron"]),
                FileFilter::new("All files", &["*"]),
            ],
        }
    }

    /// Chosen file
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Whether a file choice is in flight
    pub fn is_choosing(&self) -> bool {
        self.choosing
    }

    /// Filters offered by the dialog
    pub fn filters(&self) -> &[FileFilter] {
        &self.filters
    }

    /// Mark a file choice as started. Returns `false` when one is already
    /// running or a file is already chosen.
    pub fn begin_choose(&mut self) -> bool {
        if self.choosing || self.filename.is_some() {
            return false;
        }
        self.choosing = true;
        true
    }

    fn path_text(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }
}

impl Default for FileNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for FileNode {
    fn kind(&self) -> NodeKind {
        NodeKind::File
    }

    fn sinks(&self) -> &[SocketType] {
        &[]
    }

    fn sources(&self) -> &[SocketType] {
        &SOURCES
    }

    fn recursion_check(&self, _me: NodeId, _candidate: SourceRef, _graph: &Graph) -> bool {
        false
    }

    fn on_connect_source(&mut self, source: usize, wire: WireId, out: &mut Emitter) {
        if let Some(path) = &self.filename {
            out.emit_on(source, wire, Self::path_text(path));
        }
    }

    fn apply(&mut self, edit: Edit, out: &mut Emitter) -> Result<(), NodeError> {
        match edit {
            Edit::FileChosen(Some(path)) => {
                self.choosing = false;
                tracing::debug!(path = %path.display(), "file chosen");
                out.emit(0, Self::path_text(&path));
                self.filename = Some(path);
                Ok(())
            }
            Edit::FileChosen(None) => {
                self.choosing = false;
                Ok(())
            }
            Edit::Clear => {
                if self.choosing {
                    tracing::debug!("ignoring clear while a file choice is in flight");
                    return Ok(());
                }
                if self.filename.take().is_some() {
                    out.reset(0);
                }
                Ok(())
            }
            other => Err(NodeError::UnsupportedEdit {
                node: NodeKind::File,
                edit: other.label(),
            }),
        }
    }

    fn display(&self) -> Option<String> {
        let name = self
            .filename
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned());
        Some(name.unwrap_or_default())
    }

    fn save_data(&self) -> NodeSaveData {
        NodeSaveData::File {
            filename: self
                .filename
                .as_deref()
                .map(Self::path_text)
                .unwrap_or_default(),
            is_set: self.filename.is_some(),
        }
    }

    fn load(&mut self, data: NodeSaveData) -> Result<(), NodeError> {
        match data {
            NodeSaveData::File { filename, is_set } => {
                self.filename = is_set.then(|| PathBuf::from(filename));
                self.choosing = false;
                Ok(())
            }
            other => Err(NodeError::MismatchedSaveData {
                node: NodeKind::File,
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
