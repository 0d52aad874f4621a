// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph documents on disk.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use wireflow_graph::{Graph, GraphError, GraphSnapshot};

/// Current document format version
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// Document file extension
pub const DOCUMENT_EXTENSION: &str = "wflow";

/// Document errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Reading or writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid document
    #[error("invalid document: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The document could not be written as RON
    #[error("could not serialize document: {0}")]
    Serialize(#[from] ron::Error),

    /// The saved graph could not be rebuilt
    #[error("could not restore graph: {0}")]
    Graph(#[from] GraphError),

    /// Written by a newer version
    #[error("document version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version understood
        supported: u32,
    },

    /// Saving a document that was never given a path
    #[error("document has no file path; use save as")]
    NoPath,
}

/// Canvas camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Camera X
    pub x: f32,
    /// Camera Y
    pub y: f32,
    /// Camera Z
    pub z: f32,
    /// Zoom
    pub size: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            size: 1.0,
        }
    }
}

/// On-disk layout of a document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentFile {
    version: u32,
    view: ViewState,
    graph: GraphSnapshot,
}

/// An open graph document
#[derive(Debug, Default)]
pub struct Document {
    path: Option<PathBuf>,
    dirty: bool,
    /// Camera
    pub view: ViewState,
    graph: Graph,
}

impl Document {
    /// Create an empty, unsaved document
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document; its graph recomputes while it is rebuilt
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path)?;
        let file: DocumentFile = ron::from_str(&content)?;
        if file.version > DOCUMENT_FORMAT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: file.version,
                supported: DOCUMENT_FORMAT_VERSION,
            });
        }
        let graph = Graph::from_snapshot(&file.graph)?;
        tracing::info!(
            path = %path.display(),
            nodes = graph.node_count(),
            wires = graph.wire_count(),
            "opened document"
        );
        Ok(Self {
            path: Some(path.to_path_buf()),
            dirty: false,
            view: file.view,
            graph,
        })
    }

    /// Save to the document's own path
    pub fn save(&mut self) -> Result<(), DocumentError> {
        let path = self.path.clone().ok_or(DocumentError::NoPath)?;
        self.write(&path)
    }

    /// Save to a new path and adopt it
    pub fn save_as(&mut self, path: &Path) -> Result<(), DocumentError> {
        self.write(path)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn write(&mut self, path: &Path) -> Result<(), DocumentError> {
        let file = DocumentFile {
            version: DOCUMENT_FORMAT_VERSION,
            view: self.view,
            graph: self.graph.snapshot(),
        };
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(&file, config)?;
        std::fs::write(path, content)?;
        self.dirty = false;
        tracing::info!(path = %path.display(), "saved document");
        Ok(())
    }

    /// File path, if the document was ever saved
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether there are unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Name for window titles, with a marker for unsaved changes
    pub fn title(&self) -> String {
        let name = self
            .path
            .as_deref()
            .and_then(Path::file_stem)
            .map_or_else(|| "Untitled".to_string(), |s| s.to_string_lossy().into_owned());
        if self.dirty {
            format!("{name}*")
        } else {
            name
        }
    }

    /// The graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The graph, for changes; marks the document dirty
    pub fn graph_mut(&mut self) -> &mut Graph {
        self.dirty = true;
        &mut self.graph
    }
}
