// SPDX-License-Identifier: MIT OR Apache-2.0
//! User settings, stored as RON in the user's config directory.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use thiserror::Error;
use wireflow_graph::DispatcherConfig;

/// Maximum number of recent documents to track
pub const MAX_RECENT_FILES: usize = 10;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the settings file failed
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid RON
    #[error("invalid settings file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be written as RON
    #[error("could not serialize settings: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version
    #[error("settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version understood
        supported: u32,
    },
}

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Format version
    pub version: u32,
    /// Distance each successive paste is shifted by
    pub paste_offset: f32,
    /// Background tasks allowed to run at once
    pub max_background_tasks: usize,
    /// Recently opened documents, newest first
    pub recent_files: VecDeque<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            paste_offset: 30.0,
            max_background_tasks: DispatcherConfig::default().max_background_tasks,
            recent_files: VecDeque::new(),
        }
    }
}

impl AppSettings {
    /// Where settings live when no path is given
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wireflow").join("settings.ron"))
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: AppSettings = ron::from_str(&content)?;
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file does not exist yet
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save settings to a file, creating its directory if needed
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Dispatcher settings derived from these settings
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            max_background_tasks: self.max_background_tasks.max(1),
        }
    }

    /// Move a document to the front of the recent list
    pub fn add_to_recent(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.push_front(path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }
}
