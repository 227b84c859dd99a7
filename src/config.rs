//! voxelurn configuration.
//!
//! Loaded from `~/.voxelurn/config.toml`. Every key is optional; a missing
//! file means defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::Task;

/// Where the parser service listens unless told otherwise.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8410";

/// voxelurn configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Base URL of the semantic parser service.
    pub server_url: String,

    /// Fixed session id. Overrides the persisted one.
    pub session_id: Option<String>,

    /// Where product events are appended.
    /// Defaults to `~/.voxelurn/events.jsonl`.
    pub event_log: Option<PathBuf>,

    /// Task to start in.
    pub task: Task,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            session_id: None,
            event_log: None,
            task: Task::World,
        }
    }
}

impl Config {
    /// Load config from `~/.voxelurn/config.toml`, or defaults if there is none.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if config.server_url.trim().is_empty() {
            return Err(format!("server-url is empty in {}", path.display()));
        }

        Ok(config)
    }

    /// The config file path: `~/.voxelurn/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".voxelurn").join("config.toml"))
    }
}
