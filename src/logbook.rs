//! Event log: product events written one JSON object per line.
//!
//! Logging is fire and forget. A sink that fails to write reports it
//! through `tracing` and carries on; the session never waits on it.
//!
//! ```text
//! ~/.voxelurn/events.jsonl   # Append-only, one LogRecord per line
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

// Trait must be in scope for `.write_all()` on File.
use io::Write;

use jiff::Timestamp;
use tracing::warn;
use uuid::Uuid;

use crate::model::{LogEvent, LogRecord};

/// Errors that can occur while writing the event log.
#[derive(Debug, thiserror::Error)]
pub enum LogbookError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, LogbookError>;

/// Where product events go.
pub trait EventSink {
    /// Records one event. Never fails from the caller's point of view.
    fn record(&self, record: &LogRecord);
}

/// Appends events to a JSONL file.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Creates a sink writing to `path`. Parent directories are created.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Returns the default event log: `~/.voxelurn/events.jsonl`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".voxelurn").join("events.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record.
    pub fn append(&self, record: &LogRecord) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl EventSink for JsonlSink {
    fn record(&self, record: &LogRecord) {
        if let Err(e) = self.append(record) {
            warn!(path = %self.path.display(), error = %e, "failed to write event");
        }
    }
}

/// Stamps an event with who and when.
pub fn stamp(session_id: &str, structure_id: Option<Uuid>, event: LogEvent) -> LogRecord {
    LogRecord {
        session_id: session_id.to_string(),
        structure_id,
        logged_at: Timestamp::now(),
        event,
    }
}
