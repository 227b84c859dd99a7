//! Product events: what gets written to the event log.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::world::Voxel;

/// Something worth recording about how the user plays.
///
/// Serialized as `{"type": "...", "msg": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "msg", rename_all = "camelCase")]
pub enum LogEvent {
    /// A target puzzle was drawn.
    #[serde(rename_all = "camelCase")]
    Start { target_idx: usize, target: Vec<Voxel> },

    /// The current world matched the target.
    Win { steps: usize },

    /// The user moved through the candidate list.
    Scroll { dir: ScrollDirection },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScrollDirection {
    Up,
    Down,
}

/// One line of the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub session_id: String,

    /// The free-build structure this event belongs to, outside puzzles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_id: Option<Uuid>,

    pub logged_at: Timestamp,

    pub event: LogEvent,
}
