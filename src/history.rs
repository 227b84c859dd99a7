//! History log and time-travel cursor.
//!
//! The log is an ordered record of accepted world states. Entry 0 is the
//! session's initial state. The cursor is a view over the log: `Latest`
//! follows the tail, `At(i)` pins a past entry. Undo and redo only move
//! the cursor. Appending while the cursor sits in the past truncates the
//! log after the cursor first, so the old future is gone for good.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::model::{PathStep, WorldState};

/// One accepted world state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Position in the log at append time.
    pub step: usize,

    /// Append counter. Never reused, even after truncation.
    pub serial: u64,

    /// The command that produced this state. `None` only for the initial entry.
    pub command: Option<String>,

    pub world: WorldState,

    /// Intermediate moves, for display only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathStep>,

    pub recorded_at: Timestamp,
}

/// Where the user is looking in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// The most recent entry.
    #[default]
    Latest,

    /// A specific past entry. Always `< len - 1`; the tail is spelled `Latest`.
    At(usize),
}

/// A history-jump request from the UI.
///
/// `step_n` counts back from the newest entry: 0 is the latest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryJump {
    #[serde(rename = "type")]
    pub kind: JumpKind,

    #[serde(rename = "stepN")]
    pub step_n: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JumpKind {
    Accept,
    Initial,

    /// Pins and anything else the history view renders. Not a jump target.
    #[serde(other)]
    Other,
}

/// Append-only log of accepted states with a time-travel cursor.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
    cursor: Cursor,
    next_serial: u64,
}

impl HistoryLog {
    /// Starts a log whose only entry is `initial`.
    pub fn new(initial: WorldState) -> Self {
        let entry = HistoryEntry {
            step: 0,
            serial: 0,
            command: None,
            world: initial,
            path: Vec::new(),
            recorded_at: Timestamp::now(),
        };
        Self {
            entries: vec![entry],
            cursor: Cursor::Latest,
            next_serial: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Whether the cursor points into the past.
    pub fn is_time_travelling(&self) -> bool {
        matches!(self.cursor, Cursor::At(_))
    }

    /// The index the cursor resolves to.
    pub fn current_index(&self) -> usize {
        match self.cursor {
            Cursor::Latest => self.entries.len() - 1,
            Cursor::At(i) => i,
        }
    }

    /// The entry the cursor resolves to.
    pub fn resolve(&self) -> &HistoryEntry {
        &self.entries[self.current_index()]
    }

    /// The newest entry, regardless of the cursor.
    pub fn latest(&self) -> &HistoryEntry {
        &self.entries[self.entries.len() - 1]
    }

    /// Appends a new accepted state.
    ///
    /// If the cursor is in the past, everything after it is discarded first.
    /// The cursor always ends at `Latest`.
    pub fn append(
        &mut self,
        command: impl Into<String>,
        world: WorldState,
        path: Vec<PathStep>,
    ) -> &HistoryEntry {
        if let Cursor::At(i) = self.cursor {
            self.truncate_after(i);
        }

        let entry = HistoryEntry {
            step: self.entries.len(),
            serial: self.next_serial,
            command: Some(command.into()),
            world,
            path,
            recorded_at: Timestamp::now(),
        };
        self.next_serial += 1;
        self.entries.push(entry);
        self.cursor = Cursor::Latest;
        self.latest()
    }

    /// Steps one entry back. Returns whether the cursor moved.
    pub fn undo(&mut self) -> bool {
        if self.entries.len() <= 1 {
            return false;
        }
        match self.cursor {
            Cursor::Latest => {
                self.cursor = Cursor::At(self.entries.len() - 2);
                true
            }
            Cursor::At(0) => false,
            Cursor::At(i) => {
                self.cursor = Cursor::At(i - 1);
                true
            }
        }
    }

    /// Steps one entry forward. Returns whether the cursor moved.
    pub fn redo(&mut self) -> bool {
        match self.cursor {
            Cursor::Latest => false,
            Cursor::At(i) => {
                self.set_index(i + 1);
                true
            }
        }
    }

    /// Moves the cursor to an absolute index, clamped into the log.
    pub fn jump_to(&mut self, index: usize) {
        self.set_index(index.min(self.entries.len() - 1));
    }

    /// Moves the cursor to `step_n` entries before the newest, clamped.
    pub fn jump_back(&mut self, step_n: usize) {
        self.jump_to((self.entries.len() - 1).saturating_sub(step_n));
    }

    fn set_index(&mut self, index: usize) {
        self.cursor = if index + 1 >= self.entries.len() {
            Cursor::Latest
        } else {
            Cursor::At(index)
        };
    }

    fn truncate_after(&mut self, index: usize) {
        self.entries.truncate(index + 1);
        self.cursor = Cursor::Latest;
    }
}
