//! Core data model for voxelurn.
//!
//! These types describe the world being built and what flows around it:
//! voxel snapshots, the parser's candidate interpretations, and the
//! product events written to the event log.

mod candidate;
mod event;
mod world;

use serde::{Deserialize, Serialize};

pub use candidate::{Candidate, CandidateValue};
pub use event::{LogEvent, LogRecord, ScrollDirection};
pub use world::{Coord, Facing, PathStep, RobotPose, Voxel, WorldState};

/// What the user is doing in this session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Task {
    /// Free building, no goal.
    #[default]
    World,

    /// Reach a randomly drawn target structure within a step budget.
    Target,
}
