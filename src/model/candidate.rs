//! Candidate interpretations proposed by the semantic parser.

use serde::{Deserialize, Serialize};

use super::world::{PathStep, RobotPose, Voxel, WorldState};

/// One ranked interpretation of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The world this interpretation would produce.
    pub value: CandidateValue,

    /// Human-readable explanation of the interpretation.
    #[serde(default)]
    pub pretty_string: String,

    /// Warning or explanation for the user. Empty means nothing to show.
    #[serde(default)]
    pub status: String,

    /// The parser could not execute this interpretation. Never committed.
    #[serde(default)]
    pub error: bool,

    /// Intermediate moves, for display.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathStep>,
}

/// The proposed resulting world, in either of the shapes the parser emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateValue {
    /// Just the blocks; the robot stays where it is.
    Blocks(Vec<Voxel>),

    /// Blocks and, optionally, where the robot ends up.
    #[serde(rename_all = "camelCase")]
    Snapshot {
        world_map: Vec<Voxel>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        robot: Option<RobotPose>,
    },
}

impl Candidate {
    /// The world that committing this candidate on top of `current` yields.
    pub fn resulting_world(&self, current: &WorldState) -> WorldState {
        match &self.value {
            CandidateValue::Blocks(voxels) => {
                WorldState::from_voxels(voxels.iter().cloned(), current.robot)
            }
            CandidateValue::Snapshot { world_map, robot } => {
                WorldState::from_voxels(world_map.iter().cloned(), robot.unwrap_or(current.robot))
            }
        }
    }

    /// The status message, if there is one worth surfacing.
    pub fn status_message(&self) -> Option<&str> {
        let status = self.status.trim();
        (!status.is_empty()).then_some(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{Coord, Facing};

    #[test]
    fn bare_blocks_keep_current_robot() {
        let json = r#"{"value":[{"x":0,"y":0,"z":0,"color":"yellow"}],"prettyString":"add yellow"}"#;
        let candidate: Candidate = serde_json::from_str(json).unwrap();

        let mut current = WorldState::empty();
        current.robot.position = Coord::new(2, 1, 0);

        let next = candidate.resulting_world(&current);
        assert_eq!(next.len(), 1);
        assert_eq!(next.robot.position, Coord::new(2, 1, 0));
        assert!(!candidate.error);
        assert_eq!(candidate.status_message(), None);
    }

    #[test]
    fn snapshot_moves_robot() {
        let json = r#"{
            "value": {"worldMap": [], "robot": {"position": {"x":1,"y":0,"z":0}, "facing": "east"}},
            "prettyString": "move right",
            "status": "  robot walked off the edge  ",
            "error": false
        }"#;
        let candidate: Candidate = serde_json::from_str(json).unwrap();

        let next = candidate.resulting_world(&WorldState::empty());
        assert_eq!(next.robot.facing, Facing::East);
        assert_eq!(
            candidate.status_message(),
            Some("robot walked off the edge")
        );
    }
}
