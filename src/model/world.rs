//! World snapshots: voxels on a 3D grid plus the robot that places them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A cell on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coord {
    pub const ORIGIN: Self = Self { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// One occupied cell as it travels over the wire.
///
/// Extra fields the parser attaches (selection names, markers) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voxel {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub color: String,
}

impl Voxel {
    pub fn new(x: i32, y: i32, z: i32, color: impl Into<String>) -> Self {
        Self {
            x,
            y,
            z,
            color: color.into(),
        }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y, self.z)
    }
}

/// Which way the robot is looking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Facing {
    #[default]
    North,
    East,
    South,
    West,
}

/// Where the robot stands and which way it faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotPose {
    pub position: Coord,

    #[serde(default)]
    pub facing: Facing,
}

impl Default for RobotPose {
    fn default() -> Self {
        Self {
            position: Coord::ORIGIN,
            facing: Facing::North,
        }
    }
}

/// An intermediate step of an interpretation, kept for explanation only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub x: i32,
    pub y: i32,
    pub z: i32,

    /// Highlight color, when the step marks a cell rather than a move.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A full snapshot of the voxel grid and the robot.
///
/// Serialized as `{ "worldMap": [voxels], "robot": pose }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Snapshot", into = "Snapshot")]
pub struct WorldState {
    blocks: BTreeMap<Coord, String>,
    pub robot: RobotPose,
}

impl WorldState {
    /// An empty grid with the robot at the origin.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot from voxels. A later voxel at the same cell wins.
    pub fn from_voxels(voxels: impl IntoIterator<Item = Voxel>, robot: RobotPose) -> Self {
        let blocks = voxels.into_iter().map(|v| (v.coord(), v.color)).collect();
        Self { blocks, robot }
    }

    /// Occupied cells in coordinate order.
    pub fn voxels(&self) -> impl Iterator<Item = Voxel> + '_ {
        self.blocks
            .iter()
            .map(|(c, color)| Voxel::new(c.x, c.y, c.z, color.clone()))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Structural equality: same occupied cells with the same block colors.
    ///
    /// The robot pose is not part of the structure.
    pub fn same_structure(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    world_map: Vec<Voxel>,

    #[serde(default)]
    robot: RobotPose,
}

impl From<Snapshot> for WorldState {
    fn from(s: Snapshot) -> Self {
        Self::from_voxels(s.world_map, s.robot)
    }
}

impl From<WorldState> for Snapshot {
    fn from(w: WorldState) -> Self {
        Self {
            world_map: w.voxels().collect(),
            robot: w.robot,
        }
    }
}
