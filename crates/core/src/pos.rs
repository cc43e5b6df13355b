//! Positions, block volumes and rotations.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer block coordinates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Create a block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Block containing the given point.
    pub fn containing(pos: DVec3) -> Self {
        Self {
            x: pos.x.floor() as i32,
            y: pos.y.floor() as i32,
            z: pos.z.floor() as i32,
        }
    }

    /// Offset by a delta on each axis.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
            z: self.z.wrapping_add(dz),
        }
    }

    /// Centre of the block's bottom face.
    pub fn bottom_center(self) -> DVec3 {
        DVec3::new(self.x as f64 + 0.5, self.y as f64, self.z as f64 + 0.5)
    }

    /// Chunk column containing this block.
    pub fn chunk_column(self) -> (i32, i32) {
        (self.x >> 4, self.z >> 4)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.x, self.y, self.z)
    }
}

/// Inclusive axis-aligned box of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockBox {
    /// Minimum corner (inclusive).
    pub min: BlockPos,
    /// Maximum corner (inclusive).
    pub max: BlockPos,
}

impl BlockBox {
    /// Box spanning two arbitrary corners.
    pub fn from_corners(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Number of blocks along each axis.
    pub fn spans(&self) -> (u64, u64, u64) {
        let span = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo) + 1) as u64;
        (
            span(self.min.x, self.max.x),
            span(self.min.y, self.max.y),
            span(self.min.z, self.max.z),
        )
    }

    /// Total number of blocks in the box.
    pub fn volume(&self) -> u64 {
        let (x, y, z) = self.spans();
        x.saturating_mul(y).saturating_mul(z)
    }

    /// Same-shaped box whose minimum corner is `origin`.
    pub fn moved_to(&self, origin: BlockPos) -> Self {
        Self {
            min: origin,
            max: origin.offset(
                self.max.x - self.min.x,
                self.max.y - self.min.y,
                self.max.z - self.min.z,
            ),
        }
    }

    /// Every position in the box, z-major then y then x.
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> + '_ {
        (self.min.z..=self.max.z).flat_map(move |z| {
            (self.min.y..=self.max.y)
                .flat_map(move |y| (self.min.x..=self.max.x).map(move |x| BlockPos::new(x, y, z)))
        })
    }
}

/// Facing angles in degrees.
///
/// Yaw 0 faces +Z (south), -90 faces +X (east); pitch is positive looking down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    /// Horizontal angle.
    pub yaw: f32,
    /// Vertical angle.
    pub pitch: f32,
}

impl Rotation {
    /// Create a rotation.
    pub const fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }
}

/// Wrap an angle into `[-180, 180)`.
pub fn wrap_degrees(angle: f32) -> f32 {
    let mut wrapped = angle % 360.0;
    if wrapped >= 180.0 {
        wrapped -= 360.0;
    }
    if wrapped < -180.0 {
        wrapped += 360.0;
    }
    wrapped
}
