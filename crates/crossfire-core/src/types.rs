//! Fundamental geometric and identity types.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{UNIT_HEIGHT, UNIT_SIZE};

/// Point in world space (map units). x = East, y = North, z = Up.
pub type WorldPoint = Vec3;

/// Cell coordinates on the battle grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Centre of the cell in world space.
    pub fn center(&self) -> WorldPoint {
        Vec3::new(
            (self.x as f32 + 0.5) * UNIT_SIZE,
            (self.y as f32 + 0.5) * UNIT_SIZE,
            self.z as f32 * UNIT_HEIGHT + UNIT_HEIGHT / 2.0,
        )
    }

    /// Cell containing a world point.
    pub fn containing(point: WorldPoint) -> Self {
        Self {
            x: (point.x / UNIT_SIZE).floor() as i32,
            y: (point.y / UNIT_SIZE).floor() as i32,
            z: (point.z / UNIT_HEIGHT).floor() as i32,
        }
    }
}

/// Stable number identifying a combatant, breakable or floor container.
/// Carried in events so the presentation layer can address entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityNumber(pub u32);

/// Team index. Civilians are team 0, the player's squad team 1, aliens team 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u8);

impl TeamId {
    pub const CIVILIAN: TeamId = TeamId(0);
    pub const PHALANX: TeamId = TeamId(1);
    pub const ALIEN: TeamId = TeamId(7);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_civilian(self) -> bool {
        self == Self::CIVILIAN
    }

    pub fn is_alien(self) -> bool {
        self == Self::ALIEN
    }
}

/// One of eight compass facings, counter-clockwise from East in 45° steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Direction(pub u8);

impl Direction {
    pub const EAST: Direction = Direction(0);
    pub const NORTH: Direction = Direction(2);
    pub const WEST: Direction = Direction(4);
    pub const SOUTH: Direction = Direction(6);

    /// Nearest facing for a planar angle in radians.
    pub fn from_angle(radians: f32) -> Self {
        let step = std::f32::consts::FRAC_PI_4;
        let idx = (radians / step).round().rem_euclid(8.0) as u8;
        Direction(idx % 8)
    }

    /// Facing that looks from `from` towards `to` (planar). East if degenerate.
    pub fn towards(from: GridPos, to: GridPos) -> Self {
        let dx = (to.x - from.x) as f32;
        let dy = (to.y - from.y) as f32;
        if dx == 0.0 && dy == 0.0 {
            return Self::EAST;
        }
        Self::from_angle(dy.atan2(dx))
    }

    pub fn angle(self) -> f32 {
        (self.0 % 8) as f32 * std::f32::consts::FRAC_PI_4
    }

    /// Unit vector in the horizontal plane.
    pub fn to_vec(self) -> Vec3 {
        let a = self.angle();
        Vec3::new(a.cos(), a.sin(), 0.0)
    }
}

/// Observer position and facing for frustum tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    pub origin: WorldPoint,
    pub facing: Direction,
}

/// Pitch/yaw pair in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Angles {
    pub pitch: f32,
    pub yaw: f32,
}

impl Angles {
    /// Angles of a direction vector. Pitch is positive upwards.
    pub fn from_vec(dir: Vec3) -> Self {
        let horizontal = (dir.x * dir.x + dir.y * dir.y).sqrt();
        Self {
            pitch: dir.z.atan2(horizontal),
            yaw: dir.y.atan2(dir.x),
        }
    }

    /// Unit forward vector.
    pub fn forward(&self) -> Vec3 {
        let (sp, cp) = self.pitch.sin_cos();
        let (sy, cy) = self.yaw.sin_cos();
        Vec3::new(cp * cy, cp * sy, sp)
    }
}
