//! Collision and visibility queries the combat core consumes.
//!
//! The engine owns no map geometry. Everything spatial goes through a
//! [`TraceService`], implemented by the embedding game or by the reference
//! map in `crossfire-terrain`.

use glam::Vec3;

use crate::flags::ContentFlags;
use crate::types::{EntityNumber, GridPos, Viewpoint, WorldPoint};

/// Result of tracing a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    /// Fraction of the segment travelled before the hit; 1.0 = unobstructed.
    pub fraction: f32,
    /// Entity struck, if the obstruction was a linked body.
    pub entity: Option<EntityNumber>,
    pub end_pos: WorldPoint,
    /// Surface normal at the hit; zero if nothing was hit.
    pub normal: Vec3,
    pub contents: ContentFlags,
    /// The segment started inside a solid.
    pub start_solid: bool,
}

impl TraceResult {
    /// Unobstructed trace ending at `to`.
    pub fn clear(to: WorldPoint) -> Self {
        Self {
            fraction: 1.0,
            entity: None,
            end_pos: to,
            normal: Vec3::ZERO,
            contents: ContentFlags::empty(),
            start_solid: false,
        }
    }

    pub fn hit_something(&self) -> bool {
        self.fraction < 1.0
    }
}

/// Launch solution for a thrown projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrowArc {
    pub time_of_flight: f32,
    pub initial_velocity: Vec3,
}

/// Black-box geometry service.
pub trait TraceService {
    /// First obstruction between two points, ignoring `exclude`.
    fn trace(&self, from: WorldPoint, to: WorldPoint, exclude: Option<EntityNumber>) -> TraceResult;

    /// Nothing opaque lies between the points.
    fn line_of_sight(&self, a: WorldPoint, b: WorldPoint) -> bool;

    /// Point lies inside the observer's field of view.
    fn frustum_visible(&self, viewer: &Viewpoint, point: WorldPoint) -> bool;

    fn grid_to_world(&self, cell: GridPos) -> WorldPoint {
        cell.center()
    }

    fn world_to_grid(&self, point: WorldPoint) -> GridPos {
        GridPos::containing(point)
    }

    /// Slowest arc from `from` to `to` whose launch speed stays within
    /// `max_speed`. `None` when no clear arc exists.
    fn solve_throw_arc(
        &self,
        from: WorldPoint,
        to: WorldPoint,
        max_speed: f32,
        launched: bool,
        rolled: bool,
    ) -> Option<ThrowArc>;

    /// Register or move an entity's collision box.
    fn link_entity(&mut self, number: EntityNumber, mins: WorldPoint, maxs: WorldPoint);

    /// Remove an entity from collision queries.
    fn unlink_entity(&mut self, number: EntityNumber);
}
