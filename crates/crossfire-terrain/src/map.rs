//! BattleMap: box-brush battlefield geometry with linked entity bodies.
//!
//! Walls, windows and props are axis-aligned brushes. Units and breakables
//! register their bounding boxes as bodies. The ground is an infinite plane
//! at z = 0.

use std::collections::BTreeMap;

use glam::Vec3;
use tracing::trace;

use crossfire_core::constants::{FRUSTUM_HALF_ANGLE, UNIT_HEIGHT, UNIT_SIZE};
use crossfire_core::flags::ContentFlags;
use crossfire_core::trace::{ThrowArc, TraceResult, TraceService};
use crossfire_core::types::{EntityNumber, Viewpoint, WorldPoint};

use crate::ballistics;

/// Traces stop this far short of the surface they hit.
const SURFACE_EPSILON: f32 = 0.03125;

/// Solid axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub contents: ContentFlags,
}

impl Brush {
    pub fn new(mins: Vec3, maxs: Vec3, contents: ContentFlags) -> Self {
        Self {
            mins: mins.min(maxs),
            maxs: mins.max(maxs),
            contents,
        }
    }

    fn contains(&self, p: Vec3) -> bool {
        p.cmpgt(self.mins).all() && p.cmplt(self.maxs).all()
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    mins: Vec3,
    maxs: Vec3,
}

/// Entry into a box along a segment.
#[derive(Debug, Clone, Copy)]
struct BoxHit {
    t: f32,
    normal: Vec3,
}

/// Battlefield geometry.
#[derive(Debug, Clone, Default)]
pub struct BattleMap {
    /// Extent in cells; used only for bounds checks by callers.
    pub width: i32,
    pub height: i32,
    brushes: Vec<Brush>,
    bodies: BTreeMap<EntityNumber, Body>,
}

impl BattleMap {
    /// Empty map of the given size in cells.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            brushes: Vec::new(),
            bodies: BTreeMap::new(),
        }
    }

    pub fn add_brush(&mut self, brush: Brush) {
        self.brushes.push(brush);
    }

    /// Wall on the plane x = `x`, spanning cells `y0..y1` on level `z`.
    pub fn add_wall_x(&mut self, x: f32, y0: i32, y1: i32, z: i32, thickness: f32, contents: ContentFlags) {
        let half = thickness / 2.0;
        self.add_brush(Brush::new(
            Vec3::new(x - half, y0 as f32 * UNIT_SIZE, z as f32 * UNIT_HEIGHT),
            Vec3::new(x + half, y1 as f32 * UNIT_SIZE, (z + 1) as f32 * UNIT_HEIGHT),
            contents,
        ));
    }

    /// Wall on the plane y = `y`, spanning cells `x0..x1` on level `z`.
    pub fn add_wall_y(&mut self, y: f32, x0: i32, x1: i32, z: i32, thickness: f32, contents: ContentFlags) {
        let half = thickness / 2.0;
        self.add_brush(Brush::new(
            Vec3::new(x0 as f32 * UNIT_SIZE, y - half, z as f32 * UNIT_HEIGHT),
            Vec3::new(x1 as f32 * UNIT_SIZE, y + half, (z + 1) as f32 * UNIT_HEIGHT),
            contents,
        ));
    }

    pub fn is_linked(&self, number: EntityNumber) -> bool {
        self.bodies.contains_key(&number)
    }

    /// Trace against brushes and the ground only.
    pub fn trace_world(&self, from: Vec3, to: Vec3, mask: ContentFlags) -> TraceResult {
        self.trace_inner(from, to, None, mask, false)
    }

    fn trace_inner(
        &self,
        from: Vec3,
        to: Vec3,
        exclude: Option<EntityNumber>,
        mask: ContentFlags,
        with_bodies: bool,
    ) -> TraceResult {
        let delta = to - from;
        let length = delta.length();
        if length <= f32::EPSILON {
            return TraceResult::clear(to);
        }

        for brush in &self.brushes {
            if brush.contents.intersects(mask) && brush.contains(from) {
                return TraceResult {
                    fraction: 0.0,
                    entity: None,
                    end_pos: from,
                    normal: Vec3::ZERO,
                    contents: brush.contents,
                    start_solid: true,
                };
            }
        }

        let mut best: Option<(BoxHit, ContentFlags, Option<EntityNumber>)> = None;
        let mut consider = |hit: BoxHit, contents: ContentFlags, entity: Option<EntityNumber>| {
            if best.as_ref().map_or(true, |(b, _, _)| hit.t < b.t) {
                best = Some((hit, contents, entity));
            }
        };

        for brush in &self.brushes {
            if !brush.contents.intersects(mask) {
                continue;
            }
            if let Some(hit) = segment_box(from, delta, brush.mins, brush.maxs) {
                consider(hit, brush.contents, None);
            }
        }

        if with_bodies {
            for (number, body) in &self.bodies {
                if Some(*number) == exclude {
                    continue;
                }
                if let Some(hit) = segment_box(from, delta, body.mins, body.maxs) {
                    consider(hit, ContentFlags::BODY, Some(*number));
                }
            }
        }

        // Ground plane
        if mask.contains(ContentFlags::SOLID) && from.z >= 0.0 && to.z < 0.0 {
            let t = from.z / (from.z - to.z);
            consider(
                BoxHit {
                    t,
                    normal: Vec3::Z,
                },
                ContentFlags::SOLID,
                None,
            );
        }

        match best {
            Some((hit, contents, entity)) => {
                let fraction = (hit.t - SURFACE_EPSILON / length).max(0.0);
                TraceResult {
                    fraction,
                    entity,
                    end_pos: from + delta * fraction,
                    normal: hit.normal,
                    contents,
                    start_solid: false,
                }
            }
            None => TraceResult::clear(to),
        }
    }
}

/// Slab test of the segment `from + t * delta`, t in [0, 1], against a box.
/// Segments starting inside the box do not hit it.
fn segment_box(from: Vec3, delta: Vec3, mins: Vec3, maxs: Vec3) -> Option<BoxHit> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let (o, d, lo, hi) = (from[axis], delta[axis], mins[axis], maxs[axis]);
        if d.abs() < 1e-9 {
            if o <= lo || o >= hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (t0, t1) = ((lo - o) * inv, (hi - o) * inv);
        let (near, far, face) = if t0 < t1 { (t0, t1, -1.0) } else { (t1, t0, 1.0) };
        if near > t_enter {
            t_enter = near;
            normal = Vec3::ZERO;
            normal[axis] = face;
        }
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_enter < 0.0 || t_enter > 1.0 {
        return None;
    }
    Some(BoxHit { t: t_enter, normal })
}

impl TraceService for BattleMap {
    fn trace(&self, from: WorldPoint, to: WorldPoint, exclude: Option<EntityNumber>) -> TraceResult {
        let result = self.trace_inner(
            from,
            to,
            exclude,
            ContentFlags::SOLID | ContentFlags::WINDOW,
            true,
        );
        trace!(
            ?from,
            ?to,
            fraction = result.fraction,
            entity = ?result.entity,
            "segment trace"
        );
        result
    }

    fn line_of_sight(&self, a: WorldPoint, b: WorldPoint) -> bool {
        let result = self.trace_inner(a, b, None, ContentFlags::SOLID, false);
        !result.start_solid && !result.hit_something()
    }

    fn frustum_visible(&self, viewer: &Viewpoint, point: WorldPoint) -> bool {
        let offset = point - viewer.origin;
        let planar = Vec3::new(offset.x, offset.y, 0.0);
        if planar.length_squared() < 1.0 {
            return true;
        }
        let cos = planar.normalize().dot(viewer.facing.to_vec());
        cos >= FRUSTUM_HALF_ANGLE.cos() - 1e-5
    }

    fn solve_throw_arc(
        &self,
        from: WorldPoint,
        to: WorldPoint,
        max_speed: f32,
        launched: bool,
        rolled: bool,
    ) -> Option<ThrowArc> {
        ballistics::solve_arc(self, from, to, max_speed, launched, rolled)
    }

    fn link_entity(&mut self, number: EntityNumber, mins: WorldPoint, maxs: WorldPoint) {
        self.bodies.insert(number, Body { mins, maxs });
    }

    fn unlink_entity(&mut self, number: EntityNumber) {
        self.bodies.remove(&number);
    }
}
