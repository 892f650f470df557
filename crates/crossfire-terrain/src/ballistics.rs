//! Throw-arc solver for lobbed projectiles.
//!
//! Arcs are parabolas under constant gravity. The solver picks a launch
//! angle, derives the speed that lands on the target, and walks the arc in
//! fixed steps to make sure no wall is in the way.

use glam::Vec3;

use crossfire_core::constants::{GRAVITY, GRENADE_DT, ROLL_ANGLE_DEG};
use crossfire_core::flags::ContentFlags;
use crossfire_core::trace::ThrowArc;

use crate::map::BattleMap;

/// Steepest launch angle tried (radians, 85°).
const MAX_LAUNCH_ANGLE: f32 = 85.0 * std::f32::consts::PI / 180.0;

/// Angle increment while searching for a clear arc (radians, 1°).
const ANGLE_STEP: f32 = std::f32::consts::PI / 180.0;

/// Speed needed to hit a point `d` away horizontally and `h` above the
/// launch point at elevation `alpha`. `None` if the angle cannot reach it.
pub fn speed_for_angle(d: f32, h: f32, alpha: f32) -> Option<f32> {
    let (sin, cos) = alpha.sin_cos();
    let rise = d * sin / cos - h;
    if rise <= 0.0 || cos <= 0.0 {
        return None;
    }
    Some((GRAVITY * d * d / (2.0 * cos * cos * rise)).sqrt())
}

/// Elevation that needs the least launch speed.
pub fn min_speed_angle(d: f32, h: f32) -> f32 {
    (std::f32::consts::FRAC_PI_2 + h.atan2(d)) / 2.0
}

/// Position on the arc `t` seconds after launch.
pub fn position_at(from: Vec3, velocity: Vec3, t: f32) -> Vec3 {
    from + velocity * t - Vec3::new(0.0, 0.0, 0.5 * GRAVITY * t * t)
}

/// Solve a throw from `from` to `to`.
///
/// Rolled projectiles leave at a fixed shallow angle. Launched projectiles use
/// the flattest angle within `max_speed`, thrown ones start at the
/// least-effort angle; both steepen until the arc is clear of walls.
pub fn solve_arc(
    map: &BattleMap,
    from: Vec3,
    to: Vec3,
    max_speed: f32,
    launched: bool,
    rolled: bool,
) -> Option<ThrowArc> {
    let planar = Vec3::new(to.x - from.x, to.y - from.y, 0.0);
    let d = planar.length();
    let h = to.z - from.z;

    if d < 1.0 {
        // Dropped at the thrower's feet.
        if h > 0.0 {
            return None;
        }
        return Some(ThrowArc {
            time_of_flight: (-2.0 * h / GRAVITY).sqrt(),
            initial_velocity: Vec3::ZERO,
        });
    }
    let heading = planar / d;

    let candidates: Vec<f32> = if rolled {
        vec![ROLL_ANGLE_DEG.to_radians()]
    } else {
        let floor = h.atan2(d) + ANGLE_STEP;
        let start = if launched {
            floor
        } else {
            min_speed_angle(d, h)
        };
        let mut angles = Vec::new();
        let mut alpha = start;
        while alpha <= MAX_LAUNCH_ANGLE {
            angles.push(alpha);
            alpha += ANGLE_STEP;
        }
        angles
    };

    for alpha in candidates {
        let Some(speed) = speed_for_angle(d, h, alpha) else {
            continue;
        };
        if speed > max_speed {
            continue;
        }
        let (sin, cos) = alpha.sin_cos();
        let velocity = heading * (speed * cos) + Vec3::new(0.0, 0.0, speed * sin);
        let time_of_flight = d / (speed * cos);
        if arc_is_clear(map, from, velocity, time_of_flight) {
            return Some(ThrowArc {
                time_of_flight,
                initial_velocity: velocity,
            });
        }
    }
    None
}

/// Walk the arc in `GRENADE_DT` steps; every step up to the landing time
/// must be free of solid geometry.
fn arc_is_clear(map: &BattleMap, from: Vec3, velocity: Vec3, time_of_flight: f32) -> bool {
    let mut t = 0.0;
    let mut last = from;
    while t < time_of_flight {
        let next_t = (t + GRENADE_DT).min(time_of_flight);
        let next = position_at(from, velocity, next_t);
        let tr = map.trace_world(last, next, ContentFlags::SOLID | ContentFlags::WINDOW);
        if tr.start_solid || tr.hit_something() {
            return false;
        }
        last = next;
        t = next_t;
    }
    true
}
