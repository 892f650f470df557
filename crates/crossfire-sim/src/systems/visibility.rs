//! Who sees what: actor visibility fractions, team point checks and the
//! per-unit `seen_by` masks that drive event delivery.

use glam::Vec3;
use hecs::Entity;

use crossfire_core::components::{Actor, Placement, UnitState, Visibility};
use crossfire_core::constants::*;
use crossfire_core::events::BattleEvent;
use crossfire_core::flags::{StateFlags, TeamMask};
use crossfire_core::trace::TraceService;
use crossfire_core::types::{TeamId, Viewpoint, WorldPoint};

use crate::engine::CombatEngine;

/// Eye position of an observer standing, crouching or panicking at `origin`.
pub fn eye_position(origin: WorldPoint, flags: StateFlags) -> WorldPoint {
    let height = if flags.is_low() { EYE_CROUCH } else { EYE_STAND };
    origin + Vec3::new(0.0, 0.0, height)
}

/// Fraction of `target` visible from `from`: 0, 0.1, 0.5 or 1.
///
/// Three sight lines are tested, head to hip, each shifted sideways. Without
/// `full` the first clear line counts as fully visible. Corpses are tested
/// with a single line.
pub fn actor_vis<T: TraceService>(engine: &CombatEngine<T>, from: WorldPoint, target: Entity, full: bool) -> f32 {
    let Ok(origin) = engine.world.get::<&Placement>(target).map(|p| p.origin) else {
        return 0.0;
    };
    let flags = engine
        .world
        .get::<&UnitState>(target)
        .map(|s| s.flags)
        .unwrap_or_default();

    let mut test = origin;
    let delta = if flags.contains(StateFlags::DEAD) {
        test.z += PLAYER_DEAD;
        0.0
    } else if flags.is_low() {
        test.z += PLAYER_CROUCH - 2.0;
        (PLAYER_CROUCH - PLAYER_MIN) / 2.0 - 2.0
    } else {
        test.z += PLAYER_STAND;
        (PLAYER_STAND - PLAYER_MIN) / 2.0 - 2.0
    };

    let side = Vec3::new(from.y - origin.y, origin.x - from.x, 0.0).normalize_or_zero();
    test -= side * 7.0;

    let mut visible = 0;
    for _ in 0..3 {
        if engine.trace.line_of_sight(from, test) {
            if !full {
                return 1.0;
            }
            visible += 1;
        }
        if delta == 0.0 {
            return if visible > 0 { 1.0 } else { 0.0 };
        }
        test += side * 7.0;
        test.z -= delta;
    }

    match visible {
        0 => 0.0,
        1 => 0.1,
        2 => 0.5,
        _ => 1.0,
    }
}

/// Some living member of `team` has `point` in view.
pub fn team_point_vis<T: TraceService>(engine: &CombatEngine<T>, team: TeamId, point: WorldPoint) -> bool {
    engine
        .world
        .query::<(&Actor, &Placement, &UnitState)>()
        .iter()
        .filter(|(_, (actor, _, state))| actor.team == team && !state.flags.is_out_of_action())
        .any(|(_, (_, place, state))| {
            let view = Viewpoint {
                origin: place.origin,
                facing: place.facing,
            };
            engine.trace.frustum_visible(&view, point)
                && engine
                    .trace
                    .line_of_sight(eye_position(place.origin, state.flags), point)
        })
}

/// Can `observer` see `target` right now?
pub fn unit_sees<T: TraceService>(engine: &CombatEngine<T>, observer: Entity, target: Entity) -> bool {
    let Ok((place, flags)) = engine
        .world
        .get::<&Placement>(observer)
        .and_then(|p| engine.world.get::<&UnitState>(observer).map(|s| (*p, s.flags)))
    else {
        return false;
    };
    if flags.is_out_of_action() {
        return false;
    }
    let Ok(target_place) = engine.world.get::<&Placement>(target).map(|p| *p) else {
        return false;
    };
    if place.pos == target_place.pos {
        return true;
    }
    if place.origin.distance(target_place.origin) > MAX_SPOT_DIST {
        return false;
    }
    let view = Viewpoint {
        origin: place.origin,
        facing: place.facing,
    };
    if !engine.trace.frustum_visible(&view, target_place.origin) {
        return false;
    }
    actor_vis(engine, eye_position(place.origin, flags), target, false) > 0.0
}

/// Recompute `seen_by` for every unit. A team always sees its own units;
/// newly spotted units appear to the teams that just found them and perish
/// for the teams that lost them.
pub fn refresh<T: TraceService>(engine: &mut CombatEngine<T>) {
    let units: Vec<(Entity, TeamId)> = engine
        .world
        .query::<&Actor>()
        .iter()
        .map(|(e, actor)| (e, actor.team))
        .collect();

    let mut updates = Vec::with_capacity(units.len());
    for &(target, target_team) in &units {
        let mut mask = TeamMask::of(target_team);
        for &(observer, observer_team) in &units {
            if mask.contains_team(observer_team) {
                continue;
            }
            if unit_sees(engine, observer, target) {
                mask = mask.with(observer_team);
            }
        }
        updates.push((target, mask));
    }

    for (target, mask) in updates {
        let old = engine.seen_by(target);
        if let Ok(mut vis) = engine.world.get::<&mut Visibility>(target) {
            vis.seen_by = mask;
        }
        let appeared = mask & !old;
        let lost = old & !mask;
        let Some(number) = engine.number_of(target) else {
            continue;
        };
        if !lost.is_empty() {
            engine.emit(lost, BattleEvent::ActorPerish { entity: number });
        }
        if appeared.is_empty() {
            continue;
        }
        let Ok(pos) = engine.world.get::<&Placement>(target).map(|p| p.pos) else {
            continue;
        };
        engine.emit(appeared, BattleEvent::ActorAppear { entity: number, pos });
    }
}
