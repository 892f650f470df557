//! Morale: shifts after a unit is hurt or killed, and the mental check a
//! team goes through when its turn starts.

use hecs::Entity;
use tracing::debug;

use crossfire_core::components::{Actor, Bounds, Inventory, Placement, Skills, TimeUnits, UnitState, Vitals};
use crossfire_core::constants::{max_morale_for_mind, TU_REACTION_SINGLE};
use crossfire_core::enums::Hand;
use crossfire_core::events::BattleEvent;
use crossfire_core::flags::StateFlags;
use crossfire_core::trace::TraceService;
use crossfire_core::types::{TeamId, Viewpoint};

use crate::engine::CombatEngine;
use crate::systems::{crand, floor, frand, visibility};
use crate::world_setup;

/// Apply the morale change caused by `damage` to `victim` (and its death,
/// if `death`) to every living non-civilian unit.
pub fn apply_morale<T: TraceService>(
    engine: &mut CombatEngine<T>,
    victim: Entity,
    attacker: Entity,
    damage: i32,
    death: bool,
) {
    let Ok((victim_team, victim_origin)) = engine
        .world
        .get::<&Actor>(victim)
        .and_then(|a| engine.world.get::<&Placement>(victim).map(|p| (a.team, p.origin)))
    else {
        return;
    };
    let Ok((attacker_team, attacker_origin)) = engine
        .world
        .get::<&Actor>(attacker)
        .and_then(|a| engine.world.get::<&Placement>(attacker).map(|p| (a.team, p.origin)))
    else {
        return;
    };

    let observers: Vec<(Entity, TeamId, Placement)> = engine
        .world
        .query::<(&Actor, &Placement, &UnitState)>()
        .iter()
        .filter(|(_, (actor, _, state))| !state.flags.is_out_of_action() && !actor.team.is_civilian())
        .map(|(e, (actor, place, _))| (e, actor.team, *place))
        .collect();

    let cfg = engine.config.morale.clone();
    let single_player = engine.config.single_player;
    let spawned = engine.level.spawned(victim_team) as f32;
    let alive = engine.level.alive(victim_team) as f32;

    for (observer, team, place) in observers {
        let mut modifier = cfg.mob_wound * damage as f32;
        if death {
            modifier += cfg.mob_death;
        }

        let watching = observer == victim || {
            let view = Viewpoint {
                origin: place.origin,
                facing: place.facing,
            };
            visibility::actor_vis(engine, place.origin, victim, false) > 0.0
                && engine.trace.frustum_visible(&view, victim_origin)
        };
        if watching {
            modifier *= cfg.mof_watching;
        }
        if team == attacker_team {
            if victim_team == attacker_team {
                modifier *= cfg.mof_teamkill;
            } else {
                modifier *= cfg.mof_enemy;
            }
        }
        if victim_team.is_civilian() {
            modifier *= cfg.mof_civilian;
        }
        if victim_team == team || (victim_team.is_civilian() && !team.is_alien() && single_player) {
            modifier = -modifier;
        }

        let dv = place.origin.distance(victim_origin);
        let da = place.origin.distance(attacker_origin);
        modifier *= cfg.mor_default
            + 0.5f32.powf(dv / cfg.mor_distance) * cfg.mor_victim
            + 0.5f32.powf(da / cfg.mor_distance) * cfg.mor_attacker;
        modifier *= (1.0 - cfg.mon_teamfactor) + cfg.mon_teamfactor * (spawned + 1.0) / (alive + 1.0);
        if observer == victim {
            modifier *= cfg.mor_pain;
        }

        let noise = 1.0 + 0.3 * crand(&mut engine.rng);
        let shift = (modifier * noise + 0.9) as i32;
        let mind = engine
            .world
            .get::<&Skills>(observer)
            .map(|s| s.mind)
            .unwrap_or(0);
        if let Ok(mut vitals) = engine.world.get::<&mut Vitals>(observer) {
            vitals.morale = (vitals.morale + shift).clamp(0, max_morale_for_mind(mind));
        }
        engine.send_stats(observer);
    }
}

/// Turn-start mental check for `team`. Units at low morale break into
/// panic or rage, or start the turn shaken; broken units may recover; every
/// unit regains some morale.
pub fn morale_behaviour<T: TraceService>(engine: &mut CombatEngine<T>, team: TeamId) {
    let cfg = engine.config.morale.clone();
    if !cfg.enabled || cfg.mor_panic <= 0.0 {
        return;
    }
    let units: Vec<Entity> = engine
        .world
        .query::<(&Actor, &UnitState)>()
        .iter()
        .filter(|(_, (actor, state))| actor.team == team && !state.flags.is_out_of_action())
        .map(|(e, _)| e)
        .collect();

    for entity in units {
        let Ok(morale) = engine.world.get::<&Vitals>(entity).map(|v| v.morale) else {
            continue;
        };
        let Ok(flags) = engine.world.get::<&UnitState>(entity).map(|s| s.flags) else {
            continue;
        };
        let ratio = morale as f32 / cfg.mor_panic;
        let broken = flags.intersects(StateFlags::PANIC | StateFlags::RAGE | StateFlags::INSANE);

        if morale as f32 <= cfg.mor_panic && !broken {
            let sanity = ratio > cfg.m_sanity * frand(&mut engine.rng);
            if ratio > cfg.m_rage * frand(&mut engine.rng) {
                panic(engine, entity, sanity);
            } else {
                rage(engine, entity, sanity);
            }
        } else if morale as f32 <= cfg.mor_shaken && !broken {
            if let Ok(mut tu) = engine.world.get::<&mut TimeUnits>(entity) {
                tu.spend(TU_REACTION_SINGLE);
            }
            set_state(engine, entity, |f| f.insert(StateFlags::SHAKEN | StateFlags::REACTION_MANY));
            debug!(unit = ?entity, morale, "unit shaken");
        } else if flags.contains(StateFlags::PANIC) {
            if ratio > cfg.m_panic_stop * frand(&mut engine.rng) {
                set_state(engine, entity, |f| f.remove(StateFlags::PANIC));
            } else {
                panic(engine, entity, true);
            }
        } else if broken {
            if ratio > cfg.m_rage_stop * frand(&mut engine.rng) {
                set_state(engine, entity, |f| f.remove(StateFlags::RAGE | StateFlags::INSANE));
            } else {
                // Rage burns out into panic.
                set_state(engine, entity, |f| f.remove(StateFlags::RAGE | StateFlags::INSANE));
                panic(engine, entity, true);
            }
        }

        relink(engine, entity);

        let mind = engine
            .world
            .get::<&Skills>(entity)
            .map(|s| s.mind)
            .unwrap_or(0);
        let gain = (cfg.mor_regeneration * (1.0 + 0.3 * crand(&mut engine.rng))) as i32;
        if let Ok(mut vitals) = engine.world.get::<&mut Vitals>(entity) {
            vitals.morale = (vitals.morale + gain).min(max_morale_for_mind(mind));
        }
        engine.send_stats(entity);
    }
}

/// The unit panics: it stands up, loses its TU and, if it lost its
/// sanity, drops whatever it holds.
fn panic<T: TraceService>(engine: &mut CombatEngine<T>, entity: Entity, sanity: bool) {
    if !sanity {
        drop_hands(engine, entity);
    }
    set_state(engine, entity, |f| {
        f.remove(StateFlags::CROUCHED);
        f.insert(StateFlags::PANIC);
    });
    if let Ok(mut tu) = engine.world.get::<&mut TimeUnits>(entity) {
        tu.current = 0;
    }
    debug!(unit = ?entity, sanity, "unit panics");
}

fn rage<T: TraceService>(engine: &mut CombatEngine<T>, entity: Entity, sanity: bool) {
    let flag = if sanity {
        StateFlags::RAGE
    } else {
        StateFlags::INSANE
    };
    set_state(engine, entity, |f| f.insert(flag));
    debug!(unit = ?entity, sanity, "unit rages");
}

fn drop_hands<T: TraceService>(engine: &mut CombatEngine<T>, entity: Entity) {
    let Some(number) = engine.number_of(entity) else {
        return;
    };
    let Ok(pos) = engine.world.get::<&Placement>(entity).map(|p| p.pos) else {
        return;
    };
    for hand in [Hand::Right, Hand::Left] {
        let item = engine
            .world
            .get::<&mut Inventory>(entity)
            .ok()
            .and_then(|mut inv| inv.slot_mut(hand).take());
        let Some(item) = item else {
            continue;
        };
        let mask = engine.seen_by(entity);
        engine.emit(mask, BattleEvent::InventoryDelete { entity: number, hand });
        floor::drop_item(engine, item, pos);
    }
}

/// Change the state flags and tell everyone who sees the unit.
fn set_state<T: TraceService>(engine: &mut CombatEngine<T>, entity: Entity, change: impl FnOnce(&mut StateFlags)) {
    let Some(number) = engine.number_of(entity) else {
        return;
    };
    let flags = match engine.world.get::<&mut UnitState>(entity) {
        Ok(mut state) => {
            change(&mut state.flags);
            state.flags
        }
        Err(_) => return,
    };
    let mask = engine.seen_by(entity);
    engine.emit(mask, BattleEvent::StateChanged { entity: number, flags });
}

/// Refit the body to the current stance.
fn relink<T: TraceService>(engine: &mut CombatEngine<T>, entity: Entity) {
    let Some(number) = engine.number_of(entity) else {
        return;
    };
    let Ok(origin) = engine.world.get::<&Placement>(entity).map(|p| p.origin) else {
        return;
    };
    let Ok(flags) = engine.world.get::<&UnitState>(entity).map(|s| s.flags) else {
        return;
    };
    let bounds = world_setup::actor_bounds(origin, flags);
    engine.trace.link_entity(number, bounds.mins, bounds.maxs);
    if let Ok(mut b) = engine.world.get::<&mut Bounds>(entity) {
        *b = bounds;
    }
}
