//! Reaction fire: units of the waiting side queue shots against enemies
//! that move or fire in view, and a TU "draw" decides who shoots first.
//!
//! A pending shot is a `ReactionRecord` on the shooter plus a
//! `ReactionAttacker` back-link on the target. Records are removed before
//! they are resolved, so a nested resolution never sees them twice.

use hecs::Entity;
use tracing::{debug, warn};

use crossfire_core::components::*;
use crossfire_core::constants::{MAX_SPOT_DIST, REACTION_MIN_VISIBILITY, TU_REACTION_MULTI, TU_REACTION_SINGLE};
use crossfire_core::enums::Hand;
use crossfire_core::error::{CombatError, CombatResult};
use crossfire_core::events::BattleEvent;
use crossfire_core::flags::{StateFlags, TeamMask};
use crossfire_core::items::FireDefinition;
use crossfire_core::trace::TraceService;
use crossfire_core::types::{EntityNumber, TeamId, Viewpoint};

use crate::engine::{CombatEngine, ShotRequest};
use crate::systems::mock::ShotMock;
use crate::systems::{frand, shoot, visibility};

/// Weapon hand, firemode index and definition a unit would react with.
pub fn reaction_fire_def<T: TraceService>(
    engine: &CombatEngine<T>,
    shooter: Entity,
) -> Option<(Hand, usize, FireDefinition)> {
    let settings = *engine.world.get::<&ReactionSettings>(shooter).ok()?;
    let firemode = settings.firemode?;
    let item = engine
        .world
        .get::<&Inventory>(shooter)
        .ok()?
        .slot(settings.hand)
        .copied()?;
    let def = engine.catalog.get(item.def)?;
    if !def.is_weapon || (def.reload && item.ammo == 0) {
        return None;
    }
    let fd = engine.catalog.fire_def(&item, firemode)?;
    if !fd.reaction {
        return None;
    }
    Some((settings.hand, firemode, fd.clone()))
}

/// TU a reaction shot at `target` would cost, if the shooter can afford it
/// and the target is in range.
pub fn firing_tus<T: TraceService>(engine: &CombatEngine<T>, shooter: Entity, target: Entity) -> Option<i32> {
    let (_, _, fd) = reaction_fire_def(engine, shooter)?;
    let cost = fd.time + engine.config.reaction_leftover;
    let tus = engine.world.get::<&TimeUnits>(shooter).ok()?.current;
    let from = engine.world.get::<&Placement>(shooter).ok()?.origin;
    let to = engine.world.get::<&Placement>(target).ok()?.origin;
    (cost <= tus && fd.range > from.distance(to)).then_some(cost)
}

/// Whether `shooter` is willing and able to fire at `target` now.
pub fn can_reaction_fire<T: TraceService>(engine: &mut CombatEngine<T>, shooter: Entity, target: Entity) -> bool {
    if shooter == target {
        return false;
    }
    let Some((team, place, flags, morale, fired)) = unit_snapshot(engine, shooter) else {
        return false;
    };
    if flags.is_out_of_action() || team == engine.turn_team {
        return false;
    }
    let shaken = flags.contains(StateFlags::SHAKEN);
    let ready = shaken
        || flags.contains(StateFlags::REACTION_MANY)
        || (flags.contains(StateFlags::REACTION_ONCE) && fired == 0);
    if !ready {
        return false;
    }

    let Ok((target_team, target_origin)) = engine
        .world
        .get::<&Actor>(target)
        .and_then(|a| engine.world.get::<&Placement>(target).map(|p| (a.team, p.origin)))
    else {
        return false;
    };
    if place.origin.distance(target_origin) > MAX_SPOT_DIST {
        return false;
    }
    let view = Viewpoint {
        origin: place.origin,
        facing: place.facing,
    };
    let vis = visibility::actor_vis(engine, place.origin, target, true);
    if vis <= REACTION_MIN_VISIBILITY || !engine.trace.frustum_visible(&view, target_origin) {
        return false;
    }

    if target_team.is_civilian() || target_team == team {
        if !shaken {
            return false;
        }
        let roll = frand(&mut engine.rng);
        if morale as f32 / engine.config.morale.mor_shaken > roll {
            return false;
        }
    }
    true
}

fn unit_snapshot<T: TraceService>(
    engine: &CombatEngine<T>,
    entity: Entity,
) -> Option<(TeamId, Placement, StateFlags, i32, u32)> {
    let team = engine.world.get::<&Actor>(entity).ok()?.team;
    let place = *engine.world.get::<&Placement>(entity).ok()?;
    let flags = engine.world.get::<&UnitState>(entity).ok()?.flags;
    let morale = engine.world.get::<&Vitals>(entity).ok()?.morale;
    let fired = engine.world.get::<&ReactionSettings>(entity).ok()?.fired;
    Some((team, place, flags, morale, fired))
}

fn tus_of<T: TraceService>(engine: &CombatEngine<T>, entity: Entity) -> i32 {
    engine
        .world
        .get::<&TimeUnits>(entity)
        .map(|t| t.current)
        .unwrap_or(0)
}

/// Units holding a pending reaction shot, in entity-number order.
fn pending_shooters<T: TraceService>(engine: &CombatEngine<T>) -> Vec<EntityNumber> {
    let mut shooters: Vec<EntityNumber> = engine
        .world
        .query::<(&Tag, &ReactionRecord)>()
        .iter()
        .map(|(_, (tag, _))| tag.number)
        .collect();
    shooters.sort();
    shooters
}

fn record_of<T: TraceService>(engine: &CombatEngine<T>, shooter: EntityNumber) -> Option<ReactionRecord> {
    let entity = engine.entity(shooter)?;
    engine.world.get::<&ReactionRecord>(entity).ok().map(|r| *r)
}

/// Drop a record and the matching back-link on its target.
fn clear_record<T: TraceService>(engine: &mut CombatEngine<T>, shooter: EntityNumber) -> Option<ReactionRecord> {
    let entity = engine.entity(shooter)?;
    let record = engine.world.remove_one::<ReactionRecord>(entity).ok()?;
    if let Some(target) = engine.entity(record.target) {
        let linked = engine
            .world
            .get::<&ReactionAttacker>(target)
            .map(|a| a.shooter == shooter)
            .unwrap_or(false);
        if linked {
            let _ = engine.world.remove_one::<ReactionAttacker>(target);
        }
    }
    Some(record)
}

/// Cancel every pending shot at or by a unit leaving the fight.
pub fn clear_records_for<T: TraceService>(engine: &mut CombatEngine<T>, unit: EntityNumber) {
    for shooter in pending_shooters(engine) {
        let aimed_at_unit = record_of(engine, shooter).is_some_and(|r| r.target == unit);
        if aimed_at_unit || shooter == unit {
            clear_record(engine, shooter);
        }
    }
    if let Some(entity) = engine.entity(unit) {
        let _ = engine.world.remove_one::<ReactionAttacker>(entity);
    }
}

/// Queue reaction shots against `target` from every eligible unit that has
/// none pending.
pub fn check_trigger<T: TraceService>(engine: &mut CombatEngine<T>, target: EntityNumber) -> bool {
    let Some(target_entity) = engine.entity(target) else {
        return false;
    };
    let mut candidates: Vec<(EntityNumber, Entity)> = engine
        .world
        .query::<(&Tag, &Actor)>()
        .without::<&ReactionRecord>()
        .iter()
        .map(|(e, (tag, _))| (tag.number, e))
        .collect();
    candidates.sort_by_key(|(number, _)| *number);

    let mut queued = false;
    for (number, shooter) in candidates {
        if !can_reaction_fire(engine, shooter, target_entity) {
            continue;
        }
        let Some(cost) = firing_tus(engine, shooter, target_entity) else {
            continue;
        };
        let threshold = ((tus_of(engine, target_entity) as f32 - cost as f32 / 4.0) as i32).max(0);
        let _ = engine.world.insert_one(
            shooter,
            ReactionRecord {
                target,
                threshold,
                lost_draw: false,
            },
        );
        let _ = engine
            .world
            .insert_one(target_entity, ReactionAttacker { shooter: number });
        debug!(shooter = number.0, target = target.0, threshold, "reaction fire queued");
        queued = true;
    }
    queued
}

/// Resolve the pending shot of `shooter`. The record is cleared whatever
/// the outcome.
pub fn resolve<T: TraceService>(engine: &mut CombatEngine<T>, shooter: EntityNumber) -> CombatResult<bool> {
    let Some(shooter_entity) = engine.entity(shooter) else {
        return Ok(false);
    };
    let Some(record) = clear_record(engine, shooter) else {
        return Ok(false);
    };
    let Some(target) = engine.entity(record.target) else {
        warn!(shooter = shooter.0, target = record.target.0, "reaction record with dangling target");
        return Err(CombatError::Internal(format!(
            "reaction record of {shooter:?} targets missing unit {:?}",
            record.target
        )));
    };

    let dazed = engine
        .world
        .get::<&UnitState>(shooter_entity)
        .map(|s| s.flags.contains(StateFlags::DAZED))
        .unwrap_or(true);
    if dazed {
        return Ok(false);
    }
    let target_out = engine
        .world
        .get::<&UnitState>(target)
        .map(|s| s.flags.is_out_of_action())
        .unwrap_or(true);
    if target_out || !can_reaction_fire(engine, shooter_entity, target) {
        return Ok(false);
    }
    if firing_tus(engine, shooter_entity, target).is_none() {
        return Ok(false);
    }

    let took_shot = fire_with_judgement(engine, shooter, record.target)?;
    if took_shot {
        if let Ok(mut state) = engine.world.get::<&mut UnitState>(shooter_entity) {
            state.flags.remove(StateFlags::SHAKEN);
        }
        if let Ok(mut settings) = engine.world.get::<&mut ReactionSettings>(shooter_entity) {
            settings.fired += 1;
        }
    }
    Ok(took_shot)
}

/// Run the silent trials and take the real shot only if the expected enemy
/// hits and collateral damage are acceptable for the shooter's state of mind.
pub fn fire_with_judgement<T: TraceService>(
    engine: &mut CombatEngine<T>,
    shooter: EntityNumber,
    target: EntityNumber,
) -> CombatResult<bool> {
    let shooter_entity = engine.require(shooter)?;
    let target_entity = engine.require(target)?;
    let Some((hand, firemode, _)) = reaction_fire_def(engine, shooter_entity) else {
        return Ok(false);
    };
    let Ok(at) = engine.world.get::<&Placement>(target_entity).map(|p| p.pos) else {
        return Ok(false);
    };
    let (team, flags, min_hit) = match (
        engine.world.get::<&Actor>(shooter_entity).map(|a| a.team),
        engine.world.get::<&UnitState>(shooter_entity).map(|s| s.flags),
        engine.world.get::<&ReactionSettings>(shooter_entity).map(|s| s.min_hit),
    ) {
        (Ok(team), Ok(flags), Ok(min_hit)) => (team, flags, min_hit),
        _ => return Err(CombatError::EntityNotFound(shooter)),
    };
    let max_ff = engine.config.collateral.for_state(flags.mental_state());

    let request = ShotRequest {
        shooter,
        hand,
        firemode,
        target: at,
        height_adjustment: 0.0,
        reaction: true,
        allow_reaction: false,
    };

    let mut mock = ShotMock::default();
    for _ in 0..engine.config.mock_trials {
        if shoot::client_shoot(engine, &request, Some(&mut mock)).is_err() {
            break;
        }
    }
    let ff = mock.friendly + if team.is_alien() { 0 } else { mock.civilian };
    debug!(
        shooter = shooter.0,
        target = target.0,
        enemy = mock.enemy,
        friendly = mock.friendly,
        civilian = mock.civilian,
        max_ff,
        min_hit,
        "reaction judgement"
    );
    if ff > max_ff || mock.enemy < min_hit {
        return Ok(false);
    }

    match shoot::client_shoot(engine, &request, None) {
        Ok(_) => Ok(true),
        Err(CombatError::Shot(reason)) => {
            debug!(shooter = shooter.0, %reason, "reaction shot rejected");
            Ok(false)
        }
        Err(other) => Err(other),
    }
}

/// Resolve records whose target changed or ran down its TU.
pub fn check_resolution<T: TraceService>(engine: &mut CombatEngine<T>, target: EntityNumber) -> CombatResult<bool> {
    let mut fired = false;
    for shooter in pending_shooters(engine) {
        // May have been cleared by a nested resolution.
        let Some(record) = record_of(engine, shooter) else {
            continue;
        };
        let shoot = record.target != target
            || engine
                .entity(record.target)
                .is_some_and(|t| tus_of(engine, t) <= record.threshold);
        if shoot {
            fired |= resolve(engine, shooter)?;
        }
    }
    Ok(fired)
}

/// `target` moved: settle what is due, then queue new reactions.
pub fn react_to_move<T: TraceService>(engine: &mut CombatEngine<T>, target: EntityNumber) -> CombatResult<bool> {
    let fired = check_resolution(engine, target)?;
    check_trigger(engine, target);
    Ok(fired)
}

/// `target` has just fired.
pub fn react_to_post_fire<T: TraceService>(engine: &mut CombatEngine<T>, target: EntityNumber) -> CombatResult<bool> {
    react_to_move(engine, target)
}

/// `target` is about to fire a shot costing `active_cost` TU, reckoned
/// like a reaction shot (surcharge included) so both sides compare. Waiting
/// shooters that are at least as quick fire first; slower ones lose the
/// draw and wait until the target has spent the difference.
pub fn react_to_pre_fire<T: TraceService>(
    engine: &mut CombatEngine<T>,
    target: EntityNumber,
    active_cost: i32,
) -> CombatResult<()> {
    let Some(target_entity) = engine.entity(target) else {
        return Ok(());
    };
    for shooter in pending_shooters(engine) {
        let Some(record) = record_of(engine, shooter) else {
            continue;
        };
        if record.target != target {
            resolve(engine, shooter)?;
            continue;
        }
        if record.lost_draw {
            continue;
        }
        let Some(shooter_entity) = engine.entity(shooter) else {
            continue;
        };
        let Some(cost) = firing_tus(engine, shooter_entity, target_entity) else {
            clear_record(engine, shooter);
            continue;
        };

        if cost <= active_cost {
            debug!(shooter = shooter.0, target = target.0, cost, active_cost, "draw won by reaction");
            resolve(engine, shooter)?;
        } else {
            let threshold = (tus_of(engine, target_entity) - (cost - active_cost)).max(0);
            if let Ok(mut r) = engine.world.get::<&mut ReactionRecord>(shooter_entity) {
                r.threshold = threshold;
                r.lost_draw = true;
            }
            debug!(shooter = shooter.0, target = target.0, threshold, "draw lost by reaction");
        }
    }
    Ok(())
}

/// Resolve every outstanding record as the turn closes.
pub fn react_to_end_turn<T: TraceService>(engine: &mut CombatEngine<T>) -> CombatResult<()> {
    for shooter in pending_shooters(engine) {
        if record_of(engine, shooter).is_none() {
            continue;
        }
        resolve(engine, shooter)?;
        if let Some(entity) = engine.entity(shooter) {
            if let Ok(mut settings) = engine.world.get::<&mut ReactionSettings>(entity) {
                settings.fired = 0;
            }
        }
    }
    Ok(())
}

/// Commit reaction TU for the coming enemy turn and clear per-turn state
/// of `team`'s units.
pub fn reset_reaction_fire<T: TraceService>(engine: &mut CombatEngine<T>, team: TeamId) {
    let units: Vec<Entity> = engine
        .world
        .query::<(&Actor, &UnitState)>()
        .iter()
        .filter(|(_, (actor, state))| actor.team == team && !state.flags.is_out_of_action())
        .map(|(e, _)| e)
        .collect();

    for entity in units {
        let Ok(mut flags) = engine.world.get::<&UnitState>(entity).map(|s| s.flags) else {
            continue;
        };
        let tus = tus_of(engine, entity);
        let (spend, reserved) = if flags.intersects(StateFlags::REACTION) {
            if flags.contains(StateFlags::REACTION_ONCE) && tus >= TU_REACTION_SINGLE {
                (TU_REACTION_SINGLE, Some(TU_REACTION_SINGLE))
            } else if flags.contains(StateFlags::REACTION_MANY) && tus >= TU_REACTION_MULTI {
                (TU_REACTION_MULTI, Some(TU_REACTION_MULTI))
            } else {
                (0, None)
            }
        } else {
            (0, Some(0))
        };

        if let Ok(mut tu) = engine.world.get::<&mut TimeUnits>(entity) {
            tu.spend(spend);
        }
        if let Ok(mut settings) = engine.world.get::<&mut ReactionSettings>(entity) {
            settings.fired = 0;
            settings.reserved_tus = reserved;
        }
        flags.remove(StateFlags::SHAKEN);
        if let Ok(mut state) = engine.world.get::<&mut UnitState>(entity) {
            state.flags = flags;
        }
        if let Some(number) = engine.number_of(entity) {
            engine.emit(TeamMask::of(team), BattleEvent::StateChanged { entity: number, flags });
        }
    }
}
