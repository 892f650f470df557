//! Damage application: breakables, armour, stun and shock, incapacitation
//! and the bookkeeping that follows a kill.

use hecs::Entity;
use tracing::debug;

use crossfire_core::components::*;
use crossfire_core::constants::{max_hp_for_power, PLAYER_DEAD};
use crossfire_core::enums::{BodyKind, DamageKind, Incapacitation, WeaponSkill};
use crossfire_core::events::{BattleEvent, EventRecord};
use crossfire_core::flags::StateFlags;
use crossfire_core::items::FireDefinition;
use crossfire_core::trace::TraceService;
use crossfire_core::types::TeamId;

use crate::engine::CombatEngine;
use crate::systems::mock::{self, ShotMock};
use crate::systems::{morale, reaction};
use crate::world_setup;

/// Deal `damage` of the firemode's kind to `target`.
///
/// In mock mode only the accumulator changes.
pub fn apply_damage<T: TraceService>(
    engine: &mut CombatEngine<T>,
    target: Entity,
    fd: &FireDefinition,
    damage: i32,
    attacker: Entity,
    mock: Option<&mut ShotMock>,
) {
    let Ok(kind) = engine.world.get::<&Tag>(target).map(|t| t.kind) else {
        return;
    };
    let stun = fd.damage_kind == DamageKind::Stun;
    let shock = fd.damage_kind == DamageKind::Shock;

    match kind {
        BodyKind::Breakable | BodyKind::Door => {
            if !(stun || shock || mock.is_some()) {
                damage_breakable(engine, target, damage);
            }
            return;
        }
        BodyKind::Floor => return,
        BodyKind::Actor => {}
    }

    let (victim_team, flags) = match (
        engine.world.get::<&Actor>(target).map(|a| a.team),
        engine.world.get::<&UnitState>(target).map(|s| s.flags),
    ) {
        (Ok(team), Ok(flags)) => (team, flags),
        _ => return,
    };
    if flags.contains(StateFlags::DEAD) {
        return;
    }
    let knocked_out = flags.contains(StateFlags::STUNNED);
    let Ok(attacker_team) = engine.world.get::<&Actor>(attacker).map(|a| a.team) else {
        return;
    };

    let factor = engine
        .config
        .difficulty_factor(attacker_team.is_alien(), victim_team.is_alien());
    let mut damage = if factor == 1.0 {
        damage
    } else {
        (damage as f32 * factor) as i32
    };

    if damage > 0 {
        let protection = engine
            .world
            .get::<&Inventory>(target)
            .ok()
            .and_then(|inv| inv.armour)
            .and_then(|armour| engine.catalog.get(armour.def))
            .map(|def| def.protection_against(fd.damage_weight))
            .unwrap_or(0);
        debug!(
            target = ?target,
            damage,
            weight = fd.damage_weight,
            protection,
            "damage before armour"
        );
        damage = (damage - protection).max(1);
    }

    if !engine.config.no_damage {
        if let Some(mock) = mock {
            mock::update_shot_mock(engine, mock, attacker, target, damage);
            return;
        }
        if stun {
            if let Ok(mut vitals) = engine.world.get::<&mut Vitals>(target) {
                vitals.stun += damage;
            }
        } else if shock {
            if victim_team != attacker_team {
                if let Ok(mut tu) = engine.world.get::<&mut TimeUnits>(target) {
                    tu.current = 0;
                }
                if let Ok(mut state) = engine.world.get::<&mut UnitState>(target) {
                    state.flags.insert(StateFlags::DAZED);
                }
                debug!(target = ?target, "unit dazed by shock");
                engine.send_stats(target);
            }
            return;
        } else if let Ok(mut vitals) = engine.world.get::<&mut Vitals>(target) {
            vitals.hp = (vitals.hp - damage).max(0);
        }
    } else if mock.is_some() {
        return;
    }

    let Ok(vitals) = engine.world.get::<&Vitals>(target).map(|v| *v) else {
        return;
    };
    // A knocked-out unit can only go on to die.
    if vitals.hp == 0 || (!knocked_out && vitals.hp <= vitals.stun) {
        let how = if vitals.hp == 0 {
            Incapacitation::Killed
        } else {
            Incapacitation::KnockedOut
        };
        engine.send_stats(target);
        incapacitate(engine, target, attacker, how);
        if engine.config.morale.enabled {
            morale::apply_morale(engine, target, attacker, damage, true);
        }
        record_kill(engine, attacker, attacker_team, victim_team, how, fd.weapon_skill);
    } else {
        if damage > 0 && engine.config.morale.enabled {
            morale::apply_morale(engine, target, attacker, damage, false);
        } else {
            let power = engine
                .world
                .get::<&Skills>(target)
                .map(|s| s.power)
                .unwrap_or(0);
            if let Ok(mut vitals) = engine.world.get::<&mut Vitals>(target) {
                vitals.hp = vitals.hp.min(max_hp_for_power(power)).max(0);
            }
        }
        engine.send_stats(target);
    }
}

/// Structural damage. Destroyed objects are removed from the map.
fn damage_breakable<T: TraceService>(engine: &mut CombatEngine<T>, target: Entity, damage: i32) {
    let Some(number) = engine.number_of(target) else {
        return;
    };
    let Ok((hp, material, particle, spawn_flags)) = engine
        .world
        .get::<&Breakable>(target)
        .map(|b| (b.hp, b.material, b.particle.clone(), b.spawn_flags))
    else {
        return;
    };
    let Ok(bounds) = engine.world.get::<&Bounds>(target).map(|b| *b) else {
        return;
    };

    if damage < hp {
        if let Ok(mut b) = engine.world.get::<&mut Breakable>(target) {
            b.hp = (b.hp - damage).max(0);
        }
        return;
    }

    debug!(entity = number.0, ?material, "breakable destroyed");
    engine
        .events
        .push(EventRecord::broadcast(BattleEvent::EntityDestroyed { entity: number }));
    if let Some(name) = particle.filter(|p| p != "null") {
        engine.events.push(EventRecord::broadcast(BattleEvent::Particle {
            name,
            origin: bounds.center(),
            spawn_flags,
        }));
    }
    if let Some(sample) = material.break_sound() {
        engine.events.push(EventRecord::broadcast(BattleEvent::Sound {
            entity: number,
            sample: sample.to_string(),
        }));
    }
    engine.remove_entity(number);
    engine
        .events
        .push(EventRecord::broadcast(BattleEvent::RoutingInvalidated {
            mins: bounds.mins,
            maxs: bounds.maxs,
        }));
}

/// Take a unit out of the fight: flag it, shrink its box to a corpse and
/// cancel any reaction fire involving it.
fn incapacitate<T: TraceService>(engine: &mut CombatEngine<T>, target: Entity, attacker: Entity, how: Incapacitation) {
    let Some(number) = engine.number_of(target) else {
        return;
    };
    let flag = match how {
        Incapacitation::Killed => StateFlags::DEAD,
        Incapacitation::KnockedOut => StateFlags::STUNNED,
    };
    let (flags, was_down) = match engine.world.get::<&mut UnitState>(target) {
        Ok(mut state) => {
            let was_down = state.flags.contains(StateFlags::STUNNED);
            state.flags.remove(StateFlags::STUNNED);
            state.flags.insert(flag);
            (state.flags, was_down)
        }
        Err(_) => return,
    };

    if let Ok(origin) = engine.world.get::<&Placement>(target).map(|p| p.origin) {
        let mut bounds = world_setup::actor_bounds(origin, flags);
        bounds.maxs.z = origin.z + PLAYER_DEAD;
        engine.trace.link_entity(number, bounds.mins, bounds.maxs);
        if let Ok(mut b) = engine.world.get::<&mut Bounds>(target) {
            *b = bounds;
        }
    }

    let mask = engine.seen_by(target);
    engine.emit(
        mask,
        BattleEvent::ActorDied {
            entity: number,
            how,
            flags,
        },
    );

    let attacker_team = engine
        .world
        .get::<&Actor>(attacker)
        .map(|a| a.team)
        .unwrap_or(TeamId::CIVILIAN);
    if let Ok(victim_team) = engine.world.get::<&Actor>(target).map(|a| a.team) {
        if was_down {
            engine.level.record_finished_off(attacker_team, victim_team);
        } else {
            engine.level.record_incapacitation(attacker_team, victim_team, how);
        }
    }

    reaction::clear_records_for(engine, number);
}

/// Update the attacker's kill tally and combat score.
fn record_kill<T: TraceService>(
    engine: &mut CombatEngine<T>,
    attacker: Entity,
    attacker_team: TeamId,
    victim_team: TeamId,
    how: Incapacitation,
    skill: WeaponSkill,
) {
    if let Ok(mut tally) = engine.world.get::<&mut KillTally>(attacker) {
        if victim_team.is_civilian() {
            tally.civilians += 1;
        } else if victim_team == attacker_team {
            tally.team += 1;
        } else {
            tally.enemies += 1;
        }
    }

    let Ok(mut score) = engine.world.get::<&mut CombatScore>(attacker) else {
        return;
    };
    let killed = how == Incapacitation::Killed;
    match victim_team {
        TeamId::ALIEN => {
            if killed {
                score.aliens_killed += 1;
            } else {
                score.aliens_stunned += 1;
            }
            score.accuracy_stat += 1;
            match skill {
                WeaponSkill::Close => score.close_kills += 1,
                WeaponSkill::Heavy => {
                    score.heavy_kills += 1;
                    score.power_stat += 1;
                }
                WeaponSkill::Assault => score.assault_kills += 1,
                WeaponSkill::Sniper => score.sniper_kills += 1,
                WeaponSkill::Explosive => score.explosive_kills += 1,
                WeaponSkill::None => {}
            }
        }
        TeamId::CIVILIAN => {
            if killed {
                score.civilians_killed += 1;
            } else {
                score.civilians_stunned += 1;
            }
        }
        TeamId::PHALANX => {
            if killed {
                score.team_killed += 1;
            } else {
                score.team_stunned += 1;
            }
        }
        _ => {}
    }
}
