//! Dry-run shot accounting.

use hecs::Entity;

use crossfire_core::components::{Actor, UnitState, Visibility};
use crossfire_core::flags::StateFlags;
use crossfire_core::trace::TraceService;

use crate::engine::CombatEngine;

/// Tallies of a silent shot evaluation. Never touches real unit state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShotMock {
    pub enemy: u32,
    pub friendly: u32,
    pub civilian: u32,
    /// Hits on the shooter itself; also counted as friendly.
    pub self_hits: u32,
    pub damage: u32,
    /// Splash may strike the shooter.
    pub allow_self: bool,
}

/// Count a would-be hit on `target`. Only living units that the
/// attacker's team can see are counted.
pub fn update_shot_mock<T: TraceService>(
    engine: &CombatEngine<T>,
    mock: &mut ShotMock,
    attacker: Entity,
    target: Entity,
    damage: i32,
) {
    if damage <= 0 {
        return;
    }
    let Ok(attacker_team) = engine.world.get::<&Actor>(attacker).map(|a| a.team) else {
        return;
    };
    let Ok(target_team) = engine.world.get::<&Actor>(target).map(|a| a.team) else {
        return;
    };
    let dead = engine
        .world
        .get::<&UnitState>(target)
        .map(|s| s.flags.contains(StateFlags::DEAD))
        .unwrap_or(true);
    if dead {
        return;
    }
    let visible = engine
        .world
        .get::<&Visibility>(target)
        .map(|v| v.seen_by.contains_team(attacker_team))
        .unwrap_or(false);
    if !visible {
        return;
    }

    if target_team.is_civilian() {
        mock.civilian += 1;
    } else if target_team == attacker_team {
        mock.friendly += 1;
        if target == attacker {
            mock.self_hits += 1;
        }
    } else {
        mock.enemy += 1;
    }
    mock.damage += damage as u32;
}
