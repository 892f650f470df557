//! Per-battle statistics.
//!
//! Stored in `CombatEngine`, NOT as ECS entities.

use serde::{Deserialize, Serialize};

use crossfire_core::constants::MAX_TEAMS;
use crossfire_core::enums::Incapacitation;
use crossfire_core::types::TeamId;

/// Kill and stun matrices plus team head counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    /// `kills[attacker_team][victim_team]`
    pub kills: [[u32; MAX_TEAMS]; MAX_TEAMS],
    /// `stuns[attacker_team][victim_team]`
    pub stuns: [[u32; MAX_TEAMS]; MAX_TEAMS],
    /// Units spawned per team.
    pub spawned: [u32; MAX_TEAMS],
    /// Units still in action per team.
    pub alive: [u32; MAX_TEAMS],
}

impl LevelStats {
    pub fn record_spawn(&mut self, team: TeamId) {
        self.spawned[team.index()] += 1;
        self.alive[team.index()] += 1;
    }

    /// A unit of `victim` left the fight at the hands of `attacker`.
    pub fn record_incapacitation(&mut self, attacker: TeamId, victim: TeamId, how: Incapacitation) {
        let (a, v) = (attacker.index(), victim.index());
        match how {
            Incapacitation::Killed => self.kills[a][v] += 1,
            Incapacitation::KnockedOut => self.stuns[a][v] += 1,
        }
        self.alive[v] = self.alive[v].saturating_sub(1);
    }

    /// A knocked-out unit of `victim` was killed; it already left the head count.
    pub fn record_finished_off(&mut self, attacker: TeamId, victim: TeamId) {
        self.kills[attacker.index()][victim.index()] += 1;
    }

    pub fn alive(&self, team: TeamId) -> u32 {
        self.alive[team.index()]
    }

    pub fn spawned(&self, team: TeamId) -> u32 {
        self.spawned[team.index()]
    }
}
