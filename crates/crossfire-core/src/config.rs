//! Tunable combat balance, loadable from TOML.
//!
//! Every field has a default, so a file only needs to list the values it
//! overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::enums::MentalState;
use crate::error::ConfigError;

/// Morale weighting constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoraleConfig {
    pub enabled: bool,
    /// Morale change per point of wounding damage.
    pub mob_wound: f32,
    /// Additional morale change when the victim dies.
    pub mob_death: f32,
    /// Factor for observers that see the victim.
    pub mof_watching: f32,
    /// Factor when the attacker hits its own team.
    pub mof_teamkill: f32,
    /// Factor for civilian victims.
    pub mof_civilian: f32,
    /// Factor for observers on the attacker's side hitting an enemy.
    pub mof_enemy: f32,
    /// Extra factor applied to the victim itself.
    pub mor_pain: f32,
    /// Base distance weighting.
    pub mor_default: f32,
    /// Half-life distance for the proximity weights.
    pub mor_distance: f32,
    /// Proximity weight of the victim.
    pub mor_victim: f32,
    /// Proximity weight of the attacker.
    pub mor_attacker: f32,
    /// How strongly team strength (alive versus spawned) scales morale.
    pub mon_teamfactor: f32,
    /// Morale scale for the hold-fire roll of shaken units, and the level
    /// at or below which a unit starts its turn shaken.
    pub mor_shaken: f32,
    /// Morale at or below which a unit breaks at turn start. Zero disables
    /// turn-start morale behaviour.
    pub mor_panic: f32,
    /// Morale regained at each turn start, before noise.
    pub mor_regeneration: f32,
    /// A breaking unit keeps its sanity if `morale / mor_panic` beats this
    /// times a random roll.
    pub m_sanity: f32,
    /// Same roll deciding panic over rage.
    pub m_rage: f32,
    /// Same roll for calming down from rage.
    pub m_rage_stop: f32,
    /// Same roll for calming down from panic.
    pub m_panic_stop: f32,
}

impl Default for MoraleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mob_wound: 0.1,
            mob_death: 10.0,
            mof_watching: 1.7,
            mof_teamkill: 2.0,
            mof_civilian: 0.3,
            mof_enemy: 0.5,
            mor_pain: 3.6,
            mor_default: 0.3,
            mor_distance: 120.0,
            mor_victim: 0.7,
            mor_attacker: 0.3,
            mon_teamfactor: 0.6,
            mor_shaken: 50.0,
            mor_panic: 30.0,
            mor_regeneration: 15.0,
            m_sanity: 1.0,
            m_rage: 0.6,
            m_rage_stop: 2.0,
            m_panic_stop: 1.0,
        }
    }
}

/// Friendly-fire hits (out of the mock trials) tolerated per mental state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollateralTolerance {
    pub calm: u32,
    pub shaken: u32,
    pub panicked: u32,
    pub raging: u32,
    pub insane: u32,
}

impl Default for CollateralTolerance {
    fn default() -> Self {
        Self {
            calm: 5,
            shaken: 15,
            panicked: 30,
            raging: 60,
            insane: 100,
        }
    }
}

impl CollateralTolerance {
    pub fn for_state(&self, state: MentalState) -> u32 {
        match state {
            MentalState::Calm => self.calm,
            MentalState::Shaken => self.shaken,
            MentalState::Panicked => self.panicked,
            MentalState::Raging => self.raging,
            MentalState::Insane => self.insane,
        }
    }
}

/// Combat balance configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Extra TU a reaction shot costs on top of the firemode time.
    pub reaction_leftover: i32,
    /// Ballistic shots start this far along the aim direction.
    pub shot_origin_offset: f32,
    /// Distance a projectile travels inside a wall when penetrating it.
    pub wall_thickness: f32,
    /// Difficulty level; positive favours the aliens.
    pub difficulty: i32,
    /// Base of the difficulty damage multiplier.
    pub difficulty_base: f32,
    /// Difficulty scaling and civilian morale inversion apply only in
    /// single-player battles.
    pub single_player: bool,
    /// Debug toggle: health never changes.
    pub no_damage: bool,
    /// Silent trials run before authorising an automatic shot.
    pub mock_trials: u32,
    pub morale: MoraleConfig,
    pub collateral: CollateralTolerance,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            reaction_leftover: 0,
            shot_origin_offset: 8.0,
            wall_thickness: 8.0,
            difficulty: 0,
            difficulty_base: 1.3,
            single_player: true,
            no_damage: false,
            mock_trials: 100,
            morale: MoraleConfig::default(),
            collateral: CollateralTolerance::default(),
        }
    }
}

impl CombatConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: CombatConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.morale.mor_distance <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "morale.mor_distance",
                reason: "must be positive".into(),
            });
        }
        if self.morale.mor_panic < 0.0 {
            return Err(ConfigError::Invalid {
                field: "morale.mor_panic",
                reason: "must not be negative".into(),
            });
        }
        if self.mock_trials == 0 {
            return Err(ConfigError::Invalid {
                field: "mock_trials",
                reason: "must be at least 1".into(),
            });
        }
        if self.wall_thickness < 0.0 {
            return Err(ConfigError::Invalid {
                field: "wall_thickness",
                reason: "must not be negative".into(),
            });
        }
        Ok(())
    }

    /// Damage multiplier for a hit, from the difficulty setting.
    /// Aliens hitting non-aliens deal more on higher difficulty, the reverse less.
    pub fn difficulty_factor(&self, attacker_alien: bool, victim_alien: bool) -> f32 {
        if !self.single_player || self.difficulty == 0 || attacker_alien == victim_alien {
            return 1.0;
        }
        let exp = if attacker_alien {
            self.difficulty
        } else {
            -self.difficulty
        };
        self.difficulty_base.powi(exp)
    }
}
