//! Enumeration types used throughout the combat core.

use serde::{Deserialize, Serialize};

/// What a hit does to its victim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageKind {
    /// Ordinary wounding damage (bullets, blades).
    #[default]
    Normal,
    /// Accumulates in the stun counter instead of reducing health.
    Stun,
    /// Flash effects: zero TU and daze enemies, no health loss.
    Shock,
    /// Incendiary damage; ignites combustible surfaces.
    Fire,
    /// Explosive damage; ignites combustible surfaces on direct hits.
    Blast,
}

impl DamageKind {
    /// Kinds that may set combustible surfaces burning.
    pub fn ignites(self) -> bool {
        matches!(self, DamageKind::Fire | DamageKind::Blast)
    }
}

/// Weapon skill class a firemode trains and is scored under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponSkill {
    #[default]
    None,
    Close,
    Heavy,
    Assault,
    Sniper,
    Explosive,
}

/// Inventory slot a shot is fired from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    #[default]
    Right,
    Left,
    Headgear,
}

/// Reaction-fire readiness selected for a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionMode {
    #[default]
    Off,
    Once,
    Many,
}

/// Mental state ladder used by the collateral-damage judgement, calm to insane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MentalState {
    #[default]
    Calm,
    Shaken,
    Panicked,
    Raging,
    Insane,
}

/// Surface material of a breakable, selects the destruction sound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    Glass,
    Metal,
    Electrical,
    Wood,
    #[default]
    None,
}

impl Material {
    /// Sound sample played when an object of this material breaks.
    pub fn break_sound(self) -> Option<&'static str> {
        match self {
            Material::Glass => Some("misc/breakglass"),
            Material::Metal => Some("misc/breakmetal"),
            Material::Electrical => Some("misc/breakelectric"),
            Material::Wood => Some("misc/breakwood"),
            Material::None => None,
        }
    }
}

/// Category a kill is tallied under on the attacker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KillCategory {
    Enemies,
    Team,
    Civilians,
}

/// Way a unit left the fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Incapacitation {
    Killed,
    KnockedOut,
}

/// Kind of addressable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    Actor,
    Breakable,
    Door,
    /// Item pile on a cell; never linked for collision.
    Floor,
}

impl BodyKind {
    pub fn is_actor(self) -> bool {
        matches!(self, BodyKind::Actor)
    }
}
