//! ECS components for hecs entities.
//!
//! Components are plain data structs with few methods.
//! Game logic lives in the simulation systems, not here.

use serde::{Deserialize, Serialize};

use crate::enums::{BodyKind, Hand, Material, WeaponSkill};
use crate::flags::{StateFlags, TeamMask};
use crate::items::Item;
use crate::types::{Direction, EntityNumber, GridPos, TeamId, WorldPoint};

/// Identity shared by every addressable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub number: EntityNumber,
    pub kind: BodyKind,
}

/// Marks an entity as a combatant (soldier, alien, civilian).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub team: TeamId,
}

/// Grid cell, world origin and facing of a unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Placement {
    pub pos: GridPos,
    pub origin: WorldPoint,
    pub facing: Direction,
}

/// Health, stun accumulator and morale.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vitals {
    pub hp: i32,
    pub stun: i32,
    pub morale: i32,
}

/// State flags of a unit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UnitState {
    pub flags: StateFlags,
}

/// Time units left this turn. Never negative.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TimeUnits {
    pub current: i32,
    /// Allowance restored at the start of the unit's turn.
    pub max: i32,
}

impl TimeUnits {
    pub fn spend(&mut self, amount: i32) {
        self.current = (self.current - amount).max(0);
    }

    pub fn refill(&mut self) {
        self.current = self.max;
    }
}

/// Ability and weapon skill scores, all on a 0..=MAX_SKILL scale.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Skills {
    pub accuracy: i32,
    pub power: i32,
    pub mind: i32,
    pub close: i32,
    pub heavy: i32,
    pub assault: i32,
    pub sniper: i32,
    pub explosive: i32,
}

impl Skills {
    pub fn weapon_skill(&self, skill: WeaponSkill) -> i32 {
        match skill {
            WeaponSkill::None => 0,
            WeaponSkill::Close => self.close,
            WeaponSkill::Heavy => self.heavy,
            WeaponSkill::Assault => self.assault,
            WeaponSkill::Sniper => self.sniper,
            WeaponSkill::Explosive => self.explosive,
        }
    }
}

/// Equipped items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub right: Option<Item>,
    pub left: Option<Item>,
    pub headgear: Option<Item>,
    pub armour: Option<Item>,
}

impl Inventory {
    pub fn slot(&self, hand: Hand) -> Option<&Item> {
        match hand {
            Hand::Right => self.right.as_ref(),
            Hand::Left => self.left.as_ref(),
            Hand::Headgear => self.headgear.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, hand: Hand) -> &mut Option<Item> {
        match hand {
            Hand::Right => &mut self.right,
            Hand::Left => &mut self.left,
            Hand::Headgear => &mut self.headgear,
        }
    }
}

/// Per-character combat record, kept across battles by the campaign layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatScore {
    pub aliens_killed: u32,
    pub aliens_stunned: u32,
    pub civilians_killed: u32,
    pub civilians_stunned: u32,
    pub team_killed: u32,
    pub team_stunned: u32,
    pub close_kills: u32,
    pub heavy_kills: u32,
    pub assault_kills: u32,
    pub sniper_kills: u32,
    pub explosive_kills: u32,
    pub accuracy_stat: u32,
    pub power_stat: u32,
}

/// Kill tally by category (enemies, own team, civilians).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillTally {
    pub enemies: u32,
    pub team: u32,
    pub civilians: u32,
}

/// Which teams currently see this entity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Visibility {
    pub seen_by: TeamMask,
}

/// Reaction-fire weapon selection and per-turn bookkeeping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReactionSettings {
    /// Hand whose weapon is used for reaction fire.
    pub hand: Hand,
    /// Firemode index; `None` until the player picks one.
    pub firemode: Option<usize>,
    /// Reaction shots taken this turn.
    pub fired: u32,
    /// TU committed at end of turn; `None` when the reservation expired.
    pub reserved_tus: Option<i32>,
    /// Enemy hits (out of the mock trials) required to authorise a shot.
    pub min_hit: u32,
}

impl Default for ReactionSettings {
    fn default() -> Self {
        Self {
            hand: Hand::Right,
            firemode: None,
            fired: 0,
            reserved_tus: Some(0),
            min_hit: crate::constants::DEFAULT_REACTION_MIN_HIT,
        }
    }
}

/// Pending reaction shot of this unit against a provoking target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub target: EntityNumber,
    /// Fires once the target's TU falls to or below this.
    pub threshold: i32,
    /// Already out-drawn in this encounter; may not contest again.
    pub lost_draw: bool,
}

/// Back-link from a target to the last unit that queued reaction fire on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactionAttacker {
    pub shooter: EntityNumber,
}

/// Destructible map object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breakable {
    pub hp: i32,
    pub material: Material,
    /// Particle effect spawned on destruction.
    pub particle: Option<String>,
    /// Spawn flags forwarded with the particle event.
    pub spawn_flags: u16,
}

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub mins: WorldPoint,
    pub maxs: WorldPoint,
}

impl Bounds {
    pub fn center(&self) -> WorldPoint {
        (self.mins + self.maxs) * 0.5
    }
}

/// Items lying on the floor of one cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FloorContainer {
    pub pos: GridPos,
    pub items: Vec<Item>,
}
