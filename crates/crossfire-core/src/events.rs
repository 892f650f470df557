//! Events emitted by the combat core for the presentation and network layers.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::flags::{ContentFlags, ShotFlags, StateFlags, TeamMask};
use crate::types::{Direction, EntityNumber, GridPos, WorldPoint};

/// Abstract battle events. The core never renders; consumers decide what
/// each variant looks and sounds like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BattleEvent {
    /// Shooter turned to face the target before firing.
    ActorTurn {
        entity: EntityNumber,
        facing: Direction,
    },
    /// Shooter started a firing animation.
    StartShoot {
        entity: EntityNumber,
        hand: Hand,
        firemode: usize,
        from: GridPos,
        at: GridPos,
    },
    /// One projectile segment, visible to the event mask.
    ShotFired {
        entity: EntityNumber,
        hand: Hand,
        firemode: usize,
        /// First segment of this trigger pull.
        first: bool,
        flags: ShotFlags,
        surface: ContentFlags,
        from: WorldPoint,
        impact: WorldPoint,
        normal: WorldPoint,
    },
    /// Muffled report delivered to teams outside the event mask.
    ShotHeard {
        entity: EntityNumber,
        hand: Hand,
        firemode: usize,
        first: bool,
    },
    /// One flight leg of a thrown projectile.
    Throw {
        entity: EntityNumber,
        hand: Hand,
        firemode: usize,
        /// Seconds since the throw when this leg starts.
        delay: f32,
        flags: ShotFlags,
        at: WorldPoint,
        velocity: WorldPoint,
    },
    /// Remaining ammo of an item changed.
    InventoryAmmo {
        entity: EntityNumber,
        hand: Hand,
        ammo: u32,
    },
    /// Item removed from a slot.
    InventoryDelete { entity: EntityNumber, hand: Hand },
    /// Item added to a floor container.
    InventoryAdd {
        container: EntityNumber,
        item: crate::items::ItemId,
    },
    /// Floor container became visible.
    FloorAppear {
        container: EntityNumber,
        pos: GridPos,
    },
    /// Floor container removed before being re-announced.
    FloorPerish { container: EntityNumber },
    /// Breakable destroyed and removed from the map.
    EntityDestroyed { entity: EntityNumber },
    /// Passive particle effect spawned.
    Particle {
        name: String,
        origin: WorldPoint,
        spawn_flags: u16,
    },
    /// Positional sound sample.
    Sound {
        entity: EntityNumber,
        sample: String,
    },
    /// A unit's state flags changed.
    StateChanged {
        entity: EntityNumber,
        flags: StateFlags,
    },
    /// A unit left the fight.
    ActorDied {
        entity: EntityNumber,
        how: Incapacitation,
        flags: StateFlags,
    },
    /// A unit became visible to the event mask.
    ActorAppear { entity: EntityNumber, pos: GridPos },
    /// A unit dropped out of sight of the event mask.
    ActorPerish { entity: EntityNumber },
    /// Vital statistics after a change.
    StatsUpdated {
        entity: EntityNumber,
        hp: i32,
        stun: i32,
        morale: i32,
        tus: i32,
    },
    /// Map geometry changed; routing must be recomputed.
    RoutingInvalidated { mins: WorldPoint, maxs: WorldPoint },
}

/// An event together with the teams it is delivered to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub mask: TeamMask,
    pub event: BattleEvent,
}

impl EventRecord {
    pub fn new(mask: TeamMask, event: BattleEvent) -> Self {
        Self { mask, event }
    }

    /// Delivered to every team.
    pub fn broadcast(event: BattleEvent) -> Self {
        Self::new(TeamMask::ALL, event)
    }
}
