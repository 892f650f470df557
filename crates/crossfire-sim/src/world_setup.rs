//! Entity spawn factories for setting up the battle world.
//!
//! Creates units, breakables and floor containers with appropriate component
//! bundles and links their collision boxes into the trace service.

use std::collections::HashMap;

use glam::Vec3;
use hecs::{Entity, World};

use crossfire_core::components::*;
use crossfire_core::constants::*;
use crossfire_core::enums::{BodyKind, Material};
use crossfire_core::flags::{StateFlags, TeamMask};
use crossfire_core::items::Item;
use crossfire_core::trace::TraceService;
use crossfire_core::types::{Direction, EntityNumber, GridPos, TeamId, WorldPoint};

use crate::level::LevelStats;

/// Everything needed to place a combatant on the map.
#[derive(Debug, Clone)]
pub struct UnitSpec {
    pub name: String,
    pub team: TeamId,
    pub pos: GridPos,
    pub facing: Direction,
    pub hp: i32,
    pub morale: i32,
    pub max_tus: i32,
    pub state: StateFlags,
    pub skills: Skills,
    pub inventory: Inventory,
    pub reaction: ReactionSettings,
}

impl UnitSpec {
    pub fn new(name: &str, team: TeamId, pos: GridPos) -> Self {
        Self {
            name: name.to_string(),
            team,
            pos,
            facing: Direction::EAST,
            hp: 100,
            morale: 100,
            max_tus: 40,
            state: StateFlags::empty(),
            skills: Skills {
                accuracy: 50,
                power: 50,
                mind: 50,
                close: 50,
                heavy: 50,
                assault: 50,
                sniper: 50,
                explosive: 50,
            },
            inventory: Inventory::default(),
            reaction: ReactionSettings::default(),
        }
    }

    pub fn facing(mut self, facing: Direction) -> Self {
        self.facing = facing;
        self
    }

    pub fn hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self
    }

    pub fn tus(mut self, tus: i32) -> Self {
        self.max_tus = tus;
        self
    }

    pub fn morale(mut self, morale: i32) -> Self {
        self.morale = morale;
        self
    }

    pub fn state(mut self, state: StateFlags) -> Self {
        self.state = state;
        self
    }

    pub fn skills(mut self, skills: Skills) -> Self {
        self.skills = skills;
        self
    }

    pub fn right_hand(mut self, item: Item) -> Self {
        self.inventory.right = Some(item);
        self
    }

    pub fn left_hand(mut self, item: Item) -> Self {
        self.inventory.left = Some(item);
        self
    }

    pub fn armour(mut self, item: Item) -> Self {
        self.inventory.armour = Some(item);
        self
    }

    pub fn reaction(mut self, reaction: ReactionSettings) -> Self {
        self.reaction = reaction;
        self
    }
}

/// Destructible map object description.
#[derive(Debug, Clone)]
pub struct BreakableSpec {
    pub mins: WorldPoint,
    pub maxs: WorldPoint,
    pub hp: i32,
    pub material: Material,
    pub particle: Option<String>,
    pub spawn_flags: u16,
    pub door: bool,
}

impl BreakableSpec {
    pub fn new(mins: WorldPoint, maxs: WorldPoint, hp: i32, material: Material) -> Self {
        Self {
            mins,
            maxs,
            hp,
            material,
            particle: None,
            spawn_flags: 0,
            door: false,
        }
    }
}

/// Collision box of a unit standing, crouching or lying at `origin`.
pub fn actor_bounds(origin: WorldPoint, state: StateFlags) -> Bounds {
    let top = if state.contains(StateFlags::DEAD) {
        PLAYER_DEAD
    } else if state.is_low() {
        PLAYER_CROUCH
    } else {
        PLAYER_STAND
    };
    Bounds {
        mins: origin + Vec3::new(-PLAYER_WIDTH, -PLAYER_WIDTH, PLAYER_MIN),
        maxs: origin + Vec3::new(PLAYER_WIDTH, PLAYER_WIDTH, top),
    }
}

/// Spawn a combatant and link it into the trace service.
pub fn spawn_unit<T: TraceService>(
    world: &mut World,
    trace: &mut T,
    index: &mut HashMap<EntityNumber, Entity>,
    number: EntityNumber,
    level: &mut LevelStats,
    spec: UnitSpec,
) -> Entity {
    let origin = trace.grid_to_world(spec.pos);
    let bounds = actor_bounds(origin, spec.state);
    trace.link_entity(number, bounds.mins, bounds.maxs);
    level.record_spawn(spec.team);

    let entity = world.spawn((
        Tag {
            number,
            kind: BodyKind::Actor,
        },
        Actor {
            name: spec.name,
            team: spec.team,
        },
        Placement {
            pos: spec.pos,
            origin,
            facing: spec.facing,
        },
        Vitals {
            hp: spec.hp,
            stun: 0,
            morale: spec.morale,
        },
        UnitState { flags: spec.state },
        TimeUnits {
            current: spec.max_tus,
            max: spec.max_tus,
        },
        spec.skills,
        spec.inventory,
        CombatScore::default(),
        KillTally::default(),
        Visibility {
            seen_by: TeamMask::of(spec.team),
        },
        spec.reaction,
        bounds,
    ));
    index.insert(number, entity);
    entity
}

/// Spawn a breakable and link it into the trace service.
pub fn spawn_breakable<T: TraceService>(
    world: &mut World,
    trace: &mut T,
    index: &mut HashMap<EntityNumber, Entity>,
    number: EntityNumber,
    spec: BreakableSpec,
) -> Entity {
    trace.link_entity(number, spec.mins, spec.maxs);
    let entity = world.spawn((
        Tag {
            number,
            kind: if spec.door {
                BodyKind::Door
            } else {
                BodyKind::Breakable
            },
        },
        Breakable {
            hp: spec.hp,
            material: spec.material,
            particle: spec.particle,
            spawn_flags: spec.spawn_flags,
        },
        Bounds {
            mins: spec.mins,
            maxs: spec.maxs,
        },
        Visibility {
            seen_by: TeamMask::ALL,
        },
    ));
    index.insert(number, entity);
    entity
}

/// Spawn an empty floor container. Floors take part in no collision.
pub fn spawn_floor(
    world: &mut World,
    index: &mut HashMap<EntityNumber, Entity>,
    number: EntityNumber,
    pos: GridPos,
) -> Entity {
    let entity = world.spawn((
        Tag {
            number,
            kind: BodyKind::Floor,
        },
        FloorContainer {
            pos,
            items: Vec::new(),
        },
        Visibility::default(),
    ));
    index.insert(number, entity);
    entity
}
