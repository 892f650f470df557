//! Combat engine.
//!
//! `CombatEngine` owns the hecs ECS world of combatants and breakables, the
//! seeded RNG, level statistics and the outgoing event queue. Completely
//! headless; all geometry goes through the `TraceService` it was built with,
//! enabling deterministic testing.

use std::collections::HashMap;

use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crossfire_core::components::*;
use crossfire_core::config::CombatConfig;
use crossfire_core::enums::{BodyKind, Hand, MentalState, ReactionMode};
use crossfire_core::error::{CombatError, CombatResult, ShotError};
use crossfire_core::events::{BattleEvent, EventRecord};
use crossfire_core::flags::{StateFlags, TeamMask};
use crossfire_core::items::{Item, ItemCatalog};
use crossfire_core::trace::TraceService;
use crossfire_core::constants::MAX_TEAMS;
use crossfire_core::types::{Direction, EntityNumber, GridPos, TeamId};

use crate::level::LevelStats;
use crate::systems;
use crate::systems::mock::ShotMock;
use crate::world_setup::{self, BreakableSpec, UnitSpec};

/// Configuration for starting a new battle.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same battle.
    pub seed: u64,
    pub combat: CombatConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            combat: CombatConfig::default(),
        }
    }
}

/// A request to fire one firemode of one held item at a grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotRequest {
    pub shooter: EntityNumber,
    pub hand: Hand,
    pub firemode: usize,
    pub target: GridPos,
    /// Lowers the aim point below the cell centre (map units).
    pub height_adjustment: f32,
    /// Fired outside the shooter's turn; costs the reaction surcharge.
    pub reaction: bool,
    /// Let the opposing side draw against this shot and react afterwards.
    pub allow_reaction: bool,
}

impl ShotRequest {
    pub fn new(shooter: EntityNumber, hand: Hand, firemode: usize, target: GridPos) -> Self {
        Self {
            shooter,
            hand,
            firemode,
            target,
            height_adjustment: 0.0,
            reaction: false,
            allow_reaction: true,
        }
    }

    pub fn height_adjustment(mut self, z: f32) -> Self {
        self.height_adjustment = z;
        self
    }

    pub fn without_reaction(mut self) -> Self {
        self.allow_reaction = false;
        self
    }
}

/// Outcome of an accepted shot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShotReport {
    /// Projectiles actually fired (may be reduced by a short magazine).
    pub shots: u32,
    /// TU deducted from the shooter; zero if the shooter did not survive.
    pub tus_spent: i32,
}

/// Read-only copy of a unit's state, for drivers and tests.
#[derive(Debug, Clone)]
pub struct UnitView {
    pub number: EntityNumber,
    pub team: TeamId,
    pub pos: GridPos,
    pub hp: i32,
    pub stun: i32,
    pub morale: i32,
    pub tus: i32,
    pub state: StateFlags,
    pub inventory: Inventory,
    pub reaction: ReactionSettings,
    pub record: Option<ReactionRecord>,
    pub kills: KillTally,
    pub score: CombatScore,
    pub seen_by: TeamMask,
}

/// The combat engine. Owns the ECS world and all battle state.
pub struct CombatEngine<T: TraceService> {
    pub(crate) world: World,
    pub(crate) trace: T,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) config: CombatConfig,
    pub(crate) catalog: ItemCatalog,
    pub(crate) level: LevelStats,
    pub(crate) index: HashMap<EntityNumber, Entity>,
    pub(crate) turn_team: TeamId,
    pub(crate) events: Vec<EventRecord>,
    next_number: u32,
}

impl<T: TraceService> CombatEngine<T> {
    /// Create an empty battle over `trace` using the item definitions in `catalog`.
    pub fn new(config: SimConfig, trace: T, catalog: ItemCatalog) -> Self {
        Self {
            world: World::new(),
            trace,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config: config.combat,
            catalog,
            level: LevelStats::default(),
            index: HashMap::new(),
            turn_team: TeamId::PHALANX,
            events: Vec::new(),
            next_number: 1,
        }
    }

    // --- Setup ---

    /// Place a unit and refresh who sees whom.
    pub fn spawn_unit(&mut self, spec: UnitSpec) -> EntityNumber {
        let number = self.allocate_number();
        world_setup::spawn_unit(
            &mut self.world,
            &mut self.trace,
            &mut self.index,
            number,
            &mut self.level,
            spec,
        );
        systems::visibility::refresh(self);
        number
    }

    pub fn spawn_breakable(&mut self, spec: BreakableSpec) -> EntityNumber {
        let number = self.allocate_number();
        world_setup::spawn_breakable(
            &mut self.world,
            &mut self.trace,
            &mut self.index,
            number,
            spec,
        );
        number
    }

    pub fn set_turn_team(&mut self, team: TeamId) {
        self.turn_team = team;
    }

    // --- Actions ---

    /// Fire on behalf of the active team.
    pub fn client_shoot(&mut self, request: ShotRequest) -> CombatResult<ShotReport> {
        let shooter = self.require(request.shooter)?;
        let team = self
            .world
            .get::<&Actor>(shooter)
            .map(|a| a.team)
            .map_err(|_| CombatError::EntityNotFound(request.shooter))?;
        if team != self.turn_team {
            return Err(CombatError::NotActiveTeam(request.shooter));
        }
        systems::shoot::client_shoot(self, &request, None)
    }

    /// Evaluate a shot silently. Nothing in the battle changes except the
    /// RNG stream.
    pub fn mock_shot(&mut self, request: ShotRequest) -> CombatResult<ShotMock> {
        let mut mock = ShotMock::default();
        systems::shoot::client_shoot(self, &request, Some(&mut mock))?;
        Ok(mock)
    }

    /// Move a unit of the active team one step, paying `tu_cost`, and let
    /// the other side react.
    pub fn move_unit(&mut self, number: EntityNumber, to: GridPos, tu_cost: i32) -> CombatResult<()> {
        let entity = self.require(number)?;
        let (team, flags, tus) = {
            let actor = self
                .world
                .get::<&Actor>(entity)
                .map_err(|_| CombatError::EntityNotFound(number))?;
            let state = self
                .world
                .get::<&UnitState>(entity)
                .map_err(|_| CombatError::EntityNotFound(number))?;
            let tus = self
                .world
                .get::<&TimeUnits>(entity)
                .map_err(|_| CombatError::EntityNotFound(number))?;
            (actor.team, state.flags, tus.current)
        };
        if team != self.turn_team {
            return Err(CombatError::NotActiveTeam(number));
        }
        if flags.is_out_of_action() {
            return Err(ShotError::ShooterIncapacitated.into());
        }
        if tus < tu_cost {
            return Err(ShotError::InsufficientTimeUnits {
                required: tu_cost,
                available: tus,
            }
            .into());
        }

        let origin = self.trace.grid_to_world(to);
        if let Ok(mut place) = self.world.get::<&mut Placement>(entity) {
            let step = Direction::towards(place.pos, to);
            place.pos = to;
            place.origin = origin;
            place.facing = step;
        }
        if let Ok(mut tu) = self.world.get::<&mut TimeUnits>(entity) {
            tu.spend(tu_cost);
        }
        let bounds = world_setup::actor_bounds(origin, flags);
        self.trace.link_entity(number, bounds.mins, bounds.maxs);
        if let Ok(mut b) = self.world.get::<&mut Bounds>(entity) {
            *b = bounds;
        }
        debug!(unit = number.0, ?to, tu_cost, "unit moved");

        systems::visibility::refresh(self);
        systems::reaction::react_to_move(self, number).map(|_| ())
    }

    /// Close the active team's turn and hand over to the next team with
    /// units in action. Returns the new active team.
    pub fn end_turn(&mut self) -> CombatResult<TeamId> {
        systems::reaction::react_to_end_turn(self)?;
        let ending = self.turn_team;
        systems::reaction::reset_reaction_fire(self, ending);

        let next = (1..=MAX_TEAMS as u8)
            .map(|step| TeamId((ending.0 + step) % MAX_TEAMS as u8))
            .find(|team| self.level.alive(*team) > 0)
            .unwrap_or(ending);
        self.turn_team = next;

        let starting: Vec<Entity> = self
            .world
            .query::<(&Actor, &UnitState)>()
            .iter()
            .filter(|(_, (actor, state))| actor.team == next && !state.flags.is_out_of_action())
            .map(|(e, _)| e)
            .collect();
        for entity in starting {
            if let Ok(mut tu) = self.world.get::<&mut TimeUnits>(entity) {
                tu.refill();
            }
            if let Ok(mut state) = self.world.get::<&mut UnitState>(entity) {
                state.flags.remove(StateFlags::DAZED);
            }
        }
        systems::morale::morale_behaviour(self, next);
        systems::visibility::refresh(self);
        debug!(ending = ending.0, next = next.0, "turn ended");
        Ok(next)
    }

    /// Select Off/Once/Many reaction readiness. Only the active team may
    /// change it, and only with a reaction-capable firemode selected.
    pub fn set_reaction_mode(&mut self, number: EntityNumber, mode: ReactionMode) -> CombatResult<bool> {
        let entity = self.require(number)?;
        let team = self
            .world
            .get::<&Actor>(entity)
            .map(|a| a.team)
            .map_err(|_| CombatError::EntityNotFound(number))?;
        if team != self.turn_team {
            return Err(CombatError::NotActiveTeam(number));
        }
        if mode != ReactionMode::Off && !self.has_reaction_weapon(entity) {
            return Ok(false);
        }
        let flags = {
            let mut state = self
                .world
                .get::<&mut UnitState>(entity)
                .map_err(|_| CombatError::EntityNotFound(number))?;
            state.flags.set_reaction_mode(mode);
            state.flags
        };
        let mask = self.seen_by(entity);
        self.emit(
            mask,
            BattleEvent::StateChanged {
                entity: number,
                flags,
            },
        );
        Ok(true)
    }

    /// Choose the hand and firemode used for reaction fire.
    pub fn set_reaction_firemode(
        &mut self,
        number: EntityNumber,
        hand: Hand,
        firemode: Option<usize>,
    ) -> CombatResult<()> {
        let entity = self.require(number)?;
        let mut settings = self
            .world
            .get::<&mut ReactionSettings>(entity)
            .map_err(|_| CombatError::EntityNotFound(number))?;
        settings.hand = hand;
        settings.firemode = firemode;
        Ok(())
    }

    /// Driver hook for the morale layer: set the unit's mental condition.
    pub fn set_mental_state(&mut self, number: EntityNumber, mental: MentalState) -> CombatResult<()> {
        let entity = self.require(number)?;
        let mut state = self
            .world
            .get::<&mut UnitState>(entity)
            .map_err(|_| CombatError::EntityNotFound(number))?;
        state
            .flags
            .remove(StateFlags::SHAKEN | StateFlags::PANIC | StateFlags::RAGE | StateFlags::INSANE);
        match mental {
            MentalState::Calm => {}
            MentalState::Shaken => state.flags.insert(StateFlags::SHAKEN),
            MentalState::Panicked => state.flags.insert(StateFlags::PANIC),
            MentalState::Raging => state.flags.insert(StateFlags::RAGE),
            MentalState::Insane => state.flags.insert(StateFlags::INSANE),
        }
        Ok(())
    }

    /// Automatic shot gated by the collateral-risk estimate.
    pub fn fire_with_judgement(&mut self, shooter: EntityNumber, target: EntityNumber) -> CombatResult<bool> {
        systems::reaction::fire_with_judgement(self, shooter, target)
    }

    /// Commit end-of-turn reaction reservations for `team`.
    pub fn reset_reaction_fire(&mut self, team: TeamId) {
        systems::reaction::reset_reaction_fire(self, team);
    }

    // --- Queries ---

    /// Take all events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn unit(&self, number: EntityNumber) -> Option<UnitView> {
        let entity = self.entity(number)?;
        let actor = self.world.get::<&Actor>(entity).ok()?;
        let place = self.world.get::<&Placement>(entity).ok()?;
        let vitals = self.world.get::<&Vitals>(entity).ok()?;
        let state = self.world.get::<&UnitState>(entity).ok()?;
        let tus = self.world.get::<&TimeUnits>(entity).ok()?;
        let inventory = self.world.get::<&Inventory>(entity).ok()?;
        let reaction = self.world.get::<&ReactionSettings>(entity).ok()?;
        let kills = self.world.get::<&KillTally>(entity).ok()?;
        let score = self.world.get::<&CombatScore>(entity).ok()?;
        let vis = self.world.get::<&Visibility>(entity).ok()?;
        let record = self.world.get::<&ReactionRecord>(entity).ok().map(|r| *r);
        Some(UnitView {
            number,
            team: actor.team,
            pos: place.pos,
            hp: vitals.hp,
            stun: vitals.stun,
            morale: vitals.morale,
            tus: tus.current,
            state: state.flags,
            inventory: (*inventory).clone(),
            reaction: *reaction,
            record,
            kills: *kills,
            score: *score,
            seen_by: vis.seen_by,
        })
    }

    /// Structural health of a breakable, `None` once destroyed.
    pub fn breakable_hp(&self, number: EntityNumber) -> Option<i32> {
        let entity = self.entity(number)?;
        self.world.get::<&Breakable>(entity).ok().map(|b| b.hp)
    }

    /// Items lying on the floor of `pos`.
    pub fn floor_items(&self, pos: GridPos) -> Vec<Item> {
        self.world
            .query::<&FloorContainer>()
            .iter()
            .find(|(_, floor)| floor.pos == pos)
            .map(|(_, floor)| floor.items.clone())
            .unwrap_or_default()
    }

    pub fn level(&self) -> &LevelStats {
        &self.level
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn trace(&self) -> &T {
        &self.trace
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn turn_team(&self) -> TeamId {
        self.turn_team
    }

    // --- Internal helpers ---

    pub(crate) fn entity(&self, number: EntityNumber) -> Option<Entity> {
        self.index.get(&number).copied()
    }

    pub(crate) fn require(&self, number: EntityNumber) -> CombatResult<Entity> {
        self.entity(number).ok_or(CombatError::EntityNotFound(number))
    }

    pub(crate) fn number_of(&self, entity: Entity) -> Option<EntityNumber> {
        self.world.get::<&Tag>(entity).ok().map(|t| t.number)
    }

    pub(crate) fn allocate_number(&mut self) -> EntityNumber {
        let number = EntityNumber(self.next_number);
        self.next_number += 1;
        number
    }

    /// Queue an event for `mask`. Events nobody would receive are dropped.
    pub(crate) fn emit(&mut self, mask: TeamMask, event: BattleEvent) {
        if mask.is_empty() {
            return;
        }
        self.events.push(EventRecord::new(mask, event));
    }

    pub(crate) fn seen_by(&self, entity: Entity) -> TeamMask {
        self.world
            .get::<&Visibility>(entity)
            .map(|v| v.seen_by)
            .unwrap_or_default()
    }

    /// Remove an entity from the world, the number index and collision.
    pub(crate) fn remove_entity(&mut self, number: EntityNumber) {
        if let Some(entity) = self.index.remove(&number) {
            let is_body = self
                .world
                .get::<&Tag>(entity)
                .map(|t| t.kind != BodyKind::Floor)
                .unwrap_or(false);
            if is_body {
                self.trace.unlink_entity(number);
            }
            let _ = self.world.despawn(entity);
        }
    }

    fn has_reaction_weapon(&self, entity: Entity) -> bool {
        systems::reaction::reaction_fire_def(self, entity).is_some()
    }

    /// Send current vitals to the unit's observers.
    pub(crate) fn send_stats(&mut self, entity: Entity) {
        let Some(number) = self.number_of(entity) else {
            return;
        };
        let Ok(vitals) = self.world.get::<&Vitals>(entity).map(|v| *v) else {
            return;
        };
        let tus = self
            .world
            .get::<&TimeUnits>(entity)
            .map(|t| t.current)
            .unwrap_or(0);
        let mask = self.seen_by(entity);
        self.emit(
            mask,
            BattleEvent::StatsUpdated {
                entity: number,
                hp: vitals.hp,
                stun: vitals.stun,
                morale: vitals.morale,
                tus,
            },
        );
    }
}
