//! Shot setup: weapon lookup, preconditions, facing, event mask, ammo
//! bookkeeping and TU deduction around the projectile simulation.

use glam::Vec3;
use hecs::Entity;
use tracing::debug;

use crossfire_core::components::*;
use crossfire_core::constants::{inaccuracy, MAX_TEAMS};
use crossfire_core::enums::Hand;
use crossfire_core::error::{CombatError, CombatResult, ShotError};
use crossfire_core::events::BattleEvent;
use crossfire_core::flags::{StateFlags, TeamMask};
use crossfire_core::items::{FireDefinition, Item};
use crossfire_core::trace::TraceService;
use crossfire_core::types::{Direction, EntityNumber, GridPos, TeamId, WorldPoint};

use crate::engine::{CombatEngine, ShotReport, ShotRequest};
use crate::systems::mock::ShotMock;
use crate::systems::{ballistic, grenade, reaction, visibility};

/// Everything one trigger pull needs, resolved once up front.
#[derive(Debug, Clone)]
pub(crate) struct ShotContext {
    pub shooter: Entity,
    pub number: EntityNumber,
    pub hand: Hand,
    pub firemode: usize,
    pub fd: FireDefinition,
    /// The weapon as it was before the shot.
    pub item: Item,
    pub thrown: bool,
    pub deplete: bool,
    pub muzzle: WorldPoint,
    pub shooter_pos: GridPos,
    pub at: GridPos,
    pub height_adjustment: f32,
    /// Teams that witness the shot.
    pub mask: TeamMask,
    /// Skill-derived inaccuracy factor.
    pub acc: f32,
    pub crouched: bool,
}

impl ShotContext {
    /// Aim point: the target cell centre lowered by the height adjustment.
    pub fn aim_point<T: TraceService>(&self, engine: &CombatEngine<T>) -> WorldPoint {
        let mut target = engine.trace.grid_to_world(self.at);
        target.z -= self.height_adjustment;
        target
    }

    /// Angular noise scale for one axis (degrees).
    pub fn spread(&self, axis: usize) -> f32 {
        self.fd.spread[axis] + self.acc * (1.0 + self.fd.modif)
    }
}

/// Fire one trigger pull. With `mock` set, nothing in the battle changes
/// and all effects land in the accumulator instead.
pub fn client_shoot<T: TraceService>(
    engine: &mut CombatEngine<T>,
    request: &ShotRequest,
    mut mock: Option<&mut ShotMock>,
) -> CombatResult<ShotReport> {
    let quiet = mock.is_some();
    let shooter = engine.require(request.shooter)?;

    let item = engine
        .world
        .get::<&Inventory>(shooter)
        .ok()
        .and_then(|inv| inv.slot(request.hand).copied())
        .ok_or(ShotError::NoWeapon)?;
    let (thrown, oneshot, deplete, two_handed) = engine
        .catalog
        .get(item.def)
        .map(|d| (d.thrown, d.oneshot, d.deplete, d.two_handed))
        .ok_or(ShotError::NoWeapon)?;
    let fd = engine
        .catalog
        .fire_def(&item, request.firemode)
        .cloned()
        .ok_or(ShotError::NoWeapon)?;

    let place = *engine
        .world
        .get::<&Placement>(shooter)
        .map_err(|_| CombatError::EntityNotFound(request.shooter))?;
    let flags = engine
        .world
        .get::<&UnitState>(shooter)
        .map(|s| s.flags)
        .unwrap_or_default();
    let tus = engine
        .world
        .get::<&TimeUnits>(shooter)
        .map(|t| t.current)
        .unwrap_or(0);
    let left_occupied = engine
        .world
        .get::<&Inventory>(shooter)
        .map(|inv| inv.left.is_some())
        .unwrap_or(false);

    if flags.is_out_of_action() {
        return Err(ShotError::ShooterIncapacitated.into());
    }
    let leftover = if request.reaction {
        engine.config.reaction_leftover
    } else {
        0
    };
    let required = fd.time + leftover;
    if tus < required {
        return Err(ShotError::InsufficientTimeUnits {
            required,
            available: tus,
        }
        .into());
    }
    if place.pos == request.target {
        return Err(ShotError::SelfTarget.into());
    }
    if two_handed && left_occupied {
        return Err(ShotError::TwoHandedWeapon.into());
    }
    if item.ammo == 0 && fd.consumes_ammo() && !thrown {
        return Err(ShotError::NoAmmo.into());
    }
    let target_center = engine.trace.grid_to_world(request.target);
    let distance = place.origin.distance(target_center);
    if fd.range < distance {
        return Err(ShotError::OutOfRange {
            distance: distance as u32,
            range: fd.range as u32,
        }
        .into());
    }

    let (shots, remaining_ammo) = shots_for_ammo(&fd, item.ammo, thrown)?;

    let mut aim = target_center;
    aim.z -= request.height_adjustment;
    let (accuracy, weapon_skill) = engine
        .world
        .get::<&Skills>(shooter)
        .map(|s| (s.accuracy, s.weapon_skill(fd.weapon_skill)))
        .unwrap_or((0, 0));
    let ctx = ShotContext {
        shooter,
        number: request.shooter,
        hand: request.hand,
        firemode: request.firemode,
        muzzle: shot_origin(engine, place.pos, &fd, aim - place.origin),
        item,
        thrown,
        deplete,
        shooter_pos: place.pos,
        at: request.target,
        height_adjustment: request.height_adjustment,
        mask: TeamMask::empty(),
        acc: inaccuracy(accuracy, weapon_skill),
        crouched: flags.contains(StateFlags::CROUCHED),
        fd,
    };
    let arc = if ctx.fd.gravity {
        Some(grenade::plan_throw(engine, &ctx)?)
    } else {
        None
    };

    // Face the target; mock evaluations turn back afterwards.
    let facing = Direction::towards(place.pos, request.target);
    if let Ok(mut p) = engine.world.get::<&mut Placement>(shooter) {
        p.facing = facing;
    }
    if !quiet {
        visibility::refresh(engine);
        let mask = engine.seen_by(shooter);
        engine.emit(
            mask,
            BattleEvent::ActorTurn {
                entity: request.shooter,
                facing,
            },
        );
    }

    let center = place.origin + (aim - place.origin) * 0.5;
    let shooter_seen_by = engine.seen_by(shooter);
    let mut mask = TeamMask::empty();
    for team in 0..MAX_TEAMS as u8 {
        let team = TeamId(team);
        if shooter_seen_by.contains_team(team)
            || visibility::team_point_vis(engine, team, aim)
            || visibility::team_point_vis(engine, team, center)
        {
            mask = mask.with(team);
        }
    }
    let ctx = ShotContext { mask, ..ctx };

    if !quiet {
        if request.allow_reaction {
            let active_cost = ctx.fd.time + engine.config.reaction_leftover;
            reaction::react_to_pre_fire(engine, request.shooter, active_cost)?;
            let out = engine
                .world
                .get::<&UnitState>(shooter)
                .map(|s| s.flags.is_out_of_action())
                .unwrap_or(true);
            if out {
                return Err(ShotError::ShooterIncapacitated.into());
            }
        }

        engine.emit(
            mask,
            BattleEvent::StartShoot {
                entity: request.shooter,
                hand: request.hand,
                firemode: request.firemode,
                from: place.pos,
                at: request.target,
            },
        );
        engine.emit(
            mask.inverse(),
            BattleEvent::ShotHeard {
                entity: request.shooter,
                hand: request.hand,
                firemode: request.firemode,
                first: true,
            },
        );

        update_inventory(engine, &ctx, remaining_ammo, oneshot);
    }

    for i in 0..shots {
        match arc {
            Some(arc) => grenade::shoot_grenade(engine, &ctx, arc, mock.as_deref_mut()),
            None => ballistic::shoot_single(engine, &ctx, mock.as_deref_mut(), i),
        }
    }

    if quiet {
        if let Ok(mut p) = engine.world.get::<&mut Placement>(shooter) {
            p.facing = place.facing;
        }
        return Ok(ShotReport { shots, tus_spent: 0 });
    }

    let alive = engine
        .world
        .get::<&UnitState>(shooter)
        .map(|s| !s.flags.is_out_of_action())
        .unwrap_or(false);
    let mut tus_spent = 0;
    if alive {
        if let Ok(mut tu) = engine.world.get::<&mut TimeUnits>(shooter) {
            let before = tu.current;
            tu.spend(required);
            tus_spent = before - tu.current;
        }
        engine.send_stats(shooter);
    }
    debug!(
        shooter = request.shooter.0,
        shots,
        tus_spent,
        "shot resolved"
    );

    if request.allow_reaction {
        reaction::react_to_post_fire(engine, request.shooter)?;
    }
    Ok(ShotReport { shots, tus_spent })
}

/// Projectiles fired and ammo left after the pull. A short magazine fires
/// a proportional part of the burst.
pub(crate) fn shots_for_ammo(fd: &FireDefinition, ammo: u32, thrown: bool) -> Result<(u32, u32), ShotError> {
    if !fd.consumes_ammo() || thrown {
        return Ok((fd.shots, ammo));
    }
    let required = fd.shots * fd.ammo;
    let shots = if ammo < required {
        fd.shots * ammo / required
    } else {
        fd.shots
    };
    if shots < 1 {
        return Err(ShotError::NotEnoughAmmo);
    }
    Ok((shots, ammo - shots * fd.ammo))
}

/// Muzzle position: cell centre, raised and shifted sideways by the
/// firemode's offsets relative to the aim direction.
pub(crate) fn shot_origin<T: TraceService>(
    engine: &CombatEngine<T>,
    pos: GridPos,
    fd: &FireDefinition,
    aim_dir: Vec3,
) -> WorldPoint {
    let mut origin = engine.trace.grid_to_world(pos);
    origin.z += fd.shot_origin[1];
    let planar = (aim_dir.x * aim_dir.x + aim_dir.y * aim_dir.y).sqrt();
    if fd.shot_origin[0] != 0.0 && planar > 0.0 {
        origin.x += aim_dir.y * fd.shot_origin[0] / planar;
        origin.y += -aim_dir.x * fd.shot_origin[0] / planar;
    }
    origin
}

/// Write back ammo and drop used-up thrown items from the firing hand.
fn update_inventory<T: TraceService>(
    engine: &mut CombatEngine<T>,
    ctx: &ShotContext,
    remaining_ammo: u32,
    oneshot: bool,
) {
    let mask = engine.seen_by(ctx.shooter);
    let mut removed = false;
    if ctx.fd.consumes_ammo() {
        // An emptied gun stays in hand; an emptied throwing stack is gone.
        if remaining_ammo == 0 && ctx.thrown {
            removed = true;
        } else {
            if let Ok(mut inv) = engine.world.get::<&mut Inventory>(ctx.shooter) {
                if let Some(weapon) = inv.slot_mut(ctx.hand).as_mut() {
                    weapon.ammo = remaining_ammo;
                }
            }
            engine.emit(
                mask,
                BattleEvent::InventoryAmmo {
                    entity: ctx.number,
                    hand: ctx.hand,
                    ammo: remaining_ammo,
                },
            );
        }
    }
    if ctx.thrown && oneshot && ctx.deplete {
        removed = true;
    }
    if removed {
        if let Ok(mut inv) = engine.world.get::<&mut Inventory>(ctx.shooter) {
            *inv.slot_mut(ctx.hand) = None;
        }
        engine.emit(
            mask,
            BattleEvent::InventoryDelete {
                entity: ctx.number,
                hand: ctx.hand,
            },
        );
    }
}
