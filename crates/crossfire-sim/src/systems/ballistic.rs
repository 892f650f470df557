//! Straight-line projectiles: spread, wall penetration, bounces, splash and
//! direct hits.

use tracing::trace;

use crossfire_core::components::{Actor, Tag};
use crossfire_core::constants::{MAX_SEGMENTS_PER_SHOT, THROWN_DROP_LOWERING};
use crossfire_core::enums::BodyKind;
use crossfire_core::events::{BattleEvent, EventRecord};
use crossfire_core::flags::{ContentFlags, ShotFlags};
use crossfire_core::trace::TraceService;
use crossfire_core::types::Angles;

use crate::engine::CombatEngine;
use crate::systems::mock::ShotMock;
use crate::systems::shoot::ShotContext;
use crate::systems::{crand, damage, floor, gauss_pair, splash};

/// Fire projectile `index` of a burst.
pub(crate) fn shoot_single<T: TraceService>(
    engine: &mut CombatEngine<T>,
    ctx: &ShotContext,
    mut mock: Option<&mut ShotMock>,
    index: u32,
) {
    let fd = &ctx.fd;
    let quiet = mock.is_some();

    let aim = ctx.aim_point(engine);
    let mut dir = (aim - ctx.muzzle).normalize_or_zero();
    let mut cur_loc = ctx.muzzle + dir * engine.config.shot_origin_offset;

    let (g1, g2) = gauss_pair(&mut engine.rng);
    let crouch = if ctx.crouched && fd.crouch != 0.0 {
        fd.crouch
    } else {
        1.0
    };
    let mut angles = Angles::from_vec(dir);
    angles.pitch += (g1 * 0.5 * ctx.spread(0) * crouch).to_radians();
    angles.yaw += (g2 * 0.5 * ctx.spread(1) * crouch).to_radians();
    dir = angles.forward();

    let roll = fd.damage[0] + fd.damage[1] * crand(&mut engine.rng);
    let mut damage = if fd.damage[0] < 0.0 {
        roll as i32
    } else {
        roll.max(0.0) as i32
    };

    let mut through_wall = fd.through_wall;
    let mut range = fd.range;
    let mut bounce = 0;
    let mut flags = ShotFlags::empty();
    let mut mask = ctx.mask;
    let mut tracefrom = cur_loc;
    let mut impact = cur_loc;

    for _ in 0..MAX_SEGMENTS_PER_SHOT {
        let end = cur_loc + dir * range;
        let tr = engine.trace.trace(tracefrom, end, Some(ctx.number));
        if tr.start_solid {
            break;
        }
        impact = tr.end_pos;

        let struck = tr.entity.and_then(|n| engine.entity(n));
        let struck_kind = struck.and_then(|e| engine.world.get::<&Tag>(e).ok().map(|t| t.kind));
        let hit_actor = struck_kind == Some(BodyKind::Actor);

        if tr.hit_something() {
            if hit_actor && !fd.delay {
                flags |= ShotFlags::BODY;
            } else if bounce < fd.bounce {
                flags |= ShotFlags::BOUNCING;
            } else {
                flags |= ShotFlags::IMPACT;
            }
        }
        if hit_actor {
            if let Some(team) = struck.and_then(|e| engine.world.get::<&Actor>(e).ok().map(|a| a.team)) {
                mask = mask.with(team);
            }
        }
        trace!(
            shooter = ctx.number.0,
            fraction = tr.fraction,
            ?impact,
            ?flags,
            "shot segment"
        );

        if !quiet {
            engine.emit(
                mask,
                BattleEvent::ShotFired {
                    entity: ctx.number,
                    hand: ctx.hand,
                    firemode: ctx.firemode,
                    first: index == 0 && bounce == 0,
                    flags,
                    surface: tr.contents,
                    from: tracefrom,
                    impact,
                    normal: tr.normal,
                },
            );
            engine.emit(
                mask.inverse(),
                BattleEvent::ShotHeard {
                    entity: ctx.number,
                    hand: ctx.hand,
                    firemode: ctx.firemode,
                    first: false,
                },
            );
            if index == 0 && fd.damage_kind.ignites() && tr.contents.contains(ContentFlags::BURN) {
                engine.events.push(EventRecord::broadcast(BattleEvent::Particle {
                    name: "fire".to_string(),
                    origin: impact,
                    spawn_flags: 0,
                }));
            }
        }

        if tr.hit_something() && fd.bounce == 0 {
            if through_wall > 0 && tr.contents.contains(ContentFlags::SOLID) {
                through_wall -= 1;
                let walls = (fd.through_wall - through_wall + 1) as f32;
                damage = (damage as f32 / walls.sqrt()) as i32;
                tracefrom = tr.end_pos + dir * engine.config.wall_thickness;
                continue;
            }
            if fd.has_splash() {
                impact += tr.normal * engine.config.shot_origin_offset;
                splash::splash_damage(
                    engine,
                    ctx.shooter,
                    fd,
                    impact,
                    Some(tr.contents),
                    mock.as_deref_mut(),
                );
            }
        }

        if let (Some(target), Some(BodyKind::Actor | BodyKind::Breakable)) = (struck, struck_kind) {
            damage::apply_damage(engine, target, fd, damage, ctx.shooter, mock.as_deref_mut());
            break;
        }

        bounce += 1;
        if bounce > fd.bounce || !tr.hit_something() {
            break;
        }

        range -= tr.fraction * range;
        cur_loc = impact;
        tracefrom = impact;
        dir -= tr.normal * (2.0 * tr.normal.dot(dir));
        flags |= ShotFlags::BOUNCED;
    }

    if !quiet && fd.consumes_ammo() && !fd.has_splash() && ctx.thrown && !ctx.deplete {
        let drop = if ctx.shooter_pos == ctx.at {
            ctx.at
        } else {
            impact.z -= THROWN_DROP_LOWERING;
            engine.trace.world_to_grid(impact)
        };
        floor::drop_item(engine, ctx.item, drop);
    }
}
