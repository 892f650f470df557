//! Thrown projectiles: arc planning and fixed-step flight with bounces.

use glam::Vec3;
use tracing::trace;

use crossfire_core::components::Tag;
use crossfire_core::constants::*;
use crossfire_core::enums::BodyKind;
use crossfire_core::error::ShotError;
use crossfire_core::events::BattleEvent;
use crossfire_core::flags::ShotFlags;
use crossfire_core::trace::{ThrowArc, TraceService};
use crossfire_core::types::Angles;

use crate::engine::CombatEngine;
use crate::systems::mock::ShotMock;
use crate::systems::shoot::ShotContext;
use crate::systems::{crand, floor, splash};

/// Solve the launch towards the ground below the target cell.
pub(crate) fn plan_throw<T: TraceService>(engine: &CombatEngine<T>, ctx: &ShotContext) -> Result<ThrowArc, ShotError> {
    let mut target = ctx.aim_point(engine);
    target.z -= GROUND_DELTA;
    engine
        .trace
        .solve_throw_arc(ctx.muzzle, target, ctx.fd.range, ctx.fd.launched, ctx.fd.rolled)
        .ok_or(ShotError::ImpossibleThrow)
}

/// Throw one projectile along `arc`, bouncing until it comes to rest or
/// goes off.
pub(crate) fn shoot_grenade<T: TraceService>(
    engine: &mut CombatEngine<T>,
    ctx: &ShotContext,
    arc: ThrowArc,
    mut mock: Option<&mut ShotMock>,
) {
    let fd = &ctx.fd;
    let quiet = mock.is_some();

    let speed = arc.initial_velocity.length().min(fd.range);
    let mut angles = Angles::from_vec(arc.initial_velocity);
    angles.pitch += (crand(&mut engine.rng) * ctx.spread(0)).to_radians();
    angles.yaw += (crand(&mut engine.rng) * ctx.spread(1)).to_radians();
    let mut start_v = angles.forward() * speed;

    let mut last = ctx.muzzle;
    let mut old_pos = last;
    let mut cur_v = start_v;
    let mut time = 0.0f32;
    let mut dt = 0.0f32;
    let mut bounce = 0u32;
    let mut flags = ShotFlags::BOUNCING;

    loop {
        let new_pos = old_pos + cur_v * GRENADE_DT - Vec3::new(0.0, 0.0, 0.5 * GRAVITY * GRENADE_DT * GRENADE_DT);
        cur_v.z -= GRAVITY * GRENADE_DT;

        let tr = engine.trace.trace(old_pos, new_pos, Some(ctx.number));
        if !tr.hit_something() && time + dt <= GRENADE_MAX_TIME {
            dt += GRENADE_DT;
            old_pos = new_pos;
            continue;
        }

        dt += tr.fraction * GRENADE_DT;
        time += dt;
        bounce += 1;

        let touched_actor = tr
            .entity
            .and_then(|n| engine.entity(n))
            .and_then(|e| engine.world.get::<&Tag>(e).ok().map(|t| t.kind))
            == Some(BodyKind::Actor);
        trace!(
            shooter = ctx.number.0,
            time,
            bounce,
            speed = cur_v.length(),
            "grenade contact"
        );

        if cur_v.length() < GRENADE_STOPSPEED
            || time > GRENADE_MAX_TIME
            || bounce > fd.bounce
            || (!fd.delay && touched_actor)
        {
            if !quiet {
                let hit = if touched_actor {
                    ShotFlags::BODY
                } else {
                    ShotFlags::IMPACT
                };
                emit_throw(engine, ctx, dt, flags | hit, last, start_v);
            }

            let mut endpos = tr.end_pos;
            endpos.z += GRENADE_DETONATION_LIFT;
            if fd.has_splash() {
                splash::splash_damage(engine, ctx.shooter, fd, endpos, Some(tr.contents), mock.as_deref_mut());
            } else if !quiet && fd.consumes_ammo() && ctx.thrown {
                let drop = engine.trace.world_to_grid(endpos);
                floor::drop_item(engine, ctx.item, drop);
            }
            return;
        }

        if !quiet {
            emit_throw(engine, ctx, dt, flags, last, start_v);
        }
        flags |= ShotFlags::BOUNCED;

        cur_v *= fd.bounce_factor;
        cur_v -= tr.normal * (2.0 * tr.normal.dot(cur_v));

        last = tr.end_pos;
        old_pos = tr.end_pos;
        start_v = cur_v;
        dt = 0.0;
    }
}

fn emit_throw<T: TraceService>(
    engine: &mut CombatEngine<T>,
    ctx: &ShotContext,
    delay: f32,
    flags: ShotFlags,
    at: Vec3,
    velocity: Vec3,
) {
    engine.emit(
        ctx.mask,
        BattleEvent::Throw {
            entity: ctx.number,
            hand: ctx.hand,
            firemode: ctx.firemode,
            delay,
            flags,
            at,
            velocity,
        },
    );
}
