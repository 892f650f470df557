//! Area damage around an impact point.

use hecs::Entity;

use crossfire_core::components::{Bounds, Placement, Tag, Visibility};
use crossfire_core::constants::UNIT_SIZE;
use crossfire_core::enums::{BodyKind, DamageKind};
use crossfire_core::events::{BattleEvent, EventRecord};
use crossfire_core::flags::{ContentFlags, TeamMask};
use crossfire_core::items::FireDefinition;
use crossfire_core::trace::TraceService;
use crossfire_core::types::{Viewpoint, WorldPoint};

use crate::engine::CombatEngine;
use crate::systems::damage;
use crate::systems::mock::ShotMock;
use crate::systems::visibility;

/// Damage every unit and breakable within the splash radius of `impact`.
///
/// `surface` is the content of the struck surface, if any; combustible
/// surfaces catch fire from incendiary splash.
pub fn splash_damage<T: TraceService>(
    engine: &mut CombatEngine<T>,
    attacker: Entity,
    fd: &FireDefinition,
    impact: WorldPoint,
    surface: Option<ContentFlags>,
    mut mock: Option<&mut ShotMock>,
) {
    let shock = fd.damage_kind == DamageKind::Shock;
    let attacker_view = engine.world.get::<&Placement>(attacker).ok().map(|p| Viewpoint {
        origin: p.origin,
        facing: p.facing,
    });

    let candidates: Vec<(Entity, BodyKind)> = engine
        .world
        .query::<&Tag>()
        .iter()
        .filter(|(_, tag)| tag.kind != BodyKind::Floor)
        .map(|(e, tag)| (e, tag.kind))
        .collect();

    for (check, kind) in candidates {
        // The candidate may have been destroyed by an earlier iteration.
        if engine.number_of(check).is_none() {
            continue;
        }
        let is_actor = kind.is_actor();

        let center = if is_actor {
            let Ok(place) = engine.world.get::<&Placement>(check).map(|p| *p) else {
                continue;
            };
            if shock {
                let view = Viewpoint {
                    origin: place.origin,
                    facing: place.facing,
                };
                if !engine.trace.frustum_visible(&view, impact) {
                    continue;
                }
            }
            place.origin
        } else {
            if shock {
                continue;
            }
            let Ok(bounds) = engine.world.get::<&Bounds>(check).map(|b| *b) else {
                continue;
            };
            bounds.center()
        };

        let dist = (impact.distance(center) - UNIT_SIZE / 2.0).max(0.0);
        if dist > fd.splash_radius {
            continue;
        }

        if fd.irgoggles && is_actor {
            let in_view = attacker_view
                .as_ref()
                .is_some_and(|view| engine.trace.frustum_visible(view, center));
            if in_view {
                if mock.is_none() {
                    reveal(engine, check);
                }
                continue;
            }
        }

        if is_actor && visibility::actor_vis(engine, impact, check, false) <= 0.0 {
            continue;
        }

        let amount = if shock {
            0
        } else {
            (fd.splash_damage[0] * (1.0 - dist / fd.splash_radius)) as i32
        };

        if let Some(m) = mock.as_deref_mut() {
            m.allow_self = true;
        }
        damage::apply_damage(engine, check, fd, amount, attacker, mock.as_deref_mut());
        if let Some(m) = mock.as_deref_mut() {
            m.allow_self = false;
        }
    }

    let burning = surface.is_some_and(|c| c.contains(ContentFlags::BURN));
    if burning && fd.damage_kind == DamageKind::Fire && mock.is_none() {
        engine.events.push(EventRecord::broadcast(BattleEvent::Particle {
            name: "burning".to_string(),
            origin: impact,
            spawn_flags: 0,
        }));
    }
}

/// Infrared reveal: the unit appears to every team that could not see it.
fn reveal<T: TraceService>(engine: &mut CombatEngine<T>, check: Entity) {
    let Some(number) = engine.number_of(check) else {
        return;
    };
    let Ok(pos) = engine.world.get::<&Placement>(check).map(|p| p.pos) else {
        return;
    };
    let old = engine.seen_by(check);
    engine.emit(old.inverse(), BattleEvent::ActorAppear { entity: number, pos });
    if let Ok(mut vis) = engine.world.get::<&mut Visibility>(check) {
        vis.seen_by = TeamMask::ALL;
    }
}
