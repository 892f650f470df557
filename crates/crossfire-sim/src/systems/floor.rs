//! Items dropped onto the floor of a cell.

use crossfire_core::components::{Actor, FloorContainer, Placement, Tag, UnitState, Visibility};
use crossfire_core::constants::MAX_TEAMS;
use crossfire_core::events::BattleEvent;
use crossfire_core::flags::TeamMask;
use crossfire_core::items::Item;
use crossfire_core::trace::TraceService;
use crossfire_core::types::{GridPos, TeamId};

use crate::engine::CombatEngine;
use crate::systems::visibility;
use crate::world_setup;

/// Put `item` on the floor at `pos`, creating the container if needed.
/// A container that already exists is withdrawn and announced again.
pub fn drop_item<T: TraceService>(engine: &mut CombatEngine<T>, item: Item, pos: GridPos) {
    let existing = engine
        .world
        .query::<(&Tag, &FloorContainer, &Visibility)>()
        .iter()
        .find(|(_, (_, floor, _))| floor.pos == pos)
        .map(|(e, (tag, _, vis))| (e, tag.number, vis.seen_by));

    let (entity, number) = match existing {
        Some((entity, number, old_mask)) => {
            engine.emit(old_mask, BattleEvent::FloorPerish { container: number });
            (entity, number)
        }
        None => {
            let number = engine.allocate_number();
            let entity = world_setup::spawn_floor(&mut engine.world, &mut engine.index, number, pos);
            (entity, number)
        }
    };

    if let Ok(mut floor) = engine.world.get::<&mut FloorContainer>(entity) {
        floor.items.push(item);
    }

    let mask = floor_observers(engine, pos);
    if let Ok(mut vis) = engine.world.get::<&mut Visibility>(entity) {
        vis.seen_by = mask;
    }
    engine.emit(mask, BattleEvent::FloorAppear { container: number, pos });
    engine.emit(
        mask,
        BattleEvent::InventoryAdd {
            container: number,
            item: item.def,
        },
    );
}

/// Teams with a living unit on the cell or a view of its centre.
fn floor_observers<T: TraceService>(engine: &CombatEngine<T>, pos: GridPos) -> TeamMask {
    let point = engine.trace.grid_to_world(pos);
    let mut mask = TeamMask::empty();
    for (_, (actor, place, state)) in engine.world.query::<(&Actor, &Placement, &UnitState)>().iter() {
        if place.pos == pos && !state.flags.is_out_of_action() {
            mask = mask.with(actor.team);
        }
    }
    for team in 0..MAX_TEAMS as u8 {
        let team = TeamId(team);
        if !mask.contains_team(team)
            && engine.level.alive(team) > 0
            && visibility::team_point_vis(engine, team, point)
        {
            mask = mask.with(team);
        }
    }
    mask
}
