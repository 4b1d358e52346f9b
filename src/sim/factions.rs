use tracing::info;

use crate::model::{EventKind, World};
use crate::sim::context::TickContext;
use crate::sim::report::DiplomacyEvent;
use crate::sim::signal::{Signal, SignalKind};
use crate::sim::system::{SimSystem, TickFrequency};

/// Eliminates factions left with no cities or no members.
pub struct FactionSystem;

impl SimSystem for FactionSystem {
    fn name(&self) -> &str {
        "factions"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Daily
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        resolve_eliminations(ctx);
    }
}

/// Ranking key for "strongest surviving rival": most cities, then most
/// garrison, then lowest ID.
fn strength_key(world: &World, faction: u64) -> (usize, u64, std::cmp::Reverse<u64>) {
    (
        world.faction_cities(faction).len(),
        world.faction_garrison(faction),
        std::cmp::Reverse(faction),
    )
}

pub fn is_eliminated(world: &World, faction: u64) -> bool {
    if world.player_faction == Some(faction) {
        return false;
    }
    let Some(f) = world.faction(faction) else {
        return false;
    };
    let living_members = f.members.iter().any(|&m| world.is_alive(m));
    !living_members || (world.tick > 0 && world.faction_cities(faction).is_empty())
}

/// Absorb every eliminated faction into the strongest survivor, in ID order.
/// Returns the eliminated faction IDs.
pub fn resolve_eliminations(ctx: &mut TickContext) -> Vec<u64> {
    let mut eliminated = Vec::new();
    loop {
        let next = ctx
            .world
            .factions
            .keys()
            .copied()
            .find(|&f| is_eliminated(ctx.world, f));
        let Some(faction) = next else {
            break;
        };
        absorb(ctx, faction);
        eliminated.push(faction);
    }
    eliminated
}

fn absorb(ctx: &mut TickContext, faction: u64) {
    let absorber = ctx
        .world
        .factions
        .keys()
        .copied()
        .filter(|&f| f != faction && !is_eliminated(ctx.world, f))
        .max_by_key(|&f| strength_key(ctx.world, f));

    let Some(removed) = ctx.world.factions.remove(&faction) else {
        return;
    };
    let members: Vec<u64> = removed
        .members
        .iter()
        .copied()
        .filter(|&m| ctx.world.is_alive(m))
        .collect();
    if let Some(target) = absorber.and_then(|a| ctx.world.factions.get_mut(&a)) {
        for &m in &members {
            target.add_member(m);
        }
    }

    // Cities of living members follow them; those of dead members go to the
    // absorber's leader.
    let new_owner = absorber.and_then(|a| ctx.world.leader_of(a));
    let vacated: Vec<u64> = ctx
        .world
        .cities
        .values()
        .filter(|c| {
            c.owner.is_some_and(|o| {
                !ctx.world.is_alive(o) && (o == removed.leader || removed.members.contains(&o))
            })
        })
        .map(|c| c.id)
        .collect();
    for &city in &vacated {
        if let Some(c) = ctx.world.cities.get_mut(&city) {
            c.owner = new_owner;
        }
    }

    for city in ctx.world.cities.values_mut() {
        if city.siege.is_some_and(|s| s.faction == faction) {
            city.siege = None;
        }
    }
    ctx.world.forget_faction(faction);

    let description = match absorber {
        Some(a) => format!("{} was absorbed by {}", removed.name, ctx.world.faction_name(a)),
        None => format!("{} passed from history", removed.name),
    };
    let event_id = ctx.world.log(EventKind::Elimination, None, None, description);
    info!(
        faction,
        ?absorber,
        members = members.len(),
        cities = vacated.len(),
        "faction eliminated"
    );
    ctx.report.diplomacy.push(DiplomacyEvent::FactionEliminated {
        faction,
        absorbed_by: absorber,
    });
    ctx.signals.push(Signal {
        event_id,
        kind: SignalKind::FactionEliminated {
            faction,
            absorbed_by: absorber,
        },
    });
}
