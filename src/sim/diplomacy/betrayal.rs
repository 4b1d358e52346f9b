use rand::Rng;
use tracing::info;

use crate::config::BetrayalConfig;
use crate::model::character::DEFAULT_FAVOR;
use crate::model::{EventKind, Trait, World};
use crate::sim::context::TickContext;
use crate::sim::helpers::transfer_cities;
use crate::sim::report::BetrayalEvent;
use crate::sim::signal::{Signal, SignalKind};

const DEFECTION_TRUST: i32 = -5;
const DEFECTION_INTIMACY: i32 = -20;

/// The rival faction whose leader the character is closest to, if that
/// closeness reaches `rival_min_intimacy`. Lowest faction ID on ties.
pub fn best_rival(world: &World, config: &BetrayalConfig, character: u64) -> Option<(u64, u8)> {
    let own = world.faction_of(character);
    world
        .factions
        .values()
        .filter(|f| Some(f.id) != own && f.leader != character)
        .map(|f| (f.id, world.intimacy(character, f.leader)))
        .filter(|&(_, intimacy)| intimacy >= config.rival_min_intimacy)
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
}

/// Per-tick defection probability. Zero for leaders, the loyal, and the
/// unaffiliated.
pub fn betrayal_chance(world: &World, config: &BetrayalConfig, character: u64) -> f64 {
    let Some(c) = world.character(character) else {
        return 0.0;
    };
    let Some(faction) = world.faction_of(character).and_then(|f| world.faction(f)) else {
        return 0.0;
    };
    if c.has_trait(&Trait::Loyal) || faction.leader == character {
        return 0.0;
    }

    let mut chance = config.base_chance;
    if faction.morale < config.low_morale {
        chance += config.low_morale_bonus;
    }
    if c.favor < config.low_favor {
        chance += config.low_favor_bonus;
    }
    if world.faction_cities(faction.id).len() <= 1 {
        chance += config.weak_faction_bonus;
    }
    let own_intimacy = world.intimacy(character, faction.leader);
    let pulled = best_rival(world, config, character)
        .is_some_and(|(_, rival)| rival >= config.rival_pull_intimacy);
    if pulled && own_intimacy < config.own_leader_low_intimacy {
        chance += config.rival_pull_bonus;
    }
    if c.has_trait(&Trait::Treacherous) {
        chance *= config.treacherous_multiplier;
    }
    chance.clamp(0.0, 1.0)
}

/// Roll defection for every eligible character, in ID order.
pub fn run(ctx: &mut TickContext) {
    let config = &ctx.config.betrayal;
    let candidates: Vec<(u64, f64, u64)> = ctx
        .world
        .characters
        .keys()
        .copied()
        .filter(|&c| !ctx.world.is_busy(c))
        .filter_map(|c| {
            let (rival, _) = best_rival(ctx.world, config, c)?;
            let chance = betrayal_chance(ctx.world, config, c);
            (chance > 0.0).then_some((c, chance, rival))
        })
        .collect();

    for (character, chance, rival) in candidates {
        if !ctx.rng.random_bool(chance) {
            continue;
        }
        // Earlier defections this tick may have moved the goalposts.
        let Some(from) = ctx.world.faction_of(character) else {
            continue;
        };
        if from == rival || !ctx.world.factions.contains_key(&rival) {
            continue;
        }
        defect(ctx, character, from, rival);
    }
}

fn defect(ctx: &mut TickContext, character: u64, from: u64, to: u64) {
    let old_leader = ctx.world.leader_of(from);
    if let Some(f) = ctx.world.factions.get_mut(&from) {
        f.remove_member(character);
    }
    if let Some(f) = ctx.world.factions.get_mut(&to) {
        f.add_member(character);
    }
    transfer_cities(ctx.world, character, old_leader);
    ctx.world.queued_tactics.remove(&character);
    ctx.world.adjust_trust(from, to, DEFECTION_TRUST);
    if let Some(leader) = old_leader {
        ctx.world.adjust_intimacy(character, leader, DEFECTION_INTIMACY);
    }
    let refuge = ctx.world.strongest_city(to, None);
    if let Some(c) = ctx.world.characters.get_mut(&character) {
        c.favor = DEFAULT_FAVOR;
        if refuge.is_some() {
            c.location = refuge;
        }
    }

    let description = format!(
        "{} abandoned {} for {}",
        ctx.world.character_name(character),
        ctx.world.faction_name(from),
        ctx.world.faction_name(to)
    );
    let event_id = ctx
        .world
        .log(EventKind::Betrayal, Some(character), old_leader, description);
    info!(character, from, to, "character defected");
    ctx.report.betrayals.push(BetrayalEvent {
        event_id,
        character,
        from,
        to,
    });
    ctx.signals.push(Signal {
        event_id,
        kind: SignalKind::Defected { character, from, to },
    });
}
