//! NPC faction decisions.
//!
//! Each non-player faction reads a handful of aggregate signals, settles on
//! one strategic intent for the tick, and hands out at most one order per
//! free member. Leaders never leave their post.

pub mod personality;
pub mod targeting;

use std::collections::BTreeSet;

use tracing::debug;

use self::personality::{Personality, Stance, roll_stance};
use self::targeting::{choose_focus, eligible_targets, free_captures};
use crate::config::NpcConfig;
use crate::model::city::MAX_DEVELOPMENT;
use crate::model::{EventKind, UnitType, World};
use crate::sim::commands::recruit_cost;
use crate::sim::context::TickContext;
use crate::sim::helpers::{is_free, travel_days};
use crate::sim::report::{Recruit, RecruitmentResult};
use crate::sim::system::{SimSystem, TickFrequency};

const SMALL_MEMBERS: usize = 2;
const SMALL_CITIES: usize = 1;
const DEVELOP_RECRUITS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Defend,
    Expand,
    Develop,
}

/// Aggregate view of one faction, recomputed every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FactionSignals {
    pub members: usize,
    pub cities: usize,
    pub avg_garrison: f64,
    pub avg_development: f64,
    /// Some city is undefended, thinly garrisoned, or under siege.
    pub threatened: bool,
}

pub fn assess(world: &World, faction: u64, config: &NpcConfig) -> FactionSignals {
    let members = world
        .faction(faction)
        .map(|f| f.members.iter().filter(|&&m| world.is_alive(m)).count())
        .unwrap_or(0);
    let cities: Vec<_> = world
        .faction_cities(faction)
        .into_iter()
        .filter_map(|c| world.city(c))
        .collect();
    let n = cities.len();
    let (avg_garrison, avg_development) = if n == 0 {
        (0.0, 0.0)
    } else {
        let garrison: u64 = cities.iter().map(|c| c.garrison as u64).sum();
        let development: u64 = cities.iter().map(|c| c.development as u64).sum();
        (garrison as f64 / n as f64, development as f64 / n as f64)
    };
    let threatened = cities.iter().any(|c| {
        c.siege.is_some() || c.garrison < config.low_garrison || world.defenders_of(c.id).is_empty()
    });
    FactionSignals {
        members,
        cities: n,
        avg_garrison,
        avg_development,
        threatened,
    }
}

/// Defend beats expand beats develop.
pub fn classify(signals: &FactionSignals, has_targets: bool, config: &NpcConfig) -> Intent {
    let small = signals.members <= SMALL_MEMBERS || signals.cities <= SMALL_CITIES;
    if signals.threatened && small {
        Intent::Defend
    } else if signals.avg_garrison >= config.adequate_garrison && has_targets {
        Intent::Expand
    } else {
        Intent::Develop
    }
}

/// Members who may take an order this tick, with where they stand.
///
/// Excludes the leader, anyone in flight or unlocated, and the last defender
/// of a besieged city.
pub fn available_members(world: &World, faction: u64) -> Vec<(u64, u64)> {
    let Some(f) = world.faction(faction) else {
        return Vec::new();
    };
    f.members
        .iter()
        .copied()
        .filter(|&m| m != f.leader && is_free(world, m))
        .filter_map(|m| world.character(m).and_then(|c| c.location).map(|loc| (m, loc)))
        .filter(|&(_, loc)| {
            let besieged = world.city(loc).is_some_and(|c| c.siege.is_some());
            !(besieged && world.defenders_of(loc).len() <= 1)
        })
        .collect()
}

pub struct NpcSystem;

impl SimSystem for NpcSystem {
    fn name(&self) -> &str {
        "npc"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Daily
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let player = ctx.world.player_faction;
        let factions: Vec<u64> = ctx
            .world
            .factions
            .keys()
            .copied()
            .filter(|&f| Some(f) != player)
            .collect();
        for faction in factions {
            decide(ctx, faction);
        }
    }
}

fn decide(ctx: &mut TickContext, faction: u64) {
    let config = ctx.config;
    let npc = &config.npc;
    let available = available_members(ctx.world, faction);
    let origins: Vec<u64> = available.iter().map(|&(_, loc)| loc).collect();
    let targets = eligible_targets(ctx.world, faction, &origins);
    let signals = assess(ctx.world, faction, npc);
    let intent = classify(&signals, !targets.is_empty(), npc);
    debug!(faction, ?intent, free = available.len(), "npc intent");

    match intent {
        Intent::Expand => expand(ctx, faction, &available, &targets),
        Intent::Defend => defend(ctx, faction, &available),
        Intent::Develop => develop(ctx, faction, &available, &targets, &signals),
    }
}

fn march(ctx: &mut TickContext, faction: u64, character: u64, from: u64, to: u64) {
    let arrival = ctx.world.tick + travel_days(ctx.world, ctx.config, Some(faction));
    ctx.world.add_movement(character, from, to, arrival);
    debug!(character, from, to, arrival, "npc order");
}

fn expand(ctx: &mut TickContext, faction: u64, available: &[(u64, u64)], targets: &[u64]) {
    let Some(focus) = choose_focus(ctx.world, targets, &ctx.config.npc) else {
        return;
    };
    let mut covered: BTreeSet<u64> = BTreeSet::new();
    for &(character, loc) in available {
        let Some(c) = ctx.world.character(character) else {
            continue;
        };
        let personality = Personality::of(c);
        match roll_stance(&personality, &mut *ctx.rng) {
            Stance::Attack => {
                if loc != focus && ctx.world.reachable(loc, focus) {
                    march(ctx, faction, character, loc, focus);
                }
            }
            Stance::Reinforce => {
                let weak = ctx
                    .world
                    .faction_cities(faction)
                    .into_iter()
                    .filter(|&city| city != loc && !covered.contains(&city))
                    .filter(|&city| ctx.world.reachable(loc, city))
                    .find(|&city| ctx.world.defenders_of(city).is_empty());
                if let Some(city) = weak {
                    covered.insert(city);
                    march(ctx, faction, character, loc, city);
                }
            }
            Stance::Hold => {}
        }
    }
}

fn defend(ctx: &mut TickContext, faction: u64, available: &[(u64, u64)]) {
    let weakest = ctx
        .world
        .faction_cities(faction)
        .into_iter()
        .min_by_key(|&c| (ctx.world.city(c).map(|c| c.garrison).unwrap_or(0), c));
    let Some(weakest) = weakest else {
        return;
    };
    for &(character, loc) in available {
        if loc != weakest && ctx.world.reachable(loc, weakest) {
            march(ctx, faction, character, loc, weakest);
        }
    }
}

fn develop(
    ctx: &mut TickContext,
    faction: u64,
    available: &[(u64, u64)],
    targets: &[u64],
    signals: &FactionSignals,
) {
    let config = ctx.config;

    // Opportunistic grabs only.
    let mut assigned: BTreeSet<u64> = BTreeSet::new();
    for city in free_captures(ctx.world, targets, &config.npc) {
        let taker = available
            .iter()
            .find(|&&(c, loc)| {
                !assigned.contains(&c) && loc != city && ctx.world.reachable(loc, city)
            });
        if let Some(&(character, loc)) = taker {
            assigned.insert(character);
            march(ctx, faction, character, loc, city);
        }
    }

    let cities = ctx.world.faction_cities(faction);
    if signals.avg_development < config.npc.develop_threshold {
        let poorest = cities
            .iter()
            .copied()
            .filter_map(|c| ctx.world.city(c))
            .filter(|c| c.development < MAX_DEVELOPMENT)
            .min_by_key(|c| (c.development, c.id))
            .map(|c| c.id);
        let cost = config.economy.develop_cost;
        if let Some(id) = poorest {
            let invested = ctx.world.cities.get_mut(&id).is_some_and(|c| {
                let paid = c.spend(cost);
                if paid {
                    c.develop();
                }
                paid
            });
            if invested {
                let description = format!(
                    "{} invested in {}",
                    ctx.world.faction_name(faction),
                    ctx.world.city_name(id)
                );
                ctx.world.log(EventKind::Development, None, None, description);
            }
        }
    }

    for city_id in cities {
        let cost = recruit_cost(ctx.world, city_id, config.economy.recruit_cost, DEVELOP_RECRUITS);
        let Some(city) = ctx.world.cities.get_mut(&city_id) else {
            continue;
        };
        if city.gold < config.npc.recruit_gold || city.garrison >= config.npc.recruit_below {
            continue;
        }
        if !city.spend(cost) {
            continue;
        }
        city.garrison += DEVELOP_RECRUITS;
        city.units.add(UnitType::Infantry, DEVELOP_RECRUITS);
        ctx.report.recruitment.push(RecruitmentResult {
            city: city_id,
            faction,
            recruit: Recruit::Troops {
                unit: UnitType::Infantry,
                amount: DEVELOP_RECRUITS,
            },
            cost,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MissionKind, Trait};
    use crate::scenario::{KingdomIds, Scenario};
    use crate::sim::espionage::dispatch_spy;
    use crate::testutil::tick_system;

    fn bold() -> Vec<Trait> {
        vec![Trait::Brave, Trait::Impulsive, Trait::Ambitious]
    }

    /// Wei is comfortably garrisoned with an eager officer; Shu is the only target.
    fn war_footing() -> (Scenario, KingdomIds, KingdomIds, u64) {
        let mut s = Scenario::at_tick(3);
        let shu = s.add_kingdom("Shu");
        let wei = s.add_kingdom("Wei");
        let officer = s
            .character("Xiahou Yuan")
            .member_of(wei.faction)
            .at(wei.city)
            .military(14)
            .traits(bold())
            .id();
        s.player(shu.faction);
        (s, shu, wei, officer)
    }

    fn signals(
        threatened: bool,
        members: usize,
        cities: usize,
        avg_garrison: f64,
    ) -> FactionSignals {
        FactionSignals {
            members,
            cities,
            avg_garrison,
            avg_development: 1.0,
            threatened,
        }
    }

    #[test]
    fn intent_priorities() {
        let config = NpcConfig::default();
        assert_eq!(classify(&signals(true, 2, 3, 9.0), true, &config), Intent::Defend);
        assert_eq!(classify(&signals(true, 5, 3, 9.0), true, &config), Intent::Expand);
        assert_eq!(classify(&signals(false, 1, 1, 9.0), false, &config), Intent::Develop);
        assert_eq!(classify(&signals(false, 5, 3, 5.9), true, &config), Intent::Develop);
    }

    #[test]
    fn expanding_faction_marches_on_the_focus() {
        let (s, shu, wei, officer) = war_footing();
        let mut world = s.build();
        tick_system(&mut world, &mut NpcSystem, 4);
        let m = &world.movements;
        assert_eq!(m.len(), 1);
        assert_eq!((m[0].character, m[0].destination, m[0].arrival), (officer, shu.city, 5));
        // The leader holds.
        assert_eq!(world.character(wei.leader).unwrap().location, Some(wei.city));
    }

    #[test]
    fn player_characters_are_never_ordered() {
        let (mut s, shu, _, _) = war_footing();
        s.character("Ma Chao").member_of(shu.faction).at(shu.city).traits(bold());
        let mut world = s.build();
        tick_system(&mut world, &mut NpcSystem, 4);
        assert!(world.movements.iter().all(|m| world.faction_of(m.character) != Some(shu.faction)));
    }

    #[test]
    fn busy_characters_are_skipped() {
        let (s, shu, wei, officer) = war_footing();
        let mut world = s.build();
        dispatch_spy(&mut world, officer, wei.city, shu.city, MissionKind::Intel, 9);
        tick_system(&mut world, &mut NpcSystem, 4);
        assert!(world.movements.is_empty());
        assert!(available_members(&world, wei.faction).is_empty());
    }

    #[test]
    fn last_defender_of_a_besieged_city_stays() {
        let (mut s, shu, wei, officer) = war_footing();
        let fort = s.city("Chencang").owner(wei.leader).garrison(8).id();
        s.city_mut(fort).besieged_by(shu.faction, 1);
        s.character_mut(officer).at(fort);
        let world = s.build();
        assert!(available_members(&world, wei.faction).is_empty());
    }

    #[test]
    fn threatened_small_faction_reinforces_its_weakest_city() {
        let mut s = Scenario::at_tick(3);
        s.add_kingdom("Shu");
        let wei = s.add_kingdom("Wei");
        let outpost = s.city("Wan").owner(wei.leader).garrison(2).id();
        let officer = s.character("Cao Ren").member_of(wei.faction).at(wei.city).id();
        let mut world = s.build();
        let signals = assess(&world, wei.faction, &NpcConfig::default());
        assert!(signals.threatened);
        tick_system(&mut world, &mut NpcSystem, 4);
        let order = world.movements.iter().find(|m| m.character == officer).unwrap();
        assert_eq!(order.destination, outpost);
    }

    #[test]
    fn developing_faction_invests_and_recruits() {
        let mut s = Scenario::at_tick(3);
        let wei = s.add_kingdom("Wei");
        s.city_mut(wei.city).garrison(6).gold(200);
        let mut world = s.build();
        let (report, _) = tick_system(&mut world, &mut NpcSystem, 4);
        let city = world.city(wei.city).unwrap();
        assert_eq!(city.development, 2);
        assert_eq!(city.garrison, 8);
        assert_eq!(city.gold, 200 - 40 - 20);
        assert_eq!(report.recruitment.len(), 1);
    }
}
