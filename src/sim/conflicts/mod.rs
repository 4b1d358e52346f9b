pub mod power;
mod siege;

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use tracing::{debug, info};

use self::power::{Engagement, attacker_contribution, counter_shift, defense_power};
use super::context::TickContext;
use super::helpers::retreat;
use super::report::{BattleOutcome, BattleResult};
use super::signal::{Signal, SignalKind};
use super::system::{SimSystem, TickFrequency};
use crate::config::CombatConfig;
use crate::model::{EventKind, Season, Siege, Skill, Tactic, Units, World};

pub use siege::SiegeSystem;

// Battle aftermath
const WINNER_MORALE: i32 = 5;
const LOSER_MORALE: i32 = -10;
const REPULSED_MORALE: i32 = -3;
const CAPTURE_LEADER_INTIMACY: i32 = -5;
const REPULSED_EXHAUSTION: u32 = 5;
const CAPTURE_GARRISON_LOSS: u32 = 1;

/// One character arriving at a hostile city this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrival {
    pub character: u64,
    pub origin: u64,
}

/// Resolves this tick's movement arrivals: plain relocations into friendly
/// cities and battles at hostile ones.
pub struct CombatSystem;

impl SimSystem for CombatSystem {
    fn name(&self) -> &str {
        "combat"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Daily
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let tick = ctx.world.tick;
        let arrivals = ctx.world.take_arrivals(tick);

        // city -> attacking faction -> arrivals, all in ID order
        let mut assaults: BTreeMap<u64, BTreeMap<u64, Vec<Arrival>>> = BTreeMap::new();
        for m in arrivals {
            let Some(c) = ctx.world.characters.get_mut(&m.character) else {
                continue;
            };
            c.location = Some(m.destination);
            let Some(faction) = ctx.world.faction_of(m.character) else {
                continue;
            };
            let hostile = match ctx.world.city_faction(m.destination) {
                Some(owner) => ctx.world.hostile(faction, owner),
                None => true,
            };
            if !hostile {
                continue;
            }
            assaults
                .entry(m.destination)
                .or_default()
                .entry(faction)
                .or_default()
                .push(Arrival {
                    character: m.character,
                    origin: m.origin,
                });
        }

        for (city, by_faction) in assaults {
            let mut captured = false;
            for (faction, group) in by_faction {
                if captured {
                    debug!(city, faction, "city already taken this tick");
                    continue;
                }
                captured = resolve_battle(ctx, city, faction, &group);
            }
        }
    }
}

/// Attack and defense for a group assaulting `city`. Consumes randomness
/// for the defense jitter only.
#[allow(clippy::too_many_arguments)]
pub fn engage(
    world: &World,
    city: u64,
    faction: u64,
    attackers: &[u64],
    attacker_units: &Units,
    tactic: Tactic,
    season: Season,
    rng: &mut (impl Rng + ?Sized),
    config: &CombatConfig,
) -> Option<Engagement> {
    let target = world.city(city)?;
    let side = world.faction(faction);
    let raw_attack: f64 = attackers
        .iter()
        .filter_map(|&id| world.character(id))
        .map(|c| attacker_contribution(c, side, config))
        .sum();
    let raw_defense = defense_power(world, target, season, rng, config);
    let shift = counter_shift(attacker_units, &target.units, config.counter_bonus);
    Some(Engagement::new(raw_attack, raw_defense, tactic, shift))
}

/// Resolve one faction's assault. Returns true if the city changed hands.
fn resolve_battle(ctx: &mut TickContext, city_id: u64, faction: u64, group: &[Arrival]) -> bool {
    let config = ctx.config;
    let side = ctx.world.faction(faction).cloned();
    let mut scored: Vec<(u64, f64)> = group
        .iter()
        .filter_map(|a| ctx.world.character(a.character))
        .map(|c| (c.id, attacker_contribution(c, side.as_ref(), &config.combat)))
        .collect();
    if scored.is_empty() {
        return false;
    }
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let lead = scored[0].0;
    let attackers: Vec<u64> = scored.iter().map(|&(id, _)| id).collect();

    let queued = ctx.world.queued_tactics.remove(&lead);
    for id in &attackers {
        ctx.world.queued_tactics.remove(id);
    }
    let tactic = queued.unwrap_or_else(|| Tactic::choose_npc(&mut *ctx.rng));

    let defender_faction = ctx.world.city_faction(city_id);
    let city_name = ctx.world.city_name(city_id);
    let lead_name = ctx.world.character_name(lead);

    // Nobody controls the city: it is simply claimed.
    if defender_faction.is_none() {
        let raw_attack: f64 = scored.iter().map(|&(_, p)| p).sum();
        let event_id = execute_capture(ctx, city_id, lead, faction);
        ctx.report.battles.push(BattleResult {
            event_id,
            city: city_id,
            attacker_faction: faction,
            defender_faction: None,
            attackers,
            lead_attacker: lead,
            tactic,
            attack_power: raw_attack,
            defense_power: 0.0,
            outcome: BattleOutcome::Claimed,
        });
        return true;
    }

    let origins: BTreeSet<u64> = group.iter().map(|a| a.origin).collect();
    let attacker_units = origins
        .iter()
        .filter_map(|&o| ctx.world.city(o))
        .fold(Units::default(), |acc, c| acc.merged(&c.units));
    let season = Season::of_tick(ctx.world.tick, config.calendar.days_per_season);
    let Some(engagement) = engage(
        ctx.world,
        city_id,
        faction,
        &attackers,
        &attacker_units,
        tactic,
        season,
        &mut *ctx.rng,
        &config.combat,
    ) else {
        return false;
    };

    let captured = engagement.attacker_wins();
    let outcome;
    let event_id;
    if captured {
        if let Some(city) = ctx.world.cities.get_mut(&city_id) {
            city.lose_garrison(CAPTURE_GARRISON_LOSS);
        }
        event_id = ctx.world.log(
            EventKind::Battle,
            Some(lead),
            ctx.world.city(city_id).and_then(|c| c.owner),
            format!("{lead_name} stormed {city_name} with a {tactic} assault"),
        );
        execute_capture(ctx, city_id, lead, faction);
        for &id in &attackers {
            if let Some(c) = ctx.world.characters.get_mut(&id) {
                c.raise_military();
                c.skills.raise(Skill::Tactics);
                if id == lead {
                    c.legacy += 1;
                }
            }
        }
        outcome = BattleOutcome::Captured;
    } else {
        event_id = ctx.world.log(
            EventKind::Battle,
            Some(lead),
            ctx.world.city(city_id).and_then(|c| c.owner),
            format!("{lead_name} was thrown back from the walls of {city_name}"),
        );
        let opens_siege = ctx
            .world
            .city(city_id)
            .is_some_and(|c| c.garrison > 0 && c.siege.is_none());
        if opens_siege {
            start_siege(ctx, city_id, faction);
            outcome = BattleOutcome::SiegeStarted;
        } else {
            outcome = BattleOutcome::Repulsed;
        }
        if let Some(f) = ctx.world.factions.get_mut(&faction) {
            f.adjust_morale(REPULSED_MORALE);
        }
        if let Some(defender) = defender_faction {
            ctx.world.add_exhaustion(faction, defender, REPULSED_EXHAUSTION);
        }
    }

    debug!(
        city = city_id,
        faction,
        attack = engagement.attack,
        defense = engagement.defense,
        ?outcome,
        "battle resolved"
    );
    ctx.report.battles.push(BattleResult {
        event_id,
        city: city_id,
        attacker_faction: faction,
        defender_faction,
        attackers,
        lead_attacker: lead,
        tactic,
        attack_power: engagement.attack,
        defense_power: engagement.defense,
        outcome,
    });
    captured
}

fn start_siege(ctx: &mut TickContext, city_id: u64, faction: u64) {
    let tick = ctx.world.tick;
    if let Some(city) = ctx.world.cities.get_mut(&city_id) {
        city.siege = Some(Siege {
            faction,
            started: tick,
        });
    }
    let description = format!(
        "{} laid siege to {}",
        ctx.world.faction_name(faction),
        ctx.world.city_name(city_id)
    );
    let leader = ctx.world.leader_of(faction);
    let event_id = ctx.world.log(EventKind::SiegeStarted, leader, None, description);
    ctx.signals.push(Signal {
        event_id,
        kind: SignalKind::SiegeStarted {
            city: city_id,
            faction,
        },
    });
}

/// Hand a city to `new_owner` of `new_faction`: clear any siege, send the
/// old defenders away, and settle morale and leader relations.
/// Returns the capture's log entry.
pub(crate) fn execute_capture(
    ctx: &mut TickContext,
    city_id: u64,
    new_owner: u64,
    new_faction: u64,
) -> u64 {
    let old_faction = ctx.world.city_faction(city_id);
    let defenders = ctx.world.defenders_of(city_id);
    let previous_owner = ctx.world.city(city_id).and_then(|c| c.owner);
    if let Some(city) = ctx.world.cities.get_mut(&city_id) {
        city.owner = Some(new_owner);
        city.siege = None;
    }
    for d in defenders {
        retreat(ctx.world, d, city_id);
    }

    if let Some(f) = ctx.world.factions.get_mut(&new_faction) {
        f.adjust_morale(WINNER_MORALE);
    }
    if let Some(old) = old_faction {
        if let Some(f) = ctx.world.factions.get_mut(&old) {
            f.adjust_morale(LOSER_MORALE);
        }
        if let Some((a, b)) = ctx.world.leader_of(new_faction).zip(ctx.world.leader_of(old)) {
            ctx.world.adjust_intimacy(a, b, CAPTURE_LEADER_INTIMACY);
        }
    }

    let description = format!(
        "{} took {} for {}",
        ctx.world.character_name(new_owner),
        ctx.world.city_name(city_id),
        ctx.world.faction_name(new_faction)
    );
    let event_id = ctx
        .world
        .log(EventKind::Capture, Some(new_owner), previous_owner, description);
    info!(city = city_id, ?old_faction, new_faction, "city captured");
    ctx.signals.push(Signal {
        event_id,
        kind: SignalKind::CityCaptured {
            city: city_id,
            old_faction,
            new_faction,
        },
    });
    event_id
}
