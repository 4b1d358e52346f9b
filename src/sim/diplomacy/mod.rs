//! Faction-level diplomacy: war exhaustion, alliance hysteresis, trust drift,
//! ceasefires, and defections.
//!
//! Alliances are driven by the intimacy of the two leaders. They form only
//! when it reaches `alliance_form_intimacy` and break only when it falls to
//! `alliance_break_intimacy`, so values in between never toggle anything.

pub mod betrayal;
pub mod proposals;

use tracing::{debug, info};

use crate::model::relationship::pair_key;
use crate::model::EventKind;
use crate::sim::context::TickContext;
use crate::sim::factions::resolve_eliminations;
use crate::sim::report::DiplomacyEvent;
use crate::sim::signal::{Signal, SignalKind};
use crate::sim::system::{SimSystem, TickFrequency};

pub use proposals::{acceptance_chance, can_propose};

const CAPTURE_EXHAUSTION: u32 = 10;
const EXHAUSTION_DECAY: u32 = 1;
const ALLIED_TRUST_GAIN: i32 = 1;

pub struct DiplomacySystem;

impl SimSystem for DiplomacySystem {
    fn name(&self) -> &str {
        "diplomacy"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Daily
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        update_exhaustion(ctx);
        expire_ceasefires(ctx);
        update_alliances(ctx);
        update_trust(ctx);
        propose_ceasefires(ctx);
        betrayal::run(ctx);
        resolve_eliminations(ctx);
    }
}

/// Decay every pair by one, then add this tick's captures.
fn update_exhaustion(ctx: &mut TickContext) {
    for value in ctx.world.war_exhaustion.values_mut() {
        *value = value.saturating_sub(EXHAUSTION_DECAY);
    }
    ctx.world.war_exhaustion.retain(|_, v| *v > 0);

    let captures: Vec<(u64, u64)> = ctx
        .signals
        .iter()
        .filter_map(|s| match s.kind {
            SignalKind::CityCaptured {
                old_faction: Some(old),
                new_faction,
                ..
            } if old != new_faction => Some((old, new_faction)),
            _ => None,
        })
        .filter(|(a, b)| ctx.world.factions.contains_key(a) && ctx.world.factions.contains_key(b))
        .collect();
    for (a, b) in captures {
        ctx.world.add_exhaustion(a, b, CAPTURE_EXHAUSTION);
    }
}

fn expire_ceasefires(ctx: &mut TickContext) {
    let tick = ctx.world.tick;
    let expired: Vec<(u64, u64)> = ctx
        .world
        .ceasefires
        .iter()
        .filter(|&(_, &until)| until <= tick)
        .map(|(&k, _)| k)
        .collect();
    for key in expired {
        ctx.world.ceasefires.remove(&key);
        debug!(a = key.0, b = key.1, "ceasefire expired");
    }
}

fn update_alliances(ctx: &mut TickContext) {
    let dc = &ctx.config.diplomacy;
    let (form_at, break_at) = (dc.alliance_form_intimacy, dc.alliance_break_intimacy);
    let ids: Vec<u64> = ctx.world.factions.keys().copied().collect();

    let mut forming = Vec::new();
    let mut breaking = Vec::new();
    for (i, &a) in ids.iter().enumerate() {
        for &b in &ids[i + 1..] {
            let Some(intimacy) = ctx.world.leader_intimacy(a, b) else {
                continue;
            };
            let allied = ctx.world.are_allied(a, b);
            if !allied && intimacy >= form_at {
                forming.push((a, b));
            } else if allied && intimacy <= break_at {
                breaking.push((a, b));
            }
        }
    }
    for (a, b) in forming {
        form_alliance(ctx, a, b);
    }
    for (a, b) in breaking {
        break_alliance(ctx, a, b);
    }
}

/// Allied pairs gain trust every tick; the rest drift toward neutral.
fn update_trust(ctx: &mut TickContext) {
    let tick = ctx.world.tick;
    let interval = ctx.config.diplomacy.trust_drift_interval;
    let neutral = ctx.config.diplomacy.initial_trust;
    let allied: Vec<(u64, u64)> = ctx.world.alliances.iter().copied().collect();
    for (a, b) in allied {
        ctx.world.adjust_trust(a, b, ALLIED_TRUST_GAIN);
    }
    if interval == 0 || tick % interval != 0 {
        return;
    }
    let alliances = &ctx.world.alliances;
    for (key, value) in ctx.world.trust.iter_mut() {
        if alliances.contains(key) {
            continue;
        }
        if *value > neutral {
            *value -= 1;
        } else if *value < neutral {
            *value += 1;
        }
    }
}

/// Exhausted pairs seek peace. NPC pairs agree at once; a pair involving the
/// player becomes a standing offer until accepted or outgrown.
fn propose_ceasefires(ctx: &mut TickContext) {
    let threshold = ctx.config.diplomacy.ceasefire_exhaustion;
    let player = ctx.world.player_faction;

    if let Some(p) = player {
        let world = &*ctx.world;
        let stale: Vec<u64> = world
            .ceasefire_offers
            .iter()
            .copied()
            .filter(|&f| {
                let exhaustion = world.war_exhaustion.get(&pair_key(p, f)).copied().unwrap_or(0);
                exhaustion < threshold || !world.factions.contains_key(&f)
            })
            .collect();
        for f in stale {
            ctx.world.ceasefire_offers.remove(&f);
        }
    }

    let exhausted: Vec<(u64, u64)> = ctx
        .world
        .war_exhaustion
        .iter()
        .filter(|&(_, &v)| v >= threshold)
        .map(|(&k, _)| k)
        .filter(|&(a, b)| ctx.world.hostile(a, b))
        .collect();
    for (a, b) in exhausted {
        match player {
            Some(p) if a == p || b == p => {
                let other = if a == p { b } else { a };
                if ctx.world.ceasefire_offers.insert(other) {
                    let description = format!(
                        "{} sued {} for peace",
                        ctx.world.faction_name(other),
                        ctx.world.faction_name(p)
                    );
                    ctx.world.log(EventKind::Ceasefire, None, None, description);
                    ctx.report
                        .diplomacy
                        .push(DiplomacyEvent::CeasefireProposed { from: other, to: p });
                }
            }
            _ => agree_ceasefire(ctx, a, b),
        }
    }
}

pub(crate) fn form_alliance(ctx: &mut TickContext, a: u64, b: u64) {
    let (a, b) = pair_key(a, b);
    if !ctx.world.alliances.insert((a, b)) {
        return;
    }
    if let Some(p) = ctx.world.player_faction {
        if a == p {
            ctx.world.ceasefire_offers.remove(&b);
        } else if b == p {
            ctx.world.ceasefire_offers.remove(&a);
        }
    }
    ctx.world
        .adjust_trust(a, b, ctx.config.diplomacy.trust_alliance_formed);
    let description = format!(
        "{} and {} swore an alliance",
        ctx.world.faction_name(a),
        ctx.world.faction_name(b)
    );
    let event_id = ctx.world.log(
        EventKind::AllianceFormed,
        ctx.world.leader_of(a),
        ctx.world.leader_of(b),
        description,
    );
    info!(a, b, "alliance formed");
    ctx.report.diplomacy.push(DiplomacyEvent::AllianceFormed { a, b });
    ctx.signals.push(Signal {
        event_id,
        kind: SignalKind::AllianceFormed { a, b },
    });
}

pub(crate) fn break_alliance(ctx: &mut TickContext, a: u64, b: u64) {
    let (a, b) = pair_key(a, b);
    if !ctx.world.alliances.remove(&(a, b)) {
        return;
    }
    ctx.world
        .adjust_trust(a, b, ctx.config.diplomacy.trust_alliance_broken);
    let description = format!(
        "The alliance between {} and {} collapsed",
        ctx.world.faction_name(a),
        ctx.world.faction_name(b)
    );
    let event_id = ctx.world.log(
        EventKind::AllianceBroken,
        ctx.world.leader_of(a),
        ctx.world.leader_of(b),
        description,
    );
    info!(a, b, "alliance broken");
    ctx.report.diplomacy.push(DiplomacyEvent::AllianceBroken { a, b });
    ctx.signals.push(Signal {
        event_id,
        kind: SignalKind::AllianceBroken { a, b },
    });
}

/// Stop the fighting between two factions for `ceasefire_duration` ticks.
pub(crate) fn agree_ceasefire(ctx: &mut TickContext, a: u64, b: u64) {
    let key = pair_key(a, b);
    let until = ctx.world.tick + ctx.config.diplomacy.ceasefire_duration;
    ctx.world.ceasefires.insert(key, until);
    ctx.world.war_exhaustion.remove(&key);
    if let Some(p) = ctx.world.player_faction {
        if key.0 == p || key.1 == p {
            let other = if key.0 == p { key.1 } else { key.0 };
            ctx.world.ceasefire_offers.remove(&other);
        }
    }
    let description = format!(
        "{} and {} laid down their arms until day {until}",
        ctx.world.faction_name(key.0),
        ctx.world.faction_name(key.1)
    );
    ctx.world.log(EventKind::Ceasefire, None, None, description);
    info!(a = key.0, b = key.1, until, "ceasefire agreed");
    ctx.report.diplomacy.push(DiplomacyEvent::CeasefireAgreed {
        a: key.0,
        b: key.1,
        until,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::scenario::{KingdomIds, Scenario};
    use crate::testutil::{tick_system, tick_system_with};

    fn two_kingdoms() -> (Scenario, KingdomIds, KingdomIds) {
        let mut s = Scenario::at_tick(1);
        let shu = s.add_kingdom("Shu");
        let wu = s.add_kingdom("Wu");
        (s, shu, wu)
    }

    fn quiet() -> SimConfig {
        let mut config = SimConfig::default();
        config.betrayal.base_chance = 0.0;
        config
    }

    #[test]
    fn alliance_forms_only_at_threshold() {
        let (mut s, shu, wu) = two_kingdoms();
        s.relate(shu.leader, wu.leader, 64);
        let mut world = s.build();
        tick_system_with(&mut world, &mut DiplomacySystem, &quiet(), 1);
        assert!(!world.are_allied(shu.faction, wu.faction));

        world.set_intimacy(shu.leader, wu.leader, 65);
        let (report, signals) = tick_system_with(&mut world, &mut DiplomacySystem, &quiet(), 1);
        assert!(world.are_allied(shu.faction, wu.faction));
        assert_eq!(world.trust(shu.faction, wu.faction), 50 + 10 + 1);
        assert!(matches!(report.diplomacy[0], DiplomacyEvent::AllianceFormed { .. }));
        assert!(matches!(signals[0].kind, SignalKind::AllianceFormed { .. }));
    }

    #[test]
    fn oscillating_intimacy_never_toggles() {
        let (mut s, shu, wu) = two_kingdoms();
        s.relate(shu.leader, wu.leader, 40);
        let mut world = s.build();
        for round in 0..20 {
            let intimacy = if round % 2 == 0 { 40 } else { 60 };
            world.set_intimacy(shu.leader, wu.leader, intimacy);
            world.tick += 1;
            let (report, _) = tick_system_with(&mut world, &mut DiplomacySystem, &quiet(), round);
            assert!(report.diplomacy.is_empty());
        }
        assert!(!world.are_allied(shu.faction, wu.faction));
    }

    #[test]
    fn alliance_breaks_at_the_lower_threshold() {
        let (mut s, shu, wu) = two_kingdoms();
        s.ally(shu.faction, wu.faction);
        s.relate(shu.leader, wu.leader, 26);
        let mut world = s.build();
        tick_system_with(&mut world, &mut DiplomacySystem, &quiet(), 1);
        assert!(world.are_allied(shu.faction, wu.faction));
        world.set_intimacy(shu.leader, wu.leader, 25);
        tick_system_with(&mut world, &mut DiplomacySystem, &quiet(), 1);
        assert!(!world.are_allied(shu.faction, wu.faction));
    }

    #[test]
    fn unallied_trust_drifts_toward_neutral() {
        let (mut s, shu, wu) = two_kingdoms();
        s.trust(shu.faction, wu.faction, 20);
        let mut world = s.build();
        world.tick = 9;
        tick_system_with(&mut world, &mut DiplomacySystem, &quiet(), 1);
        assert_eq!(world.trust(shu.faction, wu.faction), 20);
        world.tick = 10;
        tick_system_with(&mut world, &mut DiplomacySystem, &quiet(), 1);
        assert_eq!(world.trust(shu.faction, wu.faction), 21);
    }

    #[test]
    fn trust_drifts_toward_the_configured_start() {
        let (mut s, shu, wu) = two_kingdoms();
        s.trust(shu.faction, wu.faction, 50);
        let mut world = s.build();
        world.tick = 10;
        let mut config = quiet();
        config.diplomacy.initial_trust = 30;
        tick_system_with(&mut world, &mut DiplomacySystem, &config, 1);
        assert_eq!(world.trust(shu.faction, wu.faction), 49);
    }

    #[test]
    fn captures_add_exhaustion_and_it_decays() {
        let (s, shu, wu) = two_kingdoms();
        let mut world = s.build();
        world.add_exhaustion(shu.faction, wu.faction, 5);
        tick_system(&mut world, &mut DiplomacySystem, 1);
        assert_eq!(world.war_exhaustion[&pair_key(shu.faction, wu.faction)], 4);
    }

    #[test]
    fn exhausted_npcs_make_peace() {
        let (s, shu, wu) = two_kingdoms();
        let mut world = s.build();
        world.add_exhaustion(shu.faction, wu.faction, 70);
        let (report, _) = tick_system_with(&mut world, &mut DiplomacySystem, &quiet(), 1);
        assert!(world.at_ceasefire(shu.faction, wu.faction));
        assert!(!world.hostile(shu.faction, wu.faction));
        assert!(report.diplomacy.iter().any(|e| matches!(
            e,
            DiplomacyEvent::CeasefireAgreed { until: 31, .. }
        )));
        world.tick = 31;
        tick_system_with(&mut world, &mut DiplomacySystem, &quiet(), 1);
        assert!(!world.at_ceasefire(shu.faction, wu.faction));
    }

    #[test]
    fn player_gets_an_offer_instead() {
        let (mut s, shu, wu) = two_kingdoms();
        s.player(shu.faction);
        let mut world = s.build();
        world.add_exhaustion(shu.faction, wu.faction, 70);
        let (report, _) = tick_system_with(&mut world, &mut DiplomacySystem, &quiet(), 1);
        assert!(!world.at_ceasefire(shu.faction, wu.faction));
        assert!(world.ceasefire_offers.contains(&wu.faction));
        assert_eq!(
            report.diplomacy,
            vec![DiplomacyEvent::CeasefireProposed {
                from: wu.faction,
                to: shu.faction
            }]
        );
        // The offer is not repeated.
        let (report, _) = tick_system_with(&mut world, &mut DiplomacySystem, &quiet(), 1);
        assert!(report.diplomacy.is_empty());
        // And is withdrawn once tempers cool.
        world
            .war_exhaustion
            .insert(pair_key(shu.faction, wu.faction), 30);
        tick_system_with(&mut world, &mut DiplomacySystem, &quiet(), 1);
        assert!(world.ceasefire_offers.is_empty());
    }
}
