//! Proposals one faction makes to another: alliances and tribute.

use rand::Rng;
use tracing::debug;

use super::form_alliance;
use crate::config::DiplomacyConfig;
use crate::model::{EventKind, World};
use crate::sim::context::TickContext;
use crate::sim::helpers::faction_strength;
use crate::sim::report::DiplomacyEvent;

const MIN_ACCEPTANCE: f64 = 0.05;
const MAX_ACCEPTANCE: f64 = 0.95;
const BASE_ACCEPTANCE: f64 = 0.2;
const REJECTED_TRUST: i32 = -2;
const REFUSED_TRIBUTE_INTIMACY: i32 = -5;

/// Chance an alliance proposal is accepted, given the pair's trust and the
/// leaders' intimacy.
pub fn acceptance_chance(trust: u8, intimacy: u8) -> f64 {
    let chance = BASE_ACCEPTANCE
        + (trust as f64 - 20.0) / 100.0
        + (intimacy as f64 - 40.0) / 100.0;
    chance.clamp(MIN_ACCEPTANCE, MAX_ACCEPTANCE)
}

/// Whether `from` may propose an alliance to `to` at all.
pub fn can_propose(world: &World, config: &DiplomacyConfig, from: u64, to: u64) -> bool {
    if from == to || world.are_allied(from, to) {
        return false;
    }
    let Some(intimacy) = world.leader_intimacy(from, to) else {
        return false;
    };
    intimacy >= config.proposal_min_intimacy && world.trust(from, to) >= config.proposal_min_trust
}

/// Roll an already-validated proposal. Returns whether it was accepted.
pub fn propose_alliance(ctx: &mut TickContext, from: u64, to: u64) -> bool {
    let trust = ctx.world.trust(from, to);
    let intimacy = ctx.world.leader_intimacy(from, to).unwrap_or(0);
    let chance = acceptance_chance(trust, intimacy);
    let accepted = ctx.rng.random_bool(chance);
    debug!(from, to, chance, accepted, "alliance proposal");
    if accepted {
        ctx.report
            .diplomacy
            .push(DiplomacyEvent::ProposalAccepted { from, to });
        form_alliance(ctx, from, to);
    } else {
        ctx.world.adjust_trust(from, to, REJECTED_TRUST);
        let description = format!(
            "{} rebuffed an alliance offered by {}",
            ctx.world.faction_name(to),
            ctx.world.faction_name(from)
        );
        ctx.world.log(
            EventKind::Custom("proposal_rejected".to_string()),
            ctx.world.leader_of(from),
            ctx.world.leader_of(to),
            description,
        );
        ctx.report
            .diplomacy
            .push(DiplomacyEvent::ProposalRejected { from, to });
    }
    accepted
}

/// Demand `amount` gold from `to`. A faction clearly outmatched pays what
/// its richest city holds, up to the amount; anyone else refuses.
/// Returns the gold paid.
pub fn demand_tribute(ctx: &mut TickContext, from: u64, to: u64, amount: u32) -> u32 {
    let dc = &ctx.config.diplomacy;
    let ours = faction_strength(ctx.world, from) as f64;
    let theirs = faction_strength(ctx.world, to) as f64;
    let outmatched = ours >= theirs * dc.tribute_strength_ratio;

    if !outmatched {
        ctx.world.adjust_trust(from, to, dc.trust_tribute_rejected);
        if let Some((a, b)) = ctx.world.leader_of(from).zip(ctx.world.leader_of(to)) {
            ctx.world.adjust_intimacy(a, b, REFUSED_TRIBUTE_INTIMACY);
        }
        let description = format!(
            "{} refused to pay tribute to {}",
            ctx.world.faction_name(to),
            ctx.world.faction_name(from)
        );
        let (payer, demander) = (ctx.world.leader_of(to), ctx.world.leader_of(from));
        ctx.world.log(EventKind::Tribute, payer, demander, description);
        ctx.report
            .diplomacy
            .push(DiplomacyEvent::TributeRefused { from, to });
        return 0;
    }

    let source = ctx.world.richest_city(to);
    let sink = ctx.world.richest_city(from);
    let paid = source
        .and_then(|c| ctx.world.city(c))
        .map(|c| c.gold.min(amount))
        .unwrap_or(0);
    if let Some(c) = source.and_then(|c| ctx.world.cities.get_mut(&c)) {
        c.lose_gold(paid);
    }
    if let Some(c) = sink.and_then(|c| ctx.world.cities.get_mut(&c)) {
        c.gold = c.gold.saturating_add(paid);
    }
    ctx.world.adjust_trust(from, to, dc.trust_tribute_accepted);
    let description = format!(
        "{} paid {paid} gold in tribute to {}",
        ctx.world.faction_name(to),
        ctx.world.faction_name(from)
    );
    let (payer, demander) = (ctx.world.leader_of(to), ctx.world.leader_of(from));
    ctx.world.log(EventKind::Tribute, payer, demander, description);
    ctx.report.diplomacy.push(DiplomacyEvent::TributePaid {
        from: to,
        to: from,
        amount: paid,
    });
    paid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::scenario::Scenario;
    use crate::testutil::with_context;

    #[test]
    fn acceptance_scales_with_margin() {
        assert!((acceptance_chance(20, 40) - 0.2).abs() < 1e-9);
        assert!((acceptance_chance(50, 60) - 0.7).abs() < 1e-9);
        assert_eq!(acceptance_chance(100, 100), MAX_ACCEPTANCE);
        assert_eq!(acceptance_chance(0, 0), MIN_ACCEPTANCE);
    }

    #[test]
    fn proposals_need_both_intimacy_and_trust() {
        let mut s = Scenario::new();
        let shu = s.add_kingdom("Shu");
        let wu = s.add_kingdom("Wu");
        s.relate(shu.leader, wu.leader, 45);
        s.trust(shu.faction, wu.faction, 19);
        let mut world = s.build();
        let config = DiplomacyConfig::default();
        assert!(!can_propose(&world, &config, shu.faction, wu.faction));
        world.adjust_trust(shu.faction, wu.faction, 1);
        assert!(can_propose(&world, &config, shu.faction, wu.faction));
        world.set_intimacy(shu.leader, wu.leader, 39);
        assert!(!can_propose(&world, &config, shu.faction, wu.faction));
    }

    #[test]
    fn weak_faction_pays_tribute() {
        let mut s = Scenario::at_tick(3);
        let shu = s.add_kingdom("Shu");
        let wu = s.add_kingdom("Wu");
        s.city_mut(shu.city).garrison(40);
        s.city_mut(wu.city).gold(25);
        let mut world = s.build();
        let config = SimConfig::default();
        let (paid, report, _) = with_context(&mut world, &config, 1, |ctx| {
            demand_tribute(ctx, shu.faction, wu.faction, 30)
        });
        assert_eq!(paid, 25);
        assert_eq!(world.city(wu.city).unwrap().gold, 0);
        assert_eq!(world.city(shu.city).unwrap().gold, 125);
        assert_eq!(world.trust(shu.faction, wu.faction), 47);
        assert!(matches!(report.diplomacy[0], DiplomacyEvent::TributePaid { amount: 25, .. }));
    }

    #[test]
    fn equal_faction_refuses() {
        let mut s = Scenario::at_tick(3);
        let shu = s.add_kingdom("Shu");
        let wu = s.add_kingdom("Wu");
        let mut world = s.build();
        let config = SimConfig::default();
        let (paid, _, _) = with_context(&mut world, &config, 1, |ctx| {
            demand_tribute(ctx, shu.faction, wu.faction, 30)
        });
        assert_eq!(paid, 0);
        assert_eq!(world.trust(shu.faction, wu.faction), 42);
        assert_eq!(world.intimacy(shu.leader, wu.leader), 45);
        assert_eq!(world.city(wu.city).unwrap().gold, 100);
    }
}
