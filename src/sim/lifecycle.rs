use rand::Rng;
use tracing::info;

use crate::model::character::MAX_SKILL;
use crate::model::{EventKind, Skill, World};
use crate::sim::context::TickContext;
use crate::sim::helpers::transfer_cities;
use crate::sim::report::DeathEvent;
use crate::sim::signal::{Signal, SignalKind};
use crate::sim::system::{SimSystem, TickFrequency};

/// Aging and natural death.
pub struct LifecycleSystem;

impl SimSystem for LifecycleSystem {
    fn name(&self) -> &str {
        "lifecycle"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Daily
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let config = ctx.config;
        let lc = &config.lifecycle;
        let tick = ctx.world.tick;
        let aged: Vec<(u64, u64)> = ctx
            .world
            .characters
            .values()
            .filter_map(|c| Some((c.id, c.age(tick, lc.ticks_per_year)?)))
            .filter(|&(_, age)| age > lc.old_age)
            .collect();

        for (id, age) in aged {
            let chance = ((age - lc.old_age) as f64 * lc.death_rate_per_year).clamp(0.0, 1.0);
            if ctx.rng.random_bool(chance) {
                handle_death(ctx, id, Some(age));
            }
        }
    }
}

/// Soft-delete a character and settle everything hanging off them:
/// faction membership, leadership, and city ownership.
pub fn handle_death(ctx: &mut TickContext, character: u64, age: Option<u64>) {
    let faction = ctx.world.faction_of(character);
    let was_leader = faction.is_some_and(|f| ctx.world.leader_of(f) == Some(character));
    let name = ctx.world.character_name(character);
    if ctx.world.kill_character(character).is_none() {
        return;
    }

    let successor = match faction {
        Some(f) if was_leader => choose_successor(ctx.world, f),
        _ => None,
    };
    let heir = successor.or_else(|| faction.and_then(|f| ctx.world.leader_of(f)));
    let heir = heir.filter(|&h| ctx.world.is_alive(h));
    // A non-player faction left without members keeps its cities under the
    // dead owner; the faction pass hands them to whoever absorbs it.
    let orphaned = heir.is_none()
        && faction.is_some_and(|f| {
            ctx.world.player_faction != Some(f)
                && ctx.world.faction(f).is_some_and(|fac| fac.members.is_empty())
        });
    if !orphaned {
        transfer_cities(ctx.world, character, heir);
    }

    let event_id = ctx.world.log(
        EventKind::Death,
        Some(character),
        None,
        match age {
            Some(age) => format!("{name} died at the age of {age}"),
            None => format!("{name} died"),
        },
    );
    info!(character, ?faction, "character died");

    if let (Some(f), Some(s)) = (faction, successor) {
        if let Some(fac) = ctx.world.factions.get_mut(&f) {
            fac.leader = s;
        }
        let successor_name = ctx.world.character_name(s);
        let faction_name = ctx.world.faction_name(f);
        ctx.world.log(
            EventKind::Succession,
            Some(s),
            Some(character),
            format!("{successor_name} succeeded {name} as leader of {faction_name}"),
        );
    }

    ctx.report.deaths.push(DeathEvent {
        event_id,
        character,
        age,
        successor,
    });
    ctx.signals.push(Signal {
        event_id,
        kind: SignalKind::CharacterDied { character, faction },
    });
}

/// Remaining member with the highest charm + military, lowest ID on ties.
pub fn choose_successor(world: &World, faction: u64) -> Option<u64> {
    let members = &world.faction(faction)?.members;
    members
        .iter()
        .filter_map(|&m| world.character(m))
        .max_by(|a, b| {
            let sa = a.stats.charm + a.stats.military;
            let sb = b.stats.charm + b.stats.military;
            sa.cmp(&sb).then(b.id.cmp(&a.id))
        })
        .map(|c| c.id)
}

/// Transfer one level of `skill` from a co-located mentor with a higher level.
/// Returns false, changing nothing, when the preconditions fail.
pub fn mentor(world: &mut World, mentor: u64, student: u64, skill: Skill) -> bool {
    if mentor == student {
        return false;
    }
    let (Some(m), Some(s)) = (world.character(mentor), world.character(student)) else {
        return false;
    };
    let together = m.location.is_some() && m.location == s.location;
    let teachable = m.skills.get(skill) > s.skills.get(skill) && s.skills.get(skill) < MAX_SKILL;
    if !together || !teachable {
        return false;
    }
    let raised = world
        .characters
        .get_mut(&student)
        .is_some_and(|s| s.skills.raise(skill));
    if raised {
        let (mn, sn) = (world.character_name(mentor), world.character_name(student));
        world.log(
            EventKind::Custom("mentorship".to_string()),
            Some(mentor),
            Some(student),
            format!("{mn} taught {sn} the ways of {skill}"),
        );
    }
    raised
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::scenario::Scenario;
    use crate::testutil::{tick_system_with, with_context};

    #[test]
    fn the_young_never_die() {
        let mut s = Scenario::at_tick(1_000);
        let shu = s.add_kingdom("Shu");
        s.character_mut(shu.leader).born(900);
        let mut world = s.build();
        let mut config = SimConfig::default();
        config.lifecycle.death_rate_per_year = 1.0;
        for seed in 0..50 {
            tick_system_with(&mut world, &mut LifecycleSystem, &config, seed);
        }
        assert!(world.is_alive(shu.leader));
    }

    #[test]
    fn dead_leader_is_succeeded_and_cities_pass_on() {
        let mut s = Scenario::at_tick(61 * 120);
        let shu = s.add_kingdom("Shu");
        s.character_mut(shu.leader).born(0);
        let heir = s
            .character("Liu Shan")
            .at(shu.city)
            .member_of(shu.faction)
            .charm(3)
            .military(3)
            .id();
        let zhuge = s
            .character("Zhuge Liang")
            .at(shu.city)
            .member_of(shu.faction)
            .charm(12)
            .military(4)
            .id();
        let mut world = s.build();
        let mut config = SimConfig::default();
        config.lifecycle.death_rate_per_year = 1.0;
        let (report, signals) = tick_system_with(&mut world, &mut LifecycleSystem, &config, 2);

        assert!(!world.is_alive(shu.leader));
        assert!(world.dead.contains_key(&shu.leader));
        assert_eq!(world.leader_of(shu.faction), Some(zhuge));
        assert_eq!(world.city(shu.city).unwrap().owner, Some(zhuge));
        assert!(world.faction(shu.faction).unwrap().is_member(heir));
        assert_eq!(report.deaths[0].successor, Some(zhuge));
        assert_eq!(report.deaths[0].age, Some(61));
        assert!(matches!(signals[0].kind, SignalKind::CharacterDied { .. }));
    }

    #[test]
    fn death_cancels_movements() {
        let mut s = Scenario::at_tick(5);
        let shu = s.add_kingdom("Shu");
        let wei = s.add_kingdom("Wei");
        let mut world = s.build();
        world.add_movement(shu.leader, shu.city, wei.city, 7);
        with_context(&mut world, &SimConfig::default(), 1, |ctx| {
            handle_death(ctx, shu.leader, None)
        });
        assert!(world.movements.is_empty());
        // Shu is left empty, so its capital waits for the faction pass.
        assert_eq!(world.city(shu.city).unwrap().owner, Some(shu.leader));
    }

    #[test]
    fn last_player_leader_leaves_cities_unowned() {
        let mut s = Scenario::at_tick(5);
        let shu = s.add_kingdom("Shu");
        s.add_kingdom("Wei");
        s.player(shu.faction);
        let mut world = s.build();
        with_context(&mut world, &SimConfig::default(), 1, |ctx| {
            handle_death(ctx, shu.leader, None)
        });
        assert_eq!(world.city(shu.city).unwrap().owner, None);
    }

    #[test]
    fn mentoring_requires_company_and_a_better_teacher() {
        let mut s = Scenario::new();
        let shu = s.add_kingdom("Shu");
        let wei = s.add_kingdom("Wei");
        let teacher = s.character("Sima Hui").at(shu.city).skill(Skill::Tactics, 4).id();
        let pupil = s.character("Pang Tong").at(shu.city).skill(Skill::Tactics, 1).id();
        let distant = s.character("Xu Shu").at(wei.city).id();
        let mut world = s.build();

        assert!(mentor(&mut world, teacher, pupil, Skill::Tactics));
        assert_eq!(world.character(pupil).unwrap().skills.tactics, 2);
        assert!(!mentor(&mut world, pupil, teacher, Skill::Tactics));
        assert!(!mentor(&mut world, teacher, distant, Skill::Tactics));
        assert!(!mentor(&mut world, teacher, pupil, Skill::Espionage));
    }
}
