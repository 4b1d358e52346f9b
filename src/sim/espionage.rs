use rand::Rng;
use tracing::{debug, info};

use crate::config::EspionageConfig;
use crate::model::{Character, EventKind, MissionKind, MissionStatus, Role, SpyMission, World};
use crate::sim::context::TickContext;
use crate::sim::report::{IntelSnapshot, SpyReport};
use crate::sim::system::{SimSystem, TickFrequency};

// Success chance modifiers
const ESPIONAGE_SKILL_WEIGHT: f64 = 0.08;
const INTELLIGENCE_WEIGHT: f64 = 0.01;
const SPYMASTER_PENALTY: f64 = 0.15;
const MIN_SUCCESS: f64 = 0.05;
const MAX_SUCCESS: f64 = 0.95;

// Mission effects
const SABOTAGE_GARRISON_LOSS: u32 = 2;
const BLOCKADE_FOOD_LOSS: u32 = 20;
const BLOCKADE_GOLD_LOSS: u32 = 15;
const CAUGHT_TRUST_PENALTY: i32 = -10;
const CAUGHT_INTIMACY_PENALTY: i32 = -10;

/// Resolves spy missions on the tick they arrive.
pub struct EspionageSystem;

impl SimSystem for EspionageSystem {
    fn name(&self) -> &str {
        "espionage"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Daily
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let tick = ctx.world.tick;
        let (arriving, pending): (Vec<SpyMission>, Vec<SpyMission>) =
            std::mem::take(&mut ctx.world.spy_missions)
                .into_iter()
                .partition(|m| m.arrival <= tick);
        ctx.world.spy_missions = pending;

        for mission in arriving {
            resolve_mission(ctx, mission);
        }
    }
}

/// Send `character` on a mission. The caller has already validated and paid.
pub fn dispatch_spy(
    world: &mut World,
    character: u64,
    origin: u64,
    target: u64,
    mission: MissionKind,
    arrival: u64,
) {
    let id = world.next_id();
    world.spy_missions.push(SpyMission {
        id,
        character,
        origin,
        target,
        mission,
        status: MissionStatus::Traveling,
        arrival,
    });
    if let Some(c) = world.characters.get_mut(&character) {
        c.location = None;
    }
}

/// Chance a spy completes the mission undetected.
pub fn success_chance(spy: &Character, counter_spy: bool, config: &EspionageConfig) -> f64 {
    let mut chance = config.base_success
        + spy.skills.espionage as f64 * ESPIONAGE_SKILL_WEIGHT
        + spy.stats.intelligence as f64 * INTELLIGENCE_WEIGHT;
    if counter_spy {
        chance -= SPYMASTER_PENALTY;
    }
    chance.clamp(MIN_SUCCESS, MAX_SUCCESS)
}

fn resolve_mission(ctx: &mut TickContext, mut mission: SpyMission) {
    let Some(spy) = ctx.world.character(mission.character).cloned() else {
        return;
    };
    let spy_faction = ctx.world.faction_of(spy.id);
    let owner_faction = ctx.world.city_faction(mission.target);
    let counter_spy = owner_faction.is_some_and(|f| {
        ctx.world
            .present_from(mission.target, f)
            .iter()
            .filter_map(|&id| ctx.world.character(id))
            .any(|c| c.has_role(Role::Spymaster))
    });

    let chance = success_chance(&spy, counter_spy, &ctx.config.espionage);
    let succeeded = ctx.rng.random_bool(chance);
    mission.status = if succeeded {
        MissionStatus::Succeeded
    } else {
        MissionStatus::Caught
    };

    let city_name = ctx.world.city_name(mission.target);
    let mut intel = None;
    let description = if succeeded {
        match mission.mission {
            MissionKind::Intel => {
                intel = ctx.world.city(mission.target).map(|c| IntelSnapshot {
                    garrison: c.garrison,
                    food: c.food,
                    gold: c.gold,
                    defenders: ctx.world.defenders_of(mission.target),
                });
                format!("{} gathered intelligence in {city_name}", spy.name)
            }
            MissionKind::Sabotage => {
                sabotage(ctx, mission.target, owner_faction);
                format!("{} sabotaged {city_name}", spy.name)
            }
            MissionKind::Blockade => {
                if let Some(city) = ctx.world.cities.get_mut(&mission.target) {
                    city.lose_food(BLOCKADE_FOOD_LOSS);
                    city.lose_gold(BLOCKADE_GOLD_LOSS);
                }
                format!("{} blockaded the roads to {city_name}", spy.name)
            }
        }
    } else {
        if let (Some(owner), Some(spy_side)) = (owner_faction, spy_faction) {
            ctx.world.adjust_trust(owner, spy_side, CAUGHT_TRUST_PENALTY);
            if let Some((la, lb)) = ctx.world.leader_of(owner).zip(ctx.world.leader_of(spy_side)) {
                ctx.world.adjust_intimacy(la, lb, CAUGHT_INTIMACY_PENALTY);
            }
        }
        format!("{} was caught spying in {city_name}", spy.name)
    };

    // Home again, or to the nearest safe city if home has fallen.
    let home = if spy_faction.is_some() && ctx.world.city_faction(mission.origin) == spy_faction {
        Some(mission.origin)
    } else {
        spy_faction.and_then(|f| ctx.world.strongest_city(f, None))
    };
    if let Some(c) = ctx.world.characters.get_mut(&spy.id) {
        c.location = home;
    }

    let event_id = ctx
        .world
        .log(EventKind::Espionage, Some(spy.id), Some(mission.target), description);
    if succeeded {
        info!(
            event_id,
            spy = spy.id,
            city = mission.target,
            mission = %mission.mission,
            "spy mission succeeded"
        );
    } else {
        debug!(event_id, spy = spy.id, city = mission.target, "spy caught");
    }
    ctx.report.spy_reports.push(SpyReport {
        mission_id: mission.id,
        character: spy.id,
        city: mission.target,
        mission: mission.mission,
        status: mission.status,
        intel,
    });
}

/// Damage the city and sour the owner's alliances.
fn sabotage(ctx: &mut TickContext, city: u64, owner: Option<u64>) {
    if let Some(c) = ctx.world.cities.get_mut(&city) {
        c.lose_garrison(SABOTAGE_GARRISON_LOSS);
        c.undevelop();
    }
    let Some(owner) = owner else {
        return;
    };
    let penalty = ctx.config.diplomacy.trust_sabotage;
    for ally in ctx.world.allies_of(owner) {
        ctx.world.adjust_trust(owner, ally, penalty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::model::Skill;
    use crate::scenario::Scenario;
    use crate::testutil::tick_system;

    #[test]
    fn chance_is_clamped() {
        let config = EspionageConfig::default();
        let mut spy = Character::new(1, "Spy");
        spy.stats.intelligence = 20;
        spy.skills.set(Skill::Espionage, 5);
        assert_eq!(success_chance(&spy, false, &config), MAX_SUCCESS);
        spy.stats.intelligence = 0;
        spy.skills.set(Skill::Espionage, 0);
        let mut weak = config.clone();
        weak.base_success = 0.0;
        assert_eq!(success_chance(&spy, true, &weak), MIN_SUCCESS);
    }

    #[test]
    fn spymaster_lowers_the_odds() {
        let config = SimConfig::default();
        let spy = Character::new(1, "Spy");
        let open = success_chance(&spy, false, &config.espionage);
        let guarded = success_chance(&spy, true, &config.espionage);
        assert!((open - guarded - SPYMASTER_PENALTY).abs() < 1e-9);
    }

    #[test]
    fn arriving_spy_reports_and_returns_home() {
        let mut s = Scenario::at_tick(4);
        let shu = s.add_kingdom("Shu");
        let wei = s.add_kingdom("Wei");
        let spy = s
            .character("Fa Zheng")
            .member_of(shu.faction)
            .intelligence(20)
            .skill(Skill::Espionage, 5)
            .id();
        let mut world = s.build();
        dispatch_spy(&mut world, spy, shu.city, wei.city, MissionKind::Intel, 4);
        assert!(world.is_busy(spy));

        let (report, _) = tick_system(&mut world, &mut EspionageSystem, 9);
        assert!(world.spy_missions.is_empty());
        assert_eq!(world.character(spy).unwrap().location, Some(shu.city));
        let spy_report = &report.spy_reports[0];
        if spy_report.status == MissionStatus::Succeeded {
            assert_eq!(spy_report.intel.as_ref().unwrap().garrison, 10);
        } else {
            assert!(spy_report.intel.is_none());
        }
    }

    #[test]
    fn missions_in_flight_wait() {
        let mut s = Scenario::at_tick(2);
        let shu = s.add_kingdom("Shu");
        let wei = s.add_kingdom("Wei");
        let spy = s.character("Jian Yong").member_of(shu.faction).id();
        let mut world = s.build();
        dispatch_spy(&mut world, spy, shu.city, wei.city, MissionKind::Sabotage, 5);
        let (report, _) = tick_system(&mut world, &mut EspionageSystem, 1);
        assert!(report.spy_reports.is_empty());
        assert_eq!(world.spy_missions.len(), 1);
    }
}
