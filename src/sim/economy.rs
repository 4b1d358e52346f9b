use tracing::debug;

use crate::config::EconomyConfig;
use crate::model::city::MAX_DEVELOPMENT;
use crate::model::{City, District, Improvement, Role, Season, Specialty, World};
use crate::sim::context::TickContext;
use crate::sim::system::{SimSystem, TickFrequency};

// Income bonuses
const COMMERCE_SPECIALTY_GOLD: u32 = 3;
const MARKET_GOLD: u32 = 2;
const TRADE_POST_GOLD: u32 = 2;

// Food bonuses
const AGRICULTURE_FOOD: u32 = 2;
const IRRIGATION_FOOD: u32 = 2;

const STARVATION_LOSS: u32 = 1;

/// Daily gold income and food production for every owned city.
pub struct EconomySystem;

impl SimSystem for EconomySystem {
    fn name(&self) -> &str {
        "economy"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Daily
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        struct Yield {
            city: u64,
            gold: u32,
            food: u32,
        }

        let season = Season::of_tick(ctx.world.tick, ctx.config.calendar.days_per_season);
        let economy = &ctx.config.economy;
        let yields: Vec<Yield> = ctx
            .world
            .cities
            .values()
            .filter(|c| c.owner.is_some() && c.siege.is_none())
            .map(|c| Yield {
                city: c.id,
                gold: gold_income(ctx.world, c, economy),
                food: food_production(c, season, economy),
            })
            .collect();

        for y in yields {
            let Some(city) = ctx.world.cities.get_mut(&y.city) else {
                continue;
            };
            city.gold = city.gold.saturating_add(y.gold);
            city.food = city.food.saturating_add(y.food);
        }

        // Upkeep applies besieged or not: a cut-off city keeps eating.
        let troops_per_food = economy.troops_per_food.max(1);
        for city in ctx.world.cities.values_mut().filter(|c| c.owner.is_some()) {
            city.lose_food(city.garrison / troops_per_food);
            if city.food == 0 && city.garrison > 0 {
                city.lose_garrison(STARVATION_LOSS);
                debug!(city = city.id, garrison = city.garrison, "garrison starving");
            }
            city.development = city.development.min(MAX_DEVELOPMENT);
        }
    }
}

/// Gold a city earns per day.
pub fn gold_income(world: &World, city: &City, economy: &EconomyConfig) -> u32 {
    let mut gold = economy.base_income + city.development;
    if city.specialty == Some(Specialty::Commerce) {
        gold += COMMERCE_SPECIALTY_GOLD;
    }
    if city.has_district(District::Market) {
        gold += MARKET_GOLD;
    }
    if city.improvement == Some(Improvement::TradePost) {
        gold += TRADE_POST_GOLD;
    }
    gold + governor_commerce(world, city) as u32
}

/// Best commerce skill among governors of the owning faction present in the city.
fn governor_commerce(world: &World, city: &City) -> u8 {
    let Some(faction) = world.city_faction(city.id) else {
        return 0;
    };
    world
        .present_from(city.id, faction)
        .iter()
        .filter_map(|&id| world.character(id))
        .filter(|c| c.has_role(Role::Governor))
        .map(|c| c.skills.commerce)
        .max()
        .unwrap_or(0)
}

/// Food a city grows per day, before upkeep. Nothing grows in winter.
pub fn food_production(city: &City, season: Season, economy: &EconomyConfig) -> u32 {
    if season == Season::Winter {
        return 0;
    }
    let mut food = economy.base_food + city.development / 2;
    if city.specialty == Some(Specialty::Agriculture) {
        food += AGRICULTURE_FOOD;
    }
    if city.improvement == Some(Improvement::Irrigation) {
        food += IRRIGATION_FOOD;
    }
    food
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Skill;
    use crate::scenario::Scenario;
    use crate::testutil::tick_system;

    #[test]
    fn income_sums_bonuses_and_governor() {
        let mut s = Scenario::at_tick(1);
        let shu = s.add_kingdom("Shu");
        s.city_mut(shu.city)
            .development(3)
            .specialty(Specialty::Commerce)
            .district(District::Market)
            .gold(0);
        s.character("Mi Zhu")
            .at(shu.city)
            .member_of(shu.faction)
            .role(Role::Governor)
            .skill(Skill::Commerce, 4);
        let mut world = s.build();
        tick_system(&mut world, &mut EconomySystem, 1);
        // 2 base + 3 development + 3 commerce + 2 market + 4 governor
        assert_eq!(world.city(shu.city).unwrap().gold, 14);
    }

    #[test]
    fn winter_grows_nothing_and_garrison_eats() {
        let mut s = Scenario::at_tick(95);
        let shu = s.add_kingdom("Shu");
        s.city_mut(shu.city).garrison(20).food(10);
        let mut world = s.build();
        tick_system(&mut world, &mut EconomySystem, 1);
        assert_eq!(world.city(shu.city).unwrap().food, 6);
    }

    #[test]
    fn starving_city_loses_garrison_but_never_goes_negative() {
        let mut s = Scenario::at_tick(95);
        let shu = s.add_kingdom("Shu");
        s.city_mut(shu.city).garrison(1).food(0);
        let mut world = s.build();
        for _ in 0..3 {
            tick_system(&mut world, &mut EconomySystem, 1);
        }
        let city = world.city(shu.city).unwrap();
        assert_eq!((city.food, city.garrison), (0, 0));
    }

    #[test]
    fn unowned_and_besieged_cities_earn_nothing() {
        let mut s = Scenario::at_tick(1);
        let shu = s.add_kingdom("Shu");
        let wei = s.add_kingdom("Wei");
        let empty = s.city("Ruins").gold(0).id();
        s.city_mut(shu.city).gold(0).besieged_by(wei.faction, 0);
        let mut world = s.build();
        tick_system(&mut world, &mut EconomySystem, 1);
        assert_eq!(world.city(empty).unwrap().gold, 0);
        assert_eq!(world.city(shu.city).unwrap().gold, 0);
        assert!(world.city(wei.city).unwrap().gold > 100);
    }
}
