//! Target scoring for faction-wide offensives.

use crate::config::NpcConfig;
use crate::model::{CityTier, World};

const BASE_SCORE: i64 = 100;
const PER_DEFENDER: i64 = 15;
const PER_GARRISON: i64 = 3;
const UNDEFENDED_BONUS: i64 = 30;
const MINOR_BONUS: i64 = 10;
const LOW_FOOD_BONUS: i64 = 15;

/// Higher is more attractive.
pub fn target_score(world: &World, city: u64, config: &NpcConfig) -> i64 {
    let Some(c) = world.city(city) else {
        return i64::MIN;
    };
    let defenders = world.defenders_of(city).len() as i64;
    let mut score = BASE_SCORE - PER_DEFENDER * defenders - PER_GARRISON * c.garrison as i64;
    if defenders == 0 {
        score += UNDEFENDED_BONUS;
    }
    if c.tier == CityTier::Minor {
        score += MINOR_BONUS;
    }
    if c.food < config.low_food {
        score += LOW_FOOD_BONUS;
    }
    score
}

/// Cities `faction` may attack: unclaimed, or held by a faction it is
/// neither allied with nor at ceasefire with, and reachable from at least
/// one of `origins`.
pub fn eligible_targets(world: &World, faction: u64, origins: &[u64]) -> Vec<u64> {
    world
        .cities
        .keys()
        .copied()
        .filter(|&city| match world.city_faction(city) {
            Some(owner) => world.hostile(faction, owner),
            None => true,
        })
        .filter(|&city| origins.iter().any(|&o| o != city && world.reachable(o, city)))
        .collect()
}

/// Best-scoring target, lowest ID on ties.
pub fn choose_focus(world: &World, targets: &[u64], config: &NpcConfig) -> Option<u64> {
    targets
        .iter()
        .copied()
        .max_by(|&a, &b| {
            target_score(world, a, config)
                .cmp(&target_score(world, b, config))
                .then(b.cmp(&a))
        })
}

/// Targets so weak they are worth taking even while developing.
pub fn free_captures(world: &World, targets: &[u64], config: &NpcConfig) -> Vec<u64> {
    targets
        .iter()
        .copied()
        .filter(|&city| {
            world.defenders_of(city).is_empty()
                && world
                    .city(city)
                    .is_some_and(|c| c.garrison <= config.free_capture_garrison)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    #[test]
    fn score_favors_weak_hungry_minor_cities() {
        let mut s = Scenario::new();
        let wei = s.add_kingdom("Wei");
        let outpost = s.city("Wan").minor().owner(wei.leader).garrison(4).food(10).id();
        let world = s.build();
        let config = NpcConfig::default();
        // capital: 100 - 15 (leader) - 30
        assert_eq!(target_score(&world, wei.city, &config), 55);
        // outpost: 100 - 12 + 30 + 10 + 15
        assert_eq!(target_score(&world, outpost, &config), 143);
        assert_eq!(
            choose_focus(&world, &[wei.city, outpost], &config),
            Some(outpost)
        );
    }

    #[test]
    fn ties_break_to_lowest_id() {
        let mut s = Scenario::new();
        let a = s.city("Xiangyang").garrison(5).id();
        let b = s.city("Fancheng").garrison(5).id();
        let world = s.build();
        let config = NpcConfig::default();
        assert_eq!(choose_focus(&world, &[b, a], &config), Some(a.min(b)));
    }

    #[test]
    fn allies_ceasefires_and_unreachable_cities_are_excluded() {
        let mut s = Scenario::new();
        let shu = s.add_kingdom("Shu");
        let wu = s.add_kingdom("Wu");
        let wei = s.add_kingdom("Wei");
        s.city("Liaodong");
        s.ally(shu.faction, wu.faction);
        s.connect(shu.city, wei.city);
        s.connect(shu.city, wu.city);
        let mut world = s.build();
        assert_eq!(eligible_targets(&world, shu.faction, &[shu.city]), vec![wei.city]);
        world
            .ceasefires
            .insert(crate::model::pair_key(shu.faction, wei.faction), 100);
        assert!(eligible_targets(&world, shu.faction, &[shu.city]).is_empty());
    }

    #[test]
    fn free_captures_are_undefended_and_nearly_empty() {
        let mut s = Scenario::new();
        let wei = s.add_kingdom("Wei");
        let empty = s.city("Ruyin").owner(wei.leader).garrison(2).id();
        let held = s.city("Hefei").owner(wei.leader).garrison(1).id();
        s.character("Zhang Liao").member_of(wei.faction).at(held);
        let world = s.build();
        let config = NpcConfig::default();
        assert_eq!(
            free_captures(&world, &[wei.city, empty, held], &config),
            vec![empty]
        );
    }
}
