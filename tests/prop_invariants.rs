//! Property-based tests for the world invariants.

mod common;

use proptest::prelude::*;

use realm_sim::flush::snapshot::validate;
use realm_sim::model::{City, CityTier, RelationshipKind, pair_key};
use realm_sim::scenario::Scenario;
use realm_sim::sim::{DiplomacySystem, Simulation};
use realm_sim::SimConfig;

#[derive(Debug, Clone)]
enum CityOp {
    Spend(u32),
    Gold(i64),
    Garrison(u32),
    Food(u32),
}

fn city_op() -> impl Strategy<Value = CityOp> {
    prop_oneof![
        (0u32..500).prop_map(CityOp::Spend),
        (-1_000i64..1_000).prop_map(CityOp::Gold),
        (0u32..50).prop_map(CityOp::Garrison),
        (0u32..200).prop_map(CityOp::Food),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The relationship type depends only on the current intimacy.
    #[test]
    fn prop_kind_is_a_function_of_intimacy(intimacy in 0u8..=100) {
        let kind = RelationshipKind::from_intimacy(intimacy);
        let expected = if intimacy >= 60 {
            RelationshipKind::Friend
        } else if intimacy <= 30 {
            RelationshipKind::Rival
        } else {
            RelationshipKind::Neutral
        };
        prop_assert_eq!(kind, expected);
        prop_assert_eq!(kind, RelationshipKind::from_intimacy(intimacy));
    }

    /// Deductions clamp at zero and failed purchases change nothing.
    #[test]
    fn prop_city_resources_clamp(
        start in 0u32..300,
        ops in prop::collection::vec(city_op(), 0..40),
    ) {
        let mut city = City::new(1, "Chengdu", CityTier::Major);
        city.gold = start;
        city.garrison = start / 10;
        city.food = start;
        for op in ops {
            let gold = city.gold;
            match op {
                CityOp::Spend(cost) => {
                    let paid = city.spend(cost);
                    prop_assert_eq!(paid, gold >= cost);
                    prop_assert_eq!(city.gold, if paid { gold - cost } else { gold });
                }
                CityOp::Gold(delta) => {
                    city.apply_gold_delta(delta);
                    prop_assert_eq!(city.gold as i64, (gold as i64 + delta).max(0));
                }
                CityOp::Garrison(n) => {
                    let before = city.garrison;
                    city.lose_garrison(n);
                    prop_assert_eq!(city.garrison, before.saturating_sub(n));
                }
                CityOp::Food(n) => {
                    let before = city.food;
                    city.lose_food(n);
                    prop_assert_eq!(city.food, before.saturating_sub(n));
                }
            }
        }
    }

    /// Leader intimacy strictly between the break and form thresholds never
    /// toggles an alliance, whatever its starting state.
    #[test]
    fn prop_alliance_hysteresis(
        allied in any::<bool>(),
        path in prop::collection::vec(26u8..=64, 1..40),
    ) {
        let (mut s, shu, wei) = common::two_kingdoms();
        if allied {
            s.ally(shu.faction, wei.faction);
        }
        let mut world = s.build();
        let config = SimConfig::default();
        for (day, intimacy) in path.into_iter().enumerate() {
            world.set_intimacy(shu.leader, wei.leader, intimacy);
            common::run_systems(&mut world, vec![Box::new(DiplomacySystem)], &config, day as u64);
            prop_assert_eq!(world.alliances.contains(&pair_key(shu.faction, wei.faction)), allied);
            world.tick += 1;
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Whole campaigns keep references consistent and never underflow.
    #[test]
    fn prop_campaigns_stay_consistent(seed in any::<u64>(), days in 10u64..60) {
        let mut s = Scenario::new();
        let shu = s.add_kingdom("Shu");
        let wei = s.add_kingdom("Wei");
        let wu = s.add_kingdom("Wu");
        s.character("Zhao Yun").military(15).member_of(shu.faction).at(shu.city);
        s.character("Zhang Liao").military(15).member_of(wei.faction).at(wei.city);
        s.character("Gan Ning").military(13).member_of(wu.faction).at(wu.city);
        s.city("Xiangyang").garrison(2);
        s.player(shu.faction);
        let mut sim = Simulation::new(s.build(), SimConfig::default(), seed);
        let reports = sim.run(days);
        prop_assert!(reports.iter().all(|r| r.tick <= days));
        prop_assert!(validate(sim.world()).is_ok());
    }
}
