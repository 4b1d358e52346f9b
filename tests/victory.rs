mod common;

use realm_sim::model::{CityTier, GameStatus, WinType};
use realm_sim::sim::Simulation;
use realm_sim::SimConfig;

#[test]
fn holding_every_major_city_ends_the_game_on_the_first_day() {
    let (mut s, shu, wei) = common::two_kingdoms();
    s.city_mut(wei.city).tier(CityTier::Minor);
    let mut sim = Simulation::new(s.build(), SimConfig::default(), 1);
    let report = sim.advance_day();
    assert_eq!(report.status.status, GameStatus::Victory);
    assert_eq!(report.status.winner, Some(shu.faction));
    assert_eq!(report.status.win_type, Some(WinType::Conquest));
    assert!(report.narrative.lines().next().is_some());
}

#[test]
fn economic_victory_lands_on_the_nth_day() {
    let (mut s, shu, _) = common::two_kingdoms();
    s.city_mut(shu.city).gold(100_000);
    let mut config = SimConfig::default();
    config.victory.economic_ticks = 3;
    let mut sim = Simulation::new(s.build(), config, 5);

    let reports = sim.run(10);
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[1].status.status, GameStatus::Ongoing);
    let last = &reports[2];
    assert_eq!(last.status.status, GameStatus::Victory);
    assert_eq!(last.status.win_type, Some(WinType::Economic));
    assert_eq!(last.status.tick, last.tick);
}

#[test]
fn polling_after_the_end_is_a_noop() {
    let (mut s, _, wei) = common::two_kingdoms();
    s.city_mut(wei.city).tier(CityTier::Minor);
    let mut sim = Simulation::new(s.build(), SimConfig::default(), 2);
    let end = sim.advance_day();
    let world = sim.world().clone();
    for _ in 0..5 {
        let again = sim.advance_day();
        assert_eq!(again.status, end.status);
        assert!(again.is_quiet());
    }
    assert_eq!(sim.world(), &world);
}
