#![allow(dead_code)]

use realm_sim::model::World;
use realm_sim::scenario::{KingdomIds, Scenario};
use realm_sim::sim::{Signal, SimSystem, TickReport, dispatch_systems, tick_rng};
use realm_sim::SimConfig;

/// Run the given systems once at the world's current tick.
pub fn run_systems(
    world: &mut World,
    mut systems: Vec<Box<dyn SimSystem>>,
    config: &SimConfig,
    seed: u64,
) -> (TickReport, Vec<Signal>) {
    let mut rng = tick_rng(seed, world.tick);
    let mut report = TickReport::default();
    report.tick = world.tick;
    let signals = dispatch_systems(world, &mut systems, &mut rng, config, &mut report);
    (report, signals)
}

/// Shu (player) and Wei, each with a capital, at tick 1.
pub fn two_kingdoms() -> (Scenario, KingdomIds, KingdomIds) {
    let mut s = Scenario::at_tick(1);
    let shu = s.add_kingdom("Shu");
    let wei = s.add_kingdom("Wei");
    s.player(shu.faction);
    (s, shu, wei)
}
