use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::SimConfig;
use crate::model::World;
use crate::sim::{Signal, SimSystem, TickContext, TickReport};

// ---------------------------------------------------------------------------
// Tick execution helpers
// ---------------------------------------------------------------------------

/// Run one system at the world's current tick with default config.
/// Returns the report and emitted signals.
pub fn tick_system(
    world: &mut World,
    system: &mut dyn SimSystem,
    seed: u64,
) -> (TickReport, Vec<Signal>) {
    tick_system_with(world, system, &SimConfig::default(), seed)
}

pub fn tick_system_with(
    world: &mut World,
    system: &mut dyn SimSystem,
    config: &SimConfig,
    seed: u64,
) -> (TickReport, Vec<Signal>) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut report = TickReport::default();
    report.tick = world.tick;
    let mut signals = Vec::new();
    let mut ctx = TickContext {
        world,
        rng: &mut rng,
        config,
        report: &mut report,
        signals: &mut signals,
    };
    system.tick(&mut ctx);
    (report, signals)
}

/// Run `f` against a fresh context over `world`. For helpers that take a
/// context but are not whole systems.
pub fn with_context<R>(
    world: &mut World,
    config: &SimConfig,
    seed: u64,
    f: impl FnOnce(&mut TickContext) -> R,
) -> (R, TickReport, Vec<Signal>) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut report = TickReport::default();
    let mut signals = Vec::new();
    let out = {
        let mut ctx = TickContext {
            world,
            rng: &mut rng,
            config,
            report: &mut report,
            signals: &mut signals,
        };
        f(&mut ctx)
    };
    (out, report, signals)
}

pub fn rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}
