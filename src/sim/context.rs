use rand::RngCore;

use super::report::TickReport;
use super::signal::Signal;
use crate::config::SimConfig;
use crate::model::World;

/// Context passed to each system on every tick.
///
/// Bundled so passes share one signature: the world they mutate, the tick's
/// random source, the read-only config, and the report they fill in.
pub struct TickContext<'a> {
    pub world: &'a mut World,
    pub rng: &'a mut dyn RngCore,
    pub config: &'a SimConfig,
    pub report: &'a mut TickReport,
    /// Signals emitted so far this tick, in pass order. Later passes read
    /// what earlier passes pushed.
    pub signals: &'a mut Vec<Signal>,
}
