use super::context::TickContext;

/// How often a simulation system runs.
///
/// Ordered coarsest-to-finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TickFrequency {
    Seasonal, // first tick of each season
    Daily,    // every tick
}

/// A pass of the turn engine.
///
/// Object-safe so passes can be stored as `Box<dyn SimSystem>` and run in
/// registration order.
pub trait SimSystem {
    fn name(&self) -> &str;
    fn frequency(&self) -> TickFrequency;
    fn tick(&mut self, ctx: &mut TickContext);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_ordering_coarsest_to_finest() {
        assert!(TickFrequency::Seasonal < TickFrequency::Daily);
    }
}
