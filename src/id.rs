use serde::{Deserialize, Serialize};

/// One ID space for characters, cities, factions and log entries, so an ID
/// alone identifies what an event's actor or target refers to.
///
/// Serialized with the world: a restored snapshot keeps handing out the same
/// IDs the original run would have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Account for an ID chosen outside the generator, e.g. by an upsert.
    /// IDs at or below the high-water mark are left alone.
    pub fn reserve(&mut self, id: u64) {
        self.next = self.next.max(id.saturating_add(1));
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
