use serde::{Deserialize, Serialize};

use super::relationship::RelationshipKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EventKind {
    Interaction,
    Battle,
    Capture,
    SiegeStarted,
    SiegeBroken,
    SallyForth,
    AllianceFormed,
    AllianceBroken,
    Ceasefire,
    Tribute,
    Betrayal,
    Death,
    Succession,
    Recruitment,
    Espionage,
    WorldEvent,
    Seasonal,
    Elimination,
    Development,
    Victory,
    Custom(String),
}

string_enum_open!(EventKind, "event kind", {
    Interaction => "interaction",
    Battle => "battle",
    Capture => "capture",
    SiegeStarted => "siege_started",
    SiegeBroken => "siege_broken",
    SallyForth => "sally_forth",
    AllianceFormed => "alliance_formed",
    AllianceBroken => "alliance_broken",
    Ceasefire => "ceasefire",
    Tribute => "tribute",
    Betrayal => "betrayal",
    Death => "death",
    Succession => "succession",
    Recruitment => "recruitment",
    Espionage => "espionage",
    WorldEvent => "world_event",
    Seasonal => "seasonal",
    Elimination => "elimination",
    Development => "development",
    Victory => "victory",
});

/// One append-only log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub tick: u64,
    pub kind: EventKind,
    pub actor: Option<u64>,
    pub target: Option<u64>,
    /// Intimacy delta for relationship entries, 0 otherwise.
    #[serde(default)]
    pub delta: i32,
    /// Resulting relationship type for entries that touched a pair.
    #[serde(default)]
    pub relationship: Option<RelationshipKind>,
    pub description: String,
    /// Narrative text backfilled after the tick.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl Event {
    pub fn involves(&self, character: u64) -> bool {
        self.actor == Some(character) || self.target == Some(character)
    }

    pub fn is_between(&self, a: u64, b: u64) -> bool {
        (self.actor == Some(a) && self.target == Some(b))
            || (self.actor == Some(b) && self.target == Some(a))
    }
}

/// Append-only event log with range, character, and pair queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries are only ever appended, so ticks stay sorted.
    pub fn append(&mut self, event: Event) {
        debug_assert!(
            self.entries.last().is_none_or(|last| last.tick <= event.tick),
            "event log must stay in tick order"
        );
        self.entries.push(event);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter()
    }

    pub fn get(&self, id: u64) -> Option<&Event> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries with `from <= tick <= to`.
    pub fn in_range(&self, from: u64, to: u64) -> impl Iterator<Item = &Event> {
        let start = self.entries.partition_point(|e| e.tick < from);
        self.entries[start..].iter().take_while(move |e| e.tick <= to)
    }

    pub fn for_tick(&self, tick: u64) -> impl Iterator<Item = &Event> {
        self.in_range(tick, tick)
    }

    pub fn involving(&self, character: u64) -> impl Iterator<Item = &Event> {
        self.entries.iter().filter(move |e| e.involves(character))
    }

    pub fn between(&self, a: u64, b: u64) -> impl Iterator<Item = &Event> {
        self.entries.iter().filter(move |e| e.is_between(a, b))
    }

    /// Backfill narrative text for an entry. Returns false for unknown IDs.
    pub fn set_narrative(&mut self, id: u64, text: String) -> bool {
        match self.entries.iter_mut().rev().find(|e| e.id == id) {
            Some(event) => {
                event.narrative = Some(text);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, tick: u64, actor: u64, target: u64) -> Event {
        Event {
            id,
            tick,
            kind: EventKind::Interaction,
            actor: Some(actor),
            target: Some(target),
            delta: 1,
            relationship: Some(RelationshipKind::Neutral),
            description: String::new(),
            narrative: None,
        }
    }

    fn sample_log() -> EventLog {
        let mut log = EventLog::new();
        log.append(entry(1, 1, 10, 11));
        log.append(entry(2, 2, 11, 12));
        log.append(entry(3, 2, 12, 10));
        log.append(entry(4, 5, 10, 11));
        log
    }

    #[test]
    fn range_queries_are_inclusive() {
        let log = sample_log();
        let ids: Vec<u64> = log.in_range(2, 4).map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
        let ids: Vec<u64> = log.for_tick(5).map(|e| e.id).collect();
        assert_eq!(ids, vec![4]);
        assert_eq!(log.in_range(6, 9).count(), 0);
    }

    #[test]
    fn character_and_pair_queries() {
        let log = sample_log();
        assert_eq!(log.involving(10).count(), 3);
        let pair: Vec<u64> = log.between(11, 10).map(|e| e.id).collect();
        assert_eq!(pair, vec![1, 4]);
    }

    #[test]
    fn narrative_backfill() {
        let mut log = sample_log();
        assert!(log.set_narrative(3, "They argued.".to_string()));
        assert!(!log.set_narrative(99, "lost".to_string()));
        assert_eq!(log.get(3).unwrap().narrative.as_deref(), Some("They argued."));
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&EventKind::SiegeBroken).unwrap(),
            "\"siege_broken\""
        );
    }
}
