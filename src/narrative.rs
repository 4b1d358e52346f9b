//! Narrative text for log entries.
//!
//! A [`Narrator`] turns one tick's events into short prose. External
//! narrators may fail at any time; [`TemplateNarrator`] never does and is
//! what the runner falls back to.

use std::collections::BTreeMap;

use crate::error::NarrativeError;
use crate::model::{Event, EventKind, RelationshipKind, World};

const SUMMARY_LINES: usize = 5;

pub trait Narrator {
    /// One text per event ID. Missing IDs are filled from templates.
    fn narrate(&self, events: &[Event]) -> Result<BTreeMap<u64, String>, NarrativeError>;
}

/// Deterministic narration built from the log entries themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

impl TemplateNarrator {
    /// Render one entry, resolving names for relationship entries.
    pub fn render(&self, world: &World, event: &Event) -> String {
        match (&event.kind, event.actor, event.target, event.relationship) {
            (EventKind::Interaction, Some(a), Some(b), Some(kind)) => {
                let a = world.character_name(a);
                let b = world.character_name(b);
                let verb = if event.delta >= 0 {
                    "grew closer to"
                } else {
                    "quarreled with"
                };
                match kind {
                    RelationshipKind::Neutral => sentence(&format!("{a} {verb} {b}")),
                    kind => sentence(&format!("{a} {verb} {b}; they are now {kind}s")),
                }
            }
            _ => self.describe(event),
        }
    }

    fn describe(&self, event: &Event) -> String {
        if event.description.is_empty() {
            sentence(&format!("A {} took place", event.kind.as_str().replace('_', " ")))
        } else {
            sentence(&event.description)
        }
    }
}

impl Narrator for TemplateNarrator {
    fn narrate(&self, events: &[Event]) -> Result<BTreeMap<u64, String>, NarrativeError> {
        Ok(events.iter().map(|e| (e.id, self.describe(e))).collect())
    }
}

/// Capitalize and terminate a clause.
fn sentence(text: &str) -> String {
    let text = text.trim();
    let mut chars = text.chars();
    let mut out: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => return String::new(),
    };
    if !out.ends_with(['.', '!', '?']) {
        out.push('.');
    }
    out
}

/// Lower sorts first in the summary.
fn priority(kind: &EventKind) -> u8 {
    match kind {
        EventKind::Victory => 0,
        EventKind::Capture | EventKind::Elimination | EventKind::Betrayal => 1,
        EventKind::Death
        | EventKind::Succession
        | EventKind::AllianceFormed
        | EventKind::AllianceBroken => 2,
        EventKind::Battle
        | EventKind::SiegeStarted
        | EventKind::SiegeBroken
        | EventKind::SallyForth
        | EventKind::Ceasefire
        | EventKind::Tribute => 3,
        EventKind::WorldEvent | EventKind::Seasonal | EventKind::Espionage => 4,
        EventKind::Interaction => 6,
        _ => 5,
    }
}

/// The most important lines of the tick, one per line.
pub fn summarize(events: &[Event], texts: &BTreeMap<u64, String>) -> String {
    let mut ranked: Vec<&Event> = events.iter().filter(|e| texts.contains_key(&e.id)).collect();
    ranked.sort_by_key(|e| (priority(&e.kind), e.id));
    ranked
        .into_iter()
        .take(SUMMARY_LINES)
        .filter_map(|e| texts.get(&e.id).map(String::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}
