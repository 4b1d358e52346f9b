use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::card::EventCard;
use super::character::Character;
use super::city::{City, CityTier};
use super::command::Command;
use super::event::{Event, EventKind, EventLog};
use super::faction::Faction;
use super::game_state::{GameState, VictoryCounters};
use super::movement::{Movement, SpyMission};
use super::relationship::{
    DEFAULT_INTIMACY, MAX_INTIMACY, Relationship, RelationshipKind, pair_key, pair_map,
};
use super::tactic::Tactic;
use crate::id::IdGenerator;

/// Trust assumed for a faction pair with no stored value.
pub const DEFAULT_TRUST: u8 = 50;
pub const MAX_TRUST: u8 = 100;

/// The whole simulated world, owned by the runner and lent to every pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub tick: u64,
    pub characters: BTreeMap<u64, Character>,
    /// Soft-deleted characters, kept so history still resolves their names.
    #[serde(default)]
    pub dead: BTreeMap<u64, Character>,
    pub cities: BTreeMap<u64, City>,
    pub factions: BTreeMap<u64, Faction>,
    #[serde(default)]
    pub player_faction: Option<u64>,
    #[serde(default, with = "pair_map")]
    pub relationships: BTreeMap<(u64, u64), Relationship>,
    #[serde(default)]
    pub alliances: BTreeSet<(u64, u64)>,
    #[serde(default, with = "pair_map")]
    pub trust: BTreeMap<(u64, u64), u8>,
    #[serde(default, with = "pair_map")]
    pub war_exhaustion: BTreeMap<(u64, u64), u32>,
    /// Ceasefires keyed by faction pair, valued by expiry tick.
    #[serde(default, with = "pair_map")]
    pub ceasefires: BTreeMap<(u64, u64), u64>,
    /// Factions whose ceasefire offer to the player awaits an answer.
    #[serde(default)]
    pub ceasefire_offers: BTreeSet<u64>,
    /// Optional city adjacency. Empty means every city reaches every other.
    #[serde(default)]
    pub adjacency: BTreeMap<u64, BTreeSet<u64>>,
    #[serde(default)]
    pub movements: Vec<Movement>,
    #[serde(default)]
    pub spy_missions: Vec<SpyMission>,
    #[serde(default)]
    pub pending_commands: Vec<Command>,
    /// Tactics chosen for characters' next battle.
    #[serde(default)]
    pub queued_tactics: BTreeMap<u64, Tactic>,
    #[serde(default)]
    pub pending_card: Option<EventCard>,
    #[serde(default)]
    pub victory_counters: VictoryCounters,
    #[serde(default)]
    pub game_state: GameState,
    #[serde(default)]
    pub id_gen: IdGenerator,
    #[serde(default)]
    pub events: EventLog,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        self.id_gen.next_id()
    }

    // -- Entity store --

    /// Create or replace a character by ID.
    pub fn upsert_character(&mut self, character: Character) {
        self.id_gen.reserve(character.id);
        self.characters.insert(character.id, character);
    }

    pub fn upsert_city(&mut self, city: City) {
        self.id_gen.reserve(city.id);
        self.cities.insert(city.id, city);
    }

    pub fn upsert_faction(&mut self, faction: Faction) {
        self.id_gen.reserve(faction.id);
        self.factions.insert(faction.id, faction);
    }

    pub fn character(&self, id: u64) -> Option<&Character> {
        self.characters.get(&id)
    }

    pub fn city(&self, id: u64) -> Option<&City> {
        self.cities.get(&id)
    }

    pub fn faction(&self, id: u64) -> Option<&Faction> {
        self.factions.get(&id)
    }

    pub fn is_alive(&self, character: u64) -> bool {
        self.characters.contains_key(&character)
    }

    /// Name of a living or dead character, with a fallback for unknown IDs.
    pub fn character_name(&self, id: u64) -> String {
        self.characters
            .get(&id)
            .or_else(|| self.dead.get(&id))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("character #{id}"))
    }

    pub fn city_name(&self, id: u64) -> String {
        self.cities
            .get(&id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("city #{id}"))
    }

    pub fn faction_name(&self, id: u64) -> String {
        self.factions
            .get(&id)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| format!("faction #{id}"))
    }

    /// Move a character into the dead set and out of every faction.
    /// Returns the removed record, or `None` if it was not alive.
    pub fn kill_character(&mut self, id: u64) -> Option<&Character> {
        let mut character = self.characters.remove(&id)?;
        character.location = None;
        for faction in self.factions.values_mut() {
            faction.remove_member(id);
        }
        self.movements.retain(|m| m.character != id);
        self.spy_missions.retain(|m| m.character != id);
        self.queued_tactics.remove(&id);
        self.dead.insert(id, character);
        self.dead.get(&id)
    }

    // -- Faction queries --

    pub fn faction_of(&self, character: u64) -> Option<u64> {
        self.factions
            .values()
            .find(|f| f.is_member(character))
            .map(|f| f.id)
    }

    pub fn is_leader(&self, character: u64) -> bool {
        self.factions.values().any(|f| f.leader == character)
    }

    pub fn leader_of(&self, faction: u64) -> Option<u64> {
        self.factions.get(&faction).map(|f| f.leader)
    }

    /// Faction controlling a city, through its owner.
    pub fn city_faction(&self, city: u64) -> Option<u64> {
        let owner = self.cities.get(&city)?.owner?;
        self.faction_of(owner)
    }

    pub fn faction_cities(&self, faction: u64) -> Vec<u64> {
        self.cities
            .keys()
            .copied()
            .filter(|&c| self.city_faction(c) == Some(faction))
            .collect()
    }

    pub fn faction_gold(&self, faction: u64) -> u64 {
        self.faction_cities(faction)
            .iter()
            .filter_map(|c| self.cities.get(c))
            .map(|c| c.gold as u64)
            .sum()
    }

    pub fn faction_garrison(&self, faction: u64) -> u64 {
        self.faction_cities(faction)
            .iter()
            .filter_map(|c| self.cities.get(c))
            .map(|c| c.garrison as u64)
            .sum()
    }

    pub fn major_cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values().filter(|c| c.tier == CityTier::Major)
    }

    /// The faction's city with the most gold, lowest ID on ties.
    pub fn richest_city(&self, faction: u64) -> Option<u64> {
        self.faction_cities(faction).into_iter().max_by(|a, b| {
            let ga = self.cities.get(a).map(|c| c.gold).unwrap_or(0);
            let gb = self.cities.get(b).map(|c| c.gold).unwrap_or(0);
            ga.cmp(&gb).then(b.cmp(a))
        })
    }

    /// The faction's city with the largest garrison, excluding `except`.
    pub fn strongest_city(&self, faction: u64, except: Option<u64>) -> Option<u64> {
        self.faction_cities(faction)
            .into_iter()
            .filter(|&c| Some(c) != except)
            .max_by(|a, b| {
                let ga = self.cities.get(a).map(|c| c.garrison).unwrap_or(0);
                let gb = self.cities.get(b).map(|c| c.garrison).unwrap_or(0);
                ga.cmp(&gb).then(b.cmp(a))
            })
    }

    // -- Location --

    pub fn characters_at(&self, city: u64) -> Vec<u64> {
        self.characters
            .values()
            .filter(|c| c.location == Some(city))
            .map(|c| c.id)
            .collect()
    }

    /// Characters at a city who belong to the controlling faction.
    pub fn defenders_of(&self, city: u64) -> Vec<u64> {
        let Some(faction) = self.city_faction(city) else {
            return Vec::new();
        };
        self.characters_at(city)
            .into_iter()
            .filter(|&c| self.faction_of(c) == Some(faction))
            .collect()
    }

    /// Characters at a city who belong to `faction`.
    pub fn present_from(&self, city: u64, faction: u64) -> Vec<u64> {
        self.characters_at(city)
            .into_iter()
            .filter(|&c| self.faction_of(c) == Some(faction))
            .collect()
    }

    pub fn reachable(&self, from: u64, to: u64) -> bool {
        if from == to {
            return true;
        }
        if self.adjacency.is_empty() {
            return true;
        }
        self.adjacency
            .get(&from)
            .is_some_and(|neighbors| neighbors.contains(&to))
    }

    pub fn connect(&mut self, a: u64, b: u64) {
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
    }

    // -- Movements --

    pub fn add_movement(&mut self, character: u64, origin: u64, destination: u64, arrival: u64) {
        let id = self.next_id();
        self.movements.push(Movement {
            id,
            character,
            origin,
            destination,
            departed: self.tick,
            arrival,
        });
        if let Some(c) = self.characters.get_mut(&character) {
            c.location = None;
        }
    }

    /// Remove and return every movement arriving on `tick`.
    pub fn take_arrivals(&mut self, tick: u64) -> Vec<Movement> {
        let (arriving, pending): (Vec<Movement>, Vec<Movement>) =
            std::mem::take(&mut self.movements)
                .into_iter()
                .partition(|m| m.arrival == tick);
        self.movements = pending;
        arriving
    }

    /// A character with a movement or spy mission in flight cannot be given
    /// another order.
    pub fn is_busy(&self, character: u64) -> bool {
        self.movements.iter().any(|m| m.character == character)
            || self.spy_missions.iter().any(|m| m.character == character)
    }

    // -- Relationships --

    pub fn intimacy(&self, a: u64, b: u64) -> u8 {
        self.relationships
            .get(&pair_key(a, b))
            .map(|r| r.intimacy)
            .unwrap_or(DEFAULT_INTIMACY)
    }

    pub fn set_intimacy(&mut self, a: u64, b: u64, intimacy: u8) {
        self.relationships
            .insert(pair_key(a, b), Relationship::new(a, b, intimacy.min(MAX_INTIMACY)));
    }

    /// Apply a clamped intimacy delta. Returns the applied delta and the
    /// resulting relationship type.
    pub fn adjust_intimacy(&mut self, a: u64, b: u64, delta: i32) -> (i32, RelationshipKind) {
        let rel = self
            .relationships
            .entry(pair_key(a, b))
            .or_insert_with(|| Relationship::new(a, b, DEFAULT_INTIMACY));
        let applied = rel.adjust(delta);
        (applied, rel.kind())
    }

    pub fn leader_intimacy(&self, fa: u64, fb: u64) -> Option<u8> {
        Some(self.intimacy(self.leader_of(fa)?, self.leader_of(fb)?))
    }

    // -- Alliances & trust --

    pub fn are_allied(&self, fa: u64, fb: u64) -> bool {
        self.alliances.contains(&pair_key(fa, fb))
    }

    pub fn allies_of(&self, faction: u64) -> Vec<u64> {
        self.alliances
            .iter()
            .filter_map(|&(a, b)| {
                if a == faction {
                    Some(b)
                } else if b == faction {
                    Some(a)
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn trust(&self, fa: u64, fb: u64) -> u8 {
        self.trust
            .get(&pair_key(fa, fb))
            .copied()
            .unwrap_or(DEFAULT_TRUST)
    }

    /// Give every faction pair without a trust record the starting value.
    pub fn seed_trust(&mut self, initial: u8) {
        let ids: Vec<u64> = self.factions.keys().copied().collect();
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                self.trust
                    .entry(pair_key(a, b))
                    .or_insert(initial.min(MAX_TRUST));
            }
        }
    }

    pub fn adjust_trust(&mut self, fa: u64, fb: u64, delta: i32) -> u8 {
        let current = self.trust(fa, fb) as i32;
        let next = (current + delta).clamp(0, MAX_TRUST as i32) as u8;
        self.trust.insert(pair_key(fa, fb), next);
        next
    }

    pub fn at_ceasefire(&self, fa: u64, fb: u64) -> bool {
        self.ceasefires
            .get(&pair_key(fa, fb))
            .is_some_and(|&until| until > self.tick)
    }

    /// Two distinct factions that may fight: not allied, not under ceasefire.
    pub fn hostile(&self, fa: u64, fb: u64) -> bool {
        fa != fb && !self.are_allied(fa, fb) && !self.at_ceasefire(fa, fb)
    }

    pub fn add_exhaustion(&mut self, fa: u64, fb: u64, amount: u32) {
        *self.war_exhaustion.entry(pair_key(fa, fb)).or_insert(0) += amount;
    }

    /// Drop every diplomatic record that mentions `faction`.
    pub fn forget_faction(&mut self, faction: u64) {
        let mentions = |&(a, b): &(u64, u64)| a == faction || b == faction;
        self.alliances.retain(|k| !mentions(k));
        self.trust.retain(|k, _| !mentions(k));
        self.war_exhaustion.retain(|k, _| !mentions(k));
        self.ceasefires.retain(|k, _| !mentions(k));
        self.ceasefire_offers.remove(&faction);
    }

    // -- Event log --

    pub fn log(
        &mut self,
        kind: EventKind,
        actor: Option<u64>,
        target: Option<u64>,
        description: String,
    ) -> u64 {
        let id = self.next_id();
        self.events.append(Event {
            id,
            tick: self.tick,
            kind,
            actor,
            target,
            delta: 0,
            relationship: None,
            description,
            narrative: None,
        });
        id
    }

    /// Log an intimacy change between two characters.
    pub fn log_relationship(
        &mut self,
        a: u64,
        b: u64,
        delta: i32,
        kind: RelationshipKind,
        description: String,
    ) -> u64 {
        let id = self.next_id();
        self.events.append(Event {
            id,
            tick: self.tick,
            kind: EventKind::Interaction,
            actor: Some(a),
            target: Some(b),
            delta,
            relationship: Some(kind),
            description,
            narrative: None,
        });
        id
    }
}
