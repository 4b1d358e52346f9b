use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Intimacy assumed for a pair with no stored relationship.
pub const DEFAULT_INTIMACY: u8 = 50;
pub const MAX_INTIMACY: u8 = 100;
pub const FRIEND_THRESHOLD: u8 = 60;
pub const RIVAL_THRESHOLD: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RelationshipKind {
    Friend,
    Rival,
    Neutral,
}

string_enum!(RelationshipKind {
    Friend => "friend",
    Rival => "rival",
    Neutral => "neutral",
});

impl RelationshipKind {
    /// Pure classification: no hysteresis.
    pub fn from_intimacy(intimacy: u8) -> Self {
        if intimacy >= FRIEND_THRESHOLD {
            RelationshipKind::Friend
        } else if intimacy <= RIVAL_THRESHOLD {
            RelationshipKind::Rival
        } else {
            RelationshipKind::Neutral
        }
    }
}

/// Unordered character pair with an intimacy score in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub a: u64,
    pub b: u64,
    pub intimacy: u8,
}

impl Relationship {
    pub fn new(a: u64, b: u64, intimacy: u8) -> Self {
        let (a, b) = pair_key(a, b);
        Self {
            a,
            b,
            intimacy: intimacy.min(MAX_INTIMACY),
        }
    }

    pub fn kind(&self) -> RelationshipKind {
        RelationshipKind::from_intimacy(self.intimacy)
    }

    /// Apply a signed delta, clamped to `0..=100`. Returns the applied delta.
    pub fn adjust(&mut self, delta: i32) -> i32 {
        let before = self.intimacy as i32;
        let after = (before + delta).clamp(0, MAX_INTIMACY as i32);
        self.intimacy = after as u8;
        after - before
    }
}

/// Canonical key for an unordered pair.
pub fn pair_key(a: u64, b: u64) -> (u64, u64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Serde adapter for maps keyed by a sorted pair.
///
/// JSON object keys must be strings, so the map is written as a sequence of
/// `[a, b, value]` triples instead.
pub mod pair_map {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S, V>(map: &BTreeMap<(u64, u64), V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        serializer.collect_seq(map.iter().map(|(&(a, b), v)| (a, b, v)))
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<(u64, u64), V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        let entries: Vec<(u64, u64, V)> = Vec::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|(a, b, v)| (pair_key(a, b), v))
            .collect())
    }
}
