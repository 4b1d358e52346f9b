use serde::{Deserialize, Serialize};

/// A character in transit between two cities.
///
/// Resolved exactly once, on the tick equal to `arrival`, then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: u64,
    pub character: u64,
    pub origin: u64,
    pub destination: u64,
    pub departed: u64,
    pub arrival: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MissionKind {
    Intel,
    Sabotage,
    Blockade,
}

string_enum!(MissionKind {
    Intel => "intel",
    Sabotage => "sabotage",
    Blockade => "blockade",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MissionStatus {
    Traveling,
    Succeeded,
    Caught,
}

string_enum!(MissionStatus {
    Traveling => "traveling",
    Succeeded => "succeeded",
    Caught => "caught",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpyMission {
    pub id: u64,
    pub character: u64,
    pub origin: u64,
    pub target: u64,
    pub mission: MissionKind,
    pub status: MissionStatus,
    pub arrival: u64,
}
