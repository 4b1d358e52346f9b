use serde::{Deserialize, Serialize};

/// A signal emitted by one pass and read by later passes in the same tick.
/// Carries the log entry that caused it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub event_id: u64,
    pub kind: SignalKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiegeOutcome {
    /// Garrison reached zero; the besieger took the city.
    Fell,
    /// Defenders broke out.
    Broken,
    /// Besiegers were no longer present.
    Lifted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalKind {
    /// A city changed hands.
    CityCaptured {
        city: u64,
        old_faction: Option<u64>,
        new_faction: u64,
    },

    SiegeStarted {
        city: u64,
        faction: u64,
    },

    SiegeEnded {
        city: u64,
        faction: u64,
        outcome: SiegeOutcome,
    },

    /// A character died and was moved to the dead set.
    CharacterDied {
        character: u64,
        faction: Option<u64>,
    },

    /// A character left one faction for another.
    Defected {
        character: u64,
        from: u64,
        to: u64,
    },

    FactionEliminated {
        faction: u64,
        absorbed_by: Option<u64>,
    },

    AllianceFormed {
        a: u64,
        b: u64,
    },

    AllianceBroken {
        a: u64,
        b: u64,
    },
}
