use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum GameStatus {
    #[default]
    Ongoing,
    Victory,
    Defeat,
}

string_enum!(GameStatus {
    Ongoing => "ongoing",
    Victory => "victory",
    Defeat => "defeat",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum WinType {
    Conquest,
    Diplomatic,
    Economic,
}

string_enum!(WinType {
    Conquest => "conquest",
    Diplomatic => "diplomatic",
    Economic => "economic",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub status: GameStatus,
    pub winner: Option<u64>,
    pub win_type: Option<WinType>,
    pub tick: u64,
}

impl GameState {
    /// Once status leaves `Ongoing` the game never ticks again.
    pub fn is_terminal(&self) -> bool {
        self.status != GameStatus::Ongoing
    }

    pub fn finish(&mut self, status: GameStatus, winner: Option<u64>, win_type: Option<WinType>) {
        self.status = status;
        self.winner = winner;
        self.win_type = win_type;
    }
}

/// Consecutive-tick counters behind the diplomatic and economic win types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryCounters {
    pub diplomatic: u32,
    pub economic: u32,
}
