use serde::{Deserialize, Serialize};

/// A player-facing decision drawn from the event deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCard {
    pub id: u32,
    pub title: String,
    pub choices: Vec<CardChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardChoice {
    pub label: String,
    /// Applied to the player's richest city.
    pub gold: i64,
    pub morale: i32,
}
