pub mod config;
pub mod error;
pub mod flush;
pub mod id;
pub mod model;
pub mod narrative;
pub mod scenario;
pub mod sim;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::SimConfig;
pub use error::{ConfigError, NarrativeError, SnapshotError};
pub use id::IdGenerator;
pub use model::{
    Character, City, Command, Event, EventKind, EventLog, Faction, GameState, GameStatus,
    Relationship, RelationshipKind, Season, Tactic, WinType, World,
};
pub use sim::{Simulation, TickReport};
