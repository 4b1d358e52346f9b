#[macro_use]
mod macros;

pub mod calendar;
pub mod card;
pub mod character;
pub mod city;
pub mod command;
pub mod event;
pub mod faction;
pub mod game_state;
pub mod movement;
pub mod relationship;
pub mod tactic;
pub mod traits;
pub mod world;

pub use calendar::Season;
pub use card::{CardChoice, EventCard};
pub use character::{Character, Role, Skill, Skills, Stats};
pub use city::{City, CityTier, District, Improvement, Siege, Specialty, UnitType, Units};
pub use command::Command;
pub use event::{Event, EventKind, EventLog};
pub use faction::{Faction, Tech};
pub use game_state::{GameState, GameStatus, VictoryCounters, WinType};
pub use movement::{MissionKind, MissionStatus, Movement, SpyMission};
pub use relationship::{Relationship, RelationshipKind, pair_key};
pub use tactic::Tactic;
pub use traits::Trait;
pub use world::World;
