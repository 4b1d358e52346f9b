pub mod commands;
pub mod conflicts;
pub mod context;
pub mod diplomacy;
pub mod economy;
pub mod espionage;
pub mod factions;
pub mod helpers;
pub mod lifecycle;
pub mod npc;
pub mod relationships;
pub mod report;
pub mod runner;
pub mod signal;
pub mod system;
pub mod victory;
pub mod world_events;

pub use commands::{CommandRejection, CommandSystem};
pub use conflicts::{CombatSystem, SiegeSystem};
pub use context::TickContext;
pub use diplomacy::DiplomacySystem;
pub use economy::EconomySystem;
pub use espionage::EspionageSystem;
pub use factions::FactionSystem;
pub use lifecycle::LifecycleSystem;
pub use npc::NpcSystem;
pub use relationships::RelationshipSystem;
pub use report::TickReport;
pub use runner::{Simulation, default_systems, dispatch_systems, should_fire, tick_rng};
pub use signal::{SiegeOutcome, Signal, SignalKind};
pub use system::{SimSystem, TickFrequency};
pub use victory::VictorySystem;
pub use world_events::{SeasonalSystem, WorldEventSystem, draw_event_card};
