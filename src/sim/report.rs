use serde::Serialize;

use crate::model::{
    EventCard, GameState, MissionKind, MissionStatus, RelationshipKind, Season, Tactic, UnitType,
};

/// Everything that happened during one "advance day".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub season: Season,
    pub relationship_events: Vec<RelationshipEvent>,
    pub narrative: String,
    pub battles: Vec<BattleResult>,
    pub sieges: Vec<SiegeUpdate>,
    pub diplomacy: Vec<DiplomacyEvent>,
    pub recruitment: Vec<RecruitmentResult>,
    pub betrayals: Vec<BetrayalEvent>,
    pub spy_reports: Vec<SpyReport>,
    pub deaths: Vec<DeathEvent>,
    pub world_events: Vec<WorldEvent>,
    pub seasonal_event: Option<SeasonalEvent>,
    pub event_card: Option<EventCard>,
    pub status: GameState,
}

impl TickReport {
    pub fn new(tick: u64, season: Season) -> Self {
        Self {
            tick,
            season,
            ..Self::default()
        }
    }

    /// True when nothing at all was recorded.
    pub fn is_quiet(&self) -> bool {
        self.relationship_events.is_empty()
            && self.battles.is_empty()
            && self.sieges.is_empty()
            && self.diplomacy.is_empty()
            && self.recruitment.is_empty()
            && self.betrayals.is_empty()
            && self.spy_reports.is_empty()
            && self.deaths.is_empty()
            && self.world_events.is_empty()
            && self.seasonal_event.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipEvent {
    pub event_id: u64,
    pub a: u64,
    pub b: u64,
    pub delta: i32,
    pub kind: RelationshipKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    /// The attackers took the city.
    Captured,
    /// The city had no controller and was claimed without a fight.
    Claimed,
    /// Attack failed and a siege was opened.
    SiegeStarted,
    /// Attack failed against a city already under siege.
    Repulsed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleResult {
    pub event_id: u64,
    pub city: u64,
    pub attacker_faction: u64,
    pub defender_faction: Option<u64>,
    pub attackers: Vec<u64>,
    pub lead_attacker: u64,
    pub tactic: Tactic,
    pub attack_power: f64,
    pub defense_power: f64,
    pub outcome: BattleOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SiegeUpdateKind {
    Attrition,
    SallySucceeded,
    SallyFailed,
    Fell,
    Lifted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiegeUpdate {
    pub city: u64,
    pub besieger: u64,
    pub kind: SiegeUpdateKind,
    pub garrison: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiplomacyEvent {
    AllianceFormed { a: u64, b: u64 },
    AllianceBroken { a: u64, b: u64 },
    ProposalAccepted { from: u64, to: u64 },
    ProposalRejected { from: u64, to: u64 },
    TributePaid { from: u64, to: u64, amount: u32 },
    TributeRefused { from: u64, to: u64 },
    CeasefireProposed { from: u64, to: u64 },
    CeasefireAgreed { a: u64, b: u64, until: u64 },
    FactionEliminated { faction: u64, absorbed_by: Option<u64> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recruit {
    Troops { unit: UnitType, amount: u32 },
    Hired { character: u64 },
    HireFailed { character: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecruitmentResult {
    pub city: u64,
    pub faction: u64,
    pub recruit: Recruit,
    pub cost: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BetrayalEvent {
    pub event_id: u64,
    pub character: u64,
    pub from: u64,
    pub to: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntelSnapshot {
    pub garrison: u32,
    pub food: u32,
    pub gold: u32,
    pub defenders: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpyReport {
    pub mission_id: u64,
    pub character: u64,
    pub city: u64,
    pub mission: MissionKind,
    pub status: MissionStatus,
    pub intel: Option<IntelSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeathEvent {
    pub event_id: u64,
    pub character: u64,
    pub age: Option<u64>,
    pub successor: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldEventKind {
    Plague,
    Bandits,
    Boom,
    Fire,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldEvent {
    pub event_id: u64,
    pub city: u64,
    pub kind: WorldEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalEvent {
    pub event_id: u64,
    pub season: Season,
    pub title: String,
    pub food_delta: i32,
}
