use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Every tunable threshold the turn engine reads.
///
/// Each section carries `#[serde(default)]`, so a JSON file only needs the
/// keys it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub calendar: CalendarConfig,
    pub relationships: RelationshipConfig,
    pub movement: MovementConfig,
    pub economy: EconomyConfig,
    pub combat: CombatConfig,
    pub siege: SiegeConfig,
    pub npc: NpcConfig,
    pub diplomacy: DiplomacyConfig,
    pub betrayal: BetrayalConfig,
    pub espionage: EspionageConfig,
    pub victory: VictoryConfig,
    pub events: EventConfig,
    pub lifecycle: LifecycleConfig,
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub days_per_season: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self { days_per_season: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipConfig {
    /// Per-tick chance that two co-located characters interact.
    pub interaction_chance: f64,
    /// Every this many ticks, each intimacy moves one step toward neutral.
    pub decay_interval: u64,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            interaction_chance: 0.15,
            decay_interval: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub travel_days: u64,
    pub spy_travel_days: u64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            travel_days: 2,
            spy_travel_days: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub base_income: u32,
    pub base_food: u32,
    /// Garrison troops fed by one unit of food per tick.
    pub troops_per_food: u32,
    pub recruit_cost: u32,
    pub develop_cost: u32,
    pub district_cost: u32,
    pub improvement_cost: u32,
    pub research_cost: u32,
    pub hire_cost: u32,
    pub max_districts: usize,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            base_income: 2,
            base_food: 2,
            troops_per_food: 5,
            recruit_cost: 10,
            develop_cost: 40,
            district_cost: 60,
            improvement_cost: 80,
            research_cost: 100,
            hire_cost: 50,
            max_districts: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Half-width of the uniform defense jitter.
    pub jitter: f64,
    pub major_tier_bonus: f64,
    pub winter_bonus: f64,
    /// Maximum percentage shift from the unit-counter relation.
    pub counter_bonus: f64,
    /// Legacy points counted toward attack power are capped at this value.
    pub legacy_cap: u32,
    pub general_multiplier: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            jitter: 2.0,
            major_tier_bonus: 3.0,
            winter_bonus: 2.0,
            counter_bonus: 0.2,
            legacy_cap: 5,
            general_multiplier: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiegeConfig {
    /// Ticks that must elapse before attrition starts.
    pub base_delay: u64,
    pub granary_delay: u64,
    pub agriculture_delay: u64,
    pub sally_chance: f64,
    /// Minimum garrison for a sally to be attempted.
    pub sally_min_garrison: u32,
    pub sally_success_cost: u32,
    pub sally_failure_cost: u32,
}

impl Default for SiegeConfig {
    fn default() -> Self {
        Self {
            base_delay: 2,
            granary_delay: 2,
            agriculture_delay: 1,
            sally_chance: 0.15,
            sally_min_garrison: 5,
            sally_success_cost: 1,
            sally_failure_cost: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcConfig {
    pub low_garrison: u32,
    pub adequate_garrison: f64,
    pub develop_threshold: f64,
    pub low_food: u32,
    /// Garrison at or below which an undefended city counts as a free capture.
    pub free_capture_garrison: u32,
    pub recruit_gold: u32,
    pub recruit_below: u32,
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            low_garrison: 5,
            adequate_garrison: 6.0,
            develop_threshold: 3.0,
            low_food: 20,
            free_capture_garrison: 2,
            recruit_gold: 60,
            recruit_below: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiplomacyConfig {
    pub alliance_form_intimacy: u8,
    pub alliance_break_intimacy: u8,
    pub proposal_min_intimacy: u8,
    pub proposal_min_trust: u8,
    pub initial_trust: u8,
    pub trust_alliance_formed: i32,
    pub trust_alliance_broken: i32,
    pub trust_tribute_accepted: i32,
    pub trust_tribute_rejected: i32,
    pub trust_sabotage: i32,
    pub trust_drift_interval: u64,
    pub ceasefire_exhaustion: u32,
    pub ceasefire_duration: u64,
    /// Strength ratio at which a demanded faction pays tribute.
    pub tribute_strength_ratio: f64,
}

impl Default for DiplomacyConfig {
    fn default() -> Self {
        Self {
            alliance_form_intimacy: 65,
            alliance_break_intimacy: 25,
            proposal_min_intimacy: 40,
            proposal_min_trust: 20,
            initial_trust: 50,
            trust_alliance_formed: 10,
            trust_alliance_broken: -10,
            trust_tribute_accepted: -3,
            trust_tribute_rejected: -8,
            trust_sabotage: -10,
            trust_drift_interval: 10,
            ceasefire_exhaustion: 60,
            ceasefire_duration: 30,
            tribute_strength_ratio: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BetrayalConfig {
    pub base_chance: f64,
    pub treacherous_multiplier: f64,
    pub low_morale: u32,
    pub low_morale_bonus: f64,
    pub low_favor: i32,
    pub low_favor_bonus: f64,
    pub weak_faction_bonus: f64,
    pub rival_pull_bonus: f64,
    /// Intimacy a rival leader needs before a defector will go to them.
    pub rival_min_intimacy: u8,
    pub rival_pull_intimacy: u8,
    pub own_leader_low_intimacy: u8,
}

impl Default for BetrayalConfig {
    fn default() -> Self {
        Self {
            base_chance: 0.002,
            treacherous_multiplier: 2.0,
            low_morale: 30,
            low_morale_bonus: 0.003,
            low_favor: 30,
            low_favor_bonus: 0.003,
            weak_faction_bonus: 0.002,
            rival_pull_bonus: 0.004,
            rival_min_intimacy: 50,
            rival_pull_intimacy: 60,
            own_leader_low_intimacy: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EspionageConfig {
    pub spy_cost: u32,
    pub base_success: f64,
}

impl Default for EspionageConfig {
    fn default() -> Self {
        Self {
            spy_cost: 20,
            base_success: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VictoryConfig {
    pub diplomatic_ticks: u32,
    pub economic_ticks: u32,
    /// Share of all controlled gold the player must exceed.
    pub economic_share: f64,
}

impl Default for VictoryConfig {
    fn default() -> Self {
        Self {
            diplomatic_ticks: 30,
            economic_ticks: 30,
            economic_share: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Per-city, per-tick chance of a random world event.
    pub world_event_chance: f64,
    pub card_draw_chance: f64,
    /// Multiplier applied to gold deltas on drawn cards.
    pub card_scale: f64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            world_event_chance: 0.01,
            card_draw_chance: 0.05,
            card_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Ticks per simulated year of age.
    pub ticks_per_year: u64,
    pub old_age: u64,
    pub death_rate_per_year: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            ticks_per_year: 120,
            old_age: 60,
            death_rate_per_year: 0.0005,
        }
    }
}
