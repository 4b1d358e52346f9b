//! Attack and defense power.
//!
//! Pure functions of the world and an injected random source, so battle
//! odds can be measured directly.

use rand::Rng;

use crate::config::CombatConfig;
use crate::model::{
    Character, City, CityTier, District, Faction, Improvement, Role, Season, Specialty, Tactic,
    Tech, UnitType, Units, World,
};

// Defense multipliers on garrison
const FORTRESS_BONUS: f64 = 0.25;
const WALLS_BONUS: f64 = 0.2;
const MASONRY_BONUS: f64 = 0.15;
const FORTIFICATIONS_FLAT: f64 = 3.0;

// Defender contribution weights
const DEFENDER_MILITARY_WEIGHT: f64 = 0.8;
const DEFENDER_INTELLIGENCE_WEIGHT: f64 = 0.3;

// Attacker contribution
const ATTACKER_INTELLIGENCE_WEIGHT: f64 = 0.5;
const IRONWORKING_MULTIPLIER: f64 = 1.1;
const MORALE_FLOOR: f64 = 0.8;
const MORALE_RANGE: f64 = 0.4;

const MAX_COUNTER_SHIFT: f64 = 0.2;

/// What one character adds to an attack.
pub fn attacker_contribution(
    c: &Character,
    faction: Option<&Faction>,
    config: &CombatConfig,
) -> f64 {
    let legacy = c.legacy.min(config.legacy_cap) as f64;
    let base = c.stats.military as f64
        + c.stats.intelligence as f64 * ATTACKER_INTELLIGENCE_WEIGHT
        + c.skills.tactics as f64
        + legacy;
    let role = if c.has_role(Role::General) {
        config.general_multiplier
    } else {
        1.0
    };
    let (tech, morale) = match faction {
        Some(f) => {
            let tech = if f.has_tech(Tech::Ironworking) {
                IRONWORKING_MULTIPLIER
            } else {
                1.0
            };
            (tech, MORALE_FLOOR + MORALE_RANGE * f.morale as f64 / 100.0)
        }
        None => (1.0, 1.0),
    };
    base * role * tech * morale
}

/// What one character present in the city adds to its defense.
pub fn defender_contribution(c: &Character) -> f64 {
    c.stats.military as f64 * DEFENDER_MILITARY_WEIGHT
        + c.stats.intelligence as f64 * DEFENDER_INTELLIGENCE_WEIGHT
        + c.skills.tactics as f64
}

/// Garrison strength after specialty, district, technology, and improvement
/// bonuses.
pub fn garrison_strength(city: &City, owner: Option<&Faction>) -> f64 {
    let mut multiplier = 1.0;
    if city.specialty == Some(Specialty::Fortress) {
        multiplier += FORTRESS_BONUS;
    }
    if city.has_district(District::Walls) {
        multiplier += WALLS_BONUS;
    }
    if owner.is_some_and(|f| f.has_tech(Tech::Masonry)) {
        multiplier += MASONRY_BONUS;
    }
    let flat = if city.improvement == Some(Improvement::Fortifications) {
        FORTIFICATIONS_FLAT
    } else {
        0.0
    };
    city.garrison as f64 * multiplier + flat
}

/// Full defense power of a city before tactics and unit counters.
pub fn defense_power(
    world: &World,
    city: &City,
    season: Season,
    rng: &mut (impl Rng + ?Sized),
    config: &CombatConfig,
) -> f64 {
    let owner = world.city_faction(city.id).and_then(|f| world.faction(f));
    let defenders: f64 = world
        .defenders_of(city.id)
        .iter()
        .filter_map(|&id| world.character(id))
        .map(defender_contribution)
        .sum();
    let jitter = if config.jitter > 0.0 {
        rng.random_range(-config.jitter..config.jitter)
    } else {
        0.0
    };
    let tier = if city.tier == CityTier::Major {
        config.major_tier_bonus
    } else {
        0.0
    };
    let winter = if season == Season::Winter {
        config.winter_bonus
    } else {
        0.0
    };
    garrison_strength(city, owner) + defenders + jitter + tier + winter
}

/// Rock-paper-scissors shift in the attacker's favor, in
/// `-MAX_COUNTER_SHIFT..=MAX_COUNTER_SHIFT`.
pub fn counter_shift(attacker: &Units, defender: &Units, counter_bonus: f64) -> f64 {
    let mut favorable = 0.0;
    let mut unfavorable = 0.0;
    for &unit in UnitType::ALL {
        favorable += attacker.share(unit) * defender.share(unit.beats());
        unfavorable += defender.share(unit) * attacker.share(unit.beats());
    }
    ((favorable - unfavorable) * counter_bonus).clamp(-MAX_COUNTER_SHIFT, MAX_COUNTER_SHIFT)
}

/// Attack and defense after tactic and unit-counter modifiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engagement {
    pub attack: f64,
    pub defense: f64,
}

impl Engagement {
    pub fn new(raw_attack: f64, raw_defense: f64, tactic: Tactic, shift: f64) -> Self {
        let attack = raw_attack * (1.0 + tactic.attack_modifier()) * (1.0 + shift);
        let defense = raw_defense * (1.0 - tactic.defense_modifier()) * (1.0 - shift);
        Self { attack, defense }
    }

    /// Attackers win only by strictly exceeding the defense.
    pub fn attacker_wins(&self) -> bool {
        self.attack > self.defense
    }
}
