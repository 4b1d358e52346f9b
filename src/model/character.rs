use serde::{Deserialize, Serialize};

use super::traits::Trait;

/// Upper bound on any numeric stat.
pub const MAX_STAT: u32 = 20;
/// Upper bound on any skill level.
pub const MAX_SKILL: u8 = 5;
/// Personal favorability toward the faction leader starts here.
pub const DEFAULT_FAVOR: i32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub military: u32,
    pub intelligence: u32,
    pub charm: u32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            military: 5,
            intelligence: 5,
            charm: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Skill {
    Leadership,
    Tactics,
    Commerce,
    Espionage,
}

string_enum!(Skill {
    Leadership => "leadership",
    Tactics => "tactics",
    Commerce => "commerce",
    Espionage => "espionage",
});

/// Skill levels, each in `0..=MAX_SKILL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub leadership: u8,
    pub tactics: u8,
    pub commerce: u8,
    pub espionage: u8,
}

impl Skills {
    pub fn get(&self, skill: Skill) -> u8 {
        match skill {
            Skill::Leadership => self.leadership,
            Skill::Tactics => self.tactics,
            Skill::Commerce => self.commerce,
            Skill::Espionage => self.espionage,
        }
    }

    fn slot(&mut self, skill: Skill) -> &mut u8 {
        match skill {
            Skill::Leadership => &mut self.leadership,
            Skill::Tactics => &mut self.tactics,
            Skill::Commerce => &mut self.commerce,
            Skill::Espionage => &mut self.espionage,
        }
    }

    /// Raise a skill by one level. Returns false if it was already at the cap.
    pub fn raise(&mut self, skill: Skill) -> bool {
        let slot = self.slot(skill);
        if *slot >= MAX_SKILL {
            return false;
        }
        *slot += 1;
        true
    }

    pub fn set(&mut self, skill: Skill, level: u8) {
        *self.slot(skill) = level.min(MAX_SKILL);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Role {
    General,
    Governor,
    Diplomat,
    Spymaster,
}

string_enum!(Role {
    General => "general",
    Governor => "governor",
    Diplomat => "diplomat",
    Spymaster => "spymaster",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub traits: Vec<Trait>,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub skills: Skills,
    #[serde(default)]
    pub role: Option<Role>,
    /// City the character is in. `None` while travelling, unlocated, or dead.
    #[serde(default)]
    pub location: Option<u64>,
    #[serde(default)]
    pub birth_tick: Option<u64>,
    /// Battles led to victory; counted toward attack power up to a cap.
    #[serde(default)]
    pub legacy: u32,
    /// Favorability toward the current faction leader, 0-100.
    #[serde(default = "default_favor")]
    pub favor: i32,
}

fn default_favor() -> i32 {
    DEFAULT_FAVOR
}

impl Character {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            traits: Vec::new(),
            stats: Stats::default(),
            skills: Skills::default(),
            role: None,
            location: None,
            birth_tick: None,
            legacy: 0,
            favor: DEFAULT_FAVOR,
        }
    }

    pub fn has_trait(&self, t: &Trait) -> bool {
        self.traits.contains(t)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }

    /// Raise military by one, respecting [`MAX_STAT`].
    pub fn raise_military(&mut self) {
        self.stats.military = (self.stats.military + 1).min(MAX_STAT);
    }

    pub fn adjust_favor(&mut self, delta: i32) {
        self.favor = (self.favor + delta).clamp(0, 100);
    }

    /// Age in whole years, if the character has a birth tick.
    pub fn age(&self, tick: u64, ticks_per_year: u64) -> Option<u64> {
        let born = self.birth_tick?;
        Some(tick.saturating_sub(born) / ticks_per_year.max(1))
    }
}
