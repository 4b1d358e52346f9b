use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MORALE: u32 = 60;
pub const MAX_MORALE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Tech {
    Ironworking,
    Masonry,
    Logistics,
    Cartography,
}

string_enum!(Tech {
    Ironworking => "ironworking",
    Masonry => "masonry",
    Logistics => "logistics",
    Cartography => "cartography",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: u64,
    pub name: String,
    pub leader: u64,
    /// Ordered member list. The leader is always a member.
    pub members: Vec<u64>,
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_morale")]
    pub morale: u32,
    #[serde(default)]
    pub techs: BTreeSet<Tech>,
}

fn default_morale() -> u32 {
    DEFAULT_MORALE
}

impl Faction {
    pub fn new(id: u64, name: impl Into<String>, leader: u64) -> Self {
        Self {
            id,
            name: name.into(),
            leader,
            members: vec![leader],
            color: String::new(),
            morale: DEFAULT_MORALE,
            techs: BTreeSet::new(),
        }
    }

    pub fn is_member(&self, character: u64) -> bool {
        self.members.contains(&character)
    }

    pub fn add_member(&mut self, character: u64) {
        if !self.is_member(character) {
            self.members.push(character);
        }
    }

    pub fn remove_member(&mut self, character: u64) {
        self.members.retain(|&m| m != character);
    }

    pub fn has_tech(&self, tech: Tech) -> bool {
        self.techs.contains(&tech)
    }

    pub fn adjust_morale(&mut self, delta: i32) {
        self.morale = (self.morale as i32 + delta).clamp(0, MAX_MORALE as i32) as u32;
    }
}
