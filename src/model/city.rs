use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Upper bound on a city's development level.
pub const MAX_DEVELOPMENT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CityTier {
    Major,
    Minor,
}

string_enum!(CityTier {
    Major => "major",
    Minor => "minor",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Specialty {
    Commerce,
    Agriculture,
    Fortress,
}

string_enum!(Specialty {
    Commerce => "commerce",
    Agriculture => "agriculture",
    Fortress => "fortress",
});

/// One-time city improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Improvement {
    Fortifications,
    Irrigation,
    TradePost,
}

string_enum!(Improvement {
    Fortifications => "fortifications",
    Irrigation => "irrigation",
    TradePost => "trade_post",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum District {
    Market,
    Barracks,
    Granary,
    Walls,
    Academy,
}

string_enum!(District {
    Market => "market",
    Barracks => "barracks",
    Granary => "granary",
    Walls => "walls",
    Academy => "academy",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum UnitType {
    Infantry,
    Cavalry,
    Archers,
}

string_enum!(UnitType {
    Infantry => "infantry",
    Cavalry => "cavalry",
    Archers => "archers",
});

impl UnitType {
    /// The unit type this one beats: cavalry > infantry > archers > cavalry.
    pub fn beats(self) -> UnitType {
        match self {
            UnitType::Cavalry => UnitType::Infantry,
            UnitType::Infantry => UnitType::Archers,
            UnitType::Archers => UnitType::Cavalry,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Units {
    pub infantry: u32,
    pub cavalry: u32,
    pub archers: u32,
}

impl Units {
    pub fn total(&self) -> u32 {
        self.infantry + self.cavalry + self.archers
    }

    pub fn get(&self, unit: UnitType) -> u32 {
        match unit {
            UnitType::Infantry => self.infantry,
            UnitType::Cavalry => self.cavalry,
            UnitType::Archers => self.archers,
        }
    }

    pub fn add(&mut self, unit: UnitType, count: u32) {
        match unit {
            UnitType::Infantry => self.infantry += count,
            UnitType::Cavalry => self.cavalry += count,
            UnitType::Archers => self.archers += count,
        }
    }

    /// Fraction of the force made up by `unit`, 0.0 for an empty force.
    pub fn share(&self, unit: UnitType) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.get(unit) as f64 / total as f64
    }

    pub fn merged(&self, other: &Units) -> Units {
        Units {
            infantry: self.infantry + other.infantry,
            cavalry: self.cavalry + other.cavalry,
            archers: self.archers + other.archers,
        }
    }
}

/// An active siege against a city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Siege {
    pub faction: u64,
    pub started: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: u64,
    pub name: String,
    pub tier: CityTier,
    /// Controlling character.
    #[serde(default)]
    pub owner: Option<u64>,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub garrison: u32,
    #[serde(default)]
    pub development: u32,
    #[serde(default)]
    pub specialty: Option<Specialty>,
    #[serde(default)]
    pub improvement: Option<Improvement>,
    #[serde(default)]
    pub districts: BTreeSet<District>,
    #[serde(default)]
    pub siege: Option<Siege>,
    #[serde(default = "default_food")]
    pub food: u32,
    #[serde(default)]
    pub units: Units,
}

fn default_food() -> u32 {
    50
}

impl City {
    pub fn new(id: u64, name: impl Into<String>, tier: CityTier) -> Self {
        Self {
            id,
            name: name.into(),
            tier,
            owner: None,
            gold: 0,
            garrison: 0,
            development: 1,
            specialty: None,
            improvement: None,
            districts: BTreeSet::new(),
            siege: None,
            food: default_food(),
            units: Units::default(),
        }
    }

    pub fn has_district(&self, district: District) -> bool {
        self.districts.contains(&district)
    }

    /// Deduct `cost` gold if affordable. Returns whether it was paid.
    pub fn spend(&mut self, cost: u32) -> bool {
        if self.gold < cost {
            return false;
        }
        self.gold -= cost;
        true
    }

    pub fn lose_garrison(&mut self, amount: u32) {
        self.garrison = self.garrison.saturating_sub(amount);
    }

    pub fn lose_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_sub(amount);
    }

    pub fn lose_food(&mut self, amount: u32) {
        self.food = self.food.saturating_sub(amount);
    }

    /// Apply a signed gold delta, clamping at zero.
    pub fn apply_gold_delta(&mut self, delta: i64) {
        let next = (self.gold as i64 + delta).clamp(0, u32::MAX as i64);
        self.gold = next as u32;
    }

    pub fn develop(&mut self) -> bool {
        if self.development >= MAX_DEVELOPMENT {
            return false;
        }
        self.development += 1;
        true
    }

    pub fn undevelop(&mut self) {
        self.development = self.development.saturating_sub(1);
    }
}
