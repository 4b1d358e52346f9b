use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Tactic {
    Aggressive,
    Defensive,
    #[default]
    Balanced,
}

string_enum!(Tactic {
    Aggressive => "aggressive",
    Defensive => "defensive",
    Balanced => "balanced",
});

impl Tactic {
    /// Fractional bonus applied to attack power.
    pub fn attack_modifier(self) -> f64 {
        match self {
            Tactic::Aggressive => 0.3,
            Tactic::Defensive => -0.1,
            Tactic::Balanced => 0.0,
        }
    }

    /// Fraction of the defender's power the tactic negates.
    /// Negative values mean the attacker exposes itself.
    pub fn defense_modifier(self) -> f64 {
        match self {
            Tactic::Aggressive => -0.15,
            Tactic::Defensive => 0.1,
            Tactic::Balanced => 0.0,
        }
    }

    /// NPC policy when no tactic is queued: 30% aggressive, 30% defensive,
    /// 40% balanced.
    pub fn choose_npc(rng: &mut (impl Rng + ?Sized)) -> Tactic {
        let roll: f64 = rng.random_range(0.0..1.0);
        if roll < 0.3 {
            Tactic::Aggressive
        } else if roll < 0.6 {
            Tactic::Defensive
        } else {
            Tactic::Balanced
        }
    }
}
