use rand::Rng;

use crate::model::{Character, Trait};

// Aggression weights
const BASE_AGGRESSION: f64 = 0.5;
const BRAVE_AGGRESSION: f64 = 0.25;
const IMPULSIVE_AGGRESSION: f64 = 0.2;
const AMBITIOUS_AGGRESSION: f64 = 0.1;
const CAUTIOUS_AGGRESSION: f64 = -0.25;
const WISE_AGGRESSION: f64 = -0.15;
const MILITARY_AGGRESSION: f64 = 0.1;

// Caution weights
const BASE_CAUTION: f64 = 0.3;
const CAUTIOUS_CAUTION: f64 = 0.25;
const WISE_CAUTION: f64 = 0.2;
const BRAVE_CAUTION: f64 = -0.15;
const IMPULSIVE_CAUTION: f64 = -0.15;
const INTELLIGENCE_CAUTION: f64 = 0.1;

const HIGH_STAT: u32 = 12;

/// How readily a character attacks versus falls back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Personality {
    pub aggression: f64,
    pub caution: f64,
}

impl Personality {
    pub fn of(c: &Character) -> Self {
        let weigh = |t: Trait, w: f64| if c.has_trait(&t) { w } else { 0.0 };
        let mut aggression = BASE_AGGRESSION
            + weigh(Trait::Brave, BRAVE_AGGRESSION)
            + weigh(Trait::Impulsive, IMPULSIVE_AGGRESSION)
            + weigh(Trait::Ambitious, AMBITIOUS_AGGRESSION)
            + weigh(Trait::Cautious, CAUTIOUS_AGGRESSION)
            + weigh(Trait::Wise, WISE_AGGRESSION);
        if c.stats.military >= HIGH_STAT {
            aggression += MILITARY_AGGRESSION;
        }
        let mut caution = BASE_CAUTION
            + weigh(Trait::Cautious, CAUTIOUS_CAUTION)
            + weigh(Trait::Wise, WISE_CAUTION)
            + weigh(Trait::Brave, BRAVE_CAUTION)
            + weigh(Trait::Impulsive, IMPULSIVE_CAUTION);
        if c.stats.intelligence >= HIGH_STAT {
            caution += INTELLIGENCE_CAUTION;
        }
        Self {
            aggression,
            caution,
        }
    }
}

/// What a character does with its share of an expansion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    Attack,
    Reinforce,
    Hold,
}

/// Roll the character's stance: aggression first, then caution.
pub fn roll_stance(p: &Personality, rng: &mut (impl Rng + ?Sized)) -> Stance {
    if rng.random_bool(p.aggression.clamp(0.0, 1.0)) {
        Stance::Attack
    } else if rng.random_bool(p.caution.clamp(0.0, 1.0)) {
        Stance::Reinforce
    } else {
        Stance::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::rng;

    fn with_traits(traits: &[Trait]) -> Character {
        let mut c = Character::new(1, "Officer");
        c.traits = traits.to_vec();
        c
    }

    #[test]
    fn weights_follow_traits_and_stats() {
        let p = Personality::of(&with_traits(&[Trait::Brave, Trait::Impulsive]));
        assert!((p.aggression - 0.95).abs() < 1e-9);
        assert!(p.caution.abs() < 1e-9);

        let mut scholar = with_traits(&[Trait::Cautious, Trait::Wise]);
        scholar.stats.intelligence = 15;
        let p = Personality::of(&scholar);
        assert!((p.aggression - 0.1).abs() < 1e-9);
        assert!((p.caution - 0.85).abs() < 1e-9);
    }

    #[test]
    fn bold_characters_attack_more_often() {
        let bold = Personality::of(&with_traits(&[Trait::Brave, Trait::Impulsive]));
        let careful = Personality::of(&with_traits(&[Trait::Cautious, Trait::Wise]));
        let mut r = rng(21);
        let count = |p: &Personality, r: &mut rand::rngs::SmallRng| {
            (0..2_000).filter(|_| roll_stance(p, r) == Stance::Attack).count()
        };
        let bold_attacks = count(&bold, &mut r);
        let careful_attacks = count(&careful, &mut r);
        assert!(bold_attacks > careful_attacks * 3, "{bold_attacks} vs {careful_attacks}");
    }

    #[test]
    fn out_of_range_weights_are_clamped() {
        let p = Personality {
            aggression: 1.4,
            caution: -0.3,
        };
        let mut r = rng(2);
        for _ in 0..100 {
            assert_eq!(roll_stance(&p, &mut r), Stance::Attack);
        }
    }
}
