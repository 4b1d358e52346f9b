use rand::Rng;
use serde::{Deserialize, Serialize};

/// Qualitative personality tag on a character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Trait {
    Brave,
    Impulsive,
    Cautious,
    Wise,
    Loyal,
    Treacherous,
    Ambitious,
    Charismatic,
    Custom(String),
}

string_enum_open!(Trait, "trait", {
    Brave => "brave",
    Impulsive => "impulsive",
    Cautious => "cautious",
    Wise => "wise",
    Loyal => "loyal",
    Treacherous => "treacherous",
    Ambitious => "ambitious",
    Charismatic => "charismatic",
});

/// Opposing pairs: a character cannot carry both traits of a pair.
pub const OPPOSING_PAIRS: [(Trait, Trait); 3] = [
    (Trait::Brave, Trait::Cautious),
    (Trait::Impulsive, Trait::Wise),
    (Trait::Loyal, Trait::Treacherous),
];

const CORE_TRAITS: [Trait; 8] = [
    Trait::Brave,
    Trait::Impulsive,
    Trait::Cautious,
    Trait::Wise,
    Trait::Loyal,
    Trait::Treacherous,
    Trait::Ambitious,
    Trait::Charismatic,
];

fn opposes(a: &Trait, b: &Trait) -> bool {
    OPPOSING_PAIRS
        .iter()
        .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
}

/// Pick up to `count` distinct, non-opposing core traits.
pub fn generate_traits(rng: &mut (impl Rng + ?Sized), count: usize) -> Vec<Trait> {
    let mut picked: Vec<Trait> = Vec::with_capacity(count);
    // Bounded retries keep this total even when the pool runs dry.
    for _ in 0..count * 8 {
        if picked.len() >= count {
            break;
        }
        let candidate = &CORE_TRAITS[rng.random_range(0..CORE_TRAITS.len())];
        if picked.contains(candidate) || picked.iter().any(|t| opposes(t, candidate)) {
            continue;
        }
        picked.push(candidate.clone());
    }
    picked
}
