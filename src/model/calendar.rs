use serde::{Deserialize, Serialize};

pub const SEASONS_PER_YEAR: u64 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Season {
    #[default]
    Spring,
    Summer,
    Autumn,
    Winter,
}

string_enum!(Season {
    Spring => "spring",
    Summer => "summer",
    Autumn => "autumn",
    Winter => "winter",
});

impl Season {
    /// Season label of a tick. Tick 0 is the first day of spring.
    pub fn of_tick(tick: u64, days_per_season: u64) -> Season {
        let index = (tick / days_per_season.max(1)) % SEASONS_PER_YEAR;
        Season::ALL[index as usize]
    }
}

/// True on the first tick of every season after the very start.
pub fn is_season_start(tick: u64, days_per_season: u64) -> bool {
    tick > 0 && tick % days_per_season.max(1) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seasons_cycle() {
        assert_eq!(Season::of_tick(0, 30), Season::Spring);
        assert_eq!(Season::of_tick(29, 30), Season::Spring);
        assert_eq!(Season::of_tick(30, 30), Season::Summer);
        assert_eq!(Season::of_tick(95, 30), Season::Winter);
        assert_eq!(Season::of_tick(120, 30), Season::Spring);
    }

    #[test]
    fn season_start_detection() {
        assert!(!is_season_start(0, 30));
        assert!(!is_season_start(29, 30));
        assert!(is_season_start(30, 30));
        assert!(is_season_start(60, 30));
    }

    #[test]
    fn zero_length_season_does_not_divide_by_zero() {
        assert_eq!(Season::of_tick(3, 0), Season::Winter);
    }
}
