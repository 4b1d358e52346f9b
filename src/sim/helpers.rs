use crate::config::SimConfig;
use crate::model::{Tech, World};

/// Days a character of `faction` needs to reach another city.
pub fn travel_days(world: &World, config: &SimConfig, faction: Option<u64>) -> u64 {
    let base = config.movement.travel_days;
    let logistics = faction
        .and_then(|f| world.faction(f))
        .is_some_and(|f| f.has_tech(Tech::Logistics));
    if logistics {
        base.saturating_sub(1).max(1)
    } else {
        base.max(1)
    }
}

/// A living, located character with nothing in flight.
pub fn is_free(world: &World, character: u64) -> bool {
    world
        .character(character)
        .is_some_and(|c| c.location.is_some())
        && !world.is_busy(character)
}

/// Send a character to its faction's strongest city other than `from`.
/// Without such a city the character is left unlocated.
pub fn retreat(world: &mut World, character: u64, from: u64) {
    let refuge = world
        .faction_of(character)
        .and_then(|f| world.strongest_city(f, Some(from)));
    if let Some(c) = world.characters.get_mut(&character) {
        c.location = refuge;
    }
}

/// Give every city owned by `character` to `heir`, or leave them unowned.
pub fn transfer_cities(world: &mut World, character: u64, heir: Option<u64>) {
    for city in world.cities.values_mut() {
        if city.owner == Some(character) {
            city.owner = heir;
        }
    }
}

/// Military strength used by diplomacy: garrison plus members' military.
pub fn faction_strength(world: &World, faction: u64) -> u64 {
    let military: u64 = world
        .faction(faction)
        .map(|f| {
            f.members
                .iter()
                .filter_map(|&m| world.character(m))
                .map(|c| c.stats.military as u64)
                .sum()
        })
        .unwrap_or(0);
    world.faction_garrison(faction) + military
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    #[test]
    fn logistics_shortens_travel_but_not_below_one() {
        let mut s = Scenario::new();
        let shu = s.add_kingdom("Shu");
        let mut world = s.build();
        let mut config = SimConfig::default();
        assert_eq!(travel_days(&world, &config, Some(shu.faction)), 2);
        world
            .factions
            .get_mut(&shu.faction)
            .unwrap()
            .techs
            .insert(Tech::Logistics);
        assert_eq!(travel_days(&world, &config, Some(shu.faction)), 1);
        config.movement.travel_days = 1;
        assert_eq!(travel_days(&world, &config, Some(shu.faction)), 1);
    }

    #[test]
    fn retreat_goes_to_strongest_other_city() {
        let mut s = Scenario::new();
        let shu = s.add_kingdom("Shu");
        let fort = s.city("Jiameng").owner(shu.leader).garrison(30).id();
        s.city("Baidi").owner(shu.leader).garrison(4).id();
        let mut world = s.build();
        retreat(&mut world, shu.leader, shu.city);
        assert_eq!(world.character(shu.leader).unwrap().location, Some(fort));
    }

    #[test]
    fn retreat_without_refuge_leaves_unlocated() {
        let mut s = Scenario::new();
        let shu = s.add_kingdom("Shu");
        let mut world = s.build();
        retreat(&mut world, shu.leader, shu.city);
        assert_eq!(world.character(shu.leader).unwrap().location, None);
    }
}
