//! Win and loss conditions, checked last every tick.
//!
//! Conquest is checked first, then defeat, then the two consecutive-tick
//! victories. A counter resets to zero on any tick its condition fails, and
//! the victory lands on exactly the Nth qualifying tick.

use tracing::info;

use crate::config::VictoryConfig;
use crate::model::{EventKind, GameStatus, WinType, World};
use crate::sim::context::TickContext;
use crate::sim::system::{SimSystem, TickFrequency};

pub struct VictorySystem;

impl SimSystem for VictorySystem {
    fn name(&self) -> &str {
        "victory"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Daily
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        if ctx.world.game_state.is_terminal() {
            return;
        }
        if let Some((status, winner, win_type)) = evaluate(ctx.world, &ctx.config.victory) {
            finish(ctx, status, winner, win_type);
        }
    }
}

/// The faction holding every major city, when there is at least one.
pub fn conqueror(world: &World) -> Option<u64> {
    let mut holders = world.major_cities().map(|c| world.city_faction(c.id));
    let first = holders.next()??;
    holders.all(|h| h == Some(first)).then_some(first)
}

pub fn allied_with_all(world: &World, player: u64) -> bool {
    let mut rivals = world.factions.keys().filter(|&&f| f != player).peekable();
    rivals.peek().is_some() && rivals.all(|&f| world.are_allied(player, f))
}

/// The player's share of all gold held in controlled cities.
pub fn gold_share(world: &World, player: u64) -> f64 {
    let total: u64 = world
        .cities
        .values()
        .filter(|c| world.city_faction(c.id).is_some())
        .map(|c| c.gold as u64)
        .sum();
    if total == 0 {
        return 0.0;
    }
    world.faction_gold(player) as f64 / total as f64
}

/// Update the consecutive counters and decide whether the game is over.
/// A defeat without a conqueror carries no win type.
pub fn evaluate(
    world: &mut World,
    config: &VictoryConfig,
) -> Option<(GameStatus, Option<u64>, Option<WinType>)> {
    let player = world.player_faction;

    if let Some(winner) = conqueror(world) {
        let status = match player {
            Some(p) if p != winner => GameStatus::Defeat,
            _ => GameStatus::Victory,
        };
        return Some((status, Some(winner), Some(WinType::Conquest)));
    }

    let p = player?;
    let alive = world.factions.contains_key(&p);
    if world.tick > 0 && (!alive || world.faction_cities(p).is_empty()) {
        return Some((GameStatus::Defeat, None, None));
    }

    let diplomatic = allied_with_all(world, p);
    let economic = gold_share(world, p) > config.economic_share;
    let counters = &mut world.victory_counters;
    counters.diplomatic = if diplomatic { counters.diplomatic + 1 } else { 0 };
    counters.economic = if economic { counters.economic + 1 } else { 0 };

    if counters.diplomatic >= config.diplomatic_ticks {
        return Some((GameStatus::Victory, Some(p), Some(WinType::Diplomatic)));
    }
    if counters.economic >= config.economic_ticks {
        return Some((GameStatus::Victory, Some(p), Some(WinType::Economic)));
    }
    None
}

fn finish(
    ctx: &mut TickContext,
    status: GameStatus,
    winner: Option<u64>,
    win_type: Option<WinType>,
) {
    let tick = ctx.world.tick;
    let state = &mut ctx.world.game_state;
    state.finish(status, winner, win_type);
    state.tick = tick;

    let description = match (status, winner, win_type) {
        (GameStatus::Victory, Some(w), Some(how)) => {
            format!("{} triumphed by {how}", ctx.world.faction_name(w))
        }
        (_, Some(w), _) => format!("{} conquered the realm", ctx.world.faction_name(w)),
        _ => "The player's realm has fallen".to_string(),
    };
    ctx.world.log(EventKind::Victory, None, None, description);
    info!(tick, %status, ?winner, ?win_type, "game over");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pair_key;
    use crate::scenario::{KingdomIds, Scenario};
    use crate::testutil::tick_system;

    fn realm() -> (Scenario, KingdomIds, KingdomIds) {
        let mut s = Scenario::at_tick(1);
        let shu = s.add_kingdom("Shu");
        let wei = s.add_kingdom("Wei");
        s.player(shu.faction);
        (s, shu, wei)
    }

    #[test]
    fn holding_every_major_city_is_conquest() {
        let (s, shu, wei) = realm();
        let mut world = s.build();
        world.cities.get_mut(&wei.city).unwrap().owner = Some(shu.leader);
        tick_system(&mut world, &mut VictorySystem, 1);
        let state = world.game_state;
        assert_eq!(state.status, GameStatus::Victory);
        assert_eq!(state.winner, Some(shu.faction));
        assert_eq!(state.win_type, Some(WinType::Conquest));
        assert_eq!(state.tick, 1);
    }

    #[test]
    fn rival_conquest_is_defeat() {
        let (s, shu, wei) = realm();
        let mut world = s.build();
        world.cities.get_mut(&shu.city).unwrap().owner = Some(wei.leader);
        tick_system(&mut world, &mut VictorySystem, 1);
        assert_eq!(world.game_state.status, GameStatus::Defeat);
        assert_eq!(world.game_state.winner, Some(wei.faction));
    }

    #[test]
    fn conquest_needs_a_major_city() {
        let mut s = Scenario::at_tick(1);
        let wei = s.add_kingdom("Wei");
        s.city_mut(wei.city).minor();
        let mut world = s.build();
        assert_eq!(conqueror(&world), None);
        tick_system(&mut world, &mut VictorySystem, 1);
        assert!(!world.game_state.is_terminal());
    }

    #[test]
    fn losing_every_city_is_defeat_after_tick_zero() {
        let (s, shu, _) = realm();
        let mut world = s.build();
        world.cities.get_mut(&shu.city).unwrap().owner = None;
        world.tick = 0;
        let config = VictoryConfig::default();
        assert_eq!(evaluate(&mut world, &config), None);
        world.tick = 1;
        assert_eq!(
            evaluate(&mut world, &config),
            Some((GameStatus::Defeat, None, None))
        );
    }

    #[test]
    fn defeat_without_a_conqueror_has_no_win_type() {
        let (s, shu, _) = realm();
        let mut world = s.build();
        world.cities.get_mut(&shu.city).unwrap().owner = None;
        tick_system(&mut world, &mut VictorySystem, 1);
        assert_eq!(world.game_state.status, GameStatus::Defeat);
        assert_eq!(world.game_state.winner, None);
        assert_eq!(world.game_state.win_type, None);
    }

    #[test]
    fn diplomatic_counter_resets_and_triggers_on_the_nth_tick() {
        let (s, shu, wei) = realm();
        let mut world = s.build();
        let config = VictoryConfig {
            diplomatic_ticks: 3,
            ..VictoryConfig::default()
        };
        let key = pair_key(shu.faction, wei.faction);
        world.alliances.insert(key);
        assert_eq!(evaluate(&mut world, &config), None);
        assert_eq!(evaluate(&mut world, &config), None);
        world.alliances.remove(&key);
        assert_eq!(evaluate(&mut world, &config), None);
        assert_eq!(world.victory_counters.diplomatic, 0);

        world.alliances.insert(key);
        assert_eq!(evaluate(&mut world, &config), None);
        assert_eq!(evaluate(&mut world, &config), None);
        assert_eq!(world.victory_counters.diplomatic, 2);
        assert_eq!(
            evaluate(&mut world, &config),
            Some((GameStatus::Victory, Some(shu.faction), Some(WinType::Diplomatic)))
        );
    }

    #[test]
    fn economic_share_must_be_exceeded() {
        let (mut s, shu, wei) = realm();
        s.city_mut(shu.city).gold(60);
        s.city_mut(wei.city).gold(40);
        let mut world = s.build();
        let config = VictoryConfig {
            economic_ticks: 2,
            ..VictoryConfig::default()
        };
        // Exactly 60% is not enough.
        assert_eq!(evaluate(&mut world, &config), None);
        assert_eq!(world.victory_counters.economic, 0);
        world.cities.get_mut(&shu.city).unwrap().gold = 61;
        assert_eq!(evaluate(&mut world, &config), None);
        assert_eq!(
            evaluate(&mut world, &config),
            Some((GameStatus::Victory, Some(shu.faction), Some(WinType::Economic)))
        );
    }

    #[test]
    fn finished_games_stay_finished() {
        let (s, shu, wei) = realm();
        let mut world = s.build();
        world.game_state.finish(GameStatus::Defeat, Some(wei.faction), Some(WinType::Conquest));
        world.cities.get_mut(&wei.city).unwrap().owner = Some(shu.leader);
        tick_system(&mut world, &mut VictorySystem, 1);
        assert_eq!(world.game_state.status, GameStatus::Defeat);
    }
}
