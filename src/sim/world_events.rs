use rand::{Rng, RngCore};
use tracing::{debug, info};

use crate::model::{CardChoice, EventCard, EventKind, Season};
use crate::sim::context::TickContext;
use crate::sim::report::{SeasonalEvent, WorldEvent, WorldEventKind};
use crate::sim::system::{SimSystem, TickFrequency};

// World event effects
const PLAGUE_GARRISON_LOSS: u32 = 2;
const BANDIT_GOLD_LOSS: u32 = 20;
const BOOM_GOLD_GAIN: u32 = 30;

const WORLD_EVENT_KINDS: [WorldEventKind; 4] = [
    WorldEventKind::Plague,
    WorldEventKind::Bandits,
    WorldEventKind::Boom,
    WorldEventKind::Fire,
];

/// Random per-city calamities and windfalls, plus the player's event cards.
pub struct WorldEventSystem;

impl SimSystem for WorldEventSystem {
    fn name(&self) -> &str {
        "world_events"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Daily
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let chance = ctx.config.events.world_event_chance.clamp(0.0, 1.0);
        let owned: Vec<u64> = ctx
            .world
            .cities
            .values()
            .filter(|c| c.owner.is_some())
            .map(|c| c.id)
            .collect();

        for city_id in owned {
            if !ctx.rng.random_bool(chance) {
                continue;
            }
            let kind = WORLD_EVENT_KINDS[ctx.rng.random_range(0..WORLD_EVENT_KINDS.len())];
            let Some(city) = ctx.world.cities.get_mut(&city_id) else {
                continue;
            };
            let what = match kind {
                WorldEventKind::Plague => {
                    city.lose_garrison(PLAGUE_GARRISON_LOSS);
                    "Plague swept through"
                }
                WorldEventKind::Bandits => {
                    city.lose_gold(BANDIT_GOLD_LOSS);
                    "Bandits raided"
                }
                WorldEventKind::Boom => {
                    city.gold = city.gold.saturating_add(BOOM_GOLD_GAIN);
                    "Trade boomed in"
                }
                WorldEventKind::Fire => {
                    city.undevelop();
                    "Fire ravaged"
                }
            };
            let city_name = city.name.clone();
            let event_id = ctx.world.log(
                EventKind::WorldEvent,
                None,
                Some(city_id),
                format!("{what} {city_name}"),
            );
            debug!(city = city_id, ?kind, "world event");
            ctx.report.world_events.push(WorldEvent {
                event_id,
                city: city_id,
                kind,
            });
        }

        if ctx.world.player_faction.is_some() && ctx.world.pending_card.is_none() {
            let events = &ctx.config.events;
            let drawn = draw_event_card(&mut *ctx.rng, events.card_draw_chance, events.card_scale);
            if let Some(card) = drawn {
                info!(card = card.id, title = %card.title, "event card drawn");
                ctx.world.pending_card = Some(card);
            }
        }
        ctx.report.event_card = ctx.world.pending_card.clone();
    }
}

// -- Event cards --

struct CardTemplate {
    title: &'static str,
    choices: &'static [(&'static str, i64, i32)],
}

const DECK: &[CardTemplate] = &[
    CardTemplate {
        title: "Wandering Merchants",
        choices: &[("Buy their silks", -30, 5), ("Turn them away", 0, 0)],
    },
    CardTemplate {
        title: "Flood in the Lowlands",
        choices: &[("Fund the relief", -40, 8), ("Let the villages fend for themselves", 0, -6)],
    },
    CardTemplate {
        title: "A Silver Vein",
        choices: &[("Open a mine", 50, -2), ("Leave the mountain sacred", 0, 4)],
    },
    CardTemplate {
        title: "Veterans' Petition",
        choices: &[("Grant pensions", -25, 6), ("Refuse", 0, -4)],
    },
    CardTemplate {
        title: "Tax Surplus",
        choices: &[("Hold a festival", -20, 10), ("Fill the treasury", 35, 0)],
    },
];

/// Maybe draw a card from the fixed deck. Gold deltas are multiplied by
/// `scale` and rounded, so they stay integers.
pub fn draw_event_card(rng: &mut dyn RngCore, draw_chance: f64, scale: f64) -> Option<EventCard> {
    if !rng.random_bool(draw_chance.clamp(0.0, 1.0)) {
        return None;
    }
    let index = rng.random_range(0..DECK.len());
    let template = &DECK[index];
    Some(EventCard {
        id: index as u32 + 1,
        title: template.title.to_string(),
        choices: template
            .choices
            .iter()
            .map(|&(label, gold, morale)| CardChoice {
                label: label.to_string(),
                gold: (gold as f64 * scale).round() as i64,
                morale,
            })
            .collect(),
    })
}

// -- Seasonal events --

struct SeasonalTemplate {
    title: &'static str,
    food_delta: i32,
}

fn seasonal_table(season: Season) -> SeasonalTemplate {
    match season {
        Season::Spring => SeasonalTemplate {
            title: "Spring planting",
            food_delta: 10,
        },
        Season::Summer => SeasonalTemplate {
            title: "Summer drought",
            food_delta: -10,
        },
        Season::Autumn => SeasonalTemplate {
            title: "Autumn harvest",
            food_delta: 20,
        },
        Season::Winter => SeasonalTemplate {
            title: "Winter frost",
            food_delta: -5,
        },
    }
}

/// One seasonal event on the first day of every season, touching every
/// owned city's food.
pub struct SeasonalSystem;

impl SimSystem for SeasonalSystem {
    fn name(&self) -> &str {
        "seasonal"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Seasonal
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let season = Season::of_tick(ctx.world.tick, ctx.config.calendar.days_per_season);
        let template = seasonal_table(season);
        for city in ctx.world.cities.values_mut().filter(|c| c.owner.is_some()) {
            if template.food_delta >= 0 {
                city.food = city.food.saturating_add(template.food_delta as u32);
            } else {
                city.lose_food(template.food_delta.unsigned_abs());
            }
        }
        let event_id = ctx.world.log(
            EventKind::Seasonal,
            None,
            None,
            format!("{} (food {:+})", template.title, template.food_delta),
        );
        info!(%season, title = template.title, "seasonal event");
        ctx.report.seasonal_event = Some(SeasonalEvent {
            event_id,
            season,
            title: template.title.to_string(),
            food_delta: template.food_delta,
        });
    }
}
