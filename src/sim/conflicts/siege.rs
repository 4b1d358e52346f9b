use rand::Rng;
use tracing::{debug, info};

use super::execute_capture;
use super::power::{attacker_contribution, defender_contribution};
use crate::config::{CombatConfig, SiegeConfig};
use crate::model::{City, District, EventKind, Specialty, World};
use crate::sim::context::TickContext;
use crate::sim::helpers::retreat;
use crate::sim::report::{SiegeUpdate, SiegeUpdateKind};
use crate::sim::signal::{SiegeOutcome, Signal, SignalKind};
use crate::sim::system::{SimSystem, TickFrequency};

const ATTRITION_LOSS: u32 = 1;
const STARVATION_EXTRA_LOSS: u32 = 1;

/// Advances every active siege: lifting, sallies, attrition, and the fall.
pub struct SiegeSystem;

impl SimSystem for SiegeSystem {
    fn name(&self) -> &str {
        "siege"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Daily
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let besieged: Vec<u64> = ctx
            .world
            .cities
            .values()
            .filter(|c| c.siege.is_some())
            .map(|c| c.id)
            .collect();
        for city in besieged {
            advance_siege(ctx, city);
        }
    }
}

/// Ticks of siege before attrition starts.
pub fn attrition_delay(city: &City, config: &SiegeConfig) -> u64 {
    let mut delay = config.base_delay;
    if city.has_district(District::Granary) {
        delay += config.granary_delay;
    }
    if city.specialty == Some(Specialty::Agriculture) {
        delay += config.agriculture_delay;
    }
    delay
}

/// Besiegers present at the city, strongest first.
fn besiegers(world: &World, city: u64, faction: u64, combat: &CombatConfig) -> Vec<(u64, f64)> {
    let side = world.faction(faction);
    let mut present: Vec<(u64, f64)> = world
        .present_from(city, faction)
        .iter()
        .filter_map(|&id| world.character(id))
        .map(|c| (c.id, attacker_contribution(c, side, combat)))
        .collect();
    present.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    present
}

fn advance_siege(ctx: &mut TickContext, city_id: u64) {
    let config = ctx.config;
    let tick = ctx.world.tick;
    let Some(city) = ctx.world.city(city_id).cloned() else {
        return;
    };
    let Some(siege) = city.siege else {
        return;
    };
    let besieger = siege.faction;

    let owner = ctx.world.city_faction(city_id);
    let still_hostile = owner.is_some_and(|o| ctx.world.hostile(besieger, o));
    let present = besiegers(ctx.world, city_id, besieger, &config.combat);
    if !still_hostile || present.is_empty() {
        end_siege(ctx, city_id, besieger, SiegeOutcome::Lifted);
        push_update(ctx, city_id, besieger, SiegeUpdateKind::Lifted);
        return;
    }

    let sc = &config.siege;
    let sally = city.garrison >= sc.sally_min_garrison
        && ctx.rng.random_bool(sc.sally_chance.clamp(0.0, 1.0));
    if sally {
        let defense: f64 = city.garrison as f64
            + ctx
                .world
                .defenders_of(city_id)
                .iter()
                .filter_map(|&id| ctx.world.character(id))
                .map(defender_contribution)
                .sum::<f64>();
        let attack: f64 = present.iter().map(|&(_, p)| p).sum();
        if defense > attack {
            if let Some(c) = ctx.world.cities.get_mut(&city_id) {
                c.lose_garrison(sc.sally_success_cost);
            }
            let description =
                format!("The defenders of {} sallied forth and broke the siege", city.name);
            ctx.world.log(EventKind::SallyForth, None, None, description);
            for &(id, _) in &present {
                retreat(ctx.world, id, city_id);
            }
            end_siege(ctx, city_id, besieger, SiegeOutcome::Broken);
            push_update(ctx, city_id, besieger, SiegeUpdateKind::SallySucceeded);
            return;
        }
        if let Some(c) = ctx.world.cities.get_mut(&city_id) {
            c.lose_garrison(sc.sally_failure_cost);
        }
        let description = format!("A sally from {} was cut down", city.name);
        ctx.world.log(EventKind::SallyForth, None, None, description);
        push_update(ctx, city_id, besieger, SiegeUpdateKind::SallyFailed);
    } else if tick.saturating_sub(siege.started) >= attrition_delay(&city, sc) {
        if let Some(c) = ctx.world.cities.get_mut(&city_id) {
            let mut loss = ATTRITION_LOSS;
            if c.food == 0 {
                loss += STARVATION_EXTRA_LOSS;
            }
            c.lose_garrison(loss);
        }
        push_update(ctx, city_id, besieger, SiegeUpdateKind::Attrition);
    }

    // A garrison at zero falls the same tick.
    let fallen = ctx.world.city(city_id).is_some_and(|c| c.garrison == 0);
    if fallen {
        let lead = present[0].0;
        let event_id = execute_capture(ctx, city_id, lead, besieger);
        info!(city = city_id, besieger, "siege ended with the city's fall");
        ctx.signals.push(Signal {
            event_id,
            kind: SignalKind::SiegeEnded {
                city: city_id,
                faction: besieger,
                outcome: SiegeOutcome::Fell,
            },
        });
        push_update(ctx, city_id, besieger, SiegeUpdateKind::Fell);
    }
}

fn end_siege(ctx: &mut TickContext, city_id: u64, besieger: u64, outcome: SiegeOutcome) {
    if let Some(c) = ctx.world.cities.get_mut(&city_id) {
        c.siege = None;
    }
    let description = format!(
        "The siege of {} by {} ended",
        ctx.world.city_name(city_id),
        ctx.world.faction_name(besieger)
    );
    let event_id = ctx.world.log(EventKind::SiegeBroken, None, None, description);
    debug!(city = city_id, besieger, ?outcome, "siege ended");
    ctx.signals.push(Signal {
        event_id,
        kind: SignalKind::SiegeEnded {
            city: city_id,
            faction: besieger,
            outcome,
        },
    });
}

fn push_update(ctx: &mut TickContext, city: u64, besieger: u64, kind: SiegeUpdateKind) {
    let garrison = ctx.world.city(city).map(|c| c.garrison).unwrap_or(0);
    ctx.report.sieges.push(SiegeUpdate {
        city,
        besieger,
        kind,
        garrison,
    });
}
