use std::collections::BTreeMap;

use rand::Rng;
use tracing::debug;

use crate::model::relationship::DEFAULT_INTIMACY;
use crate::model::{RelationshipKind, World};
use crate::sim::context::TickContext;
use crate::sim::report::RelationshipEvent;
use crate::sim::system::{SimSystem, TickFrequency};

const MIN_INTERACTION_DELTA: i32 = -3;
const MAX_INTERACTION_DELTA: i32 = 3;
const SAME_FACTION_BONUS: i32 = 1;
const HOSTILE_PENALTY: i32 = -1;

/// Co-located characters interact; stored intimacy drifts back toward neutral.
pub struct RelationshipSystem;

impl SimSystem for RelationshipSystem {
    fn name(&self) -> &str {
        "relationships"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Daily
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        interact(ctx);
        let interval = ctx.config.relationships.decay_interval;
        if interval > 0 && ctx.world.tick % interval == 0 {
            decay(ctx);
        }
    }
}

fn co_located_pairs(world: &World) -> Vec<(u64, u64)> {
    let mut by_city: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
    for c in world.characters.values() {
        if let Some(city) = c.location {
            by_city.entry(city).or_default().push(c.id);
        }
    }
    let mut pairs = Vec::new();
    for ids in by_city.values() {
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                pairs.push((a, b));
            }
        }
    }
    pairs
}

fn interact(ctx: &mut TickContext) {
    let chance = ctx.config.relationships.interaction_chance;
    for (a, b) in co_located_pairs(ctx.world) {
        if !ctx.rng.random_bool(chance.clamp(0.0, 1.0)) {
            continue;
        }
        let mut delta = ctx
            .rng
            .random_range(MIN_INTERACTION_DELTA..=MAX_INTERACTION_DELTA);
        match (ctx.world.faction_of(a), ctx.world.faction_of(b)) {
            (Some(fa), Some(fb)) if fa == fb => delta += SAME_FACTION_BONUS,
            (Some(fa), Some(fb)) if ctx.world.hostile(fa, fb) => delta += HOSTILE_PENALTY,
            _ => {}
        }
        let (applied, kind) = ctx.world.adjust_intimacy(a, b, delta);
        let description = format!(
            "{} and {} spent time together ({applied:+})",
            ctx.world.character_name(a),
            ctx.world.character_name(b)
        );
        record(ctx, a, b, applied, kind, description);
    }
}

fn decay(ctx: &mut TickContext) {
    struct Drift {
        a: u64,
        b: u64,
        step: i32,
        before: RelationshipKind,
    }

    let drifts: Vec<Drift> = ctx
        .world
        .relationships
        .values()
        .filter(|r| r.intimacy != DEFAULT_INTIMACY)
        .map(|r| Drift {
            a: r.a,
            b: r.b,
            step: if r.intimacy > DEFAULT_INTIMACY { -1 } else { 1 },
            before: r.kind(),
        })
        .collect();

    for d in drifts {
        let (applied, kind) = ctx.world.adjust_intimacy(d.a, d.b, d.step);
        if kind != d.before {
            let description = format!(
                "{} and {} drifted apart with time",
                ctx.world.character_name(d.a),
                ctx.world.character_name(d.b)
            );
            record(ctx, d.a, d.b, applied, kind, description);
        }
    }
}

fn record(
    ctx: &mut TickContext,
    a: u64,
    b: u64,
    delta: i32,
    kind: RelationshipKind,
    description: String,
) {
    debug!(a, b, delta, kind = %kind, "relationship changed");
    let event_id = ctx.world.log_relationship(a, b, delta, kind, description);
    ctx.report.relationship_events.push(RelationshipEvent {
        event_id,
        a,
        b,
        delta,
        kind,
    });
}
