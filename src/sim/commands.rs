//! Player command intake.
//!
//! Commands are drained from the world at the start of each tick. Every
//! handler checks all of its preconditions before touching any state, so a
//! rejected command leaves no trace beyond a debug line.

use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::model::city::MAX_DEVELOPMENT;
use crate::model::{
    Command, District, EventKind, Improvement, MissionKind, Role, Skill, Tactic, Tech, UnitType,
    World,
};
use crate::sim::context::TickContext;
use crate::sim::diplomacy::proposals::{can_propose, demand_tribute, propose_alliance};
use crate::sim::diplomacy::{agree_ceasefire, break_alliance};
use crate::sim::espionage::dispatch_spy;
use crate::sim::helpers::{is_free, travel_days};
use crate::sim::lifecycle;
use crate::sim::report::{Recruit, RecruitmentResult};
use crate::sim::system::{SimSystem, TickFrequency};

const BARRACKS_DISCOUNT: u32 = 2;
const ACADEMY_DISCOUNT: f64 = 0.25;
const HIRE_BASE_CHANCE: f64 = 0.5;
const HIRE_CHARM_WEIGHT: f64 = 0.05;
const HIRE_MIN_CHANCE: f64 = 0.1;
const HIRE_MAX_CHANCE: f64 = 0.9;

/// Why a queued command was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandRejection {
    #[error("there is no player faction")]
    NoPlayer,
    #[error("character {0} does not exist")]
    UnknownCharacter(u64),
    #[error("city {0} does not exist")]
    UnknownCity(u64),
    #[error("faction {0} does not exist")]
    UnknownFaction(u64),
    #[error("character {0} does not serve the player")]
    NotOurs(u64),
    #[error("city {0} is not held by the player")]
    NotOwned(u64),
    #[error("character {0} is busy or has no location")]
    Busy(u64),
    #[error("city {city} cannot afford {cost} gold")]
    Unaffordable { city: u64, cost: u32 },
    #[error("city {to} cannot be reached from {from}")]
    Unreachable { from: u64, to: u64 },
    #[error("city {0} is not a valid destination")]
    InvalidTarget(u64),
    #[error("amount must be positive")]
    ZeroAmount,
    #[error("district {0} already stands in the city")]
    DuplicateDistrict(District),
    #[error("city {0} has no room for another district")]
    DistrictCap(u64),
    #[error("city {0} already has an improvement")]
    ImprovementTaken(u64),
    #[error("city {0} is fully developed")]
    FullyDeveloped(u64),
    #[error("{0} is already known")]
    AlreadyResearched(Tech),
    #[error("character {0} cannot be hired")]
    NotForHire(u64),
    #[error("faction {0} does not meet the player's terms")]
    ProposalGated(u64),
    #[error("faction {0} is not an ally")]
    NotAllied(u64),
    #[error("faction {0} has made no ceasefire offer")]
    NoCeasefireOffer(u64),
    #[error("mentorship is not possible")]
    CannotMentor,
    #[error("no event card is pending")]
    NoPendingCard,
    #[error("event card has no choice {0}")]
    InvalidChoice(usize),
}

/// Drains and applies the player's queued commands, in queue order.
pub struct CommandSystem;

impl SimSystem for CommandSystem {
    fn name(&self) -> &str {
        "commands"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Daily
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let queue = std::mem::take(&mut ctx.world.pending_commands);
        for command in queue {
            if let Err(rejection) = execute(ctx, &command) {
                debug!(command = command.label(), %rejection, "command dropped");
            }
        }
    }
}

/// Validate and apply a single command.
pub fn execute(ctx: &mut TickContext, command: &Command) -> Result<(), CommandRejection> {
    let player = ctx.world.player_faction.ok_or(CommandRejection::NoPlayer)?;
    if !ctx.world.factions.contains_key(&player) {
        return Err(CommandRejection::NoPlayer);
    }
    match *command {
        Command::Attack {
            character,
            city,
            tactic,
        } => attack(ctx, player, character, city, tactic),
        Command::Move { character, city } => move_to(ctx, player, character, city),
        Command::Recruit { city, unit, amount } => recruit(ctx, player, city, unit, amount),
        Command::Hire { city, character } => hire(ctx, player, city, character),
        Command::BuildDistrict { city, district } => build_district(ctx, player, city, district),
        Command::Improve { city, improvement } => improve(ctx, player, city, improvement),
        Command::Develop { city } => develop(ctx, player, city),
        Command::Research { city, tech } => research(ctx, player, city, tech),
        Command::Spy {
            character,
            city,
            mission,
        } => spy(ctx, player, character, city, mission),
        Command::ProposeAlliance { faction } => {
            rival(ctx.world, player, faction)?;
            if !can_propose(ctx.world, &ctx.config.diplomacy, player, faction) {
                return Err(CommandRejection::ProposalGated(faction));
            }
            propose_alliance(ctx, player, faction);
            Ok(())
        }
        Command::BreakAlliance { faction } => {
            rival(ctx.world, player, faction)?;
            if !ctx.world.are_allied(player, faction) {
                return Err(CommandRejection::NotAllied(faction));
            }
            break_alliance(ctx, player, faction);
            Ok(())
        }
        Command::DemandTribute { faction, amount } => {
            rival(ctx.world, player, faction)?;
            if amount == 0 {
                return Err(CommandRejection::ZeroAmount);
            }
            demand_tribute(ctx, player, faction, amount);
            Ok(())
        }
        Command::AcceptCeasefire { faction } => {
            rival(ctx.world, player, faction)?;
            if !ctx.world.ceasefire_offers.contains(&faction) {
                return Err(CommandRejection::NoCeasefireOffer(faction));
            }
            agree_ceasefire(ctx, player, faction);
            Ok(())
        }
        Command::SetRole { character, role } => set_role(ctx.world, player, character, role),
        Command::Mentor {
            mentor,
            student,
            skill,
        } => teach(ctx.world, player, mentor, student, skill),
        Command::ResolveEventCard { choice } => resolve_card(ctx.world, player, choice),
    }
}

// -- Shared checks --

fn rival(world: &World, player: u64, faction: u64) -> Result<(), CommandRejection> {
    if faction == player || !world.factions.contains_key(&faction) {
        return Err(CommandRejection::UnknownFaction(faction));
    }
    Ok(())
}

fn our_character(world: &World, player: u64, character: u64) -> Result<(), CommandRejection> {
    if !world.is_alive(character) {
        return Err(CommandRejection::UnknownCharacter(character));
    }
    if world.faction_of(character) != Some(player) {
        return Err(CommandRejection::NotOurs(character));
    }
    Ok(())
}

/// A free player character and the city they stand in.
fn free_character(world: &World, player: u64, character: u64) -> Result<u64, CommandRejection> {
    our_character(world, player, character)?;
    if !is_free(world, character) {
        return Err(CommandRejection::Busy(character));
    }
    world
        .character(character)
        .and_then(|c| c.location)
        .ok_or(CommandRejection::Busy(character))
}

fn our_city(world: &World, player: u64, city: u64) -> Result<(), CommandRejection> {
    if world.city(city).is_none() {
        return Err(CommandRejection::UnknownCity(city));
    }
    if world.city_faction(city) != Some(player) {
        return Err(CommandRejection::NotOwned(city));
    }
    Ok(())
}

fn affordable(world: &World, city: u64, cost: u32) -> Result<(), CommandRejection> {
    let gold = world.city(city).map(|c| c.gold).unwrap_or(0);
    if gold < cost {
        return Err(CommandRejection::Unaffordable { city, cost });
    }
    Ok(())
}

fn reachable(world: &World, from: u64, to: u64) -> Result<(), CommandRejection> {
    if !world.reachable(from, to) {
        return Err(CommandRejection::Unreachable { from, to });
    }
    Ok(())
}

/// Pay a cost already checked by [`affordable`].
fn pay(world: &mut World, city: u64, cost: u32) {
    if let Some(c) = world.cities.get_mut(&city) {
        c.spend(cost);
    }
}

// -- Military --

fn attack(
    ctx: &mut TickContext,
    player: u64,
    character: u64,
    city: u64,
    tactic: Option<Tactic>,
) -> Result<(), CommandRejection> {
    let origin = free_character(ctx.world, player, character)?;
    if ctx.world.city(city).is_none() {
        return Err(CommandRejection::UnknownCity(city));
    }
    let valid = match ctx.world.city_faction(city) {
        Some(owner) => ctx.world.hostile(player, owner),
        None => true,
    };
    if !valid || city == origin {
        return Err(CommandRejection::InvalidTarget(city));
    }
    reachable(ctx.world, origin, city)?;

    let arrival = ctx.world.tick + travel_days(ctx.world, ctx.config, Some(player));
    ctx.world.add_movement(character, origin, city, arrival);
    if let Some(tactic) = tactic {
        ctx.world.queued_tactics.insert(character, tactic);
    }
    debug!(character, city, arrival, "attack ordered");
    Ok(())
}

fn move_to(
    ctx: &mut TickContext,
    player: u64,
    character: u64,
    city: u64,
) -> Result<(), CommandRejection> {
    let origin = free_character(ctx.world, player, character)?;
    if ctx.world.city(city).is_none() {
        return Err(CommandRejection::UnknownCity(city));
    }
    let friendly = ctx
        .world
        .city_faction(city)
        .is_some_and(|owner| owner == player || ctx.world.are_allied(player, owner));
    if !friendly || city == origin {
        return Err(CommandRejection::InvalidTarget(city));
    }
    reachable(ctx.world, origin, city)?;

    let arrival = ctx.world.tick + travel_days(ctx.world, ctx.config, Some(player));
    ctx.world.add_movement(character, origin, city, arrival);
    Ok(())
}

pub fn recruit_cost(world: &World, city: u64, per_unit: u32, amount: u32) -> u32 {
    let barracks = world
        .city(city)
        .is_some_and(|c| c.has_district(District::Barracks));
    let unit = if barracks {
        per_unit.saturating_sub(BARRACKS_DISCOUNT)
    } else {
        per_unit
    };
    unit.saturating_mul(amount)
}

fn recruit(
    ctx: &mut TickContext,
    player: u64,
    city: u64,
    unit: UnitType,
    amount: u32,
) -> Result<(), CommandRejection> {
    if amount == 0 {
        return Err(CommandRejection::ZeroAmount);
    }
    our_city(ctx.world, player, city)?;
    let cost = recruit_cost(ctx.world, city, ctx.config.economy.recruit_cost, amount);
    affordable(ctx.world, city, cost)?;

    if let Some(c) = ctx.world.cities.get_mut(&city) {
        c.spend(cost);
        c.garrison = c.garrison.saturating_add(amount);
        c.units.add(unit, amount);
    }
    ctx.report.recruitment.push(RecruitmentResult {
        city,
        faction: player,
        recruit: Recruit::Troops { unit, amount },
        cost,
    });
    Ok(())
}

/// Chance an unaffiliated character accepts service, from the leader's charm.
pub fn hire_chance(leader_charm: u32) -> f64 {
    (HIRE_BASE_CHANCE + (leader_charm as f64 - 5.0) * HIRE_CHARM_WEIGHT)
        .clamp(HIRE_MIN_CHANCE, HIRE_MAX_CHANCE)
}

fn hire(
    ctx: &mut TickContext,
    player: u64,
    city: u64,
    character: u64,
) -> Result<(), CommandRejection> {
    our_city(ctx.world, player, city)?;
    let Some(candidate) = ctx.world.character(character) else {
        return Err(CommandRejection::UnknownCharacter(character));
    };
    let unaffiliated = ctx.world.faction_of(character).is_none();
    if !unaffiliated || candidate.location != Some(city) || ctx.world.is_busy(character) {
        return Err(CommandRejection::NotForHire(character));
    }
    let cost = ctx.config.economy.hire_cost;
    affordable(ctx.world, city, cost)?;

    // The fee is paid whether or not they accept.
    pay(ctx.world, city, cost);
    let charm = ctx
        .world
        .leader_of(player)
        .and_then(|l| ctx.world.character(l))
        .map(|l| l.stats.charm)
        .unwrap_or(0);
    let accepted = ctx.rng.random_bool(hire_chance(charm));
    let recruit = if accepted {
        if let Some(f) = ctx.world.factions.get_mut(&player) {
            f.add_member(character);
        }
        let description = format!(
            "{} entered the service of {}",
            ctx.world.character_name(character),
            ctx.world.faction_name(player)
        );
        ctx.world.log(
            EventKind::Recruitment,
            Some(character),
            ctx.world.leader_of(player),
            description,
        );
        Recruit::Hired { character }
    } else {
        Recruit::HireFailed { character }
    };
    ctx.report.recruitment.push(RecruitmentResult {
        city,
        faction: player,
        recruit,
        cost,
    });
    Ok(())
}

// -- Construction --

fn build_district(
    ctx: &mut TickContext,
    player: u64,
    city: u64,
    district: District,
) -> Result<(), CommandRejection> {
    our_city(ctx.world, player, city)?;
    let max = ctx.config.economy.max_districts;
    if let Some(c) = ctx.world.city(city) {
        if c.has_district(district) {
            return Err(CommandRejection::DuplicateDistrict(district));
        }
        if c.districts.len() >= max {
            return Err(CommandRejection::DistrictCap(city));
        }
    }
    let cost = ctx.config.economy.district_cost;
    affordable(ctx.world, city, cost)?;

    if let Some(c) = ctx.world.cities.get_mut(&city) {
        c.spend(cost);
        c.districts.insert(district);
    }
    let description = format!("A {district} was raised in {}", ctx.world.city_name(city));
    ctx.world.log(EventKind::Development, None, None, description);
    Ok(())
}

fn improve(
    ctx: &mut TickContext,
    player: u64,
    city: u64,
    improvement: Improvement,
) -> Result<(), CommandRejection> {
    our_city(ctx.world, player, city)?;
    if ctx.world.city(city).is_some_and(|c| c.improvement.is_some()) {
        return Err(CommandRejection::ImprovementTaken(city));
    }
    let cost = ctx.config.economy.improvement_cost;
    affordable(ctx.world, city, cost)?;

    if let Some(c) = ctx.world.cities.get_mut(&city) {
        c.spend(cost);
        c.improvement = Some(improvement);
    }
    let description = format!("{} built {improvement}", ctx.world.city_name(city));
    ctx.world.log(EventKind::Development, None, None, description);
    Ok(())
}

fn develop(ctx: &mut TickContext, player: u64, city: u64) -> Result<(), CommandRejection> {
    our_city(ctx.world, player, city)?;
    if ctx
        .world
        .city(city)
        .is_some_and(|c| c.development >= MAX_DEVELOPMENT)
    {
        return Err(CommandRejection::FullyDeveloped(city));
    }
    let cost = ctx.config.economy.develop_cost;
    affordable(ctx.world, city, cost)?;

    if let Some(c) = ctx.world.cities.get_mut(&city) {
        c.spend(cost);
        c.develop();
    }
    Ok(())
}

pub fn research_cost(world: &World, city: u64, base: u32) -> u32 {
    let academy = world
        .city(city)
        .is_some_and(|c| c.has_district(District::Academy));
    if academy {
        (base as f64 * (1.0 - ACADEMY_DISCOUNT)).round() as u32
    } else {
        base
    }
}

fn research(
    ctx: &mut TickContext,
    player: u64,
    city: u64,
    tech: Tech,
) -> Result<(), CommandRejection> {
    our_city(ctx.world, player, city)?;
    if ctx.world.faction(player).is_some_and(|f| f.has_tech(tech)) {
        return Err(CommandRejection::AlreadyResearched(tech));
    }
    let cost = research_cost(ctx.world, city, ctx.config.economy.research_cost);
    affordable(ctx.world, city, cost)?;

    pay(ctx.world, city, cost);
    if let Some(f) = ctx.world.factions.get_mut(&player) {
        f.techs.insert(tech);
    }
    let description = format!("{} mastered {tech}", ctx.world.faction_name(player));
    ctx.world
        .log(EventKind::Development, ctx.world.leader_of(player), None, description);
    Ok(())
}

// -- Espionage --

fn spy(
    ctx: &mut TickContext,
    player: u64,
    character: u64,
    target: u64,
    mission: MissionKind,
) -> Result<(), CommandRejection> {
    let origin = free_character(ctx.world, player, character)?;
    if ctx.world.city(target).is_none() {
        return Err(CommandRejection::UnknownCity(target));
    }
    if ctx.world.city_faction(target) == Some(player) {
        return Err(CommandRejection::InvalidTarget(target));
    }
    // The mission is funded from the city the spy leaves.
    our_city(ctx.world, player, origin)?;
    reachable(ctx.world, origin, target)?;
    let cost = ctx.config.espionage.spy_cost;
    affordable(ctx.world, origin, cost)?;

    pay(ctx.world, origin, cost);
    let arrival = ctx.world.tick + ctx.config.movement.spy_travel_days.max(1);
    dispatch_spy(ctx.world, character, origin, target, mission, arrival);
    debug!(character, target, %mission, arrival, "spy dispatched");
    Ok(())
}

// -- Household --

fn set_role(
    world: &mut World,
    player: u64,
    character: u64,
    role: Option<Role>,
) -> Result<(), CommandRejection> {
    our_character(world, player, character)?;
    if let Some(c) = world.characters.get_mut(&character) {
        c.role = role;
    }
    Ok(())
}

fn teach(
    world: &mut World,
    player: u64,
    mentor: u64,
    student: u64,
    skill: Skill,
) -> Result<(), CommandRejection> {
    our_character(world, player, mentor)?;
    our_character(world, player, student)?;
    if !lifecycle::mentor(world, mentor, student, skill) {
        return Err(CommandRejection::CannotMentor);
    }
    Ok(())
}

fn resolve_card(world: &mut World, player: u64, choice: usize) -> Result<(), CommandRejection> {
    let card = world.pending_card.as_ref().ok_or(CommandRejection::NoPendingCard)?;
    let picked = card
        .choices
        .get(choice)
        .cloned()
        .ok_or(CommandRejection::InvalidChoice(choice))?;
    let title = card.title.clone();

    world.pending_card = None;
    if let Some(c) = world.richest_city(player).and_then(|c| world.cities.get_mut(&c)) {
        c.apply_gold_delta(picked.gold);
    }
    if let Some(f) = world.factions.get_mut(&player) {
        f.adjust_morale(picked.morale);
    }
    let description = format!("{title}: {}", picked.label);
    world.log(EventKind::WorldEvent, world.leader_of(player), None, description);
    Ok(())
}
