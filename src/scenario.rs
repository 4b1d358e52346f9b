use crate::model::*;
use crate::model::character::MAX_STAT;

/// IDs returned by [`Scenario::add_kingdom`] / [`Scenario::add_kingdom_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KingdomIds {
    pub faction: u64,
    pub city: u64,
    pub leader: u64,
}

// -- Builder-style ref types --

/// Typed reference to a faction in a [`Scenario`], enabling chained field mutation.
///
/// Created by [`Scenario::faction`] (creation) or [`Scenario::faction_mut`] (mutation).
/// Call [`.id()`](FactionRef::id) to terminate the chain and extract the ID.
pub struct FactionRef<'a> {
    scenario: &'a mut Scenario,
    id: u64,
}

impl<'a> FactionRef<'a> {
    fn edit(&mut self, f: impl FnOnce(&mut Faction)) {
        if let Some(faction) = self.scenario.world.factions.get_mut(&self.id) {
            f(faction);
        }
    }

    pub fn morale(mut self, v: u32) -> Self { self.edit(|f| f.morale = v); self }
    pub fn color(mut self, v: &str) -> Self { self.edit(|f| f.color = v.to_string()); self }
    pub fn tech(mut self, t: Tech) -> Self { self.edit(|f| { f.techs.insert(t); }); self }
    pub fn member(mut self, character: u64) -> Self { self.edit(|f| f.add_member(character)); self }

    /// Escape hatch: apply an arbitrary closure to the faction.
    pub fn with(mut self, f: impl FnOnce(&mut Faction)) -> Self { self.edit(f); self }

    /// Terminate the chain and return the faction ID.
    pub fn id(self) -> u64 { self.id }
}

/// Typed reference to a city in a [`Scenario`].
pub struct CityRef<'a> {
    scenario: &'a mut Scenario,
    id: u64,
}

impl<'a> CityRef<'a> {
    fn edit(&mut self, f: impl FnOnce(&mut City)) {
        if let Some(city) = self.scenario.world.cities.get_mut(&self.id) {
            f(city);
        }
    }

    pub fn tier(mut self, v: CityTier) -> Self { self.edit(|c| c.tier = v); self }
    pub fn minor(self) -> Self { self.tier(CityTier::Minor) }
    pub fn owner(mut self, character: u64) -> Self { self.edit(|c| c.owner = Some(character)); self }
    pub fn gold(mut self, v: u32) -> Self { self.edit(|c| c.gold = v); self }
    pub fn garrison(mut self, v: u32) -> Self { self.edit(|c| c.garrison = v); self }
    pub fn food(mut self, v: u32) -> Self { self.edit(|c| c.food = v); self }
    pub fn development(mut self, v: u32) -> Self { self.edit(|c| c.development = v); self }
    pub fn specialty(mut self, v: Specialty) -> Self { self.edit(|c| c.specialty = Some(v)); self }
    pub fn improvement(mut self, v: Improvement) -> Self { self.edit(|c| c.improvement = Some(v)); self }
    pub fn district(mut self, d: District) -> Self { self.edit(|c| { c.districts.insert(d); }); self }
    pub fn units(mut self, v: Units) -> Self { self.edit(|c| c.units = v); self }
    pub fn besieged_by(mut self, faction: u64, started: u64) -> Self {
        self.edit(|c| c.siege = Some(Siege { faction, started }));
        self
    }

    pub fn with(mut self, f: impl FnOnce(&mut City)) -> Self { self.edit(f); self }

    pub fn id(self) -> u64 { self.id }
}

/// Typed reference to a character in a [`Scenario`].
pub struct CharacterRef<'a> {
    scenario: &'a mut Scenario,
    id: u64,
}

impl<'a> CharacterRef<'a> {
    fn edit(&mut self, f: impl FnOnce(&mut Character)) {
        if let Some(c) = self.scenario.world.characters.get_mut(&self.id) {
            f(c);
        }
    }

    pub fn at(mut self, city: u64) -> Self { self.edit(|c| c.location = Some(city)); self }
    pub fn member_of(self, faction: u64) -> Self {
        let id = self.id;
        if let Some(f) = self.scenario.world.factions.get_mut(&faction) {
            f.add_member(id);
        }
        self
    }
    pub fn military(mut self, v: u32) -> Self { self.edit(|c| c.stats.military = v.min(MAX_STAT)); self }
    pub fn intelligence(mut self, v: u32) -> Self { self.edit(|c| c.stats.intelligence = v.min(MAX_STAT)); self }
    pub fn charm(mut self, v: u32) -> Self { self.edit(|c| c.stats.charm = v.min(MAX_STAT)); self }
    pub fn traits(mut self, v: Vec<Trait>) -> Self { self.edit(|c| c.traits = v); self }
    pub fn add_trait(mut self, t: Trait) -> Self { self.edit(|c| c.traits.push(t)); self }
    pub fn skill(mut self, skill: Skill, level: u8) -> Self { self.edit(|c| c.skills.set(skill, level)); self }
    pub fn role(mut self, v: Role) -> Self { self.edit(|c| c.role = Some(v)); self }
    pub fn legacy(mut self, v: u32) -> Self { self.edit(|c| c.legacy = v); self }
    pub fn favor(mut self, v: i32) -> Self { self.edit(|c| c.favor = v); self }
    pub fn born(mut self, tick: u64) -> Self { self.edit(|c| c.birth_tick = Some(tick)); self }

    pub fn with(mut self, f: impl FnOnce(&mut Character)) -> Self { self.edit(f); self }

    pub fn id(self) -> u64 { self.id }
}

// -- Scenario --

/// Fluent world builder for tests and demo worlds.
pub struct Scenario {
    world: World,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    pub fn new() -> Self {
        Self { world: World::new() }
    }

    /// Builder whose world clock starts at `tick`.
    pub fn at_tick(tick: u64) -> Self {
        let mut s = Self::new();
        s.world.tick = tick;
        s.world.game_state.tick = tick;
        s
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    // -- Entities --

    /// Create an unaffiliated character.
    pub fn character(&mut self, name: &str) -> CharacterRef<'_> {
        let id = self.world.next_id();
        self.world.upsert_character(Character::new(id, name));
        CharacterRef { scenario: self, id }
    }

    pub fn character_mut(&mut self, id: u64) -> CharacterRef<'_> {
        CharacterRef { scenario: self, id }
    }

    /// Create an unowned major city.
    pub fn city(&mut self, name: &str) -> CityRef<'_> {
        let id = self.world.next_id();
        self.world.upsert_city(City::new(id, name, CityTier::Major));
        CityRef { scenario: self, id }
    }

    pub fn city_mut(&mut self, id: u64) -> CityRef<'_> {
        CityRef { scenario: self, id }
    }

    /// Create a faction led by an existing character.
    pub fn faction(&mut self, name: &str, leader: u64) -> FactionRef<'_> {
        let id = self.world.next_id();
        self.world.upsert_faction(Faction::new(id, name, leader));
        FactionRef { scenario: self, id }
    }

    pub fn faction_mut(&mut self, id: u64) -> FactionRef<'_> {
        FactionRef { scenario: self, id }
    }

    /// A faction with a leader holding one major capital.
    ///
    /// The capital starts with 100 gold, 10 garrison, and 50 food; the
    /// leader has military 10 and stands in the capital.
    pub fn add_kingdom(&mut self, name: &str) -> KingdomIds {
        self.add_kingdom_with(name, |_| {}, |_| {})
    }

    pub fn add_kingdom_with(
        &mut self,
        name: &str,
        modify_faction: impl FnOnce(&mut Faction),
        modify_city: impl FnOnce(&mut City),
    ) -> KingdomIds {
        let leader = self.character(&format!("Lord of {name}")).military(10).id();
        let city = self
            .city(&format!("{name} Capital"))
            .owner(leader)
            .gold(100)
            .garrison(10)
            .with(modify_city)
            .id();
        self.character_mut(leader).at(city);
        let faction = self.faction(name, leader).with(modify_faction).id();
        KingdomIds {
            faction,
            city,
            leader,
        }
    }

    // -- Relations --

    pub fn relate(&mut self, a: u64, b: u64, intimacy: u8) {
        self.world.set_intimacy(a, b, intimacy);
    }

    pub fn ally(&mut self, fa: u64, fb: u64) {
        self.world.alliances.insert(pair_key(fa, fb));
    }

    pub fn trust(&mut self, fa: u64, fb: u64, value: u8) {
        self.world.trust.insert(pair_key(fa, fb), value);
    }

    pub fn connect(&mut self, a: u64, b: u64) {
        self.world.connect(a, b);
    }

    pub fn player(&mut self, faction: u64) {
        self.world.player_faction = Some(faction);
    }

    pub fn build(self) -> World {
        self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kingdom_wires_leader_city_and_faction() {
        let mut s = Scenario::new();
        let shu = s.add_kingdom("Shu");
        let world = s.build();
        assert_eq!(world.city_faction(shu.city), Some(shu.faction));
        assert_eq!(world.leader_of(shu.faction), Some(shu.leader));
        assert_eq!(world.character(shu.leader).unwrap().location, Some(shu.city));
        assert_eq!(world.city(shu.city).unwrap().garrison, 10);
    }

    #[test]
    fn refs_chain_and_return_ids() {
        let mut s = Scenario::new();
        let shu = s.add_kingdom("Shu");
        let zhao = s
            .character("Zhao Yun")
            .at(shu.city)
            .member_of(shu.faction)
            .military(30)
            .add_trait(Trait::Brave)
            .id();
        let world = s.build();
        let c = world.character(zhao).unwrap();
        assert_eq!(c.stats.military, MAX_STAT);
        assert!(c.has_trait(&Trait::Brave));
        assert_eq!(world.faction_of(zhao), Some(shu.faction));
    }
}
