//! Species templates
//!
//! Species are authored content: the engine only reads them. A level shares
//! one table through an `Arc` so entities carry a small id instead of a copy.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::combat::{Blow, BlowSet, Dice, Resistances};
use crate::consts::{MAX_BLOWS, NORMAL_SPEED};
use crate::rng::GameRng;

use super::SubAlign;

/// Index into a [`SpeciesTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SpeciesId(pub u16);

bitflags! {
    /// Behaviour and body flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct SpeciesFlags: u64 {
        // Terrain handling
        const OPEN_DOOR = 1 << 0;
        const BASH_DOOR = 1 << 1;
        const PASS_WALL = 1 << 2;
        const KILL_WALL = 1 << 3;
        const CAN_FLY = 1 << 4;

        // Items and bodies in the way
        const TAKE_ITEM = 1 << 5;
        const KILL_ITEM = 1 << 6;
        const MOVE_BODY = 1 << 7;
        const KILL_BODY = 1 << 8;

        // Movement style
        const NEVER_MOVE = 1 << 9;
        const NEVER_BLOW = 1 << 10;
        const RAND_25 = 1 << 11;
        const RAND_50 = 1 << 12;
        const FRIENDS = 1 << 13;
        const MULTIPLY = 1 << 14;

        // Nature
        const ANIMAL = 1 << 15;
        const UNIQUE = 1 << 16;
        const QUESTOR = 1 << 17;
        const EVIL = 1 << 18;
        const GOOD = 1 << 19;
        const UNDEAD = 1 << 20;
        const NONLIVING = 1 << 21;
        const DEMON = 1 << 22;
        const DRAGON = 1 << 23;
        const STUPID = 1 << 24;

        // Oddities
        const CAN_SPEAK = 1 << 25;
        const HEAVY_STEPS = 1 << 26;
        const QUANTUM = 1 << 27;
        const SELF_DESTRUCT = 1 << 28;
        const RIDEABLE = 1 << 29;
        const SHAPECHANGER = 1 << 30;

        // Defences
        const NO_FEAR = 1 << 31;
        const NO_SLEEP = 1 << 32;
        const NO_CONF = 1 << 33;
        const AURA_FIRE = 1 << 34;
        const AURA_COLD = 1 << 35;
        const AURA_ELEC = 1 << 36;

        /// Has at least one offensive spell
        const ATTACK_SPELLS = 1 << 37;
    }
}

impl Serialize for SpeciesFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SpeciesFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u64::deserialize(deserializer)?;
        Ok(SpeciesFlags::from_bits_truncate(bits))
    }
}

/// Species template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    pub name: String,
    pub level: i32,
    pub speed: i16,
    /// Distance at which it notices the watcher
    pub sense_radius: i32,
    pub ac: i32,
    /// Experience value; also its weight in body-shoving contests
    pub exp: i32,
    pub hit_dice: Dice,
    /// Percent chance per turn to try a spell
    pub cast_frequency: i32,
    pub flags: SpeciesFlags,
    pub resists: Resistances,
    pub blows: BlowSet,
    /// Species scattered by the passive area special
    pub swarm: Option<SpeciesId>,
}

impl Species {
    pub fn new(name: impl Into<String>, level: i32) -> Self {
        Self {
            name: name.into(),
            level,
            speed: NORMAL_SPEED,
            sense_radius: 20,
            ac: 20,
            exp: level.max(1) * 10,
            hit_dice: Dice::new(4, 8),
            cast_frequency: 0,
            flags: SpeciesFlags::empty(),
            resists: Resistances::empty(),
            blows: [Blow::NONE; MAX_BLOWS],
            swarm: None,
        }
    }

    pub fn with_speed(mut self, speed: i16) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_flags(mut self, flags: SpeciesFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_resists(mut self, resists: Resistances) -> Self {
        self.resists |= resists;
        self
    }

    pub fn with_hit_dice(mut self, num: i32, sides: i32) -> Self {
        self.hit_dice = Dice::new(num, sides);
        self
    }

    pub fn with_ac(mut self, ac: i32) -> Self {
        self.ac = ac;
        self
    }

    pub fn with_sense_radius(mut self, radius: i32) -> Self {
        self.sense_radius = radius;
        self
    }

    pub fn with_cast_frequency(mut self, pct: i32) -> Self {
        self.cast_frequency = pct;
        self
    }

    pub fn with_exp(mut self, exp: i32) -> Self {
        self.exp = exp;
        self
    }

    pub fn with_swarm(mut self, swarm: SpeciesId) -> Self {
        self.swarm = Some(swarm);
        self
    }

    /// Fill blow slots in order; extra blows are ignored
    pub fn with_blows(mut self, blows: &[Blow]) -> Self {
        for (slot, blow) in self.blows.iter_mut().zip(blows) {
            *slot = *blow;
        }
        self
    }

    pub fn has(&self, flag: SpeciesFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_living(&self) -> bool {
        !self
            .flags
            .intersects(SpeciesFlags::UNDEAD | SpeciesFlags::NONLIVING | SpeciesFlags::DEMON)
    }

    /// Can tunnel or phase through rock
    pub fn has_wall_power(&self) -> bool {
        self.flags
            .intersects(SpeciesFlags::PASS_WALL | SpeciesFlags::KILL_WALL)
    }

    pub fn can_handle_doors(&self) -> bool {
        self.flags
            .intersects(SpeciesFlags::OPEN_DOOR | SpeciesFlags::BASH_DOOR)
    }

    /// Moral alignment implied by its flags
    pub fn alignment(&self) -> SubAlign {
        let mut align = SubAlign::empty();
        if self.has(SpeciesFlags::GOOD) {
            align |= SubAlign::GOOD;
        }
        if self.has(SpeciesFlags::EVIL) {
            align |= SubAlign::EVIL;
        }
        align
    }

    /// Offends a creature of the given sub-alignment
    pub fn is_hostile_to(&self, align: SubAlign) -> bool {
        (self.has(SpeciesFlags::EVIL) && align.contains(SubAlign::GOOD))
            || (self.has(SpeciesFlags::GOOD) && align.contains(SubAlign::EVIL))
    }

    /// Roll a fresh hit point total
    pub fn roll_hp(&self, rng: &mut GameRng) -> i32 {
        if self.has(SpeciesFlags::UNIQUE) {
            self.hit_dice.max()
        } else {
            self.hit_dice.roll(rng).max(1)
        }
    }
}

/// The shared species table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeciesTable {
    species: Vec<Species>,
}

impl SpeciesTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, species: Species) -> SpeciesId {
        self.species.push(species);
        SpeciesId((self.species.len() - 1) as u16)
    }

    pub fn get(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// A random non-unique form for a shapechanger to wear
    pub fn random_disguise(&self, rng: &mut GameRng, current: SpeciesId) -> Option<SpeciesId> {
        let forms: Vec<SpeciesId> = self
            .species
            .iter()
            .enumerate()
            .filter(|(idx, s)| *idx != current.0 as usize && !s.has(SpeciesFlags::UNIQUE))
            .map(|(idx, _)| SpeciesId(idx as u16))
            .collect();
        rng.choose(&forms).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{BlowEffect, BlowMethod};

    #[test]
    fn test_builder_fills_blows_in_order() {
        let s = Species::new("jackal", 1).with_blows(&[
            Blow::new(BlowMethod::Bite, BlowEffect::Hurt, 1, 3),
            Blow::new(BlowMethod::Bite, BlowEffect::Hurt, 1, 3),
        ]);
        assert!(s.blows[0].is_active());
        assert!(s.blows[1].is_active());
        assert!(!s.blows[2].is_active());
    }

    #[test]
    fn test_living_and_alignment() {
        let s = Species::new("ghoul", 10).with_flags(SpeciesFlags::UNDEAD | SpeciesFlags::EVIL);
        assert!(!s.is_living());
        assert_eq!(s.alignment(), SubAlign::EVIL);
        assert!(s.is_hostile_to(SubAlign::GOOD));
        assert!(!s.is_hostile_to(SubAlign::EVIL));
        assert!(!s.is_hostile_to(SubAlign::empty()));
    }

    #[test]
    fn test_unique_hp_is_maximal() {
        let mut rng = GameRng::new(3);
        let s = Species::new("boss", 20)
            .with_flags(SpeciesFlags::UNIQUE)
            .with_hit_dice(10, 10);
        assert_eq!(s.roll_hp(&mut rng), 100);
    }

    #[test]
    fn test_random_disguise_skips_uniques_and_self() {
        let mut table = SpeciesTable::new();
        let me = table.add(Species::new("mimic", 5).with_flags(SpeciesFlags::SHAPECHANGER));
        table.add(Species::new("boss", 30).with_flags(SpeciesFlags::UNIQUE));
        let rat = table.add(Species::new("rat", 1));
        let mut rng = GameRng::new(11);
        for _ in 0..20 {
            assert_eq!(table.random_disguise(&mut rng, me), Some(rat));
        }
    }
}
