//! Live entity instances

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::dungeon::Pos;
use crate::object::Item;

use super::{Species, SpeciesId};

/// Generation-checked handle to an entity slot.
///
/// Index 0 is never handed out. A handle to a freed slot keeps its old
/// generation and so stops resolving once the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EntityId {
    pub index: u16,
    pub generation: u32,
}

impl EntityId {
    /// The reserved invalid handle
    pub const NONE: EntityId = EntityId {
        index: 0,
        generation: 0,
    };

    pub const fn is_none(&self) -> bool {
        self.index == 0
    }
}

bitflags! {
    /// Moral leaning of an individual
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct SubAlign: u8 {
        const GOOD = 0x01;
        const EVIL = 0x02;
    }
}

impl Serialize for SubAlign {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SubAlign {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(SubAlign::from_bits_truncate(bits))
    }
}

/// Relationship to the watcher
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Attitude {
    #[default]
    Hostile,
    Friendly,
    Pet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Disposition {
    pub align: SubAlign,
    pub attitude: Attitude,
}

/// Status timers, in turns remaining; zero means inactive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusTimers {
    pub sleep: i32,
    pub confusion: i32,
    pub stun: i32,
    pub fear: i32,
    pub haste: i32,
    pub slow: i32,
    pub invulnerable: i32,
}

impl StatusTimers {
    pub fn asleep(&self) -> bool {
        self.sleep > 0
    }

    pub fn confused(&self) -> bool {
        self.confusion > 0
    }

    pub fn stunned(&self) -> bool {
        self.stun > 0
    }

    pub fn afraid(&self) -> bool {
        self.fear > 0
    }

    pub fn hasted(&self) -> bool {
        self.haste > 0
    }

    pub fn slowed(&self) -> bool {
        self.slow > 0
    }

    pub fn invulnerable(&self) -> bool {
        self.invulnerable > 0
    }

    /// Count every active timer down by one
    pub fn tick(&mut self) {
        for timer in [
            &mut self.sleep,
            &mut self.confusion,
            &mut self.stun,
            &mut self.fear,
            &mut self.haste,
            &mut self.slow,
            &mut self.invulnerable,
        ] {
            if *timer > 0 {
                *timer -= 1;
            }
        }
    }
}

/// A cell the entity is chasing regardless of the watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PursuitTarget {
    pub pos: Pos,
    /// Forget after the next action (a counter-attack memory)
    pub one_shot: bool,
}

/// A live entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub species: SpeciesId,
    /// What the watcher believes it is
    pub apparent: SpeciesId,
    pub pos: Pos,

    pub hp: i32,
    pub max_hp: i32,
    /// Ceiling `max_hp` can recover to after draining
    pub max_max_hp: i32,

    /// Base speed rolled at creation
    pub speed: i16,
    /// Energy debt; acts once this drops to zero or below
    pub energy_need: i32,

    pub timers: StatusTimers,
    pub disposition: Disposition,

    /// Pathing degraded: ignore the flow field for safety scoring
    pub no_flow: bool,
    /// Created during the current tick
    pub born_this_tick: bool,
    /// Currently visible to the watcher
    pub in_view: bool,
    /// A shapechanger wearing another form
    pub disguised: bool,
    /// Cached distance to the watcher
    pub watcher_dist: i32,

    pub target: Option<PursuitTarget>,
    pub parent: Option<EntityId>,
    pub nickname: Option<String>,
    pub held: Vec<Item>,

    /// Times it has warned of retreating at low health
    pub pinch_warnings: u8,
}

impl Entity {
    pub fn new(id: EntityId, species_id: SpeciesId, species: &Species, pos: Pos, hp: i32) -> Self {
        Self {
            id,
            species: species_id,
            apparent: species_id,
            pos,
            hp,
            max_hp: hp,
            max_max_hp: hp,
            speed: species.speed,
            energy_need: 0,
            timers: StatusTimers::default(),
            disposition: Disposition {
                align: species.alignment(),
                attitude: Attitude::Hostile,
            },
            no_flow: false,
            born_this_tick: false,
            in_view: false,
            disguised: false,
            watcher_dist: 0,
            target: None,
            parent: None,
            nickname: None,
            held: Vec::new(),
            pinch_warnings: 0,
        }
    }

    pub fn is_pet(&self) -> bool {
        self.disposition.attitude == Attitude::Pet
    }

    pub fn is_friendly(&self) -> bool {
        self.disposition.attitude == Attitude::Friendly
    }

    pub fn is_hostile(&self) -> bool {
        self.disposition.attitude == Attitude::Hostile
    }

    pub fn set_hostile(&mut self) {
        self.disposition.attitude = Attitude::Hostile;
    }

    pub fn is_dead(&self) -> bool {
        self.hp < 0
    }

    /// Restore hp without passing the ceiling
    pub fn heal(&mut self, amount: i32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }
}

/// Decide whether `a` wants to fight `b`
pub fn are_enemies(a: &Entity, b: &Entity, b_species: &Species) -> bool {
    if b_species.is_hostile_to(a.disposition.align) && !(a.disguised && b.disguised) {
        return true;
    }
    a.is_hostile() != b.is_hostile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monster::SpeciesFlags;

    fn entity(index: u16, species: &Species) -> Entity {
        let id = EntityId {
            index,
            generation: 1,
        };
        Entity::new(id, SpeciesId(0), species, Pos::new(1, 1), 10)
    }

    #[test]
    fn test_timers_tick_to_zero() {
        let mut t = StatusTimers {
            sleep: 2,
            fear: 1,
            ..Default::default()
        };
        t.tick();
        assert!(t.asleep());
        assert!(!t.afraid());
        t.tick();
        t.tick();
        assert_eq!(t.sleep, 0);
    }

    #[test]
    fn test_hostile_and_pet_are_enemies() {
        let plain = Species::new("orc", 5);
        let a = entity(1, &plain);
        let mut b = entity(2, &plain);
        assert!(!are_enemies(&a, &b, &plain));
        b.disposition.attitude = Attitude::Pet;
        assert!(are_enemies(&a, &b, &plain));
        assert!(are_enemies(&b, &a, &plain));
    }

    #[test]
    fn test_alignment_makes_enemies() {
        let angel = Species::new("angel", 20).with_flags(SpeciesFlags::GOOD);
        let demon = Species::new("imp", 5).with_flags(SpeciesFlags::EVIL);
        let a = entity(1, &angel);
        let b = entity(2, &demon);
        assert!(are_enemies(&a, &b, &demon));
        assert!(are_enemies(&b, &a, &angel));
    }

    #[test]
    fn test_heal_caps_at_max() {
        let s = Species::new("orc", 5);
        let mut e = entity(1, &s);
        e.hp = 3;
        e.heal(50);
        assert_eq!(e.hp, e.max_hp);
    }

    #[test]
    fn test_none_id() {
        assert!(EntityId::NONE.is_none());
        assert!(!EntityId { index: 3, generation: 0 }.is_none());
    }
}
