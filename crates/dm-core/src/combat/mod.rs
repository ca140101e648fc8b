//! Combat system
//!
//! Melee between entities, and entities striking the watcher.

mod attack_type;
mod damage_type;
mod mhitm;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::consts::MAX_BLOWS;
use crate::monster::EntityId;
use crate::rng::GameRng;

pub use attack_type::BlowMethod;
pub use damage_type::{DamageType, DefenderTraits, Resistances, StatusHit};
pub use mhitm::{check_hit, resolve_melee};

/// A dice expression such as `3d6`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dice {
    pub num: i32,
    pub sides: i32,
}

impl Dice {
    pub const fn new(num: i32, sides: i32) -> Self {
        Self { num, sides }
    }

    pub fn roll(&self, rng: &mut GameRng) -> i32 {
        rng.dice(self.num, self.sides)
    }

    pub const fn max(&self) -> i32 {
        self.num * self.sides
    }
}

/// What a landed blow does beyond raw damage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum BlowEffect {
    #[default]
    None,
    Hurt,
    /// Hurt that sometimes crushes through armour
    SuperHurt,
    Poison,
    Disease,
    Disenchant,
    DrainCharges,
    StealGold,
    StealItem,
    EatFood,
    EatLight,
    Blind,
    LoseStat,
    Acid,
    Elec,
    Fire,
    Cold,
    Confuse,
    Terrify,
    Paralyze,
    /// Hurt that shakes the ground on a heavy hit
    Shatter,
    ExpDrain,
    Time,
    /// Life drain; the attacker heals `dmg / heal_divisor` dice
    Drain { heal_divisor: i32 },
    Inertia,
    Stun,
    DrainMana,
}

impl BlowEffect {
    /// Accuracy bonus the effect lends to its blow
    pub const fn power(&self) -> i32 {
        match self {
            BlowEffect::Hurt | BlowEffect::SuperHurt | BlowEffect::Shatter => 60,
            BlowEffect::Disenchant => 20,
            BlowEffect::DrainCharges => 15,
            BlowEffect::Elec
            | BlowEffect::Fire
            | BlowEffect::Cold
            | BlowEffect::Confuse
            | BlowEffect::Terrify => 10,
            BlowEffect::Blind | BlowEffect::Paralyze => 2,
            BlowEffect::None | BlowEffect::Acid | BlowEffect::LoseStat => 0,
            _ => 5,
        }
    }

    /// Damage type the defender's resistances are checked against.
    ///
    /// `None` means the blow does no damage of its own against an entity.
    pub const fn damage_type(&self) -> Option<DamageType> {
        match self {
            BlowEffect::None => None,
            BlowEffect::Poison | BlowEffect::Disease => Some(DamageType::Poison),
            BlowEffect::Disenchant => Some(DamageType::Disenchant),
            BlowEffect::Acid => Some(DamageType::Acid),
            BlowEffect::Elec => Some(DamageType::Elec),
            BlowEffect::Fire => Some(DamageType::Fire),
            BlowEffect::Cold => Some(DamageType::Cold),
            BlowEffect::Confuse => Some(DamageType::Confusion),
            BlowEffect::ExpDrain => Some(DamageType::Nether),
            BlowEffect::Time => Some(DamageType::Time),
            BlowEffect::Drain { .. } => Some(DamageType::Drain),
            BlowEffect::Inertia => Some(DamageType::Inertia),
            BlowEffect::Stun => Some(DamageType::Sound),
            BlowEffect::DrainMana => Some(DamageType::Mana),
            _ => Some(DamageType::Physical),
        }
    }

    /// Armour soaks part of the damage
    pub const fn armour_reduces(&self) -> bool {
        matches!(
            self,
            BlowEffect::Hurt | BlowEffect::SuperHurt | BlowEffect::Shatter
        )
    }
}

/// A single blow definition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blow {
    pub method: BlowMethod,
    pub effect: BlowEffect,
    pub dice: Dice,
}

impl Blow {
    pub const NONE: Blow = Blow::new(BlowMethod::None, BlowEffect::None, 0, 0);

    pub const fn new(method: BlowMethod, effect: BlowEffect, num: i32, sides: i32) -> Self {
        Self {
            method,
            effect,
            dice: Dice::new(num, sides),
        }
    }

    pub const fn is_active(&self) -> bool {
        self.method.is_active()
    }
}

/// A species' blows, in the order they are tried
pub type BlowSet = [Blow; MAX_BLOWS];

/// Who a melee exchange is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeleeTarget {
    Watcher,
    Entity(EntityId),
}

/// Summary of one melee exchange
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeleeOutcome {
    /// Whether any blow was attempted at all
    pub attempted: bool,
    pub blows_landed: u8,
    pub damage_dealt: i32,
    pub defender_died: bool,
    pub attacker_died: bool,
    pub attacker_blinked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_table() {
        assert_eq!(BlowEffect::Hurt.power(), 60);
        assert_eq!(BlowEffect::Shatter.power(), 60);
        assert_eq!(BlowEffect::Terrify.power(), 10);
        assert_eq!(BlowEffect::Paralyze.power(), 2);
        assert_eq!(BlowEffect::Acid.power(), 0);
        assert_eq!(BlowEffect::Drain { heal_divisor: 6 }.power(), 5);
    }

    #[test]
    fn test_effect_damage_types() {
        assert_eq!(BlowEffect::None.damage_type(), None);
        assert_eq!(BlowEffect::Hurt.damage_type(), Some(DamageType::Physical));
        assert_eq!(BlowEffect::Terrify.damage_type(), Some(DamageType::Physical));
        assert_eq!(BlowEffect::Stun.damage_type(), Some(DamageType::Sound));
        assert_eq!(
            BlowEffect::Drain { heal_divisor: 6 }.damage_type(),
            Some(DamageType::Drain)
        );
    }

    #[test]
    fn test_empty_blow() {
        assert!(!Blow::NONE.is_active());
        assert!(Blow::new(BlowMethod::Claw, BlowEffect::Hurt, 1, 4).is_active());
        assert_eq!(Dice::new(3, 6).max(), 18);
    }
}
