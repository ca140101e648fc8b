//! Damage types and resistances
//!
//! These define WHAT kind of harm a landed blow carries and how a
//! defender's resistances cut it down.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::rng::GameRng;

/// What kind of damage a blow deals
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum DamageType {
    /// Plain blunt or cutting force
    #[default]
    Physical = 0,
    Poison = 1,
    Disenchant = 2,
    Acid = 3,
    Elec = 4,
    Fire = 5,
    Cold = 6,
    Confusion = 7,
    Nether = 8,
    Time = 9,
    /// Life drain; harmless to the unliving
    Drain = 10,
    Inertia = 11,
    Sound = 12,
    Mana = 13,
}

bitflags! {
    /// Defensive resistances
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Resistances: u16 {
        const IM_FIRE = 0x0001;
        const IM_COLD = 0x0002;
        const IM_ELEC = 0x0004;
        const IM_ACID = 0x0008;
        const IM_POIS = 0x0010;
        const RES_NETHER = 0x0020;
        const RES_TIME = 0x0040;
        const RES_DISEN = 0x0080;
        const RES_SOUND = 0x0100;
        const RES_INERTIA = 0x0200;
        const RES_CONF = 0x0400;
        /// Shrugs off everything
        const RES_ALL = 0x8000;
    }
}

impl Serialize for Resistances {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Resistances {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u16::deserialize(deserializer)?;
        Ok(Resistances::from_bits_truncate(bits))
    }
}

/// The part of a defender that matters for damage adjustment
#[derive(Debug, Clone, Copy, Default)]
pub struct DefenderTraits {
    pub resists: Resistances,
    pub living: bool,
    pub undead: bool,
    /// Immune to confusion regardless of resistances
    pub no_conf: bool,
}

/// Lingering status a damage type leaves on a defender that did not resist it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusHit {
    Stun,
    Confuse,
    Slow,
}

impl DamageType {
    /// Immunity (damage divided by nine) rather than partial resistance
    pub const fn immunity(&self) -> Option<Resistances> {
        match self {
            DamageType::Fire => Some(Resistances::IM_FIRE),
            DamageType::Cold => Some(Resistances::IM_COLD),
            DamageType::Elec => Some(Resistances::IM_ELEC),
            DamageType::Acid => Some(Resistances::IM_ACID),
            DamageType::Poison => Some(Resistances::IM_POIS),
            _ => None,
        }
    }

    /// Partial resistance for the exotic damage types
    pub const fn resistance(&self) -> Option<Resistances> {
        match self {
            DamageType::Nether => Some(Resistances::RES_NETHER),
            DamageType::Time => Some(Resistances::RES_TIME),
            DamageType::Disenchant => Some(Resistances::RES_DISEN),
            DamageType::Sound => Some(Resistances::RES_SOUND),
            DamageType::Inertia => Some(Resistances::RES_INERTIA),
            DamageType::Confusion => Some(Resistances::RES_CONF),
            _ => None,
        }
    }

    /// Status the damage type inflicts when not resisted
    pub const fn status(&self) -> Option<StatusHit> {
        match self {
            DamageType::Sound => Some(StatusHit::Stun),
            DamageType::Confusion => Some(StatusHit::Confuse),
            DamageType::Inertia => Some(StatusHit::Slow),
            _ => None,
        }
    }

    /// Apply the defender's resistances to raw damage.
    ///
    /// Returns the adjusted damage and whether the defender resisted the
    /// damage type's secondary status.
    pub fn adjust(&self, damage: i32, def: &DefenderTraits, rng: &mut GameRng) -> (i32, bool) {
        if def.resists.contains(Resistances::RES_ALL) {
            return (0, true);
        }
        if let Some(flag) = self.immunity()
            && def.resists.contains(flag)
        {
            return (damage / 9, true);
        }
        match self {
            DamageType::Nether if def.undead => return (0, true),
            DamageType::Drain if !def.living => return (0, true),
            DamageType::Confusion if def.no_conf => {
                return (damage * 3 / (rng.rand1(6) + 6), true);
            }
            _ => {}
        }
        if let Some(flag) = self.resistance()
            && def.resists.contains(flag)
        {
            let divisor = rng.rand1(6) + 6;
            let num = if matches!(self, DamageType::Sound) { 2 } else { 3 };
            return (damage * num / divisor, true);
        }
        (damage, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn living() -> DefenderTraits {
        DefenderTraits {
            living: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_immunity_divides_by_nine() {
        let mut rng = GameRng::new(1);
        let def = DefenderTraits {
            resists: Resistances::IM_FIRE,
            ..living()
        };
        assert_eq!(DamageType::Fire.adjust(45, &def, &mut rng), (5, true));
        assert_eq!(DamageType::Cold.adjust(45, &def, &mut rng), (45, false));
    }

    #[test]
    fn test_res_all_blocks_everything() {
        let mut rng = GameRng::new(1);
        let def = DefenderTraits {
            resists: Resistances::RES_ALL,
            ..living()
        };
        assert_eq!(DamageType::Physical.adjust(30, &def, &mut rng).0, 0);
        assert_eq!(DamageType::Mana.adjust(30, &def, &mut rng).0, 0);
    }

    #[test]
    fn test_drain_harmless_to_unliving() {
        let mut rng = GameRng::new(1);
        let def = DefenderTraits::default();
        assert_eq!(DamageType::Drain.adjust(20, &def, &mut rng), (0, true));
        assert_eq!(DamageType::Drain.adjust(20, &living(), &mut rng), (20, false));
    }

    #[test]
    fn test_nether_spares_undead() {
        let mut rng = GameRng::new(1);
        let def = DefenderTraits {
            undead: true,
            ..Default::default()
        };
        assert_eq!(DamageType::Nether.adjust(20, &def, &mut rng).0, 0);
    }

    #[test]
    fn test_partial_resistance_bounds() {
        let mut rng = GameRng::new(5);
        let def = DefenderTraits {
            resists: Resistances::RES_TIME,
            ..living()
        };
        for _ in 0..100 {
            let (dam, resisted) = DamageType::Time.adjust(60, &def, &mut rng);
            assert!(resisted);
            assert!((15..=25).contains(&dam), "got {dam}");
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(DamageType::Sound.status(), Some(StatusHit::Stun));
        assert_eq!(DamageType::Fire.status(), None);
    }
}
