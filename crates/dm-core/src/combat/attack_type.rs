//! Blow delivery methods
//!
//! These define HOW a blow lands, which decides whether it counts as
//! contact (and so trips touch auras) and whether a miss is noticed.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// How a blow is delivered
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum BlowMethod {
    /// Empty blow slot; ends the blow sequence
    #[default]
    None = 0,
    Hit = 1,
    Touch = 2,
    Punch = 3,
    Kick = 4,
    Claw = 5,
    Bite = 6,
    Sting = 7,
    Slash = 8,
    Butt = 9,
    Crush = 10,
    Engulf = 11,
    Charge = 12,
    Crawl = 13,
    Drool = 14,
    Spit = 15,
    /// Destroys the attacker once the blows are done
    Explode = 16,
    Gaze = 17,
    Wail = 18,
    Spore = 19,
    Beg = 20,
    Insult = 21,
    Moan = 22,
    Show = 23,
    /// Ranged; skipped in melee
    Shoot = 24,
}

impl BlowMethod {
    /// Check if this slot holds a blow
    pub const fn is_active(&self) -> bool {
        !matches!(self, BlowMethod::None)
    }

    /// Contact blows provoke the defender's aura
    pub const fn is_contact(&self) -> bool {
        matches!(
            self,
            BlowMethod::Hit
                | BlowMethod::Touch
                | BlowMethod::Punch
                | BlowMethod::Kick
                | BlowMethod::Claw
                | BlowMethod::Bite
                | BlowMethod::Sting
                | BlowMethod::Butt
                | BlowMethod::Crush
                | BlowMethod::Engulf
                | BlowMethod::Charge
                | BlowMethod::Crawl
        )
    }

    /// A miss with one of these still wakes the defender
    pub const fn wakes_on_miss(&self) -> bool {
        matches!(
            self,
            BlowMethod::Hit
                | BlowMethod::Touch
                | BlowMethod::Punch
                | BlowMethod::Kick
                | BlowMethod::Claw
                | BlowMethod::Bite
                | BlowMethod::Sting
                | BlowMethod::Slash
                | BlowMethod::Butt
                | BlowMethod::Crush
                | BlowMethod::Engulf
                | BlowMethod::Charge
        )
    }

    pub const fn is_ranged(&self) -> bool {
        matches!(self, BlowMethod::Shoot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_none_is_inactive() {
        assert!(!BlowMethod::None.is_active());
        assert!(BlowMethod::Bite.is_active());
    }

    #[test]
    fn test_contact_blows_are_not_ranged() {
        for method in BlowMethod::iter() {
            if method.is_contact() {
                assert!(!method.is_ranged(), "{method} is both contact and ranged");
            }
        }
    }

    #[test]
    fn test_slash_wakes_but_does_not_touch() {
        assert!(BlowMethod::Slash.wakes_on_miss());
        assert!(!BlowMethod::Slash.is_contact());
        assert!(BlowMethod::Crawl.is_contact());
        assert!(!BlowMethod::Crawl.wakes_on_miss());
    }
}
