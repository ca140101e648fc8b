//! Items creatures can pick up or wreck

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::monster::SpeciesFlags;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum ItemKind {
    Gold,
    Corpse,
    Statue,
    Weapon,
    Armour,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    pub artifact: bool,
    /// Kinds of creature this item is bane to
    pub slays: SpeciesFlags,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            artifact: false,
            slays: SpeciesFlags::empty(),
        }
    }

    pub fn artifact(mut self) -> Self {
        self.artifact = true;
        self
    }

    pub fn slaying(mut self, kinds: SpeciesFlags) -> Self {
        self.slays |= kinds;
        self
    }

    /// Too bulky or worthless for a thief to pocket
    pub fn is_ignored_by_takers(&self) -> bool {
        matches!(self.kind, ItemKind::Gold | ItemKind::Corpse | ItemKind::Statue)
    }

    /// A creature with these flags can neither carry nor destroy it
    pub fn repels(&self, flags: SpeciesFlags) -> bool {
        self.artifact || self.slays.intersects(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifacts_repel_everyone() {
        let item = Item::new("Sting", ItemKind::Weapon).artifact();
        assert!(item.repels(SpeciesFlags::empty()));
    }

    #[test]
    fn test_slaying_repels_matching_kind() {
        let item = Item::new("dragon lance", ItemKind::Weapon).slaying(SpeciesFlags::DRAGON);
        assert!(item.repels(SpeciesFlags::DRAGON | SpeciesFlags::EVIL));
        assert!(!item.repels(SpeciesFlags::ANIMAL));
    }

    #[test]
    fn test_takers_skip_gold_and_bodies() {
        assert!(Item::new("gold", ItemKind::Gold).is_ignored_by_takers());
        assert!(Item::new("corpse", ItemKind::Corpse).is_ignored_by_takers());
        assert!(!Item::new("shield", ItemKind::Armour).is_ignored_by_takers());
    }
}
