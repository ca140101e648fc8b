//! Map cell types

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Cell/terrain type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum CellType {
    #[default]
    Stone = 0,
    Wall = 1,
    PermanentWall = 2,
    Rubble = 3,
    Door = 4,
    Floor = 5,
    Tree = 6,
}

impl CellType {
    /// Solid rock, masonry or rubble
    pub const fn is_obstruction(&self) -> bool {
        matches!(
            self,
            CellType::Stone | CellType::Wall | CellType::PermanentWall | CellType::Rubble
        )
    }

    /// Cannot be dug, passed or disintegrated
    pub const fn is_permanent(&self) -> bool {
        matches!(self, CellType::PermanentWall)
    }
}

bitflags! {
    /// Door state flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct DoorState: u8 {
        const NO_DOOR = 0x00;
        const BROKEN = 0x01;
        const OPEN = 0x02;
        const CLOSED = 0x04;
        const LOCKED = 0x08;
        const GLASS = 0x10;
    }
}

impl Serialize for DoorState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DoorState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(DoorState::from_bits_truncate(bits))
    }
}

/// A glyph drawn on the floor that stops monsters from entering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Ward {
    /// Blocks entry until broken by a strong enough creature
    Protection,
    /// Explodes in the face of the creature that disturbs it
    Explosive,
}

/// A single map cell
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Cell {
    pub typ: CellType,
    pub door: DoorState,
    /// Lock strength of a closed door; 0 means merely shut
    pub lock: u8,
    /// Part of a lit room rather than a corridor
    pub room: bool,
    pub ward: Option<Ward>,
}

impl Cell {
    pub const fn new(typ: CellType) -> Self {
        Self {
            typ,
            door: DoorState::NO_DOOR,
            lock: 0,
            room: false,
            ward: None,
        }
    }

    pub const fn stone() -> Self {
        Self::new(CellType::Stone)
    }

    pub const fn wall() -> Self {
        Self::new(CellType::Wall)
    }

    pub const fn permanent_wall() -> Self {
        Self::new(CellType::PermanentWall)
    }

    pub const fn floor() -> Self {
        let mut cell = Self::new(CellType::Floor);
        cell.room = true;
        cell
    }

    pub const fn corridor() -> Self {
        Self::new(CellType::Floor)
    }

    pub const fn tree() -> Self {
        Self::new(CellType::Tree)
    }

    /// A door in the given state; `lock` only matters for locked doors
    pub const fn door(state: DoorState, lock: u8) -> Self {
        let mut cell = Self::new(CellType::Door);
        cell.door = state;
        cell.lock = lock;
        cell
    }

    pub const fn is_door(&self) -> bool {
        matches!(self.typ, CellType::Door)
    }

    pub fn is_closed_door(&self) -> bool {
        self.is_door() && self.door.intersects(DoorState::CLOSED | DoorState::LOCKED)
    }

    /// Open ground a walker can stand on
    pub fn is_walkable(&self) -> bool {
        match self.typ {
            CellType::Floor | CellType::Tree => true,
            CellType::Door => !self.is_closed_door(),
            _ => false,
        }
    }

    pub fn blocks_sight(&self) -> bool {
        self.typ.is_obstruction() || self.is_closed_door()
    }

    /// Blocks a disintegration beam (only permanent masonry does)
    pub fn blocks_disintegration(&self) -> bool {
        self.typ.is_permanent()
    }

    /// Can be reduced to floor by a wall-destroying creature
    pub fn is_destructible(&self) -> bool {
        self.blocks_sight() && !self.typ.is_permanent()
    }

    /// Floor items may rest here
    pub fn holds_items(&self) -> bool {
        matches!(self.typ, CellType::Floor | CellType::Tree)
    }

    /// Open a closed door
    pub fn open_door(&mut self) {
        self.door = DoorState::OPEN | (self.door & DoorState::GLASS);
        self.lock = 0;
    }

    /// Remove the lock but leave the door shut
    pub fn unlock_door(&mut self) {
        self.door = DoorState::CLOSED | (self.door & DoorState::GLASS);
        self.lock = 0;
    }

    pub fn break_door(&mut self) {
        self.door = DoorState::BROKEN;
        self.lock = 0;
    }

    /// Turn into plain floor, keeping the room flag
    pub fn clear_to_floor(&mut self) {
        self.typ = CellType::Floor;
        self.door = DoorState::NO_DOOR;
        self.lock = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_door_blocks() {
        let door = Cell::door(DoorState::CLOSED, 0);
        assert!(door.is_closed_door());
        assert!(!door.is_walkable());
        assert!(door.blocks_sight());
        assert!(door.is_destructible());
    }

    #[test]
    fn test_open_and_broken_doors_walkable() {
        let mut door = Cell::door(DoorState::LOCKED, 5);
        door.open_door();
        assert!(door.is_walkable());
        assert_eq!(door.lock, 0);
        door.break_door();
        assert!(door.is_walkable());
        assert!(!door.blocks_sight());
    }

    #[test]
    fn test_unlock_keeps_door_shut() {
        let mut door = Cell::door(DoorState::LOCKED | DoorState::GLASS, 3);
        door.unlock_door();
        assert!(door.is_closed_door());
        assert!(door.door.contains(DoorState::GLASS));
        assert_eq!(door.lock, 0);
    }

    #[test]
    fn test_permanent_wall_indestructible() {
        let wall = Cell::permanent_wall();
        assert!(wall.blocks_sight());
        assert!(!wall.is_destructible());
        assert!(wall.blocks_disintegration());
        assert!(Cell::wall().is_destructible());
    }

    #[test]
    fn test_clear_to_floor_keeps_room() {
        let mut cell = Cell::wall();
        cell.room = true;
        cell.clear_to_floor();
        assert!(cell.is_walkable());
        assert!(cell.room);
    }
}
