//! Grid coordinates and compass directions

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// A tile coordinate, row first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pos {
    pub y: i16,
    pub x: i16,
}

impl Pos {
    pub const fn new(y: i16, x: i16) -> Self {
        Self { y, x }
    }

    pub const fn offset(self, dy: i16, dx: i16) -> Self {
        Self {
            y: self.y + dy,
            x: self.x + dx,
        }
    }

    pub const fn step(self, dir: Direction) -> Self {
        let (dy, dx) = dir.delta();
        self.offset(dy, dx)
    }

    /// Engine distance: the longer axis plus half the shorter one
    pub fn distance(self, other: Pos) -> i32 {
        let dy = (self.y as i32 - other.y as i32).abs();
        let dx = (self.x as i32 - other.x as i32).abs();
        if dy > dx { dy + (dx >> 1) } else { dx + (dy >> 1) }
    }

    /// King-move distance
    pub fn chebyshev(self, other: Pos) -> i32 {
        let dy = (self.y as i32 - other.y as i32).abs();
        let dx = (self.x as i32 - other.x as i32).abs();
        dy.max(dx)
    }

    pub fn is_adjacent(self, other: Pos) -> bool {
        self != other && self.chebyshev(other) == 1
    }
}

/// The eight compass directions, numbered like a numeric keypad
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum Direction {
    SouthWest = 1,
    South = 2,
    SouthEast = 3,
    West = 4,
    East = 6,
    NorthWest = 7,
    North = 8,
    NorthEast = 9,
}

impl Direction {
    /// Neighbour scan order: cardinals first, then diagonals.
    /// Scans that want diagonals first walk this backwards.
    pub const SCAN: [Direction; 8] = [
        Direction::South,
        Direction::North,
        Direction::East,
        Direction::West,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthEast,
        Direction::NorthWest,
    ];

    /// Row and column change for one step
    pub const fn delta(self) -> (i16, i16) {
        match self {
            Direction::SouthWest => (1, -1),
            Direction::South => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::West => (0, -1),
            Direction::East => (0, 1),
            Direction::NorthWest => (-1, -1),
            Direction::North => (-1, 0),
            Direction::NorthEast => (-1, 1),
        }
    }

    /// Direction whose step has the signs of `(dy, dx)`
    pub const fn from_signs(dy: i32, dx: i32) -> Option<Direction> {
        match (dy.signum(), dx.signum()) {
            (1, -1) => Some(Direction::SouthWest),
            (1, 0) => Some(Direction::South),
            (1, 1) => Some(Direction::SouthEast),
            (0, -1) => Some(Direction::West),
            (0, 1) => Some(Direction::East),
            (-1, -1) => Some(Direction::NorthWest),
            (-1, 0) => Some(Direction::North),
            (-1, 1) => Some(Direction::NorthEast),
            _ => None,
        }
    }

    pub const fn is_diagonal(self) -> bool {
        let (dy, dx) = self.delta();
        dy != 0 && dx != 0
    }
}
