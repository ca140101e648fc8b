//! Turning a target offset into candidate step directions
//!
//! Every directed decision (chasing, fleeing, following a flow field) ends
//! here: the offset toward the goal picks a fixed five-entry priority list
//! that leans toward the dominant axis without zig-zagging.

use crate::dungeon::Direction;
use crate::dungeon::Direction::{
    East as E, North as N, NorthEast as NE, NorthWest as NW, South as S, SouthEast as SE,
    SouthWest as SW, West as W,
};

/// One entry of a move list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    Dir(Direction),
    /// Any of the eight directions, rolled when tried
    Random,
}

/// Four random tries, used for scatter movement
pub const SCATTER: [Candidate; 4] = [Candidate::Random; 4];

/// Ordered directions toward a goal `(dy, dx)` away from the mover.
///
/// Returns `None` for a zero offset.
pub fn toward(dy: i32, dx: i32) -> Option<[Direction; 5]> {
    if dy == 0 && dx == 0 {
        return None;
    }
    // Classify by the offset from the goal back to the mover
    let (y, x) = (-dy, -dx);
    let (ay, ax) = (y.abs(), x.abs());

    let mut move_val = 0;
    if y < 0 {
        move_val += 8;
    }
    if x > 0 {
        move_val += 4;
    }
    if ay > ax * 2 {
        move_val += 2;
    } else if ax > ay * 2 {
        move_val += 1;
    }

    let dirs = match move_val {
        0 => {
            let (a, b) = if ay > ax { (N, E) } else { (E, N) };
            [NE, a, b, NW, SE]
        }
        1 | 9 => {
            let (a, b) = if y < 0 { (SE, NE) } else { (NE, SE) };
            [E, a, b, S, N]
        }
        2 | 6 => {
            let (a, b) = if x < 0 { (NE, NW) } else { (NW, NE) };
            [N, a, b, E, W]
        }
        4 => {
            let (a, b) = if ay > ax { (N, W) } else { (W, N) };
            [NW, a, b, NE, SW]
        }
        5 | 13 => {
            let (a, b) = if y < 0 { (SW, NW) } else { (NW, SW) };
            [W, a, b, N, S]
        }
        8 => {
            let (a, b) = if ay > ax { (S, E) } else { (E, S) };
            [SE, a, b, SW, NE]
        }
        10 | 14 => {
            let (a, b) = if x < 0 { (SE, SW) } else { (SW, SE) };
            [S, a, b, W, E]
        }
        _ => {
            // 12: goal lies south-west
            let (a, b) = if ay > ax { (S, W) } else { (W, S) };
            [SW, a, b, SE, NW]
        }
    };
    Some(dirs)
}

/// Three directions toward a target in one of the eight octants
pub fn octant(dy: i32, dx: i32) -> Option<[Direction; 3]> {
    let dirs = match (dy.signum(), dx.signum()) {
        (-1, 0) => [N, NW, NE],
        (1, 0) => [S, SW, SE],
        (0, 1) => [E, NE, SE],
        (0, -1) => [W, NW, SW],
        (-1, -1) => [NW, W, N],
        (-1, 1) => [NE, E, N],
        (1, -1) => [SW, W, S],
        (1, 1) => [SE, E, S],
        _ => return None,
    };
    Some(dirs)
}

/// Move list for a goal offset
pub fn candidates_toward(dy: i32, dx: i32) -> Option<Vec<Candidate>> {
    toward(dy, dx).map(|dirs| dirs.into_iter().map(Candidate::Dir).collect())
}
