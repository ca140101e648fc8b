//! Sound and scent fields
//!
//! Three per-tile grids describing how the watcher can be tracked: a flow
//! cost that charges extra for closed doors, a raw step distance that does
//! not, and the tick at which scent was last laid on each tile. Zero means
//! "unset" in all three. The AI only reads them.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::Pos;

/// Extra flow cost for squeezing sound through a closed door
const DOOR_FLOW_PENALTY: u16 = 3;

/// How much fresher each tile of the scent pattern is than the tick stamp.
/// Negative entries are skipped.
const SCENT_PATTERN: [[i8; 5]; 5] = [
    [-1, 0, 0, 0, -1],
    [0, 1, 1, 1, 0],
    [0, 1, 2, 1, 0],
    [0, 1, 1, 1, 0],
    [-1, 0, 0, 0, -1],
];

/// How a tile takes part in the flood fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Passage {
    Open,
    Door,
    Blocked,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpatialFields {
    height: i16,
    width: i16,
    sound_cost: Vec<u16>,
    sound_dist: Vec<u16>,
    scent_time: Vec<u32>,
}

impl SpatialFields {
    pub fn new(height: i16, width: i16) -> Self {
        let len = height.max(0) as usize * width.max(0) as usize;
        Self {
            height,
            width,
            sound_cost: vec![0; len],
            sound_dist: vec![0; len],
            scent_time: vec![0; len],
        }
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        if pos.y < 0 || pos.x < 0 || pos.y >= self.height || pos.x >= self.width {
            return None;
        }
        Some(pos.y as usize * self.width as usize + pos.x as usize)
    }

    pub fn cost(&self, pos: Pos) -> u16 {
        self.index(pos).map_or(0, |i| self.sound_cost[i])
    }

    pub fn dist(&self, pos: Pos) -> u16 {
        self.index(pos).map_or(0, |i| self.sound_dist[i])
    }

    pub fn scent(&self, pos: Pos) -> u32 {
        self.index(pos).map_or(0, |i| self.scent_time[i])
    }

    pub fn set_cost(&mut self, pos: Pos, cost: u16) {
        if let Some(i) = self.index(pos) {
            self.sound_cost[i] = cost;
        }
    }

    pub fn set_dist(&mut self, pos: Pos, dist: u16) {
        if let Some(i) = self.index(pos) {
            self.sound_dist[i] = dist;
        }
    }

    pub fn set_scent(&mut self, pos: Pos, when: u32) {
        if let Some(i) = self.index(pos) {
            self.scent_time[i] = when;
        }
    }

    /// Forget the sound fields (scent persists)
    pub fn clear_sound(&mut self) {
        self.sound_cost.fill(0);
        self.sound_dist.fill(0);
    }

    /// Breadth-first fill of both sound fields outward from `origin`.
    ///
    /// Tiles are revisited whenever a cheaper route is found, so a door on
    /// the short path still loses to an open detour in `sound_cost`.
    pub fn flood(&mut self, origin: Pos, depth: i32, passage: impl Fn(Pos) -> Passage) {
        self.clear_sound();
        let Some(start) = self.index(origin) else {
            return;
        };
        self.sound_cost[start] = 1;
        self.sound_dist[start] = 1;

        let mut queue = VecDeque::from([origin]);
        while let Some(here) = queue.pop_front() {
            let Some(hi) = self.index(here) else {
                continue;
            };
            let base_cost = self.sound_cost[hi] + 1;
            let n = self.sound_dist[hi] + 1;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dy == 0 && dx == 0 {
                        continue;
                    }
                    let next = here.offset(dy, dx);
                    let Some(ni) = self.index(next) else {
                        continue;
                    };
                    let mut m = base_cost;
                    match passage(next) {
                        Passage::Blocked => continue,
                        Passage::Door => m += DOOR_FLOW_PENALTY,
                        Passage::Open => {}
                    }
                    let (old_cost, old_dist) = (self.sound_cost[ni], self.sound_dist[ni]);
                    if old_dist != 0 && old_dist <= n && old_cost <= m {
                        continue;
                    }
                    if old_cost == 0 || old_cost > m {
                        self.sound_cost[ni] = m;
                    }
                    if old_dist == 0 || old_dist > n {
                        self.sound_dist[ni] = n;
                    }
                    if i32::from(n) >= depth {
                        continue;
                    }
                    queue.push_back(next);
                }
            }
        }
    }

    /// Lay fresh scent around `origin` at tick `when` on tiles `lay` accepts
    pub fn lay_scent(&mut self, origin: Pos, when: u32, lay: impl Fn(Pos) -> bool) {
        for (i, row) in SCENT_PATTERN.iter().enumerate() {
            for (j, &adjust) in row.iter().enumerate() {
                if adjust < 0 {
                    continue;
                }
                let pos = origin.offset(i as i16 - 2, j as i16 - 2);
                if self.index(pos).is_none() || !lay(pos) {
                    continue;
                }
                self.set_scent(pos, when + adjust as u32);
            }
        }
    }
}
