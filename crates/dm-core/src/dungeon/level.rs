//! Level structure: terrain, occupancy, floor items and the entity table

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::flow::{Passage, SpatialFields};
use super::{Cell, Pos};
use crate::consts::MAX_RANGE;
use crate::monster::{Entity, EntityId, EntityTable};
use crate::object::Item;
use crate::world::{EngineError, report_inconsistency};

/// One dungeon floor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    height: i16,
    width: i16,
    cells: Vec<Cell>,
    occupancy: Vec<Option<EntityId>>,
    items: HashMap<Pos, Vec<Item>>,
    pub entities: EntityTable,
    pub fields: SpatialFields,
    /// Clones produced by reproduction on this level
    pub repro_count: u32,
}

impl Level {
    /// A level of solid stone
    pub fn new(height: i16, width: i16, capacity: usize) -> Self {
        let len = height.max(0) as usize * width.max(0) as usize;
        Self {
            height,
            width,
            cells: vec![Cell::stone(); len],
            occupancy: vec![None; len],
            items: HashMap::new(),
            entities: EntityTable::new(capacity),
            fields: SpatialFields::new(height, width),
            repro_count: 0,
        }
    }

    /// One big lit room walled in by permanent rock
    pub fn open_room(height: i16, width: i16, capacity: usize) -> Self {
        let mut level = Self::new(height, width, capacity);
        for y in 0..height {
            for x in 0..width {
                let pos = Pos::new(y, x);
                let edge = y == 0 || x == 0 || y == height - 1 || x == width - 1;
                level.set_cell(pos, if edge { Cell::permanent_wall() } else { Cell::floor() });
            }
        }
        level
    }

    pub fn height(&self) -> i16 {
        self.height
    }

    pub fn width(&self) -> i16 {
        self.width
    }

    fn index(&self, pos: Pos) -> usize {
        pos.y as usize * self.width as usize + pos.x as usize
    }

    /// Inside the map, edges included
    pub fn contains(&self, pos: Pos) -> bool {
        pos.y >= 0 && pos.x >= 0 && pos.y < self.height && pos.x < self.width
    }

    /// Inside the map, edges excluded
    pub fn is_interior(&self, pos: Pos) -> bool {
        pos.y > 0 && pos.x > 0 && pos.y < self.height - 1 && pos.x < self.width - 1
    }

    /// Cell at `pos`; the caller checks bounds
    pub fn cell(&self, pos: Pos) -> &Cell {
        &self.cells[self.index(pos)]
    }

    pub fn cell_mut(&mut self, pos: Pos) -> &mut Cell {
        let idx = self.index(pos);
        &mut self.cells[idx]
    }

    pub fn set_cell(&mut self, pos: Pos, cell: Cell) {
        if self.contains(pos) {
            *self.cell_mut(pos) = cell;
        }
    }

    pub fn entity_at(&self, pos: Pos) -> Option<EntityId> {
        if !self.contains(pos) {
            return None;
        }
        self.occupancy[self.index(pos)]
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Write the occupancy back-reference for a freshly created entity
    pub(crate) fn occupy(&mut self, id: EntityId, pos: Pos) {
        let idx = self.index(pos);
        self.occupancy[idx] = Some(id);
    }

    /// Clear the occupancy back-reference if it still points at `id`
    pub(crate) fn vacate(&mut self, id: EntityId, pos: Pos) {
        if !self.contains(pos) {
            return;
        }
        let idx = self.index(pos);
        match self.occupancy[idx] {
            Some(occ) if occ == id => self.occupancy[idx] = None,
            other => report_inconsistency(&EngineError::InconsistentState(format!(
                "tile ({}, {}) holds {other:?}, expected {id:?}",
                pos.y, pos.x
            ))),
        }
    }

    /// Move an entity, swapping places with whatever stands at `to`
    pub fn move_entity(&mut self, id: EntityId, to: Pos) -> Result<(), EngineError> {
        if !self.contains(to) {
            return Err(EngineError::IllegalDestination(to));
        }
        let from = self.entities.get(id).ok_or(EngineError::InvalidEntity(id))?.pos;
        let from_idx = self.index(from);
        if self.occupancy[from_idx] != Some(id) {
            report_inconsistency(&EngineError::InconsistentState(format!(
                "{id:?} missing from its tile ({}, {})",
                from.y, from.x
            )));
        }
        let to_idx = self.index(to);
        let other = self.occupancy[to_idx].filter(|&o| o != id);

        self.occupancy[from_idx] = other;
        self.occupancy[to_idx] = Some(id);
        if let Some(other) = other
            && let Some(e) = self.entities.get_mut(other)
        {
            e.pos = from;
        }
        if let Some(e) = self.entities.get_mut(id) {
            e.pos = to;
        }
        Ok(())
    }

    /// Empty open ground
    pub fn is_free(&self, pos: Pos) -> bool {
        self.contains(pos) && self.cell(pos).is_walkable() && self.entity_at(pos).is_none()
    }

    /// Entities on the 3x3 block centred on `pos`, including `pos` itself
    pub fn count_neighbours(&self, pos: Pos) -> i32 {
        let mut count = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if self.entity_at(pos.offset(dy, dx)).is_some() {
                    count += 1;
                }
            }
        }
        count
    }

    pub fn items_at(&self, pos: Pos) -> &[Item] {
        self.items.get(&pos).map_or(&[], Vec::as_slice)
    }

    pub fn take_items(&mut self, pos: Pos) -> Vec<Item> {
        self.items.remove(&pos).unwrap_or_default()
    }

    pub fn drop_item(&mut self, pos: Pos, item: Item) {
        self.items.entry(pos).or_default().push(item);
    }

    pub fn drop_items(&mut self, pos: Pos, items: impl IntoIterator<Item = Item>) {
        let mut items = items.into_iter().peekable();
        if items.peek().is_some() {
            self.items.entry(pos).or_default().extend(items);
        }
    }

    /// Walk a Bresenham line from `from` to `to`. Every tile strictly
    /// between the ends is tested with `blocks`; the destination never
    /// blocks its own line.
    fn trace(&self, from: Pos, to: Pos, range: Option<i32>, blocks: impl Fn(Pos, &Cell) -> bool) -> bool {
        let (mut y, mut x) = (from.y as i32, from.x as i32);
        let (y1, x1) = (to.y as i32, to.x as i32);

        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let mut steps = 0;

        loop {
            if x == x1 && y == y1 {
                return true;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
            steps += 1;
            if range.is_some_and(|r| steps > r) {
                return false;
            }
            let here = Pos::new(y as i16, x as i16);
            if !self.contains(here) {
                return false;
            }
            if x == x1 && y == y1 {
                return true;
            }
            if blocks(here, self.cell(here)) {
                return false;
            }
        }
    }

    /// Line of sight, unlimited range
    pub fn los(&self, from: Pos, to: Pos) -> bool {
        self.trace(from, to, None, |_, c| c.blocks_sight())
    }

    /// A bolt fired from `from` would reach `to`
    pub fn projectable(&self, from: Pos, to: Pos) -> bool {
        self.trace(from, to, Some(MAX_RANGE), |_, c| c.blocks_sight())
    }

    /// Projectable with no entity standing in the way
    pub fn clean_shot(&self, from: Pos, to: Pos) -> bool {
        self.trace(from, to, Some(MAX_RANGE), |p, c| {
            c.blocks_sight() || self.entity_at(p).is_some()
        })
    }

    /// A disintegration beam, stopped only by permanent rock
    pub fn in_disintegration_range(&self, from: Pos, to: Pos) -> bool {
        self.trace(from, to, Some(MAX_RANGE), |_, c| c.blocks_disintegration())
    }

    /// Recompute the sound fields around the watcher
    pub fn update_flow(&mut self, origin: Pos, depth: i32) {
        let Level { cells, fields, width, .. } = self;
        let width = *width as usize;
        fields.flood(origin, depth, |p| {
            let cell = &cells[p.y as usize * width + p.x as usize];
            if cell.is_closed_door() {
                Passage::Door
            } else if cell.is_walkable() {
                Passage::Open
            } else {
                Passage::Blocked
            }
        });
    }

    /// Lay the watcher's scent on visible open tiles around it
    pub fn update_scent(&mut self, origin: Pos, when: u32) {
        let visible: Vec<Pos> = (-2..=2)
            .flat_map(|dy| (-2..=2).map(move |dx| origin.offset(dy, dx)))
            .filter(|&p| {
                self.contains(p)
                    && (self.cell(p).is_walkable() || self.cell(p).is_closed_door())
                    && self.los(origin, p)
            })
            .collect();
        self.fields.lay_scent(origin, when, |p| visible.contains(&p));
    }
}
