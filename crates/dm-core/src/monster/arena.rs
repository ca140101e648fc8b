//! Entity slot arena

use serde::{Deserialize, Serialize};

use crate::world::EngineError;

use super::{Entity, EntityId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Fixed-capacity table of entities addressed by [`EntityId`].
///
/// Slot 0 is reserved. Freed slots are reused lowest-index first, with the
/// generation bumped so stale handles stop resolving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTable {
    slots: Vec<Slot>,
    capacity: usize,
    live: usize,
}

impl EntityTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Slot::default()],
            capacity,
            live: 0,
        }
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// One past the highest slot index ever used
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_full(&self) -> bool {
        self.live >= self.capacity
    }

    /// Claim a slot and build the entity that lives in it
    pub fn insert(&mut self, build: impl FnOnce(EntityId) -> Entity) -> Result<EntityId, EngineError> {
        if self.is_full() {
            return Err(EngineError::ResourceExhaustion("entity slots"));
        }
        let index = match self.slots.iter().skip(1).position(|s| s.entity.is_none()) {
            Some(offset) => offset + 1,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        let id = EntityId {
            index: index as u16,
            generation: slot.generation,
        };
        slot.entity = Some(build(id));
        self.live += 1;
        Ok(id)
    }

    pub fn remove(&mut self, id: EntityId) -> Result<Entity, EngineError> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation && id.index != 0)
            .ok_or(EngineError::InvalidEntity(id))?;
        let entity = slot.entity.take().ok_or(EngineError::InvalidEntity(id))?;
        self.live -= 1;
        Ok(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        if id.is_none() {
            return None;
        }
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entity.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if id.is_none() {
            return None;
        }
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entity.as_mut())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Handle of whatever currently lives in slot `index`
    pub fn id_at(&self, index: usize) -> Option<EntityId> {
        if index == 0 {
            return None;
        }
        self.slots
            .get(index)
            .and_then(|s| s.entity.as_ref())
            .map(|e| e.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(|s| s.entity.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.slots.iter_mut().filter_map(|s| s.entity.as_mut())
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|e| e.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::Pos;
    use crate::monster::{Species, SpeciesId};

    fn build(id: EntityId) -> Entity {
        Entity::new(id, SpeciesId(0), &Species::new("rat", 1), Pos::new(1, 1), 5)
    }

    #[test]
    fn test_slot_zero_reserved() {
        let mut table = EntityTable::new(4);
        let id = table.insert(build).unwrap();
        assert_eq!(id.index, 1);
        assert!(table.id_at(0).is_none());
        assert!(table.get(EntityId::NONE).is_none());
    }

    #[test]
    fn test_stale_handle_rejected_after_reuse() {
        let mut table = EntityTable::new(4);
        let old = table.insert(build).unwrap();
        table.remove(old).unwrap();
        let new = table.insert(build).unwrap();
        assert_eq!(old.index, new.index);
        assert_ne!(old.generation, new.generation);
        assert!(table.get(old).is_none());
        assert!(table.get(new).is_some());
        assert!(matches!(table.remove(old), Err(EngineError::InvalidEntity(id)) if id == old));
    }

    #[test]
    fn test_capacity_exhaustion() {
        let mut table = EntityTable::new(2);
        table.insert(build).unwrap();
        table.insert(build).unwrap();
        assert_eq!(
            table.insert(build),
            Err(EngineError::ResourceExhaustion("entity slots"))
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_lowest_free_slot_reused() {
        let mut table = EntityTable::new(8);
        let a = table.insert(build).unwrap();
        let _b = table.insert(build).unwrap();
        let _c = table.insert(build).unwrap();
        table.remove(a).unwrap();
        let d = table.insert(build).unwrap();
        assert_eq!(d.index, 1);
        assert_eq!(table.slot_count(), 4);
    }
}
