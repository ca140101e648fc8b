//! The explicit world context threaded through every engine call

use std::sync::Arc;

use crate::dungeon::Level;
use crate::monster::{Entity, EntityId, Species, SpeciesTable};
use crate::player::Watcher;
use crate::rng::GameRng;

use super::{EventLog, SimConfig, WorldFlags};

/// Everything one tick reads and writes
pub struct WorldContext {
    pub level: Level,
    pub watcher: Watcher,
    pub species: Arc<SpeciesTable>,
    pub rng: GameRng,
    pub config: SimConfig,
    pub flags: WorldFlags,
    pub events: EventLog,
    /// Game tick counter; scent is stamped with it
    pub turn: u32,
}

impl WorldContext {
    pub fn new(level: Level, watcher: Watcher, species: Arc<SpeciesTable>, seed: u64) -> Self {
        Self {
            level,
            watcher,
            species,
            rng: GameRng::new(seed),
            config: SimConfig::default(),
            flags: WorldFlags::default(),
            events: EventLog::new(),
            turn: 0,
        }
    }

    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.level.entity(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.level.entity_mut(id)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.level.entities.contains(id)
    }

    /// Species template of a live entity
    pub fn species_of(&self, id: EntityId) -> Option<&Species> {
        let entity = self.level.entity(id)?;
        self.species.get(entity.species)
    }

    /// Refresh one entity's cached watcher distance and visibility
    pub fn update_view(&mut self, id: EntityId) {
        let watcher = self.watcher.pos;
        let sight = self.config.max_sight;
        let Some(pos) = self.level.entity(id).map(|e| e.pos) else {
            return;
        };
        let dist = pos.distance(watcher);
        let visible = dist <= sight && self.level.los(watcher, pos);
        if let Some(e) = self.level.entity_mut(id) {
            e.watcher_dist = dist;
            e.in_view = visible;
        }
    }

    pub fn update_all_views(&mut self) {
        for id in self.level.entities.ids() {
            self.update_view(id);
        }
    }
}
