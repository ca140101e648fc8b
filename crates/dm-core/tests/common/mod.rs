//! Shared fixtures for the scenario tests

#![allow(dead_code)]

use std::sync::Arc;

use dm_core::combat::{Blow, BlowEffect, BlowMethod};
use dm_core::dungeon::{Level, Pos};
use dm_core::monster::{EntityId, Species, SpeciesFlags, SpeciesTable};
use dm_core::player::Watcher;
use dm_core::world::{Event, WorldContext};

/// Build a world around `level` with the watcher at `watcher`
pub fn world(level: Level, watcher: Pos, species: Vec<Species>, seed: u64) -> WorldContext {
    let mut table = SpeciesTable::new();
    for s in species {
        table.add(s);
    }
    WorldContext::new(level, Watcher::new(watcher), Arc::new(table), seed)
}

/// A plain melee brute with two bites
pub fn orc() -> Species {
    Species::new("cave orc", 7).with_blows(&[
        Blow::new(BlowMethod::Hit, BlowEffect::Hurt, 1, 8),
        Blow::new(BlowMethod::Bite, BlowEffect::Hurt, 1, 4),
    ])
}

/// Never moves and never attacks
pub fn statue() -> Species {
    Species::new("stone statue", 5)
        .with_flags(SpeciesFlags::NEVER_MOVE | SpeciesFlags::NEVER_BLOW)
}

pub fn acted(ctx: &WorldContext, id: EntityId) -> usize {
    ctx.events.count(|e| matches!(e, Event::Acted { id: who } if *who == id))
}
