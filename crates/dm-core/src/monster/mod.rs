//! Monster system
//!
//! Species templates, live entities in their arena, and the turn logic that
//! moves and fights with them.

pub mod ai;
mod arena;
pub mod direction;
pub mod lifecycle;
mod monst;
pub mod movement;
mod permonst;
pub mod search;
pub mod step;

pub use ai::{TurnEnded, TurnOutcome, act_one_turn};
pub use arena::EntityTable;
pub use lifecycle::{HitOutcome, damage_entity, despawn, spawn, spawn_clone};
pub use monst::{
    Attitude, Disposition, Entity, EntityId, PursuitTarget, StatusTimers, SubAlign, are_enemies,
};
pub use permonst::{Species, SpeciesFlags, SpeciesId, SpeciesTable};
