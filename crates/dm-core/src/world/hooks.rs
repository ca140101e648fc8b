//! Seams to systems the engine does not own

use crate::monster::EntityId;

use super::WorldContext;

/// Callbacks into the host's spell and teleport systems.
///
/// Every method has a do-nothing default so hosts only implement what they
/// support.
pub trait Hooks {
    /// Let `caster` try a spell at the watcher; true if it cast one
    fn cast_at_watcher(&mut self, _ctx: &mut WorldContext, _caster: EntityId) -> bool {
        false
    }

    /// Let `caster` try a spell at another entity, preferring `preferred`.
    /// Returns the entity actually targeted.
    fn cast_at_entity(
        &mut self,
        _ctx: &mut WorldContext,
        _caster: EntityId,
        _preferred: Option<EntityId>,
    ) -> Option<EntityId> {
        None
    }

    /// A magical barrier stops `id` from teleporting
    fn teleport_barrier(&self, _ctx: &WorldContext, _id: EntityId) -> bool {
        false
    }
}

/// A host with no spells and no barriers
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl Hooks for NoHooks {}
