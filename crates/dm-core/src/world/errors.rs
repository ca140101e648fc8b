//! Engine error taxonomy
//!
//! Ordinary control flow never goes through these: a blocked direction, an
//! empty search or an early end of turn are plain values. Errors are for
//! callers handing the engine something it cannot honour.

use thiserror::Error;

use crate::dungeon::Pos;
use crate::monster::{EntityId, SpeciesId};

/// Errors raised at the engine's API boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("entity {0:?} is not alive")]
    InvalidEntity(EntityId),

    #[error("cannot place an entity at ({}, {})", .0.y, .0.x)]
    IllegalDestination(Pos),

    #[error("out of room for {0}")]
    ResourceExhaustion(&'static str),

    #[error("inconsistent state: {0}")]
    InconsistentState(String),

    #[error("unknown species {0:?}")]
    UnknownSpecies(SpeciesId),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Report a broken invariant the caller is about to repair.
///
/// Debug builds stop here; release builds log and carry on.
pub(crate) fn report_inconsistency(err: &EngineError) {
    debug_assert!(false, "{err}");
    tracing::warn!(%err, "repairing inconsistent state");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = EngineError::IllegalDestination(Pos::new(3, 4));
        assert_eq!(err.to_string(), "cannot place an entity at (3, 4)");
        let err = EngineError::ResourceExhaustion("entity slots");
        assert_eq!(err.to_string(), "out of room for entity slots");
    }
}
