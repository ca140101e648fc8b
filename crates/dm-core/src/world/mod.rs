//! World state shared by the scheduler, planner and combat resolver

mod config;
mod context;
mod errors;
mod events;
mod flags;
mod hooks;

pub use config::SimConfig;
pub use context::WorldContext;
pub use errors::EngineError;
pub(crate) use errors::report_inconsistency;
pub use events::{DespawnReason, Event, EventLog};
pub use flags::WorldFlags;
pub use hooks::{Hooks, NoHooks};
