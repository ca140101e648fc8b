//! dm-core: monster turn scheduling, movement AI and melee
//!
//! The engine owns no globals. Every call receives a [`world::WorldContext`]
//! holding the level, the watcher (the player as monsters see it), the
//! shared species table, the random stream and the event log. Spells and
//! teleport barriers belong to the host and are reached through
//! [`world::Hooks`].
//!
//! A host typically calls [`gameloop::track_watcher`] after the watcher
//! moves, [`gameloop::run_tick`] once per game tick, and
//! [`gameloop::advance_status_timers`] on its own timer cadence.

pub mod combat;
pub mod consts;
pub mod dungeon;
pub mod gameloop;
pub mod monster;
pub mod object;
pub mod player;
pub mod rng;
pub mod world;

pub use consts::NORMAL_SPEED;
pub use gameloop::{TickReport, TurnScheduler, run_tick};
pub use world::{EngineError, Event, WorldContext};
