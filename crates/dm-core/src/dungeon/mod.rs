//! Dungeon floor: terrain, geometry and tracking fields

mod cell;
mod flow;
mod level;
mod position;

pub use cell::{Cell, CellType, DoorState, Ward};
pub use flow::{Passage, SpatialFields};
pub use level::Level;
pub use position::{Direction, Pos};
