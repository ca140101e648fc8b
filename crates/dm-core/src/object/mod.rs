//! Floor items as seen by wandering creatures

mod item;

pub use item::{Item, ItemKind};
