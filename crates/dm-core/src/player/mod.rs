//! The watcher: the player character as the monster engine sees it

mod watcher;

pub use watcher::Watcher;
