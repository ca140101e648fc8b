//! Per-level switches

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldFlags {
    /// Nightmare difficulty: every creature is a little faster
    pub nightmare: bool,
    /// Melee is impossible on this level
    pub no_melee: bool,
    /// Overland travel; nothing on the level takes turns
    pub travelling: bool,
}
