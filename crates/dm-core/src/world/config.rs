//! Tuning constants
//!
//! Every knob has a default matching the classic behaviour; hosts override
//! only what they need, usually from a JSON snippet.

use serde::{Deserialize, Serialize};

use crate::consts::{
    ENERGY_QUANTUM, FLOW_DEPTH, HEAVY_STEP_CHANCE, MAX_PROXIMITY, MAX_REPRO, MAX_SIGHT,
    PET_SEEK_DIST, SCENT_STALE, SPEAK_CHANCE,
};

use super::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Entities at or beyond this distance sleep through the tick
    pub max_proximity: i32,
    pub max_sight: i32,
    /// Energy debt added per action
    pub energy_quantum: i32,
    /// Uniform spread applied to each quantum
    pub energy_jitter: i32,
    /// Level-wide cap on reproduction clones
    pub max_repro: u32,
    pub scent_stale: u32,
    pub flow_depth: i32,
    pub pet_seek_dist: i32,
    pub speak_chance: i32,
    pub heavy_step_chance: i32,
    /// Low-health warnings before a tamed unique flees
    pub pinch_warnings: u8,
    /// Same, while the watcher is riding it
    pub riding_pinch_warnings: u8,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_proximity: MAX_PROXIMITY,
            max_sight: MAX_SIGHT,
            energy_quantum: ENERGY_QUANTUM,
            energy_jitter: 0,
            max_repro: MAX_REPRO,
            scent_stale: SCENT_STALE,
            flow_depth: FLOW_DEPTH,
            pet_seek_dist: PET_SEEK_DIST,
            speak_chance: SPEAK_CHANCE,
            heavy_step_chance: HEAVY_STEP_CHANCE,
            pinch_warnings: 1,
            riding_pinch_warnings: 2,
        }
    }
}

impl SimConfig {
    /// Parse overrides; missing keys keep their defaults
    #[cfg(feature = "std")]
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let config: SimConfig =
            serde_json::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.energy_quantum <= 0 {
            return Err(EngineError::Config("energy_quantum must be positive".into()));
        }
        if self.energy_jitter < 0 || self.energy_jitter >= self.energy_quantum {
            return Err(EngineError::Config(
                "energy_jitter must be within 0..energy_quantum".into(),
            ));
        }
        if self.max_sight <= 0 || self.max_proximity <= 0 {
            return Err(EngineError::Config("distances must be positive".into()));
        }
        Ok(())
    }
}
