//! Engine-wide constants

/// Ring search radius limit for safety and hiding spots
pub const MAX_SEARCH_RADIUS: usize = 9;

/// Longest line a projection may travel
pub const MAX_RANGE: i32 = 18;

/// Sight radius used by the awareness and will-run tests
pub const MAX_SIGHT: i32 = 20;

/// Entities at or beyond this distance from the watcher are dormant
pub const MAX_PROXIMITY: i32 = 100;

/// Speed of an unhasted, unslowed average creature
pub const NORMAL_SPEED: i16 = 110;

/// Energy debt added after each action
pub const ENERGY_QUANTUM: i32 = 100;

/// Level-wide cap on reproduction clones
pub const MAX_REPRO: u32 = 100;

/// Crowding factor for the reproduction roll
pub const MULTIPLY_ADJUST: i32 = 8;

/// Scent older than this (in ticks) is ignored
pub const SCENT_STALE: u32 = 127;

/// Flow fill depth
pub const FLOW_DEPTH: i32 = 32;

/// Pets farther than this go looking for the watcher
pub const PET_SEEK_DIST: i32 = 10;

/// 1 in N chance per turn that a speaking creature talks
pub const SPEAK_CHANCE: i32 = 8;

/// 1 in N chance per turn that heavy footsteps are heard
pub const HEAVY_STEP_CHANCE: i32 = 20;

/// 1 in N chance that a disguised creature changes shape
pub const DISGUISE_FLICKER: i32 = 13;

/// Protection wards break when `rand1(BREAK_WARD) < level`
pub const BREAK_WARD: i32 = 550;

/// Explosive runes go off when `rand1(BREAK_RUNE) > level`
pub const BREAK_RUNE: i32 = 299;

/// Blow damage above this from a shattering blow shakes the ground
pub const QUAKE_DAMAGE: i32 = 23;

/// Maximum number of blows per melee round
pub const MAX_BLOWS: usize = 4;

/// Upper bound on swarm members produced by one area special
pub const SWARM_SIZE: usize = 6;

/// Flat self-damage dealt each turn by self-destructing species
pub const SELF_DESTRUCT_DAMAGE: i32 = 1;
