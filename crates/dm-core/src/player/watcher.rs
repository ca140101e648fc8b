//! Watcher snapshot and disturbance sink

use serde::{Deserialize, Serialize};

use crate::combat::Resistances;
use crate::consts::NORMAL_SPEED;
use crate::dungeon::Pos;
use crate::monster::{EntityId, SubAlign};

/// Alignment magnitude at which the watcher counts as good or evil
const ALIGN_THRESHOLD: i32 = 10;

/// What the monster engine reads from (and writes back to) the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Watcher {
    pub pos: Pos,
    pub hp: i32,
    pub max_hp: i32,
    pub mana: i32,
    pub max_mana: i32,
    /// Experience level
    pub level: i32,
    pub ac: i32,
    /// Signed alignment record; positive is good
    pub alignment: i32,
    pub speed: i16,
    pub resists: Resistances,
    /// Cursed with aggravation: wakes and angers everything
    pub aggravate: bool,
    /// The mount currently ridden
    pub riding: Option<EntityId>,
    /// 0..=100
    pub riding_skill: i32,
    /// Leash length for pets; negative keeps them at arm's length
    pub pet_follow_distance: i32,
    pub pet_open_doors: bool,
    pub pet_pickup_items: bool,
    /// Hiding in a way that blinds the flow field
    pub no_flowed: bool,
    /// Stealth score while hidden in shadow
    pub shadow_stealth: Option<i32>,
    pub dead: bool,
    pub left_level: bool,
    /// Times something interrupted the watcher
    pub disturbances: u32,
}

impl Watcher {
    pub fn new(pos: Pos) -> Self {
        Self {
            pos,
            hp: 100,
            max_hp: 100,
            mana: 0,
            max_mana: 0,
            level: 10,
            ac: 20,
            alignment: 0,
            speed: NORMAL_SPEED,
            resists: Resistances::empty(),
            aggravate: false,
            riding: None,
            riding_skill: 50,
            pet_follow_distance: 6,
            pet_open_doors: true,
            pet_pickup_items: false,
            no_flowed: false,
            shadow_stealth: None,
            dead: false,
            left_level: false,
            disturbances: 0,
        }
    }

    /// Sub-alignment used when creatures judge the watcher
    pub fn sub_align(&self) -> SubAlign {
        let mut align = SubAlign::empty();
        if self.alignment >= ALIGN_THRESHOLD {
            align |= SubAlign::GOOD;
        }
        if self.alignment <= -ALIGN_THRESHOLD {
            align |= SubAlign::EVIL;
        }
        align
    }

    pub fn disturb(&mut self) {
        self.disturbances += 1;
    }

    pub fn is_riding(&self, id: EntityId) -> bool {
        self.riding == Some(id)
    }

    /// Apply damage; returns true when this kills the watcher
    pub fn take_damage(&mut self, damage: i32) -> bool {
        self.hp -= damage;
        if self.hp < 0 {
            self.dead = true;
        }
        self.dead
    }

    /// The tick must stop once the watcher is gone from this floor
    pub fn is_gone(&self) -> bool {
        self.dead || self.left_level
    }
}
