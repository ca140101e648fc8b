//! Observable event log
//!
//! The engine never formats text. Everything the watcher could notice is
//! recorded here as a value, and the host turns it into messages.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::combat::MeleeTarget;
use crate::dungeon::Pos;
use crate::monster::{EntityId, SpeciesId};

/// Why an entity left the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum DespawnReason {
    Killed,
    /// Its parent was already gone
    Orphaned,
    /// A volatile creature blinked out of existence
    Vanished,
    /// Fled the level at low health
    Escaped,
    SelfDestructed,
    /// Removed by the host
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Passed the sleep gate and took a turn
    Acted { id: EntityId },
    Moved { id: EntityId, from: Pos, to: Pos },
    /// Shoved past another entity, trading places
    Shoved { id: EntityId, other: EntityId },
    Despawned { id: EntityId, species: SpeciesId, reason: DespawnReason },

    MeleeStarted { attacker: EntityId, target: MeleeTarget },
    BlowLanded { attacker: EntityId, target: MeleeTarget, damage: i32 },
    BlowMissed { attacker: EntityId, target: MeleeTarget },
    /// A touch aura burned the attacker
    AuraBurn { defender: EntityId, attacker: EntityId, damage: i32 },
    Healed { id: EntityId, amount: i32 },
    Frightened { id: EntityId },
    PutToSleep { id: EntityId },
    Quake { center: Pos },
    ThiefBlinked { id: EntityId, to: Pos },
    BarrierBlocked { id: EntityId },
    /// A blow affected the watcher in a way only the host can apply
    WatcherStatus { attacker: EntityId, effect: String },

    Woke { id: EntityId },
    BecameHostile { id: EntityId },
    Multiplied { parent: EntityId, child: EntityId },
    Swarmed { id: EntityId, count: usize },
    HeavySteps { id: EntityId },
    Speech { id: EntityId },
    /// `target` is None when the spell went at the watcher
    SpellCast { id: EntityId, target: Option<EntityId> },
    Disguised { id: EntityId, form: SpeciesId },
    TurnsToFight { id: EntityId },

    DoorOpened { id: EntityId, pos: Pos },
    DoorUnlocked { id: EntityId, pos: Pos },
    DoorBashed { id: EntityId, pos: Pos, broken: bool },
    WallDug { id: EntityId, pos: Pos },
    WardBroken { pos: Pos },
    RuneExploded { pos: Pos, damage: i32 },
    RuneDisarmed { pos: Pos },
    ItemTaken { id: EntityId, item: String },
    ItemDestroyed { id: EntityId, item: String },
    PickupFailed { id: EntityId, item: String },

    Dismounted { mount: EntityId },
    PinchWarning { id: EntityId },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        tracing::trace!(?event, "event");
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
