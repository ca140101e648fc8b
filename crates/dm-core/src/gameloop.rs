//! Tick scheduling
//!
//! Every tick each entity pays its speed's worth of energy off its debt and
//! acts whenever the debt reaches zero. Slots are walked from the highest
//! index down, so the newest entities move first.

use serde::{Deserialize, Serialize};

use crate::monster::{EntityId, act_one_turn, despawn};
use crate::world::{DespawnReason, Event, Hooks, WorldContext};

/// Energy earned per tick at a given speed.
///
/// 110 is normal speed and earns 10. The curve is flat and low for slow
/// creatures and tops out at 49.
pub fn speed_to_energy(speed: i16) -> u8 {
    let s = i32::from(speed);
    let energy = match s {
        i32::MIN..=99 => 1 + s.max(0) * 4 / 100,
        100..=109 => 5 + (s - 100) / 2,
        110..=129 => s - 100,
        _ => (30 + (s - 130) / 4).min(49),
    };
    energy as u8
}

/// Maps speed to per-tick energy
pub trait EnergyCurve {
    fn energy_for(&self, speed: i16) -> u8;
}

/// The standard speed table
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEnergy;

impl EnergyCurve for StandardEnergy {
    fn energy_for(&self, speed: i16) -> u8 {
        speed_to_energy(speed)
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Turns handed out
    pub acted: u32,
    /// Entities skipped for being too far from the watcher
    pub dormant: u32,
    /// Entities that did not notice the watcher
    pub unaware: u32,
    /// The tick stopped early because the watcher died or left
    pub aborted: bool,
}

/// Hands out turns according to an energy curve
#[derive(Debug, Clone, Default)]
pub struct TurnScheduler<E: EnergyCurve = StandardEnergy> {
    curve: E,
}

impl TurnScheduler<StandardEnergy> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: EnergyCurve> TurnScheduler<E> {
    pub fn with_curve(curve: E) -> Self {
        Self { curve }
    }

    /// Run one tick over every live entity
    pub fn run_tick(&self, ctx: &mut WorldContext, hooks: &mut dyn Hooks) -> TickReport {
        let mut report = TickReport::default();
        if ctx.flags.travelling {
            return report;
        }
        ctx.update_all_views();

        for index in (1..ctx.level.entities.slot_count()).rev() {
            let Some(id) = ctx.level.entities.id_at(index) else {
                continue;
            };
            match self.prepare(ctx, id) {
                Readiness::Ready => {}
                Readiness::Dormant => {
                    report.dormant += 1;
                    continue;
                }
                Readiness::Unaware => {
                    report.unaware += 1;
                    continue;
                }
                Readiness::Waiting | Readiness::Gone => continue,
            }

            act_one_turn(ctx, hooks, id);
            report.acted += 1;

            let no_flowed = ctx.watcher.no_flowed;
            let degrade = no_flowed && ctx.rng.one_in(3);
            if let Some(e) = ctx.entity_mut(id) {
                if e.target.is_some_and(|t| t.one_shot) {
                    e.target = None;
                }
                if degrade {
                    e.no_flow = true;
                }
            }
            if ctx.watcher.is_gone() {
                report.aborted = true;
                break;
            }
        }

        ctx.turn += 1;
        tracing::debug!(
            turn = ctx.turn,
            acted = report.acted,
            dormant = report.dormant,
            aborted = report.aborted,
            "tick done"
        );
        report
    }

    fn prepare(&self, ctx: &mut WorldContext, id: EntityId) -> Readiness {
        // Followers of a dead summoner go before anything else is checked
        if let Some(parent) = ctx.entity(id).and_then(|e| e.parent)
            && !ctx.is_alive(parent)
        {
            if let Err(err) = despawn(ctx, id, DespawnReason::Orphaned) {
                tracing::trace!(?id, %err, "orphan already gone");
            }
            return Readiness::Gone;
        }

        let no_flowed = ctx.watcher.no_flowed;
        let Some(e) = ctx.entity_mut(id) else {
            return Readiness::Waiting;
        };
        if e.born_this_tick {
            e.born_this_tick = false;
            return Readiness::Waiting;
        }
        if !no_flowed {
            e.no_flow = false;
        }

        let Some(e) = ctx.entity(id) else {
            return Readiness::Waiting;
        };
        if e.watcher_dist >= ctx.config.max_proximity && e.target.is_none() {
            return Readiness::Dormant;
        }
        if !notices_watcher(ctx, id) {
            return Readiness::Unaware;
        }
        if !self.charge(ctx, id) {
            return Readiness::Waiting;
        }
        Readiness::Ready
    }
}

enum Readiness {
    Ready,
    Waiting,
    Dormant,
    Unaware,
    Gone,
}

impl<E: EnergyCurve> TurnScheduler<E> {
    /// Pay energy and decide whether `id` acts now
    fn charge(&self, ctx: &mut WorldContext, id: EntityId) -> bool {
        let Some(e) = ctx.entity(id) else {
            return false;
        };
        let speed = if ctx.watcher.is_riding(id) {
            ctx.watcher.speed
        } else {
            let mut speed = e.speed;
            if ctx.flags.nightmare {
                speed += 5;
            }
            if e.timers.hasted() {
                speed += 10;
            }
            if e.timers.slowed() {
                speed -= 10;
            }
            speed
        };
        let gain = i32::from(self.curve.energy_for(speed));
        let refill = ctx.config.energy_quantum + ctx.rng.spread(ctx.config.energy_jitter);
        let Some(e) = ctx.entity_mut(id) else {
            return false;
        };
        e.energy_need -= gain;
        if e.energy_need > 0 {
            return false;
        }
        e.energy_need += refill;
        true
    }
}

/// Whether the entity has any way of knowing where the watcher is
fn notices_watcher(ctx: &WorldContext, id: EntityId) -> bool {
    let (Some(e), Some(species)) = (ctx.entity(id), ctx.species_of(id)) else {
        return false;
    };
    let sight = ctx.config.max_sight;
    let radius = if e.is_pet() {
        species.sense_radius.min(sight)
    } else {
        species.sense_radius
    };
    if e.watcher_dist <= radius {
        return true;
    }
    if e.watcher_dist <= sight && (e.in_view || ctx.watcher.aggravate) {
        return true;
    }

    let fields = &ctx.level.fields;
    let trail = fields.scent(ctx.watcher.pos);
    let dist = i32::from(fields.dist(e.pos));
    if !e.no_flow
        && trail != 0
        && fields.scent(e.pos) == trail
        && dist < ctx.config.flow_depth
        && dist < species.sense_radius
    {
        return true;
    }
    e.target.is_some()
}

/// Run one tick with the standard energy curve
pub fn run_tick(ctx: &mut WorldContext, hooks: &mut dyn Hooks) -> TickReport {
    TurnScheduler::new().run_tick(ctx, hooks)
}

/// Count every entity's status timers down by one.
///
/// Sleepers whose timer runs out wake up.
pub fn advance_status_timers(ctx: &mut WorldContext) {
    let mut woke = Vec::new();
    for e in ctx.level.entities.iter_mut() {
        let was_asleep = e.timers.asleep();
        e.timers.tick();
        if was_asleep && !e.timers.asleep() {
            woke.push(e.id);
        }
    }
    for id in woke {
        ctx.events.push(Event::Woke { id });
    }
}

/// Recompute the sound fields and lay fresh scent around the watcher
pub fn track_watcher(ctx: &mut WorldContext) {
    let origin = ctx.watcher.pos;
    ctx.level.update_flow(origin, ctx.config.flow_depth);
    ctx.level.update_scent(origin, ctx.turn);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use proptest::prelude::*;

    use crate::dungeon::{Level, Pos};
    use crate::monster::lifecycle::spawn;
    use crate::monster::{PursuitTarget, Species, SpeciesFlags, SpeciesId, SpeciesTable};
    use crate::player::Watcher;
    use crate::world::NoHooks;

    fn world(species: Species) -> WorldContext {
        let mut table = SpeciesTable::new();
        table.add(species);
        WorldContext::new(
            Level::open_room(30, 30, 16),
            Watcher::new(Pos::new(2, 2)),
            Arc::new(table),
            17,
        )
    }

    fn statue() -> Species {
        Species::new("gargoyle", 5).with_flags(SpeciesFlags::NEVER_MOVE | SpeciesFlags::NEVER_BLOW)
    }

    #[test]
    fn test_energy_table_points() {
        assert_eq!(speed_to_energy(110), 10);
        assert_eq!(speed_to_energy(120), 20);
        assert_eq!(speed_to_energy(100), 5);
        assert_eq!(speed_to_energy(0), 1);
        assert_eq!(speed_to_energy(-40), 1);
        assert_eq!(speed_to_energy(i16::MAX), 49);
    }

    proptest! {
        #[test]
        fn prop_energy_is_monotone(a in -200i16..400, b in -200i16..400) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(speed_to_energy(lo) <= speed_to_energy(hi));
            prop_assert!(speed_to_energy(hi) >= 1);
        }
    }

    #[test]
    fn test_travel_skips_the_tick() {
        let mut ctx = world(statue());
        spawn(&mut ctx, SpeciesId(0), Pos::new(5, 5)).unwrap();
        ctx.flags.travelling = true;
        let report = run_tick(&mut ctx, &mut NoHooks);
        assert_eq!(report, TickReport::default());
        assert_eq!(ctx.turn, 0);
    }

    #[test]
    fn test_newborns_sit_out_one_tick() {
        let mut ctx = world(statue());
        let id = spawn(&mut ctx, SpeciesId(0), Pos::new(5, 5)).unwrap();
        {
            let e = ctx.entity_mut(id).unwrap();
            e.born_this_tick = true;
            e.energy_need = -1000;
        }
        assert_eq!(run_tick(&mut ctx, &mut NoHooks).acted, 0);
        assert!(!ctx.entity(id).unwrap().born_this_tick);
        assert_eq!(run_tick(&mut ctx, &mut NoHooks).acted, 1);
    }

    #[test]
    fn test_orphans_despawn_before_any_gate() {
        let mut ctx = world(statue());
        ctx.config.max_proximity = 10;
        let parent = spawn(&mut ctx, SpeciesId(0), Pos::new(5, 5)).unwrap();
        // Far away, freshly born and still in energy debt
        let child = spawn(&mut ctx, SpeciesId(0), Pos::new(25, 25)).unwrap();
        {
            let e = ctx.entity_mut(child).unwrap();
            e.parent = Some(parent);
            e.born_this_tick = true;
        }
        despawn(&mut ctx, parent, DespawnReason::Killed).unwrap();
        ctx.events.clear();

        let report = run_tick(&mut ctx, &mut NoHooks);
        assert!(!ctx.is_alive(child));
        assert_eq!(report.acted, 0);
        assert_eq!(report.dormant, 0);
        assert_eq!(
            ctx.events.events(),
            &[Event::Despawned {
                id: child,
                species: SpeciesId(0),
                reason: DespawnReason::Orphaned,
            }]
        );
    }

    #[test]
    fn test_distant_entities_stay_dormant() {
        let mut ctx = world(statue());
        ctx.config.max_proximity = 10;
        let id = spawn(&mut ctx, SpeciesId(0), Pos::new(25, 25)).unwrap();
        ctx.entity_mut(id).unwrap().energy_need = -1000;
        let report = run_tick(&mut ctx, &mut NoHooks);
        assert_eq!(report.dormant, 1);
        assert_eq!(report.acted, 0);

        ctx.entity_mut(id).unwrap().target = Some(PursuitTarget {
            pos: Pos::new(2, 3),
            one_shot: true,
        });
        let report = run_tick(&mut ctx, &mut NoHooks);
        assert_eq!(report.acted, 1);
        // One-shot targets are forgotten after the turn
        assert!(ctx.entity(id).unwrap().target.is_none());
    }

    #[test]
    fn test_unaware_entities_do_not_act() {
        let mut ctx = world(statue().with_sense_radius(3));
        let mut level = Level::open_room(30, 30, 16);
        for y in 1..29 {
            level.set_cell(Pos::new(y, 10), crate::dungeon::Cell::wall());
        }
        ctx.level = level;
        let id = spawn(&mut ctx, SpeciesId(0), Pos::new(5, 15)).unwrap();
        ctx.entity_mut(id).unwrap().energy_need = -1000;
        let report = run_tick(&mut ctx, &mut NoHooks);
        assert_eq!(report.unaware, 1);
        assert_eq!(report.acted, 0);
    }

    #[test]
    fn test_haste_doubles_energy_at_normal_speed() {
        let mut ctx = world(statue().with_speed(110));
        let id = spawn(&mut ctx, SpeciesId(0), Pos::new(5, 5)).unwrap();
        {
            let e = ctx.entity_mut(id).unwrap();
            e.speed = 110;
            e.energy_need = 1000;
            e.timers.haste = 50;
        }
        let scheduler = TurnScheduler::new();
        assert!(!scheduler.charge(&mut ctx, id));
        assert_eq!(ctx.entity(id).unwrap().energy_need, 980);
    }

    #[test]
    fn test_timers_wake_sleepers() {
        let mut ctx = world(statue());
        let id = spawn(&mut ctx, SpeciesId(0), Pos::new(5, 5)).unwrap();
        ctx.entity_mut(id).unwrap().timers.sleep = 1;
        advance_status_timers(&mut ctx);
        assert!(!ctx.entity(id).unwrap().timers.asleep());
        assert_eq!(ctx.events.events(), &[Event::Woke { id }]);
    }

    #[test]
    fn test_track_watcher_fills_fields() {
        let mut ctx = world(statue());
        ctx.turn = 40;
        track_watcher(&mut ctx);
        assert_eq!(ctx.level.fields.dist(Pos::new(2, 2)), 1);
        assert_eq!(ctx.level.fields.scent(Pos::new(2, 2)), 42);
    }
}
