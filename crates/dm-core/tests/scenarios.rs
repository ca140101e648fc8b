//! Multi-tick scenarios driven through the public scheduler

mod common;

use common::{acted, orc, statue, world};
use dm_core::combat::MeleeTarget;
use dm_core::dungeon::{Cell, Level, Pos};
use dm_core::gameloop::{run_tick, track_watcher};
use dm_core::monster::search::find_safety;
use dm_core::monster::{
    Attitude, EntityId, Species, SpeciesFlags, SpeciesId, TurnOutcome, act_one_turn, despawn, spawn,
};
use dm_core::world::{DespawnReason, Event, NoHooks, SimConfig, WorldContext};
use proptest::prelude::*;

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn test_faster_entities_act_more_often() {
    let mut ctx = world(Level::open_room(20, 20, 8), Pos::new(2, 2), vec![statue()], 3);
    let fast = spawn(&mut ctx, SpeciesId(0), Pos::new(8, 8)).unwrap();
    let slow = spawn(&mut ctx, SpeciesId(0), Pos::new(8, 12)).unwrap();
    for (id, speed) in [(fast, 120), (slow, 110)] {
        let e = ctx.entity_mut(id).unwrap();
        e.speed = speed;
        e.energy_need = 0;
    }

    for _ in 0..100 {
        run_tick(&mut ctx, &mut NoHooks);
    }
    assert_eq!(acted(&ctx, fast), 21);
    assert_eq!(acted(&ctx, slow), 11);
}

#[test]
fn test_sleepers_never_act() {
    let mut ctx = world(Level::open_room(12, 12, 8), Pos::new(2, 2), vec![orc()], 5);
    let id = spawn(&mut ctx, SpeciesId(0), Pos::new(3, 3)).unwrap();
    {
        let e = ctx.entity_mut(id).unwrap();
        e.timers.sleep = 1000;
        e.energy_need = -10_000;
    }

    for _ in 0..50 {
        run_tick(&mut ctx, &mut NoHooks);
    }
    assert_eq!(acted(&ctx, id), 0);
    assert_eq!(ctx.entity(id).unwrap().pos, Pos::new(3, 3));
    assert_eq!(ctx.watcher.hp, ctx.watcher.max_hp);
}

#[test]
fn test_orphans_vanish_one_generation_per_tick() {
    let mut ctx = world(Level::open_room(12, 12, 8), Pos::new(2, 2), vec![statue()], 9);
    let parent = spawn(&mut ctx, SpeciesId(0), Pos::new(5, 5)).unwrap();
    let child = spawn(&mut ctx, SpeciesId(0), Pos::new(5, 7)).unwrap();
    let grandchild = spawn(&mut ctx, SpeciesId(0), Pos::new(5, 9)).unwrap();
    // Default spawn state: energy debt and no awareness tweaks
    for (id, up) in [(child, parent), (grandchild, child)] {
        ctx.entity_mut(id).unwrap().parent = Some(up);
    }
    despawn(&mut ctx, parent, DespawnReason::Killed).unwrap();

    // The grandchild moves first and still sees its parent alive
    run_tick(&mut ctx, &mut NoHooks);
    assert!(!ctx.is_alive(child));
    assert!(ctx.is_alive(grandchild));

    run_tick(&mut ctx, &mut NoHooks);
    assert!(!ctx.is_alive(grandchild));
    let orphaned = ctx.events.count(|e| {
        matches!(
            e,
            Event::Despawned {
                reason: DespawnReason::Orphaned,
                ..
            }
        )
    });
    assert_eq!(orphaned, 2);
}

#[test]
fn test_reproduction_respects_the_level_cap() {
    let config = SimConfig {
        max_repro: 3,
        ..SimConfig::default()
    };
    let breeder = Species::new("giant louse", 1)
        .with_flags(SpeciesFlags::MULTIPLY | SpeciesFlags::NEVER_BLOW);
    let mut ctx = world(Level::open_room(20, 20, 32), Pos::new(2, 2), vec![breeder], 13)
        .with_config(config);
    let first = spawn(&mut ctx, SpeciesId(0), Pos::new(10, 10)).unwrap();
    ctx.entity_mut(first).unwrap().energy_need = 0;

    for _ in 0..300 {
        run_tick(&mut ctx, &mut NoHooks);
    }
    let births = ctx.events.count(|e| matches!(e, Event::Multiplied { .. }));
    assert!(births >= 1);
    assert!(ctx.level.repro_count <= 3);
    assert_eq!(births as u32, ctx.level.repro_count);
    assert_eq!(ctx.level.entities.len(), 1 + births);
}

// ============================================================================
// Movement and melee
// ============================================================================

#[test]
fn test_hostile_chases_then_attacks() {
    let mut ctx = world(Level::open_room(12, 12, 8), Pos::new(2, 2), vec![orc()], 21);
    track_watcher(&mut ctx);
    let id = spawn(&mut ctx, SpeciesId(0), Pos::new(8, 8)).unwrap();
    ctx.entity_mut(id).unwrap().energy_need = -10_000;

    let mut attacked = false;
    for _ in 0..20 {
        run_tick(&mut ctx, &mut NoHooks);
        attacked = ctx.events.events().iter().any(|e| {
            matches!(
                e,
                Event::MeleeStarted {
                    target: MeleeTarget::Watcher,
                    ..
                }
            )
        });
        if attacked {
            break;
        }
    }
    assert!(attacked);
    assert_eq!(ctx.entity(id).unwrap().pos.distance(ctx.watcher.pos), 1);
    assert!(ctx.watcher.disturbances > 0);
}

fn melee_on_watcher(ctx: &WorldContext) -> usize {
    ctx.events.count(|e| {
        matches!(
            e,
            Event::MeleeStarted {
                target: MeleeTarget::Watcher,
                ..
            }
        )
    })
}

#[test]
fn test_chaser_steps_next_to_watcher_without_swinging() {
    let mut ctx = world(Level::open_room(12, 12, 8), Pos::new(5, 7), vec![orc()], 31);
    track_watcher(&mut ctx);
    let id = spawn(&mut ctx, SpeciesId(0), Pos::new(5, 5)).unwrap();

    let outcome = act_one_turn(&mut ctx, &mut NoHooks, id);
    assert!(outcome.moved());
    assert_eq!(ctx.entity(id).unwrap().pos, Pos::new(5, 6));
    assert_eq!(melee_on_watcher(&ctx), 0);
}

#[test]
fn test_adjacent_hostile_swings_instead_of_moving() {
    let mut ctx = world(Level::open_room(12, 12, 8), Pos::new(5, 7), vec![orc()], 32);
    track_watcher(&mut ctx);
    let id = spawn(&mut ctx, SpeciesId(0), Pos::new(5, 6)).unwrap();

    act_one_turn(&mut ctx, &mut NoHooks, id);
    assert_eq!(melee_on_watcher(&ctx), 1);
    assert!(ctx.events.events().contains(&Event::MeleeStarted {
        attacker: id,
        target: MeleeTarget::Watcher,
    }));
    assert_eq!(ctx.entity(id).unwrap().pos, Pos::new(5, 6));
}

#[test]
fn test_frightened_entity_swerves_around_wall() {
    let mut level = Level::open_room(12, 12, 8);
    level.set_cell(Pos::new(5, 7), Cell::wall());
    let mut ctx = world(level, Pos::new(5, 5), vec![orc()], 33);
    track_watcher(&mut ctx);
    let id = spawn(&mut ctx, SpeciesId(0), Pos::new(5, 6)).unwrap();
    ctx.entity_mut(id).unwrap().timers.fear = 20;

    let outcome = act_one_turn(&mut ctx, &mut NoHooks, id);
    assert!(outcome.moved());
    let now = ctx.entity(id).unwrap().pos;
    assert_ne!(now, Pos::new(5, 6));
    assert!(now.distance(ctx.watcher.pos) >= 2);
    assert_eq!(melee_on_watcher(&ctx), 0);
}

#[test]
fn test_pet_engages_adjacent_hostile() {
    let mut ctx = world(Level::open_room(12, 12, 8), Pos::new(4, 4), vec![orc()], 4);
    let pet = spawn(&mut ctx, SpeciesId(0), Pos::new(6, 6)).unwrap();
    let foe = spawn(&mut ctx, SpeciesId(0), Pos::new(6, 7)).unwrap();
    ctx.entity_mut(pet).unwrap().disposition.attitude = Attitude::Pet;

    act_one_turn(&mut ctx, &mut NoHooks, pet);
    assert!(ctx.events.events().contains(&Event::MeleeStarted {
        attacker: pet,
        target: MeleeTarget::Entity(foe),
    }));
    assert_eq!(ctx.entity(pet).unwrap().pos, Pos::new(6, 6));
}

#[test]
fn test_frightened_entity_backs_away() {
    let mut ctx = world(Level::open_room(20, 20, 8), Pos::new(2, 2), vec![orc()], 8);
    track_watcher(&mut ctx);
    let id = spawn(&mut ctx, SpeciesId(0), Pos::new(5, 5)).unwrap();
    ctx.entity_mut(id).unwrap().timers.fear = 20;
    let before = Pos::new(5, 5).distance(ctx.watcher.pos);

    let outcome = act_one_turn(&mut ctx, &mut NoHooks, id);
    assert!(matches!(outcome, TurnOutcome::Finished { moved: true, .. }));
    assert!(ctx.entity(id).unwrap().pos.distance(ctx.watcher.pos) > before);
}

// ============================================================================
// Determinism
// ============================================================================

fn brawl(seed: u64) -> String {
    let mut ctx = world(Level::open_room(14, 14, 16), Pos::new(7, 7), vec![orc()], seed);
    track_watcher(&mut ctx);
    for pos in [Pos::new(3, 3), Pos::new(10, 10), Pos::new(3, 11)] {
        spawn(&mut ctx, SpeciesId(0), pos).unwrap();
    }
    let pet = spawn(&mut ctx, SpeciesId(0), Pos::new(7, 8)).unwrap();
    ctx.entity_mut(pet).unwrap().disposition.attitude = Attitude::Pet;

    for _ in 0..100 {
        run_tick(&mut ctx, &mut NoHooks);
        track_watcher(&mut ctx);
        if ctx.watcher.is_gone() {
            break;
        }
    }
    serde_json::to_string(ctx.events.events()).unwrap()
}

#[test]
fn test_same_seed_same_fight() {
    let first = brawl(77);
    assert_eq!(first, brawl(77));
    assert!(first.contains("MeleeStarted"));
}

// ============================================================================
// Safety search
// ============================================================================

fn pillar_room(mover: Pos) -> Option<(WorldContext, EntityId)> {
    let mut level = Level::open_room(15, 15, 8);
    for y in 4..=8 {
        level.set_cell(Pos::new(y, 8), Cell::wall());
    }
    let mut ctx = world(level, Pos::new(6, 4), vec![orc()], 1);
    track_watcher(&mut ctx);
    let id = spawn(&mut ctx, SpeciesId(0), mover).ok()?;
    Some((ctx, id))
}

proptest! {
    #[test]
    fn prop_safety_is_farther_and_hidden(y in 1i16..14, x in 1i16..14) {
        let Some((ctx, id)) = pillar_room(Pos::new(y, x)) else {
            return Ok(());
        };
        let species = ctx.species_of(id).unwrap().clone();
        if let Some(spot) = find_safety(&ctx, id, &species) {
            let watcher = ctx.watcher.pos;
            prop_assert!(spot.distance(watcher) > Pos::new(y, x).distance(watcher));
            prop_assert!(!ctx.level.projectable(watcher, spot));
            prop_assert!(ctx.level.entity_at(spot).is_none());
        }
    }
}
