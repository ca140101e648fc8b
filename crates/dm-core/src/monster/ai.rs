//! One entity's turn
//!
//! A turn is a fixed pipeline of states. Each state either lets the turn go
//! on or ends it early with a [`TurnEnded`] reason, so the pipeline reads as
//! a chain of `?`s. Liveness is rechecked after anything that can kill.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::consts::{DISGUISE_FLICKER, MULTIPLY_ADJUST, SELF_DESTRUCT_DAMAGE, SWARM_SIZE};
use crate::dungeon::Direction;
use crate::world::{DespawnReason, Event, Hooks, WorldContext};

use super::direction::{Candidate, SCATTER};
use super::lifecycle::{damage_entity, despawn, free_neighbour, spawn, spawn_clone};
use super::movement::{enemy_direction, plan_moves};
use super::step::{StepReport, apply_steps};
use super::{Attitude, EntityId, Species, SpeciesFlags, are_enemies};

/// Why a turn stopped before the step loop finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum TurnEnded {
    /// The entity no longer exists
    Gone,
    Asleep,
    Stunned,
    /// A volatile creature skipped its turn
    Flickered,
    Multiplied,
    CastSpell,
    /// The planner found nowhere to go
    NoMove,
    /// The watcher died or left the level
    WatcherGone,
}

/// How a turn went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnOutcome {
    Ended(TurnEnded),
    Finished {
        moved: bool,
        /// Something used up the turn: a step, a fight, a door
        committed: bool,
    },
}

impl TurnOutcome {
    pub fn moved(&self) -> bool {
        matches!(self, TurnOutcome::Finished { moved: true, .. })
    }
}

/// Per-turn state shared by the pipeline
struct Turn<'a> {
    id: EntityId,
    species: &'a Species,
    /// Knows where the watcher is
    aware: bool,
    ridden: bool,
}

type State = Result<(), TurnEnded>;

/// Run one full turn for `id`
pub fn act_one_turn(ctx: &mut WorldContext, hooks: &mut dyn Hooks, id: EntityId) -> TurnOutcome {
    let table = Arc::clone(&ctx.species);
    let Some(species) = ctx.entity(id).and_then(|e| table.get(e.species)) else {
        return TurnOutcome::Ended(TurnEnded::Gone);
    };
    let mut turn = Turn {
        id,
        species,
        aware: true,
        ridden: ctx.watcher.is_riding(id),
    };

    match run_pipeline(ctx, hooks, &mut turn) {
        Ok(report) => TurnOutcome::Finished {
            moved: report.moved,
            committed: report.took_turn,
        },
        Err(end) => {
            tracing::debug!(?id, %end, "turn ended");
            TurnOutcome::Ended(end)
        }
    }
}

fn run_pipeline(ctx: &mut WorldContext, hooks: &mut dyn Hooks, turn: &mut Turn<'_>) -> Result<StepReport, TurnEnded> {
    dismount_hazard(ctx, turn);
    disguise_flicker(ctx, turn);
    stealth_check(ctx, turn);
    orphan_check(ctx, turn)?;
    quantum_flicker(ctx, turn)?;
    self_destruct(ctx, turn)?;
    pinch_escape(ctx, turn)?;
    sleep_gate(ctx, turn)?;
    stun_gate(ctx, turn)?;
    hostility_flip(ctx, turn);
    reproduce(ctx, turn)?;
    swarm(ctx, turn);
    ambient_noise(ctx, turn);
    cast_spell(ctx, hooks, turn)?;

    let candidates = choose_directions(ctx, turn)?;
    let report = apply_steps(ctx, hooks, turn.id, turn.species, &candidates);
    still_here(ctx, turn)?;

    if !report.took_turn && !report.moved {
        fallback_spell(ctx, hooks, turn)?;
        steel_nerves(ctx, turn);
    }
    Ok(report)
}

fn still_here(ctx: &WorldContext, turn: &Turn<'_>) -> State {
    if !ctx.is_alive(turn.id) {
        return Err(TurnEnded::Gone);
    }
    if ctx.watcher.is_gone() {
        return Err(TurnEnded::WatcherGone);
    }
    Ok(())
}

/// A mount that was never meant to be ridden may throw its rider
fn dismount_hazard(ctx: &mut WorldContext, turn: &mut Turn<'_>) {
    if !turn.ridden || turn.species.has(SpeciesFlags::RIDEABLE) {
        return;
    }
    if ctx.rng.rand0(100) < ctx.watcher.riding_skill {
        return;
    }
    let here = ctx.watcher.pos;
    let Some(spot) = free_neighbour(ctx, here) else {
        return;
    };
    ctx.watcher.riding = None;
    ctx.watcher.pos = spot;
    ctx.watcher.disturb();
    ctx.events.push(Event::Dismounted { mount: turn.id });
    ctx.update_all_views();
    turn.ridden = false;
}

fn disguise_flicker(ctx: &mut WorldContext, turn: &Turn<'_>) {
    if !turn.species.has(SpeciesFlags::SHAPECHANGER) {
        return;
    }
    let Some((current, disguised, asleep)) = ctx
        .entity(turn.id)
        .map(|e| (e.apparent, e.disguised, e.timers.asleep()))
    else {
        return;
    };
    if !disguised || asleep || !ctx.rng.one_in(DISGUISE_FLICKER) {
        return;
    }
    let table = Arc::clone(&ctx.species);
    if let Some(form) = table.random_disguise(&mut ctx.rng, current)
        && let Some(e) = ctx.entity_mut(turn.id)
    {
        e.apparent = form;
        ctx.events.push(Event::Disguised { id: turn.id, form });
    }
}

/// A watcher hiding in shadow may go unnoticed
fn stealth_check(ctx: &mut WorldContext, turn: &mut Turn<'_>) {
    let Some(stealth) = ctx.watcher.shadow_stealth else {
        return;
    };
    let level = turn.species.level;
    let w_lev = ctx.watcher.level;
    let mut score = stealth;
    if ctx.watcher.aggravate {
        score /= 2;
    }
    if level > w_lev * w_lev / 20 + 10 {
        score /= 3;
    }
    if ctx.rng.rand0(score) > level + 20 {
        turn.aware = false;
    }
}

/// Summoned followers vanish once their summoner is gone
fn orphan_check(ctx: &mut WorldContext, turn: &Turn<'_>) -> State {
    let Some(parent) = ctx.entity(turn.id).and_then(|e| e.parent) else {
        return Ok(());
    };
    if ctx.is_alive(parent) {
        return Ok(());
    }
    if let Err(err) = despawn(ctx, turn.id, DespawnReason::Orphaned) {
        tracing::trace!(id = ?turn.id, %err, "orphan already gone");
    }
    Err(TurnEnded::Gone)
}

fn quantum_flicker(ctx: &mut WorldContext, turn: &Turn<'_>) -> State {
    if !turn.species.has(SpeciesFlags::QUANTUM) {
        return Ok(());
    }
    if ctx.rng.one_in(2) {
        return Err(TurnEnded::Flickered);
    }
    let odds = i32::from(turn.id.index) % 100 + 10;
    if ctx.rng.one_in(odds) && !turn.species.has(SpeciesFlags::QUESTOR) {
        if let Err(err) = despawn(ctx, turn.id, DespawnReason::Vanished) {
            tracing::trace!(id = ?turn.id, %err, "flicker target already gone");
        }
        return Err(TurnEnded::Gone);
    }
    Ok(())
}

fn self_destruct(ctx: &mut WorldContext, turn: &Turn<'_>) -> State {
    if !turn.species.has(SpeciesFlags::SELF_DESTRUCT) {
        return Ok(());
    }
    match damage_entity(
        ctx,
        turn.id,
        SELF_DESTRUCT_DAMAGE,
        Some(turn.id),
        DespawnReason::SelfDestructed,
    ) {
        Ok(hit) if !hit.died() => Ok(()),
        _ => Err(TurnEnded::Gone),
    }
}

/// Allied uniques retreat off the level when badly hurt, after a warning
fn pinch_escape(ctx: &mut WorldContext, turn: &Turn<'_>) -> State {
    if !turn.species.has(SpeciesFlags::UNIQUE) {
        return Ok(());
    }
    let limit = if turn.ridden {
        ctx.config.riding_pinch_warnings
    } else {
        ctx.config.pinch_warnings
    };
    let Some(e) = ctx.entity_mut(turn.id) else {
        return Err(TurnEnded::Gone);
    };
    if e.is_hostile() {
        return Ok(());
    }
    if e.hp >= e.max_hp / 3 {
        e.pinch_warnings = 0;
        return Ok(());
    }
    if e.pinch_warnings < limit {
        e.pinch_warnings += 1;
        ctx.events.push(Event::PinchWarning { id: turn.id });
        ctx.watcher.disturb();
        return Ok(());
    }
    tracing::info!(id = ?turn.id, "ally escaped the level");
    if let Err(err) = despawn(ctx, turn.id, DespawnReason::Escaped) {
        tracing::trace!(id = ?turn.id, %err, "escapee already gone");
    }
    Err(TurnEnded::Gone)
}

fn sleep_gate(ctx: &mut WorldContext, turn: &Turn<'_>) -> State {
    let aggravate = ctx.watcher.aggravate;
    let Some(e) = ctx.entity_mut(turn.id) else {
        return Err(TurnEnded::Gone);
    };
    if e.timers.asleep() {
        if !aggravate {
            return Err(TurnEnded::Asleep);
        }
        e.timers.sleep = 0;
        ctx.events.push(Event::Woke { id: turn.id });
    }
    ctx.events.push(Event::Acted { id: turn.id });
    Ok(())
}

fn stun_gate(ctx: &mut WorldContext, turn: &Turn<'_>) -> State {
    let stunned = ctx.entity(turn.id).is_some_and(|e| e.timers.stunned());
    if stunned && ctx.rng.one_in(2) {
        return Err(TurnEnded::Stunned);
    }
    Ok(())
}

fn hostility_flip(ctx: &mut WorldContext, turn: &Turn<'_>) {
    let aggravate = ctx.watcher.aggravate;
    let align = ctx.watcher.sub_align();
    let Some(e) = ctx.entity_mut(turn.id) else {
        return;
    };
    let angry = (e.is_friendly() && aggravate)
        || (e.is_pet() && turn.species.is_hostile_to(align));
    if angry {
        e.set_hostile();
        ctx.events.push(Event::BecameHostile { id: turn.id });
    }
}

fn reproduce(ctx: &mut WorldContext, turn: &Turn<'_>) -> State {
    if !turn.species.has(SpeciesFlags::MULTIPLY) || ctx.level.repro_count >= ctx.config.max_repro {
        return Ok(());
    }
    let Some(pos) = ctx.entity(turn.id).map(|e| e.pos) else {
        return Err(TurnEnded::Gone);
    };
    let crowd = ctx.level.count_neighbours(pos);
    if crowd >= 4 || (crowd != 0 && ctx.rng.rand0(crowd * MULTIPLY_ADJUST) != 0) {
        return Ok(());
    }
    match spawn_clone(ctx, turn.id) {
        Ok(child) => {
            ctx.events.push(Event::Multiplied {
                parent: turn.id,
                child,
            });
            Err(TurnEnded::Multiplied)
        }
        Err(err) => {
            tracing::trace!(id = ?turn.id, %err, "no room to multiply");
            Ok(())
        }
    }
}

/// Swarm species scatter smaller creatures around themselves
fn swarm(ctx: &mut WorldContext, turn: &Turn<'_>) {
    let Some(kind) = turn.species.swarm else {
        return;
    };
    if !ctx.rng.percent(turn.species.cast_frequency) {
        return;
    }
    let Some((pos, pet)) = ctx.entity(turn.id).map(|e| (e.pos, e.is_pet())) else {
        return;
    };
    let mut count = 0;
    for _ in 0..SWARM_SIZE {
        let Some(spot) = free_neighbour(ctx, pos) else {
            break;
        };
        let Ok(child) = spawn(ctx, kind, spot) else {
            continue;
        };
        if let Some(c) = ctx.entity_mut(child) {
            c.born_this_tick = true;
            if pet {
                c.disposition.attitude = Attitude::Pet;
                c.parent = Some(turn.id);
            }
        }
        count += 1;
    }
    if count > 0 {
        ctx.events.push(Event::Swarmed { id: turn.id, count });
    }
}

fn ambient_noise(ctx: &mut WorldContext, turn: &Turn<'_>) {
    let Some((pos, in_view, dist)) = ctx
        .entity(turn.id)
        .map(|e| (e.pos, e.in_view, e.watcher_dist))
    else {
        return;
    };
    if turn.species.has(SpeciesFlags::HEAVY_STEPS)
        && !in_view
        && dist <= ctx.config.max_sight
        && ctx.rng.one_in(ctx.config.heavy_step_chance)
    {
        ctx.events.push(Event::HeavySteps { id: turn.id });
    }
    if turn.species.has(SpeciesFlags::CAN_SPEAK)
        && turn.aware
        && ctx.rng.one_in(ctx.config.speak_chance)
        && ctx.level.los(ctx.watcher.pos, pos)
        && ctx.level.projectable(pos, ctx.watcher.pos)
    {
        ctx.events.push(Event::Speech { id: turn.id });
    }
}

/// The entity standing on our counter-attack target, if worth a spell
fn counter_target(ctx: &WorldContext, id: EntityId) -> Option<EntityId> {
    let me = ctx.entity(id)?;
    let target = me.target?;
    let other_id = ctx.level.entity_at(target.pos).filter(|&o| o != id)?;
    let other = ctx.entity(other_id)?;
    let other_species = ctx.species.get(other.species)?;
    (are_enemies(me, other, other_species) && ctx.level.projectable(me.pos, target.pos))
        .then_some(other_id)
}

fn spell_at_watcher(ctx: &mut WorldContext, hooks: &mut dyn Hooks, turn: &Turn<'_>) -> bool {
    let hostile = ctx.entity(turn.id).is_some_and(|e| e.is_hostile());
    if !turn.aware || !hostile || !hooks.cast_at_watcher(ctx, turn.id) {
        return false;
    }
    ctx.events.push(Event::SpellCast {
        id: turn.id,
        target: None,
    });
    true
}

fn spell_at_entity(
    ctx: &mut WorldContext,
    hooks: &mut dyn Hooks,
    turn: &Turn<'_>,
    preferred: Option<EntityId>,
) -> bool {
    let Some(target) = hooks.cast_at_entity(ctx, turn.id, preferred) else {
        return false;
    };
    ctx.events.push(Event::SpellCast {
        id: turn.id,
        target: Some(target),
    });
    true
}

fn cast_spell(ctx: &mut WorldContext, hooks: &mut dyn Hooks, turn: &Turn<'_>) -> State {
    let freq = turn.species.cast_frequency;
    if freq <= 0 || ctx.rng.rand1(100) > freq {
        return Ok(());
    }
    let cast = match counter_target(ctx, turn.id) {
        Some(other) => {
            spell_at_entity(ctx, hooks, turn, Some(other)) || spell_at_watcher(ctx, hooks, turn)
        }
        None => spell_at_watcher(ctx, hooks, turn) || spell_at_entity(ctx, hooks, turn, None),
    };
    if cast {
        still_here(ctx, turn)?;
        return Err(TurnEnded::CastSpell);
    }
    Ok(())
}

/// Four tries with the first three aimed at `dirs` when given
fn scatter_toward(dirs: Option<[Direction; 3]>) -> Vec<Candidate> {
    let mut list = SCATTER.to_vec();
    if let Some(dirs) = dirs {
        for (slot, dir) in list.iter_mut().zip(dirs) {
            *slot = Candidate::Dir(dir);
        }
    }
    list
}

fn choose_directions(ctx: &mut WorldContext, turn: &Turn<'_>) -> Result<Vec<Candidate>, TurnEnded> {
    let Some((confused, pet, friendly, dist)) = ctx
        .entity(turn.id)
        .map(|e| (e.timers.confused(), e.is_pet(), e.is_friendly(), e.watcher_dist))
    else {
        return Err(TurnEnded::Gone);
    };
    let species = turn.species;
    let erratic = SpeciesFlags::RAND_25 | SpeciesFlags::RAND_50;

    if confused || !turn.aware {
        return Ok(SCATTER.to_vec());
    }
    if species.flags.contains(erratic) && ctx.rng.rand0(100) < 75 {
        return Ok(SCATTER.to_vec());
    }
    if species.has(SpeciesFlags::RAND_50) && ctx.rng.rand0(100) < 50 {
        return Ok(SCATTER.to_vec());
    }
    if species.has(SpeciesFlags::RAND_25) && ctx.rng.rand0(100) < 25 {
        return Ok(SCATTER.to_vec());
    }
    if species.has(SpeciesFlags::NEVER_MOVE) && dist > 1 {
        return Ok(scatter_toward(enemy_direction(ctx, turn.id, species)));
    }

    if pet {
        let leash = ctx.watcher.pet_follow_distance;
        let avoid = leash < 0 && dist <= -leash;
        let lonely = leash >= 0 && dist > leash;
        let distant = dist > ctx.config.pet_seek_dist;
        if let Some(dirs) = enemy_direction(ctx, turn.id, species) {
            return Ok(scatter_toward(Some(dirs)));
        }
        if avoid || lonely || distant {
            let leash = leash.min(ctx.config.pet_seek_dist);
            if let Some(list) = plan_moves(ctx, turn.id, species, leash) {
                return Ok(list);
            }
        }
        return Ok(SCATTER.to_vec());
    }
    if friendly {
        return Ok(scatter_toward(enemy_direction(ctx, turn.id, species)));
    }

    let leash = ctx.watcher.pet_follow_distance;
    plan_moves(ctx, turn.id, species, leash).ok_or(TurnEnded::NoMove)
}

/// Idle casters get a second chance to use a spell
fn fallback_spell(ctx: &mut WorldContext, hooks: &mut dyn Hooks, turn: &Turn<'_>) -> State {
    let afraid = ctx.entity(turn.id).is_some_and(|e| e.timers.afraid());
    if afraid || turn.ridden || !turn.aware {
        return Ok(());
    }
    let freq = turn.species.cast_frequency;
    if freq <= 0 || ctx.rng.rand1(100) > freq {
        return Ok(());
    }
    if spell_at_watcher(ctx, hooks, turn) {
        still_here(ctx, turn)?;
        return Err(TurnEnded::CastSpell);
    }
    Ok(())
}

/// A frightened entity with nowhere to run turns to fight
fn steel_nerves(ctx: &mut WorldContext, turn: &Turn<'_>) {
    if !turn.aware {
        return;
    }
    if let Some(e) = ctx.entity_mut(turn.id)
        && e.timers.afraid()
    {
        e.timers.fear = 0;
        ctx.events.push(Event::TurnsToFight { id: turn.id });
    }
}
