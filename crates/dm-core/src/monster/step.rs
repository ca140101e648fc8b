//! Applying a move list
//!
//! Each candidate direction runs through a fixed series of gates: who or
//! what stands on the destination, terrain, doors, wards, melee and body
//! contests. The first direction that uses up the turn ends the loop.

use std::sync::Arc;

use crate::combat::{MeleeTarget, resolve_melee};
use crate::consts::{BREAK_RUNE, BREAK_WARD};
use crate::dungeon::{Cell, CellType, Direction, Pos, Ward};
use crate::world::{DespawnReason, Event, Hooks, WorldContext};

use super::direction::Candidate;
use super::lifecycle::damage_entity;
use super::search::can_cross;
use super::{EntityId, Species, SpeciesFlags, are_enemies};

/// What the step loop achieved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// The turn was spent (moved, fought, opened a door, dug)
    pub took_turn: bool,
    pub moved: bool,
    /// Candidates tried
    pub tries: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Step {
    took_turn: bool,
    moved: bool,
}

impl Step {
    const NOTHING: Step = Step {
        took_turn: false,
        moved: false,
    };
    const TURN: Step = Step {
        took_turn: true,
        moved: false,
    };
}

/// Try the candidates in order until one spends the turn
pub fn apply_steps(
    ctx: &mut WorldContext,
    hooks: &mut dyn Hooks,
    id: EntityId,
    species: &Species,
    candidates: &[Candidate],
) -> StepReport {
    let mut report = StepReport::default();

    for (i, candidate) in candidates.iter().enumerate() {
        report.tries = i + 1;
        let dir = match *candidate {
            Candidate::Dir(dir) => dir,
            Candidate::Random => Direction::SCAN[ctx.rng.rand0(8) as usize],
        };
        let Some(here) = ctx.entity(id).map(|e| e.pos) else {
            break;
        };
        let to = here.step(dir);
        if !ctx.level.contains(to) {
            continue;
        }
        tracing::trace!(?id, %dir, y = to.y, x = to.x, "step attempt");

        let step = try_step(ctx, hooks, id, species, here, to);
        report.moved |= step.moved;
        if step.took_turn {
            report.took_turn = true;
            break;
        }
        if !ctx.is_alive(id) || ctx.watcher.is_gone() {
            break;
        }
    }

    if ctx.watcher.no_flowed
        && report.tries > 2
        && let Some(e) = ctx.entity_mut(id)
        && e.target.is_some()
    {
        e.no_flow = false;
    }
    report
}

fn try_step(
    ctx: &mut WorldContext,
    hooks: &mut dyn Hooks,
    id: EntityId,
    species: &Species,
    here: Pos,
    to: Pos,
) -> Step {
    let Some((hp, pet, confused)) = ctx
        .entity(id)
        .map(|e| (e.hp, e.is_pet(), e.timers.confused()))
    else {
        return Step::NOTHING;
    };
    let ridden = ctx.watcher.is_riding(id);
    let watcher_here = to == ctx.watcher.pos;
    let occupant = ctx.level.entity_at(to).filter(|&o| o != id);
    let cell = *ctx.level.cell(to);
    let crossable = can_cross(&cell, species, ridden);

    let mut do_move = false;
    let mut took_turn = false;
    let mut dug = false;
    let mut bashed = false;

    if watcher_here || occupant.is_some() {
        do_move = true;
    } else if species.has(SpeciesFlags::KILL_WALL) && !ridden && cell.is_destructible() {
        do_move = true;
        dug = true;
    } else if crossable {
        do_move = true;
    } else if cell.is_closed_door() && (!pet || ctx.watcher.pet_open_doors) {
        let mut may_bash = true;
        if species.has(SpeciesFlags::OPEN_DOOR) {
            if cell.lock == 0 {
                ctx.level.cell_mut(to).open_door();
                ctx.events.push(Event::DoorOpened { id, pos: to });
                took_turn = true;
                may_bash = false;
            } else if ctx.rng.rand0(hp / 10) > i32::from(cell.lock) {
                ctx.level.cell_mut(to).unlock_door();
                ctx.events.push(Event::DoorUnlocked { id, pos: to });
                took_turn = true;
                may_bash = false;
            }
        }
        if may_bash
            && species.has(SpeciesFlags::BASH_DOOR)
            && ctx.rng.rand0(hp / 10) > i32::from(cell.lock)
        {
            let broken = ctx.rng.one_in(2);
            let door = ctx.level.cell_mut(to);
            if broken {
                door.break_door();
            } else {
                door.open_door();
            }
            ctx.events.push(Event::DoorBashed { id, pos: to, broken });
            bashed = true;
            do_move = true;
        }
    }

    if do_move && !(watcher_here && species.has(SpeciesFlags::NEVER_BLOW)) {
        match cell.ward {
            Some(Ward::Protection) => {
                do_move = false;
                if !pet && ctx.rng.rand1(BREAK_WARD) < species.level {
                    ctx.level.cell_mut(to).ward = None;
                    ctx.events.push(Event::WardBroken { pos: to });
                    do_move = true;
                }
            }
            Some(Ward::Explosive) => {
                do_move = false;
                if !pet {
                    if ctx.rng.rand1(BREAK_RUNE) > species.level {
                        let damage = 2 * (ctx.watcher.level + ctx.rng.dice(7, 7));
                        ctx.events.push(Event::RuneExploded { pos: to, damage });
                        ctx.level.cell_mut(to).ward = None;
                        let hit = damage_entity(ctx, id, damage, None, DespawnReason::Killed);
                        if hit.is_err() || hit.is_ok_and(|h| h.died()) {
                            return Step::TURN;
                        }
                    } else {
                        ctx.events.push(Event::RuneDisarmed { pos: to });
                        ctx.level.cell_mut(to).ward = None;
                    }
                    do_move = true;
                }
            }
            None => {}
        }
    }

    if do_move && watcher_here {
        if species.has(SpeciesFlags::NEVER_BLOW) {
            do_move = false;
        }
        if do_move && ctx.flags.no_melee && !confused && !species.has(SpeciesFlags::STUPID) {
            do_move = false;
        }
        if do_move && (ctx.watcher.riding.is_none() || ctx.rng.one_in(2)) {
            resolve_melee(ctx, hooks, id, MeleeTarget::Watcher);
            return Step::TURN;
        }
    }

    let mut shoved = None;
    if do_move && let Some(other) = occupant {
        do_move = false;
        let table = Arc::clone(&ctx.species);
        let (Some(mover), Some(z)) = (ctx.entity(id), ctx.entity(other)) else {
            return Step::NOTHING;
        };
        let Some(z_species) = table.get(z.species) else {
            return Step::NOTHING;
        };
        let is_mount = ctx.watcher.is_riding(other);
        let outweighs = species.exp * species.level > z_species.exp * z_species.level;
        let crushes = species.has(SpeciesFlags::KILL_BODY)
            && !species.has(SpeciesFlags::NEVER_BLOW)
            && outweighs
            && crossable
            && !is_mount;

        if crushes || are_enemies(mover, z, z_species) || confused {
            if !species.has(SpeciesFlags::NEVER_BLOW) {
                let outcome = resolve_melee(ctx, hooks, id, MeleeTarget::Entity(other));
                if outcome.attempted {
                    return Step::TURN;
                }
            }
        } else if species.has(SpeciesFlags::MOVE_BODY)
            && !species.has(SpeciesFlags::NEVER_MOVE)
            && species.exp > z_species.exp
            && crossable
            && !is_mount
            && can_cross(ctx.level.cell(here), z_species, false)
        {
            do_move = true;
            shoved = Some(other);
            if let Some(z) = ctx.entity_mut(other) {
                z.timers.sleep = 0;
            }
        }
    }

    if ridden && !ctx.entity(id).is_some_and(|e| e.timers.afraid()) {
        do_move = false;
    }

    if dug && do_move {
        ctx.level.cell_mut(to).clear_to_floor();
        ctx.events.push(Event::WallDug { id, pos: to });
        took_turn = true;
    }

    if do_move && !crossable && !dug && !bashed {
        do_move = false;
    }
    if do_move && species.has(SpeciesFlags::NEVER_MOVE) {
        do_move = false;
    }
    if !do_move {
        return Step {
            took_turn,
            moved: false,
        };
    }

    commit_move(ctx, id, species, here, to, &cell, shoved);
    Step {
        took_turn: true,
        moved: true,
    }
}

fn commit_move(
    ctx: &mut WorldContext,
    id: EntityId,
    species: &Species,
    from: Pos,
    to: Pos,
    cell: &Cell,
    shoved: Option<EntityId>,
) {
    let quantum = ctx.config.energy_quantum;
    if cell.typ == CellType::Tree && !species.has(SpeciesFlags::CAN_FLY)
        && let Some(e) = ctx.entity_mut(id)
    {
        e.energy_need += quantum;
    }

    if let Err(err) = ctx.level.move_entity(id, to) {
        tracing::warn!(?id, %err, "move rejected");
        return;
    }
    ctx.events.push(Event::Moved { id, from, to });
    if let Some(other) = shoved {
        ctx.events.push(Event::Shoved { id, other });
        ctx.update_view(other);
    }
    if ctx.watcher.is_riding(id) {
        ctx.watcher.pos = to;
        ctx.update_all_views();
    } else {
        ctx.update_view(id);
    }

    if ctx.entity(id).is_some_and(|e| e.in_view && e.is_hostile()) {
        ctx.watcher.disturb();
    }

    let wants_items = species
        .flags
        .intersects(SpeciesFlags::TAKE_ITEM | SpeciesFlags::KILL_ITEM);
    let pet = ctx.entity(id).is_some_and(|e| e.is_pet());
    let allowed = !pet || (ctx.watcher.pet_pickup_items && species.has(SpeciesFlags::TAKE_ITEM));
    if cell.holds_items() && wants_items && allowed {
        handle_items(ctx, id, species, to, pet);
    }
}

/// Take or wreck what lies on the new tile
fn handle_items(ctx: &mut WorldContext, id: EntityId, species: &Species, pos: Pos, pet: bool) {
    let taking = species.has(SpeciesFlags::TAKE_ITEM);
    let only_taking = taking && !species.has(SpeciesFlags::KILL_ITEM);
    let mut left = Vec::new();

    for item in ctx.level.take_items(pos) {
        if only_taking && item.is_ignored_by_takers() {
            left.push(item);
            continue;
        }
        if item.repels(species.flags) {
            if taking && species.has(SpeciesFlags::STUPID) {
                ctx.events.push(Event::PickupFailed {
                    id,
                    item: item.name.clone(),
                });
            }
            left.push(item);
            continue;
        }
        if taking {
            ctx.events.push(Event::ItemTaken {
                id,
                item: item.name.clone(),
            });
            if let Some(e) = ctx.entity_mut(id) {
                e.held.push(item);
            }
        } else if !pet {
            ctx.events.push(Event::ItemDestroyed { id, item: item.name });
        } else {
            left.push(item);
        }
    }
    ctx.level.drop_items(pos, left);
}
