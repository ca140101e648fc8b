//! Movement planning
//!
//! Picks where an entity wants to go this turn: the watcher, a remembered
//! enemy, a tile from which it can cast, a safe retreat, or a slot in a
//! pack's encirclement. The result is always a short list of candidate
//! directions; trying them is the step module's job.

use std::sync::Arc;

use crate::dungeon::{Direction, Pos};
use crate::world::WorldContext;

use super::direction::{Candidate, candidates_toward, octant};
use super::search::{can_cross, can_enter, find_hiding, find_safety, wall_powers};
use super::{EntityId, Species, SpeciesFlags, are_enemies};

/// Goals reached through the flow field are pushed this far out so the
/// direction table sees a clean heading
const FLOW_REACH: i16 = 16;

/// Whether the entity wants to get away from the watcher.
///
/// Pets only flee when kept at arm's length. Others run when afraid, or
/// when the watcher clearly outclasses them and they are not already in
/// close combat.
pub fn will_run(ctx: &WorldContext, id: EntityId, species: &Species, leash: i32) -> bool {
    let Some(mover) = ctx.entity(id) else {
        return false;
    };
    if mover.is_pet() {
        return leash < 0 && mover.watcher_dist <= -leash;
    }
    if mover.watcher_dist > ctx.config.max_sight + 5 {
        return false;
    }
    if mover.timers.afraid() {
        return true;
    }
    if mover.watcher_dist <= 5 {
        return false;
    }

    let w = &ctx.watcher;
    let p_lev = i64::from(w.level);
    let m_lev = i64::from(species.level + (i32::from(id.index) & 0x08) + 25);
    if m_lev > p_lev + 4 {
        return false;
    }
    if m_lev + 4 <= p_lev {
        return true;
    }

    let (p_chp, p_mhp) = (i64::from(w.hp.max(0)), i64::from(w.max_hp.max(1)));
    let (m_chp, m_mhp) = (i64::from(mover.hp.max(0)), i64::from(mover.max_hp.max(1)));
    let p_val = p_lev * p_mhp + (p_chp << 2);
    let m_val = m_lev * m_mhp + (m_chp << 2);
    p_val * m_mhp > m_val * p_mhp
}

/// Look for another entity worth fighting.
///
/// The scan starts at a random slot. Pets respect the watcher's leash and
/// their own sense radius. The first enemy in a clear line (or in
/// disintegration range for wall movers) decides the heading.
pub fn enemy_direction(ctx: &mut WorldContext, id: EntityId, species: &Species) -> Option<[Direction; 3]> {
    let slots = ctx.level.entities.slot_count();
    if slots <= 1 {
        return None;
    }
    let start = ctx.rng.rand0(slots as i32) as usize;
    let leash = ctx.watcher.pet_follow_distance;
    let walls = wall_powers(species, ctx.watcher.is_riding(id));
    let table = Arc::clone(&ctx.species);
    let mover = ctx.entity(id)?;

    for i in 0..slots {
        let Some(other_id) = ctx.level.entities.id_at((start + i) % slots) else {
            continue;
        };
        if other_id == id {
            continue;
        }
        let Some(other) = ctx.entity(other_id) else {
            continue;
        };
        let Some(other_species) = table.get(other.species) else {
            continue;
        };

        if mover.is_pet() {
            if leash < 0 {
                if other.watcher_dist <= -leash {
                    continue;
                }
            } else if mover.watcher_dist < other.watcher_dist && other.watcher_dist > leash {
                continue;
            }
            if species.sense_radius < other.watcher_dist {
                continue;
            }
        }
        if !are_enemies(mover, other, other_species) {
            continue;
        }
        let reachable = if walls {
            ctx.level.in_disintegration_range(mover.pos, other.pos)
        } else {
            ctx.level.projectable(mover.pos, other.pos)
        };
        if !reachable {
            continue;
        }
        return octant(
            i32::from(other.pos.y - mover.pos.y),
            i32::from(other.pos.x - mover.pos.x),
        );
    }
    None
}

/// An adjacent tile from which a spell would reach the watcher.
///
/// Only used when the watcher is out of reach from where the caster
/// stands. Candidates must not be farther along the flow field; the
/// cheapest wins, ties going to the first tile scanned.
pub fn spell_position(ctx: &WorldContext, id: EntityId, species: &Species) -> Option<Pos> {
    let here = ctx.entity(id)?.pos;
    let watcher = ctx.watcher.pos;
    if ctx.level.projectable(here, watcher) {
        return None;
    }
    let fields = &ctx.level.fields;
    let now_cost = match fields.cost(here) {
        0 => 999,
        c => i32::from(c),
    };
    let doors = species.can_handle_doors();
    let walls = wall_powers(species, ctx.watcher.is_riding(id));

    let mut best: Option<(Pos, i32)> = None;
    for &dir in Direction::SCAN.iter().rev() {
        let spot = here.step(dir);
        if !ctx.level.contains(spot) {
            continue;
        }
        if spot == watcher {
            return None;
        }
        let mut cost = i32::from(fields.cost(spot));
        if !walls {
            if cost == 0 {
                continue;
            }
            if !doors && ctx.level.cell(spot).is_closed_door() {
                continue;
            }
        }
        if cost == 0 {
            cost = 998;
        }
        if now_cost < cost || !ctx.level.projectable(spot, watcher) {
            continue;
        }
        if best.is_some_and(|(_, b)| b <= cost) {
            continue;
        }
        best = Some((spot, cost));
    }
    best.map(|(spot, _)| spot)
}

/// Follow the sound field, or failing that the scent trail.
///
/// Casters first try to step somewhere they can cast from. Wall movers,
/// degraded movers and anything the watcher can already see and shoot
/// charge straight in instead.
pub fn flow_goal(ctx: &WorldContext, id: EntityId, species: &Species, no_flow: bool) -> Option<Pos> {
    if species.has(SpeciesFlags::ATTACK_SPELLS)
        && let Some(spot) = spell_position(ctx, id, species)
    {
        return Some(spot);
    }
    if no_flow || wall_powers(species, ctx.watcher.is_riding(id)) {
        return None;
    }
    let here = ctx.entity(id)?.pos;
    let watcher = ctx.watcher.pos;
    if ctx.level.los(watcher, here) && ctx.level.projectable(watcher, here) {
        return None;
    }

    let fields = &ctx.level.fields;
    let neighbours = Direction::SCAN
        .iter()
        .rev()
        .copied()
        .filter(|&d| ctx.level.contains(here.step(d)));

    let heading = if fields.cost(here) > 0 {
        let doors = species.can_handle_doors();
        let mut best = u16::MAX;
        let mut heading = None;
        for dir in neighbours {
            let spot = here.step(dir);
            let cost = if doors { fields.dist(spot) } else { fields.cost(spot) };
            if cost == 0 || cost > best {
                continue;
            }
            best = cost;
            heading = Some(dir);
        }
        heading
    } else if fields.scent(here) > 0 {
        if fields.scent(watcher).saturating_sub(fields.scent(here)) > ctx.config.scent_stale {
            return None;
        }
        let mut best = 0;
        let mut heading = None;
        for dir in neighbours {
            let when = fields.scent(here.step(dir));
            if when == 0 || when < best {
                continue;
            }
            best = when;
            heading = Some(dir);
        }
        heading
    } else {
        None
    };

    heading.map(|dir| {
        let (dy, dx) = dir.delta();
        here.offset(dy * FLOW_REACH, dx * FLOW_REACH)
    })
}

/// Best neighbour while retreating toward `retreat`.
///
/// Rewards closeness to the retreat spot and penalises tiles the flow
/// field marks as near the watcher. Tiles the mover cannot enter are
/// skipped.
pub fn fear_swerve(ctx: &WorldContext, id: EntityId, species: &Species, retreat: Pos) -> Option<Pos> {
    let here = ctx.entity(id)?.pos;
    let ridden = ctx.watcher.is_riding(id);
    let mut best: Option<(Pos, i32)> = None;
    for &dir in Direction::SCAN.iter().rev() {
        let spot = here.step(dir);
        if !can_enter(ctx, species, spot, ridden) {
            continue;
        }
        let dis = spot.distance(retreat);
        let score =
            (5000 / (dis + 3) - 500 / (i32::from(ctx.level.fields.dist(spot)) + 1)).max(0);
        if best.is_some_and(|(_, s)| score < s) {
            continue;
        }
        best = Some((spot, score));
    }
    best.map(|(spot, _)| spot)
}

/// Group tactics for pack hunters near the watcher.
///
/// Animal packs without wall powers hide and wait while the watcher holds
/// a corridor and is in good shape. Close to the watcher, members spread
/// out over its free neighbours instead of queueing.
fn pack_goal(ctx: &WorldContext, id: EntityId, species: &Species, here: Pos) -> Option<Pos> {
    let watcher = ctx.watcher.pos;
    let ridden = ctx.watcher.is_riding(id);

    if species.has(SpeciesFlags::ANIMAL) && !wall_powers(species, ridden) {
        let mut room = Direction::SCAN
            .iter()
            .map(|&d| watcher.step(d))
            .filter(|&p| ctx.level.contains(p) && can_cross(ctx.level.cell(p), species, ridden))
            .count() as i32;
        if ctx.level.contains(watcher) && ctx.level.cell(watcher).room {
            room -= 2;
        }
        if species.cast_frequency == 0 {
            room -= 2;
        }
        let w = &ctx.watcher;
        let vigour = 8 * (w.hp + w.mana) / (w.max_hp + w.max_mana).max(1);
        if room < vigour
            && let Some(spot) = find_hiding(ctx, id, species)
        {
            return Some(spot);
        }
    }

    let dist = ctx.level.fields.dist(here);
    if dist == 0 || dist >= 3 {
        return None;
    }
    let start = usize::from(id.index);
    for i in 0..8 {
        let spot = watcher.step(Direction::SCAN[(start + i) & 7]);
        if spot == here {
            return Some(watcher);
        }
        if can_enter(ctx, species, spot, ridden) {
            return Some(spot);
        }
    }
    Some(watcher)
}

/// A remembered target still worth chasing
fn pursuit_in_reach(ctx: &WorldContext, id: EntityId, target: Pos) -> bool {
    let (Some(mover), Some(other)) = (
        ctx.entity(id),
        ctx.level.entity_at(target).and_then(|o| ctx.entity(o)),
    ) else {
        return false;
    };
    let Some(other_species) = ctx.species.get(other.species) else {
        return false;
    };
    are_enemies(mover, other, other_species)
        && ctx.level.los(mover.pos, target)
        && ctx.level.projectable(mover.pos, target)
}

/// Plan this turn's candidate directions.
///
/// `leash` is the pet follow distance in force for this decision. Returns
/// `None` when the entity has nowhere it wants to go.
pub fn plan_moves(ctx: &WorldContext, id: EntityId, species: &Species, leash: i32) -> Option<Vec<Candidate>> {
    let mover = ctx.entity(id)?;
    let here = mover.pos;
    let run = will_run(ctx, id, species, leash);
    let no_flow = mover.no_flow && ctx.level.fields.cost(here) > 2;
    let watcher = ctx.watcher.pos;

    let mut goal = watcher;
    let mut done = false;

    if !run
        && let Some(target) = mover.target
        && pursuit_in_reach(ctx, id, target.pos)
    {
        goal = target.pos;
        done = true;
    }

    if !done && !run && mover.is_hostile() && species.has(SpeciesFlags::FRIENDS) {
        let dist = i32::from(ctx.level.fields.dist(here));
        let in_sight = ctx.level.los(here, watcher) && ctx.level.projectable(here, watcher);
        if (in_sight || (dist > 0 && dist < ctx.config.max_sight / 2))
            && let Some(spot) = pack_goal(ctx, id, species, here)
        {
            goal = spot;
            done = true;
        }
    }

    if !done && let Some(spot) = flow_goal(ctx, id, species, no_flow) {
        goal = spot;
    }

    let mut dy = i32::from(goal.y - here.y);
    let mut dx = i32::from(goal.x - here.x);

    if mover.is_pet() && run {
        dy = -dy;
        dx = -dx;
    } else if !done && run {
        let swerve = find_safety(ctx, id, species)
            .filter(|_| !no_flow)
            .and_then(|spot| fear_swerve(ctx, id, species, spot));
        match swerve {
            Some(step) => {
                dy = i32::from(step.y - here.y);
                dx = i32::from(step.x - here.x);
            }
            None => {
                dy = -dy;
                dx = -dx;
            }
        }
    }

    candidates_toward(dy, dx)
}
