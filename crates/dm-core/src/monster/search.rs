//! Ring searches for safe and ambush spots
//!
//! Offsets are grouped into rings by engine distance from the centre so a
//! search can widen one radius at a time without recomputing distances.

use crate::consts::MAX_SEARCH_RADIUS;
use crate::dungeon::{Cell, Pos};
use crate::world::WorldContext;

use super::{EntityId, Species, SpeciesFlags};

/// Largest ring needs 48 slots
const RING_CAPACITY: usize = 64;

#[derive(Clone, Copy)]
struct Ring {
    len: usize,
    offsets: [(i16, i16); RING_CAPACITY],
}

const fn engine_distance(dy: i16, dx: i16) -> i16 {
    let ay = if dy < 0 { -dy } else { dy };
    let ax = if dx < 0 { -dx } else { dx };
    if ay > ax { ay + (ax >> 1) } else { ax + (ay >> 1) }
}

const fn build_rings() -> [Ring; MAX_SEARCH_RADIUS + 1] {
    let mut rings = [Ring {
        len: 0,
        offsets: [(0, 0); RING_CAPACITY],
    }; MAX_SEARCH_RADIUS + 1];
    let r = MAX_SEARCH_RADIUS as i16;
    let mut dy = -r;
    while dy <= r {
        let mut dx = -r;
        while dx <= r {
            let d = engine_distance(dy, dx) as usize;
            if d >= 1 && d <= MAX_SEARCH_RADIUS {
                let ring = &mut rings[d];
                ring.offsets[ring.len] = (dy, dx);
                ring.len += 1;
            }
            dx += 1;
        }
        dy += 1;
    }
    rings
}

static RINGS: [Ring; MAX_SEARCH_RADIUS + 1] = build_rings();

/// Offsets at exactly `radius` from the centre
pub fn ring(radius: usize) -> &'static [(i16, i16)] {
    match RINGS.get(radius) {
        Some(ring) => &ring.offsets[..ring.len],
        None => &[],
    }
}

/// Wall powers only work when nobody is riding
pub fn wall_powers(species: &Species, ridden: bool) -> bool {
    !ridden && species.has_wall_power()
}

/// The terrain itself lets this species through
pub fn can_cross(cell: &Cell, species: &Species, ridden: bool) -> bool {
    cell.is_walkable()
        || (!ridden && species.has(SpeciesFlags::PASS_WALL) && !cell.typ.is_permanent())
}

/// Nothing stands on `pos` and the species can cross its terrain
pub fn can_enter(ctx: &WorldContext, species: &Species, pos: Pos, ridden: bool) -> bool {
    ctx.level.contains(pos)
        && pos != ctx.watcher.pos
        && ctx.level.entity_at(pos).is_none()
        && can_cross(ctx.level.cell(pos), species, ridden)
}

/// Nearest ring holding a tile out of the watcher's line of fire.
///
/// Only tiles strictly farther from the watcher than the mover are
/// considered; within the ring the farthest one wins. Unless the mover's
/// flow is degraded, tiles off the flow field or leading into dead ends
/// are skipped.
pub fn find_safety(ctx: &WorldContext, id: EntityId, species: &Species) -> Option<Pos> {
    let mover = ctx.entity(id)?;
    let here = mover.pos;
    let watcher = ctx.watcher.pos;
    let current = here.distance(watcher);
    let here_dist = i32::from(ctx.level.fields.dist(here));
    let use_flow = !mover.no_flow && here_dist > 0;
    let ridden = ctx.watcher.is_riding(id);

    for radius in 1..=MAX_SEARCH_RADIUS {
        let mut best: Option<(Pos, i32)> = None;
        for &(dy, dx) in ring(radius) {
            let spot = here.offset(dy, dx);
            if !can_enter(ctx, species, spot, ridden) {
                continue;
            }
            if use_flow {
                let dist = i32::from(ctx.level.fields.dist(spot));
                if dist == 0 || dist > here_dist + 2 * radius as i32 {
                    continue;
                }
            }
            if ctx.level.projectable(watcher, spot) {
                continue;
            }
            let dis = spot.distance(watcher);
            if dis > current && best.is_none_or(|(_, d)| dis > d) {
                best = Some((spot, dis));
            }
        }
        if let Some((spot, _)) = best {
            return Some(spot);
        }
    }
    None
}

/// Nearest ring holding an ambush spot.
///
/// A spot is hidden from the watcher's line of fire, reachable by a clean
/// shot from the mover, and at least two steps from the watcher. The spot
/// closest to the watcher wins within a ring.
pub fn find_hiding(ctx: &WorldContext, id: EntityId, species: &Species) -> Option<Pos> {
    let here = ctx.entity(id)?.pos;
    let watcher = ctx.watcher.pos;
    let ridden = ctx.watcher.is_riding(id);

    for radius in 1..=MAX_SEARCH_RADIUS {
        let mut best: Option<(Pos, i32)> = None;
        for &(dy, dx) in ring(radius) {
            let spot = here.offset(dy, dx);
            if !can_enter(ctx, species, spot, ridden) {
                continue;
            }
            if ctx.level.projectable(watcher, spot) || !ctx.level.clean_shot(here, spot) {
                continue;
            }
            let dis = spot.distance(watcher);
            if dis >= 2 && best.is_none_or(|(_, d)| dis < d) {
                best = Some((spot, dis));
            }
        }
        if let Some((spot, _)) = best {
            return Some(spot);
        }
    }
    None
}
