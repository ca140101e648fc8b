//! Entity lifecycle: creation, cloning, damage, relocation and removal

use std::sync::Arc;

use crate::dungeon::{Direction, Pos};
use crate::gameloop::speed_to_energy;
use crate::world::{DespawnReason, EngineError, Event, WorldContext};

use super::{Entity, EntityId, PursuitTarget, SpeciesFlags, SpeciesId};

/// Chance (1 in N) that a blow gets through invulnerability
const PIERCE_INVULNERABILITY: i32 = 13;

/// Attempts before a teleport gives up
const TELEPORT_TRIES: usize = 500;

impl DespawnReason {
    /// Leaves its belongings behind
    pub fn drops_items(&self) -> bool {
        !matches!(self, DespawnReason::Orphaned | DespawnReason::Escaped)
    }
}

/// Create an entity of `species` at `pos`
pub fn spawn(ctx: &mut WorldContext, species: SpeciesId, pos: Pos) -> Result<EntityId, EngineError> {
    let table = Arc::clone(&ctx.species);
    let template = table.get(species).ok_or(EngineError::UnknownSpecies(species))?;
    if !ctx.level.is_free(pos) || pos == ctx.watcher.pos {
        return Err(EngineError::IllegalDestination(pos));
    }

    let hp = template.roll_hp(&mut ctx.rng);
    let mut speed = template.speed;
    if !template.has(SpeciesFlags::UNIQUE) {
        let spread = i32::from(speed_to_energy(speed)) / 2;
        speed += ctx.rng.spread(spread) as i16;
    }
    let quantum = ctx.config.energy_quantum;
    let energy_need = quantum - ctx.rng.rand0(quantum);

    let id = ctx.level.entities.insert(|id| {
        let mut entity = Entity::new(id, species, template, pos, hp);
        entity.speed = speed;
        entity.energy_need = energy_need;
        entity
    })?;
    ctx.level.occupy(id, pos);
    ctx.update_view(id);
    tracing::debug!(?id, species = %template.name, y = pos.y, x = pos.x, "spawned");
    Ok(id)
}

/// A random free tile next to `center`
pub fn free_neighbour(ctx: &mut WorldContext, center: Pos) -> Option<Pos> {
    let start = ctx.rng.rand0(8) as usize;
    (0..8)
        .map(|i| center.step(Direction::SCAN[(start + i) % 8]))
        .find(|&p| ctx.level.is_free(p) && p != ctx.watcher.pos)
}

/// Create an offspring of `parent` on a free adjacent tile.
///
/// The clone shares the parent's species and disposition, counts against
/// the level's reproduction total, and sits out the current tick.
pub fn spawn_clone(ctx: &mut WorldContext, parent: EntityId) -> Result<EntityId, EngineError> {
    let (species, pos, disposition, is_pet) = {
        let p = ctx.entity(parent).ok_or(EngineError::InvalidEntity(parent))?;
        (p.species, p.pos, p.disposition, p.is_pet())
    };
    let spot = free_neighbour(ctx, pos).ok_or(EngineError::ResourceExhaustion("free tiles"))?;
    let child = spawn(ctx, species, spot)?;
    if let Some(c) = ctx.entity_mut(child) {
        c.disposition = disposition;
        c.born_this_tick = true;
        c.parent = is_pet.then_some(parent);
    }
    ctx.level.repro_count += 1;
    Ok(child)
}

/// Remove an entity from the level
pub fn despawn(ctx: &mut WorldContext, id: EntityId, reason: DespawnReason) -> Result<Entity, EngineError> {
    let mut entity = ctx.level.entities.remove(id)?;
    ctx.level.vacate(id, entity.pos);
    if reason.drops_items() {
        ctx.level.drop_items(entity.pos, entity.held.drain(..));
    }
    if ctx.watcher.is_riding(id) {
        ctx.watcher.riding = None;
        ctx.events.push(Event::Dismounted { mount: id });
    }
    ctx.events.push(Event::Despawned {
        id,
        species: entity.species,
        reason,
    });
    tracing::debug!(?id, %reason, "despawned");
    Ok(entity)
}

/// Result of harming an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Died,
    Survived { frightened: bool },
}

impl HitOutcome {
    pub fn died(&self) -> bool {
        matches!(self, HitOutcome::Died)
    }
}

/// Deal `damage` to `id`.
///
/// Wakes the victim, may frighten it, and remembers a living attacker's
/// position as a one-shot counter-attack target. A killed victim is
/// despawned with `reason`.
pub fn damage_entity(
    ctx: &mut WorldContext,
    id: EntityId,
    damage: i32,
    attacker: Option<EntityId>,
    reason: DespawnReason,
) -> Result<HitOutcome, EngineError> {
    let attacker_pos = attacker
        .filter(|&a| a != id)
        .and_then(|a| ctx.entity(a))
        .map(|a| a.pos);
    let no_fear = ctx
        .species_of(id)
        .ok_or(EngineError::InvalidEntity(id))?
        .has(SpeciesFlags::NO_FEAR);

    let pierce = ctx.rng.one_in(PIERCE_INVULNERABILITY);
    let self_inflicted = attacker == Some(id);
    let rng = &mut ctx.rng;
    let entity = ctx.level.entity_mut(id).ok_or(EngineError::InvalidEntity(id))?;

    let damage = if entity.timers.invulnerable() && !pierce && !self_inflicted {
        0
    } else {
        damage
    };
    entity.timers.sleep = 0;
    entity.hp -= damage;
    if let Some(pos) = attacker_pos {
        entity.target = Some(PursuitTarget { pos, one_shot: true });
    }
    if entity.is_dead() {
        despawn(ctx, id, reason)?;
        return Ok(HitOutcome::Died);
    }

    let mut frightened = false;
    if damage > 0 && !no_fear && !entity.timers.afraid() {
        let percentage = (100 * entity.hp / entity.max_hp.max(1)).max(0);
        let lethal_close = damage >= entity.hp;
        if rng.rand1(10) >= percentage || (lethal_close && rng.rand0(100) < 80) {
            entity.timers.fear = rng.rand1(10)
                + if lethal_close && percentage > 7 {
                    20
                } else {
                    (11 - percentage).max(0) * 5
                };
            frightened = true;
        }
    }
    if frightened {
        ctx.events.push(Event::Frightened { id });
    }
    Ok(HitOutcome::Survived { frightened })
}

/// Move `id` to a random free tile roughly `dist` away
pub fn teleport_away(ctx: &mut WorldContext, id: EntityId, dist: i32) -> Option<Pos> {
    let from = ctx.entity(id)?.pos;
    let min = dist / 3;
    let mut reach = dist;
    for attempt in 0..TELEPORT_TRIES {
        if attempt > 0 && attempt % 100 == 0 {
            reach *= 2;
        }
        let dy = ctx.rng.spread(reach) as i16;
        let dx = ctx.rng.spread(reach) as i16;
        let to = from.offset(dy, dx);
        if !ctx.level.is_interior(to) || !ctx.level.is_free(to) || to == ctx.watcher.pos {
            continue;
        }
        let d = from.distance(to);
        if d < min || d > reach {
            continue;
        }
        ctx.level.move_entity(id, to).ok()?;
        ctx.update_view(id);
        return Some(to);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::Level;
    use crate::monster::{Species, SpeciesTable};
    use crate::object::{Item, ItemKind};
    use crate::player::Watcher;

    fn ctx() -> (WorldContext, SpeciesId) {
        let mut table = SpeciesTable::new();
        let orc = table.add(Species::new("orc", 5).with_hit_dice(2, 5));
        let level = Level::open_room(12, 12, 8);
        let watcher = Watcher::new(Pos::new(10, 10));
        (WorldContext::new(level, watcher, Arc::new(table), 7), orc)
    }

    #[test]
    fn test_spawn_places_and_rejects_occupied() {
        let (mut ctx, orc) = ctx();
        let id = spawn(&mut ctx, orc, Pos::new(3, 3)).unwrap();
        assert_eq!(ctx.level.entity_at(Pos::new(3, 3)), Some(id));
        assert_eq!(
            spawn(&mut ctx, orc, Pos::new(3, 3)),
            Err(EngineError::IllegalDestination(Pos::new(3, 3)))
        );
        assert_eq!(
            spawn(&mut ctx, orc, Pos::new(10, 10)),
            Err(EngineError::IllegalDestination(Pos::new(10, 10)))
        );
        assert_eq!(
            spawn(&mut ctx, SpeciesId(99), Pos::new(4, 4)),
            Err(EngineError::UnknownSpecies(SpeciesId(99)))
        );
    }

    #[test]
    fn test_clone_is_adjacent_and_born() {
        let (mut ctx, orc) = ctx();
        let parent = spawn(&mut ctx, orc, Pos::new(5, 5)).unwrap();
        let child = spawn_clone(&mut ctx, parent).unwrap();
        let c = ctx.entity(child).unwrap();
        assert!(c.pos.is_adjacent(Pos::new(5, 5)));
        assert!(c.born_this_tick);
        assert_eq!(c.parent, None);
        assert_eq!(ctx.level.repro_count, 1);
    }

    #[test]
    fn test_despawn_drops_items_and_frees_tile() {
        let (mut ctx, orc) = ctx();
        let id = spawn(&mut ctx, orc, Pos::new(5, 5)).unwrap();
        ctx.entity_mut(id).unwrap().held.push(Item::new("club", ItemKind::Weapon));
        despawn(&mut ctx, id, DespawnReason::Killed).unwrap();
        assert!(ctx.level.entity_at(Pos::new(5, 5)).is_none());
        assert_eq!(ctx.level.items_at(Pos::new(5, 5)).len(), 1);
        assert!(despawn(&mut ctx, id, DespawnReason::Killed).is_err());
    }

    #[test]
    fn test_damage_kills_below_zero() {
        let (mut ctx, orc) = ctx();
        let id = spawn(&mut ctx, orc, Pos::new(5, 5)).unwrap();
        let hp = ctx.entity(id).unwrap().hp;
        let outcome = damage_entity(&mut ctx, id, hp, None, DespawnReason::Killed).unwrap();
        assert!(!outcome.died());
        let outcome = damage_entity(&mut ctx, id, 1, None, DespawnReason::Killed).unwrap();
        assert!(outcome.died());
        assert!(!ctx.is_alive(id));
    }

    #[test]
    fn test_damage_sets_counter_target_and_wakes() {
        let (mut ctx, orc) = ctx();
        let a = spawn(&mut ctx, orc, Pos::new(5, 5)).unwrap();
        let b = spawn(&mut ctx, orc, Pos::new(5, 6)).unwrap();
        ctx.entity_mut(b).unwrap().timers.sleep = 50;
        damage_entity(&mut ctx, b, 0, Some(a), DespawnReason::Killed).unwrap();
        let eb = ctx.entity(b).unwrap();
        assert_eq!(eb.timers.sleep, 0);
        assert_eq!(
            eb.target,
            Some(PursuitTarget {
                pos: Pos::new(5, 5),
                one_shot: true
            })
        );
    }

    #[test]
    fn test_teleport_moves_far() {
        let mut table = SpeciesTable::new();
        let orc = table.add(Species::new("orc", 5));
        let level = Level::open_room(60, 60, 8);
        let watcher = Watcher::new(Pos::new(1, 1));
        let mut ctx = WorldContext::new(level, watcher, Arc::new(table), 3);
        let id = spawn(&mut ctx, orc, Pos::new(30, 30)).unwrap();
        let to = teleport_away(&mut ctx, id, 20).unwrap();
        assert!(Pos::new(30, 30).distance(to) >= 6);
        assert_eq!(ctx.level.entity_at(to), Some(id));
        assert!(ctx.level.entity_at(Pos::new(30, 30)).is_none());
    }
}
