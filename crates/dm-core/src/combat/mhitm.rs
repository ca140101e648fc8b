//! Monster melee (mhitm)
//!
//! Resolves up to four blows from one entity against another entity or
//! against the watcher. Damage routes through the defender's resistances,
//! and a defender with a touch aura burns contact attackers.

use std::sync::Arc;

use crate::consts::{MAX_SIGHT, QUAKE_DAMAGE, SELF_DESTRUCT_DAMAGE};
use crate::monster::lifecycle::{damage_entity, teleport_away};
use crate::monster::{EntityId, Species, SpeciesFlags};
use crate::rng::GameRng;
use crate::world::{DespawnReason, Event, Hooks, WorldContext};

use super::{
    Blow, BlowEffect, BlowMethod, DamageType, DefenderTraits, MeleeOutcome, MeleeTarget,
    Resistances, StatusHit,
};

/// Armour stops at most this much of a hurting blow
const AC_CAP: i32 = 150;
/// Sleep inflicted by a paralysing blow
const PARALYZE_SLEEP: i32 = 500;

/// Accuracy test for one blow.
///
/// A stunned attacker fumbles half its blows; otherwise 5% always hit, 5%
/// always miss, and the rest compare `power + 3 * level` against three
/// quarters of the defender's armour.
pub fn check_hit(rng: &mut GameRng, power: i32, level: i32, ac: i32, stunned: bool) -> bool {
    let k = rng.rand0(100);
    if stunned && rng.one_in(2) {
        return false;
    }
    if k < 10 {
        return k < 5;
    }
    let chance = power + level * 3;
    chance > 0 && rng.rand1(chance) > ac * 3 / 4
}

fn traits_of(species: &Species) -> DefenderTraits {
    DefenderTraits {
        resists: species.resists,
        living: species.is_living(),
        undead: species.has(SpeciesFlags::UNDEAD),
        no_conf: species.has(SpeciesFlags::NO_CONF),
    }
}

fn armour_soak(damage: i32, ac: i32) -> i32 {
    damage - damage * ac.min(AC_CAP) / 250
}

/// Raw damage after armour, plus the quake check for shattering blows
fn physical_damage(rng: &mut GameRng, blow: &Blow, level: i32, ac: i32) -> i32 {
    let rolled = blow.dice.roll(rng);
    match blow.effect {
        BlowEffect::SuperHurt
            if rng.rand1(level * 2 + 250) > ac + 200 || rng.one_in(13) =>
        {
            rolled.max(armour_soak(rolled, ac) * 2)
        }
        effect if effect.armour_reduces() => armour_soak(rolled, ac),
        _ => rolled,
    }
}

/// Whether the exchange may go on after a blow
enum Flow {
    Continue,
    Stop,
}

/// Run a full melee exchange.
///
/// Every blow revalidates the attacker and checks that the target has not
/// been displaced; the exchange stops at the first empty blow slot. A killed
/// defender is despawned here.
pub fn resolve_melee(
    ctx: &mut WorldContext,
    hooks: &mut dyn Hooks,
    attacker: EntityId,
    target: MeleeTarget,
) -> MeleeOutcome {
    let mut outcome = MeleeOutcome::default();
    if target == MeleeTarget::Entity(attacker) || ctx.flags.no_melee {
        return outcome;
    }
    let table = Arc::clone(&ctx.species);
    let Some(a_species) = ctx.entity(attacker).and_then(|a| table.get(a.species)) else {
        return outcome;
    };
    if a_species.has(SpeciesFlags::NEVER_BLOW) {
        return outcome;
    }
    let target_pos = match target {
        MeleeTarget::Watcher => ctx.watcher.pos,
        MeleeTarget::Entity(d) => match ctx.entity(d) {
            Some(e) => e.pos,
            None => return outcome,
        },
    };

    outcome.attempted = true;
    ctx.events.push(Event::MeleeStarted { attacker, target });
    if target == MeleeTarget::Watcher {
        ctx.watcher.disturb();
    }

    let level = a_species.level.max(1);
    let mut explode = false;
    let mut blink = false;

    for blow in a_species.blows.iter() {
        if !blow.is_active() {
            break;
        }
        let Some(stunned) = ctx.entity(attacker).map(|a| a.timers.stunned()) else {
            break;
        };
        let current = match target {
            MeleeTarget::Watcher if ctx.watcher.is_gone() => None,
            MeleeTarget::Watcher => Some(ctx.watcher.pos),
            MeleeTarget::Entity(d) => ctx.entity(d).map(|e| e.pos),
        };
        if current != Some(target_pos) {
            break;
        }
        if blow.method.is_ranged() {
            continue;
        }

        let ac = match target {
            MeleeTarget::Watcher => ctx.watcher.ac,
            MeleeTarget::Entity(d) => ctx.species_of(d).map_or(0, |s| s.ac),
        };
        if !check_hit(&mut ctx.rng, blow.effect.power(), level, ac, stunned) {
            if blow.method.wakes_on_miss()
                && let MeleeTarget::Entity(d) = target
                && let Some(e) = ctx.entity_mut(d)
            {
                e.timers.sleep = 0;
            }
            ctx.events.push(Event::BlowMissed { attacker, target });
            tracing::trace!(?attacker, ?target, "blow missed");
            continue;
        }

        if blow.method == BlowMethod::Explode {
            explode = true;
        }
        if matches!(blow.effect, BlowEffect::StealGold | BlowEffect::StealItem)
            && !ctx.watcher.is_riding(attacker)
            && ctx.rng.one_in(2)
        {
            blink = true;
        }

        let flow = match target {
            MeleeTarget::Watcher => strike_watcher(ctx, attacker, blow, level, &mut outcome),
            MeleeTarget::Entity(d) => strike_entity(ctx, attacker, d, blow, level, &mut outcome),
        };
        if matches!(flow, Flow::Stop) {
            break;
        }
    }

    if explode && !outcome.attacker_died && ctx.is_alive(attacker) {
        let hp = ctx.entity(attacker).map_or(0, |a| a.hp);
        let killed = damage_entity(
            ctx,
            attacker,
            hp + SELF_DESTRUCT_DAMAGE,
            Some(attacker),
            DespawnReason::SelfDestructed,
        );
        outcome.attacker_died = killed.is_ok_and(|o| o.died());
    }

    if blink && !outcome.attacker_died && ctx.is_alive(attacker) {
        if hooks.teleport_barrier(ctx, attacker) {
            ctx.events.push(Event::BarrierBlocked { id: attacker });
        } else if let Some(to) = teleport_away(ctx, attacker, MAX_SIGHT * 2 + 5) {
            ctx.events.push(Event::ThiefBlinked { id: attacker, to });
            outcome.attacker_blinked = true;
        }
    }

    tracing::debug!(
        ?attacker,
        ?target,
        landed = outcome.blows_landed,
        damage = outcome.damage_dealt,
        died = outcome.defender_died,
        "melee resolved"
    );
    outcome
}

fn strike_entity(
    ctx: &mut WorldContext,
    attacker: EntityId,
    defender: EntityId,
    blow: &Blow,
    level: i32,
    outcome: &mut MeleeOutcome,
) -> Flow {
    let table = Arc::clone(&ctx.species);
    let Some(d_species) = ctx.entity(defender).and_then(|d| table.get(d.species)) else {
        return Flow::Stop;
    };
    let traits = traits_of(d_species);
    if let Some(d) = ctx.entity_mut(defender) {
        d.timers.sleep = 0;
    }

    let raw = physical_damage(&mut ctx.rng, blow, level, d_species.ac);
    let target = MeleeTarget::Entity(defender);
    outcome.blows_landed += 1;

    // Fear and sleep blows carry no damage of their own
    let harmless = match blow.effect {
        BlowEffect::None => true,
        BlowEffect::Terrify => {
            terrify(ctx, defender, d_species, raw);
            true
        }
        BlowEffect::Paralyze => {
            paralyze(ctx, defender, d_species, raw);
            true
        }
        _ => false,
    };

    if harmless {
        ctx.events.push(Event::BlowLanded { attacker, target, damage: 0 });
    } else {
        let dtype = blow.effect.damage_type().unwrap_or(DamageType::Physical);
        let (damage, resisted) = dtype.adjust(raw, &traits, &mut ctx.rng);
        if !resisted && let Some(status) = dtype.status() {
            inflict(ctx, defender, status);
        }
        if blow.effect == BlowEffect::Shatter && damage > QUAKE_DAMAGE {
            ctx.events.push(Event::Quake { center: ctx.watcher.pos });
        }
        if let BlowEffect::Drain { heal_divisor } = blow.effect
            && traits.living
            && damage > 2
        {
            let amount = ctx.rng.dice(4, damage / heal_divisor.max(1));
            if let Some(a) = ctx.entity_mut(attacker) {
                a.heal(amount);
                ctx.events.push(Event::Healed { id: attacker, amount });
            }
        }

        ctx.events.push(Event::BlowLanded { attacker, target, damage });
        outcome.damage_dealt += damage;
        match damage_entity(ctx, defender, damage, Some(attacker), DespawnReason::Killed) {
            Ok(hit) if hit.died() => {
                outcome.defender_died = true;
                return Flow::Stop;
            }
            Ok(_) => {}
            Err(_) => return Flow::Stop,
        }
    }

    if blow.method.is_contact() && aura_burn(ctx, attacker, defender, d_species) {
        outcome.attacker_died = true;
        return Flow::Stop;
    }
    Flow::Continue
}

fn strike_watcher(
    ctx: &mut WorldContext,
    attacker: EntityId,
    blow: &Blow,
    level: i32,
    outcome: &mut MeleeOutcome,
) -> Flow {
    let raw = physical_damage(&mut ctx.rng, blow, level, ctx.watcher.ac);
    let traits = DefenderTraits {
        resists: ctx.watcher.resists,
        living: true,
        ..DefenderTraits::default()
    };
    let dtype = blow.effect.damage_type().unwrap_or(DamageType::Physical);
    let (damage, _) = dtype.adjust(raw, &traits, &mut ctx.rng);
    outcome.blows_landed += 1;

    if !matches!(
        blow.effect,
        BlowEffect::None | BlowEffect::Hurt | BlowEffect::SuperHurt | BlowEffect::Shatter
    ) {
        ctx.events.push(Event::WatcherStatus {
            attacker,
            effect: blow.effect.to_string(),
        });
    }
    if blow.effect == BlowEffect::Shatter && damage > QUAKE_DAMAGE {
        ctx.events.push(Event::Quake { center: ctx.watcher.pos });
    }
    if let BlowEffect::Drain { heal_divisor } = blow.effect
        && damage > 2
    {
        let amount = ctx.rng.dice(4, damage / heal_divisor.max(1));
        if let Some(a) = ctx.entity_mut(attacker) {
            a.heal(amount);
            ctx.events.push(Event::Healed { id: attacker, amount });
        }
    }

    ctx.events.push(Event::BlowLanded {
        attacker,
        target: MeleeTarget::Watcher,
        damage,
    });
    outcome.damage_dealt += damage;
    if ctx.watcher.take_damage(damage) {
        outcome.defender_died = true;
        return Flow::Stop;
    }
    Flow::Continue
}

/// Fear blow: a level save resists, NO_FEAR ignores it
fn terrify(ctx: &mut WorldContext, defender: EntityId, species: &Species, damage: i32) {
    if species.has(SpeciesFlags::NO_FEAR) {
        return;
    }
    if species.level > ctx.rng.rand1((damage - 10).max(1)) + 10 {
        return;
    }
    let fear = ctx.rng.dice(3, damage / 2) + 1;
    if let Some(d) = ctx.entity_mut(defender) {
        d.timers.fear += fear;
        ctx.events.push(Event::Frightened { id: defender });
    }
}

/// Sleep blow: a level save resists, NO_SLEEP ignores it
fn paralyze(ctx: &mut WorldContext, defender: EntityId, species: &Species, damage: i32) {
    if species.has(SpeciesFlags::NO_SLEEP) {
        return;
    }
    if species.level > ctx.rng.rand1((damage - 10).max(1)) + 10 {
        return;
    }
    if let Some(d) = ctx.entity_mut(defender) {
        d.timers.sleep = PARALYZE_SLEEP;
        ctx.events.push(Event::PutToSleep { id: defender });
    }
}

fn inflict(ctx: &mut WorldContext, defender: EntityId, status: StatusHit) {
    let amount = 10 + ctx.rng.rand1(15);
    let Some(d) = ctx.entity_mut(defender) else {
        return;
    };
    match status {
        StatusHit::Stun => d.timers.stun += amount,
        StatusHit::Confuse => d.timers.confusion += amount,
        StatusHit::Slow => d.timers.slow += 50,
    }
}

/// Touch auras burn a contact attacker; true if the attacker died
fn aura_burn(ctx: &mut WorldContext, attacker: EntityId, defender: EntityId, d_species: &Species) -> bool {
    let table = Arc::clone(&ctx.species);
    let Some(a_species) = ctx.entity(attacker).and_then(|a| table.get(a.species)) else {
        return false;
    };
    let a_traits = traits_of(a_species);
    let lvl = d_species.level;
    let auras = [
        (SpeciesFlags::AURA_FIRE, DamageType::Fire, Resistances::IM_FIRE),
        (SpeciesFlags::AURA_COLD, DamageType::Cold, Resistances::IM_COLD),
        (SpeciesFlags::AURA_ELEC, DamageType::Elec, Resistances::IM_ELEC),
    ];
    for (aura, dtype, immunity) in auras {
        if !d_species.has(aura) || a_species.resists.contains(immunity) {
            continue;
        }
        let raw = ctx.rng.dice(1 + lvl / 26, 1 + lvl / 17);
        let (damage, _) = dtype.adjust(raw, &a_traits, &mut ctx.rng);
        ctx.events.push(Event::AuraBurn {
            defender,
            attacker,
            damage,
        });
        match damage_entity(ctx, attacker, damage, None, DespawnReason::Killed) {
            Ok(hit) if hit.died() => return true,
            Ok(_) => {}
            Err(_) => return true,
        }
    }
    false
}
