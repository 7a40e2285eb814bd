//! Gameplay resolution of overlapping pairs
//!
//! Dispatch is on the unordered type pair; each branch normalizes argument
//! order so (A, B) and (B, A) behave identically.
//!
//! Projectile hits run a small state machine:
//!
//! ```text
//! ALIVE --hit, piercing > 0------------------> ALIVE (piercing - 1)
//! ALIVE --hit, piercing exhausted, ricochet--> ALIVE (new target, piercing restored)
//! ALIVE --hit, piercing exhausted, no bounce-> DEAD  (explosion first, if explosive)
//! ```
//!
//! DEAD is terminal. The `hit_enemies` set guarantees a projectile instance
//! never damages the same enemy twice, however long they overlap.

use super::effects::{EffectContext, EffectHooks};
use super::entity::{Entity, EntityId, EntityKind, EntityType};
use super::events::CollisionEvent;
use crate::error::ResolveError;

/// What resolving a pair did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Guards failed or the type pair has no rule
    Skipped,
    /// Player was invulnerable
    Blocked,
    Pickup,
    ContactDamage,
    EnemyShot,
    /// Projectile already damaged this enemy
    AlreadyHit,
    /// Projectile's targeting rejected the enemy
    Vetoed,
    ProjectileHit { projectile_died: bool },
}

/// Apply the gameplay consequence of slots `a` and `b` overlapping
pub fn resolve<H: EffectHooks + ?Sized>(
    hooks: &mut H,
    ctx: &mut EffectContext<'_>,
    a: usize,
    b: usize,
) -> Result<Outcome, ResolveError> {
    let len = ctx.entities.len();
    for slot in [a, b] {
        if slot >= len {
            return Err(ResolveError::SlotOutOfRange(slot));
        }
    }
    if a == b {
        return Ok(Outcome::Skipped);
    }
    let (ea, eb) = (&ctx.entities[a], &ctx.entities[b]);
    if ea.id == eb.id || ea.is_dead || eb.is_dead {
        return Ok(Outcome::Skipped);
    }

    use EntityType::*;
    match (ea.entity_type(), eb.entity_type()) {
        (Player, XpOrb) => Ok(collect_orb(ctx, a, b)),
        (XpOrb, Player) => Ok(collect_orb(ctx, b, a)),
        (Player, Enemy) => Ok(contact_damage(ctx, a, b)),
        (Enemy, Player) => Ok(contact_damage(ctx, b, a)),
        (Player, EnemyProjectile) => Ok(enemy_shot(ctx, a, b)),
        (EnemyProjectile, Player) => Ok(enemy_shot(ctx, b, a)),
        (Projectile, Enemy) => projectile_hit(hooks, ctx, a, b),
        (Enemy, Projectile) => projectile_hit(hooks, ctx, b, a),
        _ => Ok(Outcome::Skipped),
    }
}

/// Two distinct mutable entities
fn pair_mut(entities: &mut [Entity], i: usize, j: usize) -> (&mut Entity, &mut Entity) {
    if i < j {
        let (lo, hi) = entities.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = entities.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

fn collect_orb(ctx: &mut EffectContext<'_>, player_slot: usize, orb_slot: usize) -> Outcome {
    let (player_entity, orb_entity) = pair_mut(ctx.entities, player_slot, orb_slot);
    let (EntityKind::Player(player), EntityKind::XpOrb(orb)) =
        (&mut player_entity.kind, &mut orb_entity.kind)
    else {
        return Outcome::Skipped;
    };

    if !orb.collected {
        orb.collected = true;
        player.experience += orb.value;
        ctx.events.push(CollisionEvent::XpCollected {
            player: player_entity.id,
            orb: orb_entity.id,
            value: orb.value,
            pos: orb_entity.pos,
        });
    }
    orb_entity.is_dead = true;
    Outcome::Pickup
}

/// Apply damage to a player and report it
fn hurt_player(
    events: &mut Vec<CollisionEvent>,
    player_entity: &mut Entity,
    source: EntityId,
    amount: f32,
) {
    let id = player_entity.id;
    let Some(player) = player_entity.as_player_mut() else {
        return;
    };
    let was_standing = player.health > 0.0;
    let taken = player.take_damage(amount);
    events.push(CollisionEvent::PlayerDamaged {
        player: id,
        source,
        amount: taken,
    });
    if was_standing && player.health <= 0.0 {
        events.push(CollisionEvent::PlayerDefeated { player: id });
    }
}

fn contact_damage(ctx: &mut EffectContext<'_>, player_slot: usize, enemy_slot: usize) -> Outcome {
    let (player_entity, enemy_entity) = pair_mut(ctx.entities, player_slot, enemy_slot);
    let (EntityKind::Player(player), EntityKind::Enemy(enemy)) =
        (&player_entity.kind, &enemy_entity.kind)
    else {
        return Outcome::Skipped;
    };
    if player.invulnerable {
        return Outcome::Blocked;
    }
    let amount = enemy.damage;
    hurt_player(ctx.events, player_entity, enemy_entity.id, amount);
    Outcome::ContactDamage
}

fn enemy_shot(ctx: &mut EffectContext<'_>, player_slot: usize, shot_slot: usize) -> Outcome {
    let (player_entity, shot_entity) = pair_mut(ctx.entities, player_slot, shot_slot);
    let (EntityKind::Player(player), EntityKind::EnemyProjectile(shot)) =
        (&player_entity.kind, &shot_entity.kind)
    else {
        return Outcome::Skipped;
    };
    if player.invulnerable {
        return Outcome::Blocked;
    }
    let amount = shot.damage;
    hurt_player(ctx.events, player_entity, shot_entity.id, amount);
    // Enemy projectiles never pierce
    shot_entity.is_dead = true;
    Outcome::EnemyShot
}

fn projectile_hit<H: EffectHooks + ?Sized>(
    hooks: &mut H,
    ctx: &mut EffectContext<'_>,
    proj_slot: usize,
    enemy_slot: usize,
) -> Result<Outcome, ResolveError> {
    let (proj_entity, enemy_entity) = pair_mut(ctx.entities, proj_slot, enemy_slot);
    let proj_id = proj_entity.id;
    let enemy_id = enemy_entity.id;
    let EntityKind::Projectile(proj) = &mut proj_entity.kind else {
        return Ok(Outcome::Skipped);
    };
    if proj.has_hit(enemy_id) {
        return Ok(Outcome::AlreadyHit);
    }
    if !hooks.accept_hit(proj, enemy_entity) {
        return Ok(Outcome::Vetoed);
    }

    // Recorded before any hook runs so a failing hook cannot cause a re-hit
    proj.record_hit(enemy_id);
    let damage = proj.damage;
    let owner = proj.owner;
    let has_chain = proj.chain.is_some();
    let has_ricochet = proj.ricochet.is_some();
    let has_explosive = proj.explosive.is_some();
    let lifesteal = proj.lifesteal.unwrap_or(0.0);

    ctx.damage_enemy(enemy_slot, damage, proj_id);

    if has_chain {
        hooks.chain(ctx, proj_slot, enemy_slot)?;
    }

    if lifesteal > 0.0 {
        if let Some(slot) = ctx.player_slot(owner) {
            let player_entity = &mut ctx.entities[slot];
            let player_id = player_entity.id;
            if let Some(player) = player_entity.as_player_mut() {
                let healed = player.heal(damage * lifesteal);
                if healed > 0.0 {
                    ctx.events.push(CollisionEvent::PlayerHealed {
                        player: player_id,
                        amount: healed,
                    });
                }
            }
        }
    }

    let Some(proj) = ctx.entities[proj_slot].as_projectile_mut() else {
        return Ok(Outcome::Skipped);
    };
    let mut should_die = true;
    let mut exhausted = false;
    if proj.piercing > 0 {
        proj.piercing -= 1;
        should_die = false;
    } else {
        proj.piercing = (proj.piercing - 1).max(-1);
        exhausted = true;
    }

    if should_die && has_ricochet && hooks.ricochet(ctx, proj_slot)? {
        should_die = false;
        if exhausted {
            if let Some(proj) = ctx.entities[proj_slot].as_projectile_mut() {
                proj.piercing = proj.original_piercing.div_euclid(2).max(1);
            }
        }
    }

    if should_die && has_explosive {
        hooks.explode(ctx, proj_slot)?;
    }

    if should_die {
        ctx.entities[proj_slot].is_dead = true;
        ctx.events.push(CollisionEvent::ProjectileSpent {
            projectile: proj_id,
        });
    }

    log::trace!(
        "projectile {} hit enemy {} for {} (dies: {})",
        proj_id,
        enemy_id,
        damage,
        should_die
    );
    Ok(Outcome::ProjectileHit {
        projectile_died: should_die,
    })
}
