//! Projectile capability hooks
//!
//! A projectile's capabilities (chain lightning, ricochet, explosive,
//! targeting) are plain data on [`Projectile`]. What they *do* is decided by
//! an [`EffectHooks`] implementation injected into the engine. The default
//! methods implement the standard arena behavior; hosts override individual
//! methods for custom weapons.

use glam::Vec2;
use smallvec::SmallVec;

use super::entity::{Entity, EntityId, EntityType, Projectile, Targeting};
use super::events::CollisionEvent;
use super::grid::SpatialGrid;
use super::narrow_phase::circles_overlap;
use crate::error::EffectError;

/// Mutable view of the frame handed to hooks and the resolver
pub struct EffectContext<'a> {
    pub entities: &'a mut [Entity],
    pub grid: &'a SpatialGrid,
    pub events: &'a mut Vec<CollisionEvent>,
    scratch: &'a mut Vec<usize>,
}

impl<'a> EffectContext<'a> {
    pub fn new(
        entities: &'a mut [Entity],
        grid: &'a SpatialGrid,
        events: &'a mut Vec<CollisionEvent>,
        scratch: &'a mut Vec<usize>,
    ) -> Self {
        Self {
            entities,
            grid,
            events,
            scratch,
        }
    }

    /// Nearest live enemy whose center lies within `range` of `pos` and
    /// that passes `filter`. Ties go to the first found.
    pub fn nearest_enemy<F>(&mut self, pos: Vec2, range: f32, filter: F) -> Option<usize>
    where
        F: Fn(usize, &Entity) -> bool,
    {
        self.grid.query_radius_into(pos, range, self.scratch);
        let range_sq = range * range;
        let mut best: Option<(usize, f32)> = None;
        for &slot in self.scratch.iter() {
            let Some(entity) = self.entities.get(slot) else {
                continue;
            };
            if entity.is_dead || entity.entity_type() != EntityType::Enemy || !filter(slot, entity)
            {
                continue;
            }
            let dist_sq = entity.pos.distance_squared(pos);
            if dist_sq > range_sq {
                continue;
            }
            if best.is_none_or(|(_, d)| dist_sq < d) {
                best = Some((slot, dist_sq));
            }
        }
        best.map(|(slot, _)| slot)
    }

    /// Live enemies whose circle overlaps the circle at `pos`
    pub fn enemies_in_radius(&mut self, pos: Vec2, radius: f32, out: &mut Vec<usize>) {
        out.clear();
        // Widen the cell query so large enemies centered outside still count
        let reach = radius + self.grid.cell_size();
        self.grid.query_radius_into(pos, reach, self.scratch);
        for &slot in self.scratch.iter() {
            let Some(entity) = self.entities.get(slot) else {
                continue;
            };
            if !entity.is_dead
                && entity.entity_type() == EntityType::Enemy
                && entity.has_valid_geometry()
                && circles_overlap(pos, radius, entity.pos, entity.radius)
            {
                out.push(slot);
            }
        }
    }

    /// Damage a live enemy, marking it dead if its health runs out.
    /// Returns true if this call killed it.
    pub fn damage_enemy(&mut self, slot: usize, amount: f32, source: EntityId) -> bool {
        let Some(entity) = self.entities.get_mut(slot) else {
            return false;
        };
        if entity.is_dead {
            return false;
        }
        let id = entity.id;
        let pos = entity.pos;
        let Some(enemy) = entity.as_enemy_mut() else {
            return false;
        };
        let killed = enemy.take_damage(amount);
        let xp_reward = enemy.xp_reward;

        self.events.push(CollisionEvent::EnemyDamaged {
            enemy: id,
            source,
            amount,
        });
        if killed {
            entity.is_dead = true;
            self.events.push(CollisionEvent::EnemyKilled {
                enemy: id,
                pos,
                xp_reward,
            });
        }
        killed
    }

    /// Slot of the player owning a projectile, falling back to the first
    /// live player
    pub fn player_slot(&self, owner: Option<EntityId>) -> Option<usize> {
        let is_live_player =
            |e: &Entity| !e.is_dead && e.entity_type() == EntityType::Player;
        owner
            .and_then(|id| {
                self.entities
                    .iter()
                    .position(|e| e.id == id && is_live_player(e))
            })
            .or_else(|| self.entities.iter().position(is_live_player))
    }

    fn projectile(&self, slot: usize) -> Result<(EntityId, Vec2, &Projectile), EffectError> {
        self.entities
            .get(slot)
            .and_then(|e| e.as_projectile().map(|p| (e.id, e.pos, p)))
            .ok_or(EffectError::NotAProjectile(slot))
    }
}

/// Capability behavior invoked by the resolver
pub trait EffectHooks {
    /// Veto a hit before any damage is applied
    fn accept_hit(&mut self, projectile: &Projectile, enemy: &Entity) -> bool {
        accept_by_targeting(projectile, enemy)
    }

    /// Arc damage onward from the struck enemy
    fn chain(
        &mut self,
        ctx: &mut EffectContext<'_>,
        projectile: usize,
        struck: usize,
    ) -> Result<(), EffectError> {
        chain_lightning(ctx, projectile, struck)
    }

    /// Try to retarget a projectile that would otherwise die
    fn ricochet(&mut self, ctx: &mut EffectContext<'_>, projectile: usize) -> Result<bool, EffectError> {
        ricochet_to_nearest(ctx, projectile)
    }

    /// Area damage fired just before a projectile dies
    fn explode(&mut self, ctx: &mut EffectContext<'_>, projectile: usize) -> Result<(), EffectError> {
        explode_area(ctx, projectile)
    }
}

/// Stock arena behavior for every capability
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEffects;

impl EffectHooks for StandardEffects {}

pub fn accept_by_targeting(projectile: &Projectile, enemy: &Entity) -> bool {
    match projectile.targeting {
        None => true,
        Some(Targeting::Locked(id)) => enemy.id == id,
        Some(Targeting::SkipBosses) => !enemy.as_enemy().is_some_and(|e| e.is_boss),
    }
}

/// Jump from enemy to enemy, nearest first, skipping anything this
/// projectile already hit directly
pub fn chain_lightning(
    ctx: &mut EffectContext<'_>,
    projectile: usize,
    struck: usize,
) -> Result<(), EffectError> {
    let (source, _, proj) = ctx.projectile(projectile)?;
    let Some(chain) = proj.chain else {
        return Ok(());
    };
    let damage = proj.damage * chain.damage_fraction;
    let already_hit = proj.hit_enemies.clone();

    let mut visited: SmallVec<[usize; 8]> = SmallVec::new();
    visited.push(struck);
    let mut from = struck;
    for _ in 0..chain.jumps {
        let Some(origin) = ctx.entities.get(from).map(|e| e.pos) else {
            break;
        };
        let next = ctx.nearest_enemy(origin, chain.range, |slot, e| {
            !visited.contains(&slot) && !already_hit.contains(&e.id)
        });
        let Some(next) = next else {
            break;
        };
        visited.push(next);
        ctx.events.push(CollisionEvent::ChainJump {
            from: ctx.entities[from].id,
            to: ctx.entities[next].id,
            damage,
        });
        ctx.damage_enemy(next, damage, source);
        from = next;
    }
    Ok(())
}

/// Redirect toward the nearest enemy not yet hit, keeping speed
pub fn ricochet_to_nearest(
    ctx: &mut EffectContext<'_>,
    projectile: usize,
) -> Result<bool, EffectError> {
    let (source, pos, proj) = ctx.projectile(projectile)?;
    let Some(ricochet) = proj.ricochet else {
        return Ok(false);
    };
    if ricochet.bounces == 0 {
        return Ok(false);
    }
    let already_hit = proj.hit_enemies.clone();

    let Some(target) = ctx.nearest_enemy(pos, ricochet.range, |_, e| !already_hit.contains(&e.id))
    else {
        return Ok(false);
    };
    let target_id = ctx.entities[target].id;
    let target_pos = ctx.entities[target].pos;

    let proj = ctx.entities[projectile]
        .as_projectile_mut()
        .ok_or(EffectError::NotAProjectile(projectile))?;
    let dir = (target_pos - pos).normalize_or_zero();
    if dir != Vec2::ZERO {
        proj.vel = dir * proj.vel.length();
    }
    if let Some(r) = proj.ricochet.as_mut() {
        r.bounces -= 1;
    }

    ctx.events.push(CollisionEvent::Ricocheted {
        projectile: source,
        target: target_id,
    });
    Ok(true)
}

/// Damage every live enemy touching the blast circle
pub fn explode_area(ctx: &mut EffectContext<'_>, projectile: usize) -> Result<(), EffectError> {
    let (source, pos, proj) = ctx.projectile(projectile)?;
    let Some(explosive) = proj.explosive else {
        return Ok(());
    };
    let damage = proj.damage * explosive.damage_fraction;

    // Collect first, then damage
    let mut victims = Vec::new();
    ctx.enemies_in_radius(pos, explosive.radius, &mut victims);
    for &slot in &victims {
        ctx.damage_enemy(slot, damage, source);
    }

    ctx.events.push(CollisionEvent::Exploded {
        projectile: source,
        pos,
        radius: explosive.radius,
        victims: victims.len(),
    });
    Ok(())
}
