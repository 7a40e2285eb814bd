//! Side effects reported to gameplay collaborators
//!
//! The engine mutates entity state directly; these events let the rest of
//! the game (floating damage numbers, particles, audio, orb drops) react
//! after the collision pass without the engine knowing about them.

use glam::Vec2;

use super::entity::EntityId;

#[derive(Debug, Clone, PartialEq)]
pub enum CollisionEvent {
    PlayerDamaged {
        player: EntityId,
        source: EntityId,
        amount: f32,
    },
    /// Player health reached zero this frame
    PlayerDefeated { player: EntityId },
    EnemyDamaged {
        enemy: EntityId,
        source: EntityId,
        amount: f32,
    },
    EnemyKilled {
        enemy: EntityId,
        pos: Vec2,
        xp_reward: f32,
    },
    XpCollected {
        player: EntityId,
        orb: EntityId,
        value: f32,
        pos: Vec2,
    },
    PlayerHealed { player: EntityId, amount: f32 },
    ChainJump {
        from: EntityId,
        to: EntityId,
        damage: f32,
    },
    Ricocheted {
        projectile: EntityId,
        target: EntityId,
    },
    Exploded {
        projectile: EntityId,
        pos: Vec2,
        radius: f32,
        victims: usize,
    },
    /// A projectile was marked dead by a hit
    ProjectileSpent { projectile: EntityId },
}
