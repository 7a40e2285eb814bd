//! Arena Collide - collision engine for an arena survival game
//!
//! Core modules:
//! - `collision`: Spatial hash grid, broad/narrow phase, resolution and effects
//! - `config`: Data-driven engine tuning
//! - `error`: Error types surfaced by hooks and config loading

pub mod collision;
pub mod config;
pub mod error;

pub use collision::{CollisionEngine, CollisionEvent, Entity, EntityType};
pub use config::EngineConfig;

use glam::Vec2;

/// Arena and driver constants
pub mod consts {
    /// Fixed frame time for the headless driver (60 Hz)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;

    /// Half-extent of the square arena
    pub const ARENA_HALF_SIZE: f32 = 1200.0;
    /// Enemies spawn on a ring this far from the player
    pub const SPAWN_RING_RADIUS: f32 = 700.0;

    pub const PLAYER_RADIUS: f32 = 16.0;
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;

    pub const ENEMY_RADIUS: f32 = 12.0;
    pub const ENEMY_SPEED: f32 = 90.0;
    pub const ENEMY_HEALTH: f32 = 30.0;
    pub const ENEMY_CONTACT_DAMAGE: f32 = 0.5;

    pub const PROJECTILE_RADIUS: f32 = 5.0;
    pub const PROJECTILE_SPEED: f32 = 480.0;
    pub const PROJECTILE_DAMAGE: f32 = 12.0;

    pub const XP_ORB_RADIUS: f32 = 6.0;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
