//! Arena collision module
//!
//! Entities are owned by the host; the engine borrows the slice each frame.
//! This module must stay deterministic:
//! - No randomness
//! - Stable iteration order (grid cells in first-insertion order)
//! - No rendering or platform dependencies

pub mod broad_phase;
pub mod effects;
pub mod engine;
pub mod entity;
pub mod events;
pub mod grid;
pub mod narrow_phase;
pub mod resolve;
pub mod rules;
pub mod scheduler;
pub mod stats;

pub use broad_phase::{FORWARD_NEIGHBORS, ScanCounts, for_each_candidate_pair};
pub use effects::{EffectContext, EffectHooks, StandardEffects};
pub use engine::CollisionEngine;
pub use entity::{
    ChainLightning, Enemy, EnemyProjectile, Entity, EntityId, EntityKind, EntityType, Explosive,
    Player, Projectile, Ricochet, Targeting, XpOrb,
};
pub use events::CollisionEvent;
pub use grid::{CellCoord, CellEntry, PoolLimits, SpatialGrid};
pub use narrow_phase::{circles_overlap, is_colliding};
pub use resolve::{Outcome, resolve};
pub use rules::CollisionRules;
pub use scheduler::{CellSizing, RebuildDecision, RebuildReason, RebuildScheduler};
pub use stats::{CollisionStats, StatsWindow};
