//! Entity data model consumed by the collision engine
//!
//! Entities are created and owned by gameplay collaborators and appended to a
//! live collection. The engine reads their geometry and type, and only ever
//! writes lifecycle fields: health, death flags, piercing counters.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Stable identity of an entity across frames
pub type EntityId = u32;

/// Enemy ids already damaged by one projectile instance
pub type HitSet = SmallVec<[EntityId; 8]>;

/// Fieldless type tag used by the collision rules and broad phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    Player,
    Enemy,
    Projectile,
    EnemyProjectile,
    XpOrb,
}

impl EntityType {
    pub const COUNT: usize = 5;

    pub const ALL: [EntityType; Self::COUNT] = [
        EntityType::Player,
        EntityType::Enemy,
        EntityType::Projectile,
        EntityType::EnemyProjectile,
        EntityType::XpOrb,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Player => "player",
            EntityType::Enemy => "enemy",
            EntityType::Projectile => "projectile",
            EntityType::EnemyProjectile => "enemy_projectile",
            EntityType::XpOrb => "xp_orb",
        }
    }
}

/// The player avatar
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub health: f32,
    pub max_health: f32,
    /// Set by collaborators (dash, i-frames); blocks all incoming damage
    pub invulnerable: bool,
    pub experience: f32,
}

impl Player {
    pub fn new(max_health: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            invulnerable: false,
            experience: 0.0,
        }
    }

    /// Apply damage, clamping health at zero. Returns the damage actually taken.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let before = self.health;
        self.health = (self.health - amount).max(0.0);
        before - self.health
    }

    /// Heal up to max health. Returns the amount actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.health;
        self.health = (self.health + amount).min(self.max_health);
        self.health - before
    }
}

/// A hostile entity
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub health: f32,
    pub max_health: f32,
    /// Contact damage dealt to the player
    pub damage: f32,
    /// Experience granted to whoever drops the orb on death
    pub xp_reward: f32,
    pub is_boss: bool,
}

impl Enemy {
    pub fn new(health: f32, damage: f32) -> Self {
        Self {
            health,
            max_health: health,
            damage,
            xp_reward: 1.0,
            is_boss: false,
        }
    }

    pub fn boss(mut self) -> Self {
        self.is_boss = true;
        self
    }

    pub fn with_xp_reward(mut self, xp_reward: f32) -> Self {
        self.xp_reward = xp_reward;
        self
    }

    /// Subtract health. Returns true if this blow took health to zero or below.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.health -= amount;
        self.health <= 0.0
    }
}

/// Experience pickup
#[derive(Debug, Clone, PartialEq)]
pub struct XpOrb {
    pub value: f32,
    /// One-shot guard for the collection effect
    pub collected: bool,
}

impl XpOrb {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            collected: false,
        }
    }
}

/// Projectile fired by an enemy ability. Never pierces.
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyProjectile {
    pub damage: f32,
}

/// Chain lightning: a hit arcs to nearby untouched enemies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainLightning {
    pub range: f32,
    /// Fraction of the projectile's damage dealt per jump
    pub damage_fraction: f32,
    pub jumps: u32,
}

impl Default for ChainLightning {
    fn default() -> Self {
        Self {
            range: 150.0,
            damage_fraction: 0.5,
            jumps: 2,
        }
    }
}

/// Ricochet: a projectile about to die may retarget instead
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ricochet {
    pub range: f32,
    /// Remaining retargets
    pub bounces: u32,
}

impl Default for Ricochet {
    fn default() -> Self {
        Self {
            range: 250.0,
            bounces: 2,
        }
    }
}

/// Explosive: area damage when the projectile dies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosive {
    pub radius: f32,
    pub damage_fraction: f32,
}

impl Default for Explosive {
    fn default() -> Self {
        Self {
            radius: 80.0,
            damage_fraction: 0.75,
        }
    }
}

/// Custom targeting rule consulted before a hit is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Targeting {
    /// Only this enemy may be hit (homing shots)
    Locked(EntityId),
    /// Passes through bosses without touching them
    SkipBosses,
}

/// Player-owned projectile with optional capabilities
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    /// Player that fired this projectile (lifesteal target)
    pub owner: Option<EntityId>,
    pub damage: f32,
    pub vel: Vec2,
    /// Remaining extra penetrations; -1 once exhausted
    pub piercing: i32,
    /// Piercing at spawn, used to restore a budget after a ricochet
    pub original_piercing: i32,
    pub hit_enemies: HitSet,
    pub chain: Option<ChainLightning>,
    pub ricochet: Option<Ricochet>,
    pub explosive: Option<Explosive>,
    /// Fraction (0-1) of damage dealt returned to the owner as health
    pub lifesteal: Option<f32>,
    pub targeting: Option<Targeting>,
}

impl Projectile {
    pub fn new(damage: f32, piercing: i32) -> Self {
        Self {
            owner: None,
            damage,
            vel: Vec2::ZERO,
            piercing,
            original_piercing: piercing,
            hit_enemies: HitSet::new(),
            chain: None,
            ricochet: None,
            explosive: None,
            lifesteal: None,
            targeting: None,
        }
    }

    pub fn with_owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_chain(mut self, chain: ChainLightning) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_ricochet(mut self, ricochet: Ricochet) -> Self {
        self.ricochet = Some(ricochet);
        self
    }

    pub fn with_explosive(mut self, explosive: Explosive) -> Self {
        self.explosive = Some(explosive);
        self
    }

    pub fn with_lifesteal(mut self, fraction: f32) -> Self {
        self.lifesteal = Some(fraction.clamp(0.0, 1.0));
        self
    }

    pub fn with_targeting(mut self, targeting: Targeting) -> Self {
        self.targeting = Some(targeting);
        self
    }

    #[inline]
    pub fn has_hit(&self, enemy: EntityId) -> bool {
        self.hit_enemies.contains(&enemy)
    }

    pub fn record_hit(&mut self, enemy: EntityId) {
        if !self.has_hit(enemy) {
            self.hit_enemies.push(enemy);
        }
    }
}

/// Variant payload of an entity
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Player(Player),
    Enemy(Enemy),
    Projectile(Projectile),
    EnemyProjectile(EnemyProjectile),
    XpOrb(XpOrb),
}

/// A circular entity in the arena
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    /// The sole "remove me" signal; purged by the owning collection after the frame
    pub is_dead: bool,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(id: EntityId, pos: Vec2, radius: f32, kind: EntityKind) -> Self {
        Self {
            id,
            pos,
            radius,
            is_dead: false,
            kind,
        }
    }

    pub fn player(id: EntityId, pos: Vec2, radius: f32, player: Player) -> Self {
        Self::new(id, pos, radius, EntityKind::Player(player))
    }

    pub fn enemy(id: EntityId, pos: Vec2, radius: f32, enemy: Enemy) -> Self {
        Self::new(id, pos, radius, EntityKind::Enemy(enemy))
    }

    pub fn projectile(id: EntityId, pos: Vec2, radius: f32, projectile: Projectile) -> Self {
        Self::new(id, pos, radius, EntityKind::Projectile(projectile))
    }

    pub fn enemy_projectile(id: EntityId, pos: Vec2, radius: f32, damage: f32) -> Self {
        Self::new(
            id,
            pos,
            radius,
            EntityKind::EnemyProjectile(EnemyProjectile { damage }),
        )
    }

    pub fn xp_orb(id: EntityId, pos: Vec2, radius: f32, value: f32) -> Self {
        Self::new(id, pos, radius, EntityKind::XpOrb(XpOrb::new(value)))
    }

    #[inline]
    pub fn entity_type(&self) -> EntityType {
        match self.kind {
            EntityKind::Player(_) => EntityType::Player,
            EntityKind::Enemy(_) => EntityType::Enemy,
            EntityKind::Projectile(_) => EntityType::Projectile,
            EntityKind::EnemyProjectile(_) => EntityType::EnemyProjectile,
            EntityKind::XpOrb(_) => EntityType::XpOrb,
        }
    }

    /// Damage this entity deals on contact, if it is an attacking variant
    pub fn damage(&self) -> Option<f32> {
        match &self.kind {
            EntityKind::Enemy(e) => Some(e.damage),
            EntityKind::Projectile(p) => Some(p.damage),
            EntityKind::EnemyProjectile(p) => Some(p.damage),
            EntityKind::Player(_) | EntityKind::XpOrb(_) => None,
        }
    }

    /// Finite position and a strictly positive radius
    #[inline]
    pub fn has_valid_geometry(&self) -> bool {
        self.pos.is_finite() && self.radius.is_finite() && self.radius > 0.0
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_enemy(&self) -> Option<&Enemy> {
        match &self.kind {
            EntityKind::Enemy(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_enemy_mut(&mut self) -> Option<&mut Enemy> {
        match &mut self.kind {
            EntityKind::Enemy(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_projectile(&self) -> Option<&Projectile> {
        match &self.kind {
            EntityKind::Projectile(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_projectile_mut(&mut self) -> Option<&mut Projectile> {
        match &mut self.kind {
            EntityKind::Projectile(p) => Some(p),
            _ => None,
        }
    }
}
