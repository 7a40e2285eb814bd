//! Arena Collide headless driver
//!
//! Runs a seeded swarm against the collision engine at a fixed frame time
//! and logs engine telemetry. Useful for soak testing and profiling the
//! grid under load without a renderer.

use std::f32::consts::TAU;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rustc_hash::FxHashMap;

use arena_collide::collision::{
    ChainLightning, CollisionEngine, CollisionEvent, Enemy, Entity, EntityId, Explosive, Player,
    Projectile, Ricochet, Targeting,
};
use arena_collide::consts::*;
use arena_collide::{EngineConfig, polar_to_cartesian};

/// Headless soak run of the arena collision engine
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// RNG seed for spawns and weapon rolls
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Frames to simulate
    #[arg(long, default_value_t = 3600)]
    frames: u32,

    /// Enemies kept alive at once
    #[arg(long, default_value_t = 250)]
    enemies: usize,

    /// Frames between player shots
    #[arg(long, default_value_t = 4)]
    fire_interval: u32,

    /// JSON engine config; defaults apply when omitted
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the effective engine config to PATH and exit
    #[arg(long, value_name = "PATH")]
    dump_config: Option<PathBuf>,
}

/// Host-side world state the engine borrows each frame
struct Arena {
    rng: Pcg32,
    entities: Vec<Entity>,
    /// Velocities of enemy shots (player shots carry their own)
    shot_velocities: FxHashMap<EntityId, Vec2>,
    next_id: EntityId,
    player_id: EntityId,
    time: f32,
    kills: u32,
    defeats: u32,
}

impl Arena {
    fn new(seed: u64) -> Self {
        let player_id = 0;
        Self {
            rng: Pcg32::seed_from_u64(seed),
            entities: vec![Entity::player(
                player_id,
                Vec2::ZERO,
                PLAYER_RADIUS,
                Player::new(PLAYER_MAX_HEALTH),
            )],
            shot_velocities: FxHashMap::default(),
            next_id: player_id + 1,
            player_id,
            time: 0.0,
            kills: 0,
            defeats: 0,
        }
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn player_pos(&self) -> Vec2 {
        self.entities
            .iter()
            .find(|e| e.id == self.player_id)
            .map_or(Vec2::ZERO, |e| e.pos)
    }

    fn player_mut(&mut self) -> Option<&mut Player> {
        let id = self.player_id;
        self.entities
            .iter_mut()
            .find(|e| e.id == id)
            .and_then(Entity::as_player_mut)
    }

    fn enemy_count(&self) -> usize {
        self.entities.iter().filter(|e| e.as_enemy().is_some()).count()
    }

    /// Top the swarm back up to `target` on a ring around the player
    fn spawn_enemies(&mut self, target: usize) {
        let center = self.player_pos();
        for _ in self.enemy_count()..target {
            let id = self.alloc_id();
            let angle = self.rng.random_range(0.0..TAU);
            let pos = center + polar_to_cartesian(SPAWN_RING_RADIUS, angle);
            let enemy = if self.rng.random_bool(0.01) {
                Enemy::new(ENEMY_HEALTH * 20.0, ENEMY_CONTACT_DAMAGE * 4.0).boss()
            } else {
                Enemy::new(ENEMY_HEALTH, ENEMY_CONTACT_DAMAGE)
            };
            let radius = if enemy.is_boss {
                ENEMY_RADIUS * 3.0
            } else {
                ENEMY_RADIUS
            };
            self.entities.push(Entity::enemy(id, pos, radius, enemy));
        }
    }

    /// Fire one player projectile with a random capability roll
    fn fire(&mut self) {
        let id = self.alloc_id();
        let angle = self.rng.random_range(0.0..TAU);
        let vel = polar_to_cartesian(PROJECTILE_SPEED, angle);

        let mut projectile = Projectile::new(PROJECTILE_DAMAGE, self.rng.random_range(0..3))
            .with_owner(self.player_id)
            .with_velocity(vel);
        if self.rng.random_bool(0.25) {
            projectile = projectile.with_chain(ChainLightning::default());
        }
        if self.rng.random_bool(0.2) {
            projectile = projectile.with_ricochet(Ricochet::default());
        }
        if self.rng.random_bool(0.15) {
            projectile = projectile.with_explosive(Explosive::default());
        }
        if self.rng.random_bool(0.1) {
            projectile = projectile.with_lifesteal(0.05);
        }
        if self.rng.random_bool(0.1) {
            projectile = projectile.with_targeting(Targeting::SkipBosses);
        }

        let pos = self.player_pos();
        self.entities
            .push(Entity::projectile(id, pos, PROJECTILE_RADIUS, projectile));
    }

    /// Occasionally let an enemy shoot at the player
    fn enemy_fire(&mut self) {
        let target = self.player_pos();
        let shooters: Vec<Vec2> = self
            .entities
            .iter()
            .filter(|e| !e.is_dead && e.as_enemy().is_some())
            .map(|e| e.pos)
            .collect();
        for pos in shooters {
            if !self.rng.random_bool(0.002) {
                continue;
            }
            let id = self.alloc_id();
            let vel = (target - pos).normalize_or_zero() * PROJECTILE_SPEED * 0.5;
            self.shot_velocities.insert(id, vel);
            self.entities
                .push(Entity::enemy_projectile(id, pos, PROJECTILE_RADIUS, 4.0));
        }
    }

    /// Move everything one frame and retire what left the arena
    fn advance(&mut self, dt: f32) {
        self.time += dt;
        let player_pos = polar_to_cartesian(250.0, self.time * 0.4);
        let player_id = self.player_id;

        for entity in &mut self.entities {
            if entity.id == player_id {
                entity.pos = player_pos;
                continue;
            }
            let step = if let Some(projectile) = entity.as_projectile() {
                projectile.vel * dt
            } else if entity.as_enemy().is_some() {
                (player_pos - entity.pos).normalize_or_zero() * ENEMY_SPEED * dt
            } else if let Some(vel) = self.shot_velocities.get(&entity.id) {
                *vel * dt
            } else {
                // XP orbs drift toward a nearby player
                let to_player = player_pos - entity.pos;
                if to_player.length_squared() < 150.0 * 150.0 {
                    to_player.normalize_or_zero() * ENEMY_SPEED * 2.0 * dt
                } else {
                    Vec2::ZERO
                }
            };
            entity.pos += step;
            if entity.pos.abs().max_element() > ARENA_HALF_SIZE {
                entity.is_dead = true;
            }
        }
    }

    fn purge_dead(&mut self) {
        self.entities.retain(|e| !e.is_dead);
        let entities = &self.entities;
        self.shot_velocities
            .retain(|id, _| entities.iter().any(|e| e.id == *id));
    }

    /// React to the side effects of a collision pass
    fn apply(&mut self, events: Vec<CollisionEvent>) {
        for event in events {
            match event {
                CollisionEvent::EnemyKilled { pos, xp_reward, .. } => {
                    self.kills += 1;
                    let id = self.alloc_id();
                    self.entities
                        .push(Entity::xp_orb(id, pos, XP_ORB_RADIUS, xp_reward));
                }
                CollisionEvent::PlayerDefeated { player } => {
                    self.defeats += 1;
                    log::info!("Player {} defeated at t={:.1}s, respawning", player, self.time);
                    if let Some(p) = self.player_mut() {
                        p.heal(p.max_health);
                    }
                }
                _ => {}
            }
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    if let Some(path) = &cli.dump_config {
        return match config.save(path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("Failed to write config {}: {}", path.display(), e);
                ExitCode::FAILURE
            }
        };
    }

    log::info!(
        "Arena Collide starting: seed {}, {} frames, {} enemies",
        cli.seed,
        cli.frames,
        cli.enemies
    );

    let mut engine = CollisionEngine::new(config);
    let mut arena = Arena::new(cli.seed);
    let fire_interval = cli.fire_interval.max(1);

    for frame in 0..cli.frames {
        let now_ms = frame as f64 * FRAME_MS;

        arena.advance(FRAME_MS as f32 / 1000.0);
        arena.purge_dead();
        arena.spawn_enemies(cli.enemies);
        if frame % fire_interval == 0 {
            arena.fire();
        }
        arena.enemy_fire();

        engine.step(&mut arena.entities, now_ms);
        arena.apply(engine.drain_events());

        if frame % 60 == 59 {
            let stats = engine.stats();
            let history = engine.history();
            log::info!(
                "frame {}: {} entities, cell {} ({} occupied, {} pooled), pairs {:.0} checked / {:.0} resolved, rebuilt {:.0}%, scan {:.3}ms",
                frame + 1,
                arena.entities.len(),
                stats.cell_size,
                stats.occupied_cells,
                stats.pooled_cells,
                history.avg_pairs_checked(),
                history.avg_pairs_resolved(),
                history.rebuild_ratio() * 100.0,
                history.avg_scan_ms()
            );
            if stats.faults > 0 {
                log::warn!("{} collision faults this frame", stats.faults);
            }
        }
    }

    let experience = arena.player_mut().map_or(0.0, |p| p.experience);
    log::info!(
        "Done: {} kills, {} defeats, {:.0} experience collected",
        arena.kills,
        arena.defeats,
        experience
    );
    ExitCode::SUCCESS
}
