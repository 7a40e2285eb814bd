//! Per-frame collision pass
//!
//! The host calls, every non-paused frame and in this order:
//!
//! 1. [`CollisionEngine::update_spatial_grid`]: rebuild or reuse the grid
//! 2. [`CollisionEngine::check_collisions`]: scan, test and resolve pairs
//!
//! Everything runs synchronously on the caller's thread. Resolving one pair
//! can invalidate a later pair in the same scan (an enemy killed mid-scan);
//! dead flags are re-read before every narrow-phase test so such pairs are
//! skipped.

use std::time::Instant;

use super::broad_phase::for_each_candidate_pair;
use super::effects::{EffectContext, EffectHooks, StandardEffects};
use super::entity::Entity;
use super::events::CollisionEvent;
use super::grid::SpatialGrid;
use super::narrow_phase::is_colliding;
use super::resolve::{Outcome, resolve};
use super::rules::CollisionRules;
use super::scheduler::{RebuildDecision, RebuildScheduler};
use super::stats::{CollisionStats, StatsWindow};
use crate::config::EngineConfig;

/// Spatial-hash collision engine with injected capability hooks
pub struct CollisionEngine<H: EffectHooks = StandardEffects> {
    rules: CollisionRules,
    grid: SpatialGrid,
    scheduler: RebuildScheduler,
    hooks: H,
    events: Vec<CollisionEvent>,
    /// Reused buffer for radius queries
    scratch: Vec<usize>,
    stats: CollisionStats,
    history: StatsWindow,
}

impl CollisionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_hooks(config, StandardEffects)
    }
}

impl Default for CollisionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<H: EffectHooks> CollisionEngine<H> {
    pub fn with_hooks(config: EngineConfig, hooks: H) -> Self {
        let EngineConfig {
            sizing,
            pool,
            rules,
        } = config;
        Self {
            rules,
            grid: SpatialGrid::new(sizing.dense_cell_size, pool),
            scheduler: RebuildScheduler::new(sizing),
            hooks,
            events: Vec::new(),
            scratch: Vec::new(),
            stats: CollisionStats::default(),
            history: StatsWindow::default(),
        }
    }

    /// Bring the grid in line with `entities`, rebuilding only when reuse
    /// would differ from a rebuild. Starts a new stats frame.
    pub fn update_spatial_grid(&mut self, entities: &[Entity], now_ms: f64) -> RebuildDecision {
        self.grid.reset_counters();
        let decision = self
            .scheduler
            .rebuild_if_needed(&mut self.grid, entities, now_ms);
        let counters = self.grid.counters();

        self.stats = CollisionStats {
            rebuilt: decision.rebuilt(),
            cell_clears: counters.cell_clears,
            insertions: counters.insertions,
            cell_size: self.grid.cell_size(),
            occupied_cells: self.grid.occupied_cells(),
            pooled_cells: self.grid.pooled(),
            ..Default::default()
        };
        decision
    }

    /// Scan the grid and resolve every overlapping, type-compatible pair at
    /// most once. Never fails: a pair whose resolution errors is logged and
    /// skipped.
    pub fn check_collisions(&mut self, entities: &mut [Entity]) {
        if !self.scheduler.tracks(entities) {
            log::warn!(
                "grid not synced with these {} entities, skipping collision pass",
                entities.len()
            );
            return;
        }

        let started = Instant::now();
        let mut resolved = 0;
        let mut faults = 0;

        let Self {
            rules,
            grid,
            hooks,
            events,
            scratch,
            ..
        } = self;
        let grid: &SpatialGrid = grid;
        let mut ctx = EffectContext::new(entities, grid, events, scratch);

        let counts = for_each_candidate_pair(grid, rules, |a, b| {
            let (ea, eb) = (&ctx.entities[a.slot], &ctx.entities[b.slot]);
            if ea.is_dead || eb.is_dead || !is_colliding(ea, eb) {
                return;
            }
            match resolve(&mut *hooks, &mut ctx, a.slot, b.slot) {
                Ok(Outcome::Skipped) => {}
                Ok(outcome) => {
                    resolved += 1;
                    log::trace!("{} <-> {}: {:?}", a.kind.as_str(), b.kind.as_str(), outcome);
                }
                Err(err) => {
                    faults += 1;
                    log::warn!(
                        "collision {} <-> {} failed: {}",
                        a.kind.as_str(),
                        b.kind.as_str(),
                        err
                    );
                }
            }
        });

        self.stats.cells_processed = counts.cells_processed;
        self.stats.pairs_checked = counts.pairs_checked;
        self.stats.pairs_resolved = resolved;
        self.stats.faults = faults;
        self.stats.scan_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.history.push(self.stats);
    }

    /// Both entry points in order
    pub fn step(&mut self, entities: &mut [Entity], now_ms: f64) {
        self.update_spatial_grid(entities, now_ms);
        self.check_collisions(entities);
    }

    /// Take the side effects produced since the last drain
    pub fn drain_events(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }

    /// Stats for the most recent frame
    pub fn stats(&self) -> &CollisionStats {
        &self.stats
    }

    pub fn history(&self) -> &StatsWindow {
        &self.history
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn rules(&self) -> &CollisionRules {
        &self.rules
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.grid.cell_size()
    }
}
