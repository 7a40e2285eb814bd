//! Rebuild scheduling for the spatial grid
//!
//! Once per frame the scheduler decides whether the grid must be rebuilt or
//! can be reused as-is. Reuse is only allowed when it is provably identical
//! to a rebuild: same entity count, same identity at every slot, every live
//! entity still in the cell it was recorded in, and nothing dead.
//!
//! The cell size adapts to entity density. It is resampled at most every
//! `resample_interval_ms`, or sooner when the live population jumps by more
//! than `count_delta`.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId};
use super::grid::{CellCoord, SpatialGrid};

/// One density tier: populations below `below` use `cell_size`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSizeTier {
    pub below: usize,
    pub cell_size: f32,
}

/// Adaptive cell sizing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSizing {
    pub resample_interval_ms: f64,
    pub count_delta: usize,
    /// Ascending by `below`
    pub tiers: Vec<CellSizeTier>,
    /// Cell size once every tier is exceeded
    pub dense_cell_size: f32,
}

impl Default for CellSizing {
    fn default() -> Self {
        Self {
            resample_interval_ms: 250.0,
            count_delta: 50,
            tiers: vec![
                CellSizeTier { below: 50, cell_size: 160.0 },
                CellSizeTier { below: 100, cell_size: 140.0 },
                CellSizeTier { below: 200, cell_size: 120.0 },
            ],
            dense_cell_size: 100.0,
        }
    }
}

impl CellSizing {
    /// Cell size for a population of `count` entities
    pub fn cell_size_for(&self, count: usize) -> f32 {
        self.tiers
            .iter()
            .find(|tier| count < tier.below)
            .map(|tier| tier.cell_size)
            .unwrap_or(self.dense_cell_size)
    }
}

/// Why the grid was rebuilt this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    Initial,
    CellSizeChanged,
    CountChanged,
    EntityMoved,
    EntityDied,
}

/// Outcome of [`RebuildScheduler::rebuild_if_needed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildDecision {
    Reused,
    Rebuilt(RebuildReason),
}

impl RebuildDecision {
    pub fn rebuilt(&self) -> bool {
        matches!(self, RebuildDecision::Rebuilt(_))
    }
}

/// Last recorded placement of the entity at one slot
#[derive(Debug, Clone, Copy)]
struct Tracked {
    id: EntityId,
    /// None when the entity was not inserted (dead or malformed)
    cell: Option<CellCoord>,
}

/// Decides per frame whether the grid needs a full rebuild
pub struct RebuildScheduler {
    sizing: CellSizing,
    last_sample_ms: Option<f64>,
    last_sample_count: usize,
    /// Slot-indexed; reset wholesale on every rebuild
    tracked: Vec<Tracked>,
    built: bool,
}

impl RebuildScheduler {
    pub fn new(sizing: CellSizing) -> Self {
        Self {
            sizing,
            last_sample_ms: None,
            last_sample_count: 0,
            tracked: Vec::new(),
            built: false,
        }
    }

    pub fn sizing(&self) -> &CellSizing {
        &self.sizing
    }

    /// Resample the cell size if due, then rebuild the grid unless reuse is
    /// equivalent to a rebuild.
    pub fn rebuild_if_needed(
        &mut self,
        grid: &mut SpatialGrid,
        entities: &[Entity],
        now_ms: f64,
    ) -> RebuildDecision {
        let mut reason = None;

        let live = entities.iter().filter(|e| !e.is_dead).count();
        if self.resample_due(live, now_ms) {
            self.last_sample_ms = Some(now_ms);
            self.last_sample_count = live;
            let size = self.sizing.cell_size_for(live);
            if size != grid.cell_size() {
                log::debug!(
                    "cell size {} -> {} ({} live entities)",
                    grid.cell_size(),
                    size,
                    live
                );
                grid.set_cell_size(size);
                reason = Some(RebuildReason::CellSizeChanged);
            }
        }

        match reason.or_else(|| self.dirty_reason(grid, entities)) {
            Some(reason) => {
                self.rebuild(grid, entities);
                log::trace!("grid rebuilt ({:?}), {} cells", reason, grid.occupied_cells());
                RebuildDecision::Rebuilt(reason)
            }
            None => RebuildDecision::Reused,
        }
    }

    /// True if `entities` holds, slot for slot, the entities the grid was
    /// last built or reused for
    pub fn tracks(&self, entities: &[Entity]) -> bool {
        self.built
            && entities.len() == self.tracked.len()
            && entities
                .iter()
                .zip(&self.tracked)
                .all(|(entity, tracked)| entity.id == tracked.id)
    }

    fn resample_due(&self, count: usize, now_ms: f64) -> bool {
        match self.last_sample_ms {
            None => true,
            Some(last) => {
                now_ms - last >= self.sizing.resample_interval_ms
                    || count.abs_diff(self.last_sample_count) > self.sizing.count_delta
            }
        }
    }

    fn dirty_reason(&self, grid: &SpatialGrid, entities: &[Entity]) -> Option<RebuildReason> {
        if !self.built {
            return Some(RebuildReason::Initial);
        }
        if entities.len() != self.tracked.len() {
            return Some(RebuildReason::CountChanged);
        }
        for (entity, tracked) in entities.iter().zip(&self.tracked) {
            if entity.is_dead {
                return Some(RebuildReason::EntityDied);
            }
            if entity.id != tracked.id || placement(grid, entity) != tracked.cell {
                return Some(RebuildReason::EntityMoved);
            }
        }
        None
    }

    fn rebuild(&mut self, grid: &mut SpatialGrid, entities: &[Entity]) {
        grid.clear();
        self.tracked.clear();
        for (slot, entity) in entities.iter().enumerate() {
            let cell = placement(grid, entity)
                .map(|_| grid.insert(slot, entity.entity_type(), entity.pos));
            self.tracked.push(Tracked {
                id: entity.id,
                cell,
            });
        }
        self.built = true;
    }
}

/// Cell a live, well-formed entity belongs in
fn placement(grid: &SpatialGrid, entity: &Entity) -> Option<CellCoord> {
    (!entity.is_dead && entity.has_valid_geometry()).then(|| grid.cell_of(entity.pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::entity::Enemy;
    use crate::collision::grid::PoolLimits;
    use glam::Vec2;

    fn enemies(n: usize) -> Vec<Entity> {
        (0..n)
            .map(|i| {
                Entity::enemy(
                    i as u32,
                    Vec2::new(i as f32 * 37.0, (i % 7) as f32 * 53.0),
                    8.0,
                    Enemy::new(10.0, 1.0),
                )
            })
            .collect()
    }

    fn setup() -> (RebuildScheduler, SpatialGrid) {
        let sizing = CellSizing::default();
        let grid = SpatialGrid::new(sizing.dense_cell_size, PoolLimits::default());
        (RebuildScheduler::new(sizing), grid)
    }

    #[test]
    fn test_cell_size_tiers_monotonic() {
        let sizing = CellSizing::default();
        assert_eq!(sizing.cell_size_for(40), 160.0);
        assert_eq!(sizing.cell_size_for(99), 140.0);
        assert_eq!(sizing.cell_size_for(150), 120.0);
        assert_eq!(sizing.cell_size_for(250), 100.0);
        assert!(sizing.cell_size_for(40) >= sizing.cell_size_for(150));
        assert!(sizing.cell_size_for(150) >= sizing.cell_size_for(250));
    }

    #[test]
    fn test_static_frame_reuses_grid() {
        let (mut scheduler, mut grid) = setup();
        let entities = enemies(20);

        let first = scheduler.rebuild_if_needed(&mut grid, &entities, 0.0);
        assert!(first.rebuilt());

        grid.reset_counters();
        let second = scheduler.rebuild_if_needed(&mut grid, &entities, 16.0);
        assert_eq!(second, RebuildDecision::Reused);
        assert_eq!(grid.counters().cell_clears, 0);
        assert_eq!(grid.counters().insertions, 0);
    }

    #[test]
    fn test_move_within_cell_is_reuse() {
        let (mut scheduler, mut grid) = setup();
        let mut entities = enemies(5);
        entities[0].pos = Vec2::new(10.0, 10.0);
        scheduler.rebuild_if_needed(&mut grid, &entities, 0.0);

        entities[0].pos = Vec2::new(12.0, 11.0);
        assert_eq!(
            scheduler.rebuild_if_needed(&mut grid, &entities, 16.0),
            RebuildDecision::Reused
        );
    }

    #[test]
    fn test_cell_crossing_forces_rebuild() {
        let (mut scheduler, mut grid) = setup();
        let mut entities = enemies(5);
        scheduler.rebuild_if_needed(&mut grid, &entities, 0.0);

        entities[3].pos.x += grid.cell_size() * 2.0;
        assert_eq!(
            scheduler.rebuild_if_needed(&mut grid, &entities, 16.0),
            RebuildDecision::Rebuilt(RebuildReason::EntityMoved)
        );
    }

    #[test]
    fn test_death_and_count_change_force_rebuild() {
        let (mut scheduler, mut grid) = setup();
        let mut entities = enemies(5);
        scheduler.rebuild_if_needed(&mut grid, &entities, 0.0);

        entities[1].is_dead = true;
        assert_eq!(
            scheduler.rebuild_if_needed(&mut grid, &entities, 16.0),
            RebuildDecision::Rebuilt(RebuildReason::EntityDied)
        );
        // Dead entities are left out of the grid
        assert!(grid.occupied().all(|(_, cell)| cell.iter().all(|e| e.slot != 1)));

        entities.remove(1);
        assert_eq!(
            scheduler.rebuild_if_needed(&mut grid, &entities, 32.0),
            RebuildDecision::Rebuilt(RebuildReason::CountChanged)
        );
    }

    #[test]
    fn test_unpurged_corpse_forces_rebuild() {
        let (mut scheduler, mut grid) = setup();
        let mut entities = enemies(5);
        entities[2].is_dead = true;
        scheduler.rebuild_if_needed(&mut grid, &entities, 0.0);

        assert_eq!(
            scheduler.rebuild_if_needed(&mut grid, &entities, 16.0),
            RebuildDecision::Rebuilt(RebuildReason::EntityDied)
        );
    }

    #[test]
    fn test_cell_size_follows_live_count() {
        let (mut scheduler, mut grid) = setup();
        let mut entities = enemies(140);
        for e in &mut entities[40..] {
            e.is_dead = true;
        }
        scheduler.rebuild_if_needed(&mut grid, &entities, 0.0);
        assert_eq!(grid.cell_size(), 160.0);

        // Live count drops to 20, within the count delta
        entities.truncate(100);
        for e in &mut entities[..20] {
            e.is_dead = true;
        }
        scheduler.rebuild_if_needed(&mut grid, &entities, 16.0);
        assert_eq!(grid.cell_size(), 160.0);
        for e in &mut entities {
            e.is_dead = false;
        }
        // Back to 100 live: a swing of 80 from the last sample
        scheduler.rebuild_if_needed(&mut grid, &entities, 32.0);
        assert_eq!(grid.cell_size(), 120.0);
    }

    #[test]
    fn test_tracks_detects_reordered_slice() {
        let (mut scheduler, mut grid) = setup();
        let mut entities = enemies(4);
        assert!(!scheduler.tracks(&entities));

        scheduler.rebuild_if_needed(&mut grid, &entities, 0.0);
        assert!(scheduler.tracks(&entities));

        entities.swap(1, 3);
        assert!(!scheduler.tracks(&entities));
        entities.pop();
        assert!(!scheduler.tracks(&entities));
    }

    #[test]
    fn test_slot_identity_swap_forces_rebuild() {
        let (mut scheduler, mut grid) = setup();
        let mut entities = enemies(3);
        for e in &mut entities {
            e.pos = Vec2::new(5.0, 5.0);
        }
        scheduler.rebuild_if_needed(&mut grid, &entities, 0.0);

        entities.swap(0, 2);
        assert_eq!(
            scheduler.rebuild_if_needed(&mut grid, &entities, 16.0),
            RebuildDecision::Rebuilt(RebuildReason::EntityMoved)
        );
    }

    #[test]
    fn test_resample_waits_for_interval() {
        let (mut scheduler, mut grid) = setup();
        let mut entities = enemies(250);
        scheduler.rebuild_if_needed(&mut grid, &entities, 0.0);
        assert_eq!(grid.cell_size(), 100.0);

        // Shrinks by 30: under the count delta, before the interval
        entities.truncate(220);
        scheduler.rebuild_if_needed(&mut grid, &entities, 100.0);
        assert_eq!(grid.cell_size(), 100.0);

        // Down to 180: a swing of 70 from the last sample
        entities.truncate(180);
        assert_eq!(
            scheduler.rebuild_if_needed(&mut grid, &entities, 120.0),
            RebuildDecision::Rebuilt(RebuildReason::CellSizeChanged)
        );
        assert_eq!(grid.cell_size(), 120.0);

        entities.truncate(170);
        scheduler.rebuild_if_needed(&mut grid, &entities, 200.0);
        assert_eq!(grid.cell_size(), 120.0);
        entities.truncate(40);
        scheduler.rebuild_if_needed(&mut grid, &entities, 200.0);
        assert_eq!(grid.cell_size(), 160.0);
    }

    #[test]
    fn test_resample_after_interval() {
        let (mut scheduler, mut grid) = setup();
        let mut entities = enemies(120);
        scheduler.rebuild_if_needed(&mut grid, &entities, 0.0);
        assert_eq!(grid.cell_size(), 120.0);

        entities.truncate(90);
        scheduler.rebuild_if_needed(&mut grid, &entities, 100.0);
        assert_eq!(grid.cell_size(), 120.0);
        scheduler.rebuild_if_needed(&mut grid, &entities, 260.0);
        assert_eq!(grid.cell_size(), 140.0);
    }
}
