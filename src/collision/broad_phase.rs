//! Broad phase: candidate pairs from the spatial grid
//!
//! Each occupied cell pairs its own occupants, then pairs them against a
//! fixed set of four forward neighbors. Together with their mirror images
//! the offsets cover all eight neighbors, so every unordered pair of
//! entities in the same or adjacent cells is produced exactly once with no
//! visited-pair set.
//!
//! Completeness holds as long as no two overlapping circles are more than
//! one cell apart, i.e. the cell size is at least the largest diameter.

use super::grid::{CellCoord, CellEntry, SpatialGrid};
use super::rules::CollisionRules;

/// Forward-only neighbor offsets: east, south, south-east, south-west
pub const FORWARD_NEIGHBORS: [CellCoord; 4] = [(1, 0), (0, 1), (1, 1), (-1, 1)];

/// Work done by one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCounts {
    pub cells_processed: usize,
    /// Pairs that passed the type filter
    pub pairs_checked: usize,
}

/// Visit every type-compatible candidate pair in deterministic order:
/// cell order, then same-cell pairs, then forward-neighbor pairs.
pub fn for_each_candidate_pair<F>(
    grid: &SpatialGrid,
    rules: &CollisionRules,
    mut callback: F,
) -> ScanCounts
where
    F: FnMut(CellEntry, CellEntry),
{
    let mut counts = ScanCounts::default();
    let mut visit = |a: CellEntry, b: CellEntry, counts: &mut ScanCounts| {
        if rules.can_collide(a.kind, b.kind) {
            counts.pairs_checked += 1;
            callback(a, b);
        }
    };

    for ((cx, cy), cell) in grid.occupied() {
        counts.cells_processed += 1;

        for (i, &a) in cell.iter().enumerate() {
            for &b in &cell[i + 1..] {
                visit(a, b, &mut counts);
            }
        }

        for (dx, dy) in FORWARD_NEIGHBORS {
            let (Some(nx), Some(ny)) = (cx.checked_add(dx), cy.checked_add(dy)) else {
                continue;
            };
            let Some(neighbor) = grid.cell((nx, ny)) else {
                continue;
            };
            for &a in cell {
                for &b in neighbor {
                    visit(a, b, &mut counts);
                }
            }
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::entity::{Enemy, Entity, EntityType};
    use crate::collision::grid::PoolLimits;
    use crate::collision::narrow_phase::is_colliding;
    use glam::Vec2;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn all_enemies() -> CollisionRules {
        CollisionRules::empty().allow(EntityType::Enemy, EntityType::Enemy)
    }

    fn build(entities: &[Entity], cell_size: f32) -> SpatialGrid {
        let mut grid = SpatialGrid::new(cell_size, PoolLimits::default());
        for (slot, e) in entities.iter().enumerate() {
            grid.insert(slot, e.entity_type(), e.pos);
        }
        grid
    }

    fn ordered(a: usize, b: usize) -> (usize, usize) {
        if a < b { (a, b) } else { (b, a) }
    }

    #[test]
    fn test_all_eight_neighbors_reached_once() {
        // One entity in the middle cell, one in each surrounding cell
        let mut entities = vec![Entity::enemy(0, Vec2::new(150.0, 150.0), 5.0, Enemy::new(1.0, 1.0))];
        let mut id = 1;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let pos = Vec2::new(150.0 + dx as f32 * 100.0, 150.0 + dy as f32 * 100.0);
                entities.push(Entity::enemy(id, pos, 5.0, Enemy::new(1.0, 1.0)));
                id += 1;
            }
        }
        let grid = build(&entities, 100.0);

        let mut with_center = Vec::new();
        for_each_candidate_pair(&grid, &all_enemies(), |a, b| {
            if a.slot == 0 || b.slot == 0 {
                with_center.push(a.slot + b.slot);
            }
        });
        with_center.sort_unstable();
        assert_eq!(with_center, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_type_filter_runs_before_callback() {
        let entities = vec![
            Entity::enemy(0, Vec2::new(1.0, 1.0), 5.0, Enemy::new(1.0, 1.0)),
            Entity::xp_orb(1, Vec2::new(2.0, 2.0), 5.0, 1.0),
            Entity::enemy(2, Vec2::new(3.0, 3.0), 5.0, Enemy::new(1.0, 1.0)),
        ];
        let grid = build(&entities, 100.0);
        let mut pairs = Vec::new();
        let counts = for_each_candidate_pair(&grid, &all_enemies(), |a, b| pairs.push((a.slot, b.slot)));
        assert_eq!(pairs, vec![(0, 2)]);
        assert_eq!(counts.pairs_checked, 1);
        assert_eq!(counts.cells_processed, 1);
    }

    #[test]
    fn test_far_cells_are_not_paired() {
        let entities = vec![
            Entity::enemy(0, Vec2::new(10.0, 10.0), 5.0, Enemy::new(1.0, 1.0)),
            Entity::enemy(1, Vec2::new(210.0, 10.0), 5.0, Enemy::new(1.0, 1.0)),
        ];
        let grid = build(&entities, 100.0);
        let counts = for_each_candidate_pair(&grid, &all_enemies(), |_, _| panic!("no pair expected"));
        assert_eq!(counts.cells_processed, 2);
    }

    #[test]
    fn test_scan_order_is_deterministic() {
        let entities: Vec<_> = (0..40)
            .map(|i| {
                let pos = Vec2::new((i * 31 % 300) as f32, (i * 17 % 300) as f32);
                Entity::enemy(i, pos, 20.0, Enemy::new(1.0, 1.0))
            })
            .collect();
        let run = || {
            let grid = build(&entities, 50.0);
            let mut seq = Vec::new();
            for_each_candidate_pair(&grid, &all_enemies(), |a, b| seq.push((a.slot, b.slot)));
            seq
        };
        assert_eq!(run(), run());
    }

    proptest! {
        #[test]
        fn prop_overlapping_pairs_found_exactly_once(
            points in prop::collection::vec((-300.0f32..300.0, -300.0f32..300.0, 1.0f32..25.0), 0..60)
        ) {
            let entities: Vec<_> = points
                .iter()
                .enumerate()
                .map(|(i, &(x, y, r))| Entity::enemy(i as u32, Vec2::new(x, y), r, Enemy::new(1.0, 1.0)))
                .collect();
            let grid = build(&entities, 50.0);

            let mut seen = HashSet::new();
            for_each_candidate_pair(&grid, &all_enemies(), |a, b| {
                if is_colliding(&entities[a.slot], &entities[b.slot]) {
                    assert!(seen.insert(ordered(a.slot, b.slot)), "pair visited twice");
                }
            });

            let mut expected = HashSet::new();
            for i in 0..entities.len() {
                for j in (i + 1)..entities.len() {
                    if is_colliding(&entities[i], &entities[j]) {
                        expected.insert((i, j));
                    }
                }
            }
            prop_assert_eq!(seen, expected);
        }
    }
}
