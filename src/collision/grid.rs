//! Uniform spatial hash
//!
//! Maps an encoded (cell_x, cell_y) key to the entities occupying that cell.
//! Cell lists are recycled through a bounded pool so steady-state frames do
//! not allocate. The grid stores slots into the host's entity slice plus the
//! entity type tag, never the entities themselves.

use std::collections::hash_map::Entry;

use glam::Vec2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::entity::EntityType;

/// Integer cell coordinate
pub type CellCoord = (i32, i32);

/// Packed cell coordinate: x in the high 32 bits, y in the low 32 bits
pub type CellKey = i64;

#[inline]
pub fn encode_cell((cx, cy): CellCoord) -> CellKey {
    ((cx as i64) << 32) | (cy as u32 as i64)
}

#[inline]
pub fn decode_cell(key: CellKey) -> CellCoord {
    ((key >> 32) as i32, key as i32)
}

/// One occupant of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellEntry {
    /// Index into the entity slice the grid was built from
    pub slot: usize,
    pub kind: EntityType,
}

/// Bounds on how many spare cell lists are kept between rebuilds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolLimits {
    pub min: usize,
    pub max: usize,
    /// Spare lists kept per occupied cell
    pub factor: f32,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            min: 32,
            max: 512,
            factor: 1.5,
        }
    }
}

impl PoolLimits {
    /// Pool capacity for a grid that had `occupied` cells
    pub fn capacity_for(&self, occupied: usize) -> usize {
        let scaled = (occupied as f32 * self.factor) as usize;
        scaled.min(self.max).max(self.min)
    }
}

/// Work counters, reset by the owner at the start of each frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridCounters {
    pub cell_clears: usize,
    pub insertions: usize,
}

/// Spatial hash grid with pooled cell lists
pub struct SpatialGrid {
    cell_size: f32,
    inv_cell_size: f32,
    cells: FxHashMap<CellKey, Vec<CellEntry>>,
    /// Occupied keys in first-insertion order; scans follow this order
    order: Vec<CellKey>,
    pool: Vec<Vec<CellEntry>>,
    pool_limits: PoolLimits,
    counters: GridCounters,
}

impl SpatialGrid {
    pub fn new(cell_size: f32, pool_limits: PoolLimits) -> Self {
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: FxHashMap::default(),
            order: Vec::new(),
            pool: Vec::with_capacity(pool_limits.min),
            pool_limits,
            counters: GridCounters::default(),
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Change the cell size. Existing contents become meaningless; the
    /// caller must clear and repopulate.
    pub fn set_cell_size(&mut self, cell_size: f32) {
        self.cell_size = cell_size;
        self.inv_cell_size = 1.0 / cell_size;
    }

    #[inline]
    pub fn cell_of(&self, pos: Vec2) -> CellCoord {
        (
            (pos.x * self.inv_cell_size).floor() as i32,
            (pos.y * self.inv_cell_size).floor() as i32,
        )
    }

    /// Empty every cell, returning its list to the pool
    pub fn clear(&mut self) {
        let keep = self.pool_limits.capacity_for(self.order.len());
        for key in self.order.drain(..) {
            if let Some(mut list) = self.cells.remove(&key) {
                list.clear();
                self.pool.push(list);
                self.counters.cell_clears += 1;
            }
        }
        self.pool.truncate(keep);
    }

    /// Insert an occupant at `pos`, returning the cell it landed in
    pub fn insert(&mut self, slot: usize, kind: EntityType, pos: Vec2) -> CellCoord {
        let coord = self.cell_of(pos);
        let key = encode_cell(coord);
        let entry = CellEntry { slot, kind };
        match self.cells.entry(key) {
            Entry::Occupied(cell) => cell.into_mut().push(entry),
            Entry::Vacant(cell) => {
                let mut list = self.pool.pop().unwrap_or_default();
                list.push(entry);
                cell.insert(list);
                self.order.push(key);
            }
        }
        self.counters.insertions += 1;
        coord
    }

    /// Occupants of one cell, if any
    pub fn cell(&self, coord: CellCoord) -> Option<&[CellEntry]> {
        self.cells.get(&encode_cell(coord)).map(Vec::as_slice)
    }

    /// Occupied cells in deterministic (first-insertion) order
    pub fn occupied(&self) -> impl Iterator<Item = (CellCoord, &[CellEntry])> + '_ {
        self.order.iter().filter_map(move |key| {
            self.cells
                .get(key)
                .map(|list| (decode_cell(*key), list.as_slice()))
        })
    }

    /// Collect slots in every cell overlapping the square around `pos`.
    ///
    /// Work is bounded by the number of occupied cells: when the square
    /// spans more cells than are occupied, the occupied list is filtered
    /// instead of probing every coordinate.
    pub fn query_radius_into(&self, pos: Vec2, radius: f32, buf: &mut Vec<usize>) {
        buf.clear();
        if !pos.is_finite() || !radius.is_finite() || radius < 0.0 {
            return;
        }
        let (cx, cy) = self.cell_of(pos);
        // Cell coordinates are i32, so a reach beyond u32::MAX covers them all
        let r = ((radius * self.inv_cell_size).ceil() as i64).min(u32::MAX as i64);
        let (min_x, max_x) = (cx as i64 - r, cx as i64 + r);
        let (min_y, max_y) = (cy as i64 - r, cy as i64 + r);

        let span = (2 * r + 1) as u64;
        if span.saturating_mul(span) > self.order.len() as u64 {
            for key in &self.order {
                let (x, y) = decode_cell(*key);
                let inside = (min_x..=max_x).contains(&(x as i64))
                    && (min_y..=max_y).contains(&(y as i64));
                if let Some(list) = self.cells.get(key).filter(|_| inside) {
                    buf.extend(list.iter().map(|e| e.slot));
                }
            }
            return;
        }

        for ix in min_x..=max_x {
            for iy in min_y..=max_y {
                let (Ok(x), Ok(y)) = (i32::try_from(ix), i32::try_from(iy)) else {
                    continue;
                };
                if let Some(list) = self.cells.get(&encode_cell((x, y))) {
                    buf.extend(list.iter().map(|e| e.slot));
                }
            }
        }
    }

    #[inline]
    pub fn occupied_cells(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn pooled(&self) -> usize {
        self.pool.len()
    }

    #[inline]
    pub fn counters(&self) -> GridCounters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = GridCounters::default();
    }
}
