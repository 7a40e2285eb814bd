//! Frame telemetry for an optional performance overlay
//!
//! Purely observational: nothing in the engine reads these back.

/// Counters for one `update_spatial_grid` + `check_collisions` frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionStats {
    pub cells_processed: usize,
    /// Candidate pairs that passed the type filter
    pub pairs_checked: usize,
    /// Overlapping pairs that reached a resolution outcome
    pub pairs_resolved: usize,
    /// Pairs whose resolution returned an error
    pub faults: usize,
    pub rebuilt: bool,
    pub cell_clears: usize,
    pub insertions: usize,
    pub cell_size: f32,
    pub occupied_cells: usize,
    pub pooled_cells: usize,
    /// Wall time spent scanning and resolving
    pub scan_ms: f64,
}

/// Number of frames kept for averages (one second at 60 FPS)
pub const STATS_WINDOW: usize = 60;

/// Rolling window of recent frame stats
#[derive(Debug, Clone)]
pub struct StatsWindow {
    frames: [CollisionStats; STATS_WINDOW],
    index: usize,
    filled: usize,
}

impl Default for StatsWindow {
    fn default() -> Self {
        Self {
            frames: [CollisionStats::default(); STATS_WINDOW],
            index: 0,
            filled: 0,
        }
    }
}

impl StatsWindow {
    pub fn push(&mut self, stats: CollisionStats) {
        self.frames[self.index] = stats;
        self.index = (self.index + 1) % STATS_WINDOW;
        self.filled = (self.filled + 1).min(STATS_WINDOW);
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    fn recent(&self) -> impl Iterator<Item = &CollisionStats> {
        self.frames.iter().take(self.filled)
    }

    fn mean(&self, f: impl Fn(&CollisionStats) -> f64) -> f64 {
        if self.filled == 0 {
            return 0.0;
        }
        self.recent().map(f).sum::<f64>() / self.filled as f64
    }

    pub fn avg_pairs_checked(&self) -> f64 {
        self.mean(|s| s.pairs_checked as f64)
    }

    pub fn avg_pairs_resolved(&self) -> f64 {
        self.mean(|s| s.pairs_resolved as f64)
    }

    pub fn avg_scan_ms(&self) -> f64 {
        self.mean(|s| s.scan_ms)
    }

    /// Fraction of frames that rebuilt the grid
    pub fn rebuild_ratio(&self) -> f64 {
        self.mean(|s| if s.rebuilt { 1.0 } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_averages() {
        let mut window = StatsWindow::default();
        assert_eq!(window.avg_pairs_checked(), 0.0);

        window.push(CollisionStats {
            pairs_checked: 10,
            rebuilt: true,
            ..Default::default()
        });
        window.push(CollisionStats {
            pairs_checked: 20,
            ..Default::default()
        });
        assert_eq!(window.len(), 2);
        assert_eq!(window.avg_pairs_checked(), 15.0);
        assert_eq!(window.rebuild_ratio(), 0.5);
    }

    #[test]
    fn test_window_wraps() {
        let mut window = StatsWindow::default();
        for i in 0..(STATS_WINDOW + 10) {
            window.push(CollisionStats {
                pairs_resolved: i,
                ..Default::default()
            });
        }
        assert_eq!(window.len(), STATS_WINDOW);
        // Frames 10..70 remain
        let expected = (10..STATS_WINDOW + 10).sum::<usize>() as f64 / STATS_WINDOW as f64;
        assert_eq!(window.avg_pairs_resolved(), expected);
    }
}
