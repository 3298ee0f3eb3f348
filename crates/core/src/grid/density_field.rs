//! Incrementally maintained local-occupancy density
//!
//! Tracks, per tile, the fraction of addressable neighbors within a Chebyshev
//! radius that are occupied. The population collaborator reports every
//! occupancy change through [`DensityField::apply_delta`] (O(R²) per call);
//! consumers read a snapshot that is synchronized from the live grid once per
//! tick. Recomputing the aggregate from scratch is O(rows·cols·R²) and only
//! happens at initialization or when the radius changes.
//!
//! Four parallel grids: `counts` (occupied neighbors), `totals` (in-bounds
//! neighbors, fixed per radius, smaller at edges and corners), `live`
//! (clamped fraction, updated incrementally), `snapshot` (the externally read
//! copy). The dirty set names tiles where `live` and `snapshot` diverge.

use rustc_hash::FxHashSet;

use crate::core_types::OccupancyGrid;

/// Local crowding fraction per tile, in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct DensityField {
    counts: Vec<i32>,
    totals: Vec<u32>,
    live: Vec<f32>,
    snapshot: Vec<f32>,
    dirty: FxHashSet<usize>,
    synced_once: bool,
    rows: usize,
    cols: usize,
    radius: usize,
}

impl DensityField {
    /// Create an empty field for the given shape and neighborhood radius.
    #[must_use]
    pub fn new(rows: usize, cols: usize, radius: usize) -> Self {
        let tiles = rows * cols;
        Self {
            counts: vec![0; tiles],
            totals: build_totals(rows, cols, radius),
            live: vec![0.0; tiles],
            snapshot: vec![0.0; tiles],
            dirty: FxHashSet::default(),
            synced_once: false,
            rows,
            cols,
            radius,
        }
    }

    /// Grid dimensions as `(rows, cols)`.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Current neighborhood radius.
    #[must_use]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Addressable-neighbor count for a tile; zero out of range.
    ///
    /// Fixed for a given radius, smaller near edges and corners.
    #[must_use]
    pub fn total_neighbors(&self, row: usize, col: usize) -> u32 {
        self.index_of(row, col).map_or(0, |idx| self.totals[idx])
    }

    /// Number of tiles whose live value has not been synchronized yet.
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Apply one occupancy change at `(row, col)`: `+1` for a spawn, `-1`
    /// for a death or departure. Adjusts the occupied-neighbor count of
    /// every tile within the radius (the changed tile itself excluded) and
    /// marks tiles dirty where the live fraction moved. O(R²), independent
    /// of grid size. No-op out of range.
    pub fn apply_delta(&mut self, row: usize, col: usize, delta: i32) {
        if self.index_of(row, col).is_none() || delta == 0 {
            return;
        }

        let radius = self.radius as isize;
        for dr in -radius..=radius {
            for dc in -radius..=radius {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let nr = row as isize + dr;
                let nc = col as isize + dc;
                if nr < 0 || nc < 0 || nr >= self.rows as isize || nc >= self.cols as isize {
                    continue;
                }
                let idx = nr as usize * self.cols + nc as usize;

                self.counts[idx] += delta;
                let total = self.totals[idx];
                let recomputed = if total > 0 {
                    (self.counts[idx] as f32 / total as f32).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                if (recomputed - self.live[idx]).abs() > f32::EPSILON {
                    self.live[idx] = recomputed;
                    self.dirty.insert(idx);
                }
            }
        }
    }

    /// Copy the live grid into the snapshot consumers read.
    ///
    /// Without `force` only dirty tiles are copied, O(|dirty|); with `force`
    /// the whole grid is copied unconditionally (initialization, radius
    /// change). The dirty set is empty afterwards either way.
    pub fn sync(&mut self, force: bool) {
        if force {
            self.snapshot.copy_from_slice(&self.live);
        } else {
            for &idx in &self.dirty {
                self.snapshot[idx] = self.live[idx];
            }
        }
        self.dirty.clear();
        self.synced_once = true;
    }

    /// Full rebuild from a presence grid, used at initialization or when the
    /// radius configuration changes. Rebuilds `totals` for the new radius,
    /// zeroes the aggregate, replays every occupied tile as a `+1` delta,
    /// then force-syncs.
    pub fn recalculate_from_occupancy(&mut self, occupancy: &OccupancyGrid, radius: usize) {
        self.radius = radius;
        self.totals = build_totals(self.rows, self.cols, radius);
        self.counts.fill(0);
        self.live.fill(0.0);
        self.dirty.clear();

        for row in 0..self.rows {
            for col in 0..self.cols {
                if occupancy.is_occupied(row, col) {
                    self.apply_delta(row, col, 1);
                }
            }
        }

        self.sync(true);
    }

    /// Density at a tile; zero out of range.
    ///
    /// Reads the synchronized snapshot. Before the first sync the live
    /// fraction is served directly so early readers see a sane ratio.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.index_of(row, col).map_or(0.0, |idx| {
            if self.synced_once {
                self.snapshot[idx]
            } else {
                self.live[idx]
            }
        })
    }

    /// Borrow the snapshot as a flat row-major slice.
    #[must_use]
    pub fn snapshot_slice(&self) -> &[f32] {
        &self.snapshot
    }

    #[inline]
    fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then_some(row * self.cols + col)
    }
}

/// Addressable-neighbor counts for every tile at the given radius.
///
/// A tile's total is the number of in-bounds tiles within Chebyshev distance
/// `radius`, itself excluded; the in-bounds window collapses at edges.
fn build_totals(rows: usize, cols: usize, radius: usize) -> Vec<u32> {
    let mut totals = vec![0; rows * cols];
    for row in 0..rows {
        let row_span = window_span(row, radius, rows);
        for col in 0..cols {
            let col_span = window_span(col, radius, cols);
            totals[row * cols + col] = (row_span * col_span - 1) as u32;
        }
    }
    totals
}

/// Number of in-bounds positions within `radius` of `at` on an axis of
/// length `len`, including `at` itself.
fn window_span(at: usize, radius: usize, len: usize) -> usize {
    let lo = at.saturating_sub(radius);
    let hi = (at + radius).min(len.saturating_sub(1));
    hi - lo + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_shrink_at_edges_and_corners() {
        let field = DensityField::new(8, 8, 1);
        assert_eq!(field.total_neighbors(4, 4), 8, "interior");
        assert_eq!(field.total_neighbors(0, 0), 3, "corner");
        assert_eq!(field.total_neighbors(0, 4), 5, "edge");

        let wide = DensityField::new(8, 8, 2);
        assert_eq!(wide.total_neighbors(4, 4), 24);
        assert_eq!(wide.total_neighbors(0, 0), 8);
    }

    #[test]
    fn delta_raises_density_of_neighbors_not_self() {
        let mut field = DensityField::new(8, 8, 1);
        field.apply_delta(4, 4, 1);
        field.sync(false);

        assert_eq!(field.get(4, 4), 0.0, "a tile's own occupant is excluded");
        assert!((field.get(4, 5) - 1.0 / 8.0).abs() < 1e-6);
        assert!((field.get(3, 3) - 1.0 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn delta_touches_nothing_outside_the_radius() {
        let mut field = DensityField::new(10, 10, 2);
        field.apply_delta(5, 5, 1);
        field.sync(false);

        for row in 0..10_usize {
            for col in 0..10_usize {
                let chebyshev = row.abs_diff(5).max(col.abs_diff(5));
                if chebyshev > 2 {
                    assert_eq!(field.get(row, col), 0.0, "tile ({row},{col}) touched");
                }
            }
        }
    }

    #[test]
    fn totals_survive_deltas_unchanged() {
        let mut field = DensityField::new(6, 6, 1);
        let before: Vec<u32> = (0..6)
            .flat_map(|r| (0..6).map(move |c| (r, c)))
            .map(|(r, c)| field.total_neighbors(r, c))
            .collect();

        field.apply_delta(2, 2, 1);
        field.apply_delta(3, 3, 1);
        field.apply_delta(2, 2, -1);

        let after: Vec<u32> = (0..6)
            .flat_map(|r| (0..6).map(move |c| (r, c)))
            .map(|(r, c)| field.total_neighbors(r, c))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn sync_drains_the_dirty_set_and_converges() {
        let mut field = DensityField::new(8, 8, 1);
        field.apply_delta(4, 4, 1);
        assert!(field.dirty_count() > 0);

        field.sync(false);
        assert_eq!(field.dirty_count(), 0);

        // A second sync with nothing dirty is a no-op
        field.sync(false);
        assert_eq!(field.dirty_count(), 0);
        assert!((field.get(4, 5) - 1.0 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn deltas_after_sync_stay_invisible_until_the_next_sync() {
        let mut field = DensityField::new(8, 8, 1);
        field.apply_delta(4, 4, 1);
        field.sync(false);

        field.apply_delta(4, 6, 1);
        assert_eq!(field.get(4, 7), 0.0, "snapshot must lag the live grid");

        field.sync(false);
        assert!((field.get(4, 7) - 1.0 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn live_ratio_is_served_before_the_first_sync() {
        let mut field = DensityField::new(8, 8, 1);
        field.apply_delta(4, 4, 1);
        assert!(
            (field.get(4, 5) - 1.0 / 8.0).abs() < 1e-6,
            "pre-sync readers get the direct ratio"
        );
    }

    #[test]
    fn spawn_then_death_cancels_out() {
        let mut field = DensityField::new(8, 8, 2);
        field.apply_delta(3, 3, 1);
        field.apply_delta(3, 3, -1);
        field.sync(false);

        for row in 0..8 {
            for col in 0..8 {
                assert_eq!(field.get(row, col), 0.0);
            }
        }
    }

    #[test]
    fn rebuild_matches_replayed_deltas() {
        let mut occupancy = OccupancyGrid::new(6, 6);
        occupancy.set(1, 1, true);
        occupancy.set(1, 2, true);
        occupancy.set(4, 4, true);

        let mut rebuilt = DensityField::new(6, 6, 1);
        rebuilt.recalculate_from_occupancy(&occupancy, 1);

        let mut incremental = DensityField::new(6, 6, 1);
        incremental.apply_delta(1, 1, 1);
        incremental.apply_delta(1, 2, 1);
        incremental.apply_delta(4, 4, 1);
        incremental.sync(false);

        for row in 0..6 {
            for col in 0..6 {
                assert!(
                    (rebuilt.get(row, col) - incremental.get(row, col)).abs() < 1e-6,
                    "mismatch at ({row},{col})"
                );
            }
        }
    }

    #[test]
    fn radius_change_rebuilds_totals() {
        let occupancy = OccupancyGrid::new(8, 8);
        let mut field = DensityField::new(8, 8, 1);
        assert_eq!(field.total_neighbors(4, 4), 8);

        field.recalculate_from_occupancy(&occupancy, 3);
        assert_eq!(field.radius(), 3);
        assert_eq!(field.total_neighbors(4, 4), 48);
        assert_eq!(field.dirty_count(), 0);
    }

    #[test]
    fn density_never_leaves_the_unit_interval() {
        let mut field = DensityField::new(4, 4, 1);
        // Pile far more occupants onto one tile than neighbors exist
        for _ in 0..20 {
            field.apply_delta(1, 1, 1);
        }
        // And drive another negative
        for _ in 0..5 {
            field.apply_delta(3, 3, -1);
        }
        field.sync(false);

        for row in 0..4 {
            for col in 0..4 {
                let d = field.get(row, col);
                assert!((0.0..=1.0).contains(&d), "density {d} escaped [0, 1]");
            }
        }
    }

    #[test]
    fn out_of_range_delta_is_a_no_op() {
        let mut field = DensityField::new(4, 4, 1);
        field.apply_delta(9, 9, 1);
        field.sync(false);
        assert_eq!(field.dirty_count(), 0);
        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(field.get(row, col), 0.0);
            }
        }
    }
}
