//! Double-buffered tile energy grid
//!
//! Owns the `current`/`next` energy buffers and the full O(rows·cols)
//! regeneration pass that runs once per tick: diffusion with cardinal
//! neighbors, logistic regrowth toward the tile ceiling damped by local
//! density, and event modifiers folded in per tile. Harvesting deducts from
//! the current buffer immediately.
//!
//! Invariants: every observable energy value sits in `[0, max_tile_energy]`;
//! obstacle tiles carry zero on both buffers and never act as diffusion
//! sources for their neighbors.

use crate::core_types::config::non_negative;
use crate::core_types::{EnvironmentalEvent, FieldTunables, GridConfig};
use crate::events::{AreaPredicate, EffectSource, EventModifierResolver};

use super::fields::FieldData;

/// Floor and ceiling for the organism-supplied base forage rate.
const FORAGE_RATE_MIN: f32 = 0.05;
const FORAGE_RATE_MAX: f32 = 1.0;

/// Harvest-side view of an organism.
///
/// The population collaborator owns organism state; the energy field only
/// needs the foraging parameters and an energy-credit hook bounded by the
/// organism's own ceiling.
pub trait Harvester {
    /// Base fraction of a tile the organism tries to harvest per tick.
    fn forage_rate(&self) -> f32;
    /// Lower bound on the per-tick harvest cap.
    fn harvest_cap_min(&self) -> f32;
    /// Upper bound on the per-tick harvest cap.
    fn harvest_cap_max(&self) -> f32;
    /// Current stored energy.
    fn energy(&self) -> f32;
    /// Storage ceiling.
    fn max_energy(&self) -> f32;
    /// Credit harvested energy. Callers never credit past `max_energy`.
    fn credit_energy(&mut self, amount: f32);
}

/// Obstacle lookup supplied by the terrain collaborator.
pub trait ObstacleMask {
    /// Whether the tile at `(row, col)` is blocked terrain.
    fn is_obstacle(&self, row: usize, col: usize) -> bool;
}

impl<F: Fn(usize, usize) -> bool> ObstacleMask for F {
    fn is_obstacle(&self, row: usize, col: usize) -> bool {
        self(row, col)
    }
}

/// Double-buffered per-tile energy resource.
#[derive(Debug, Clone)]
pub struct EnergyField {
    /// Authoritative buffer; all reads go here.
    energy: FieldData,
    /// Scratch buffer written during a pass, swapped in afterwards.
    energy_back: FieldData,
    max_tile_energy: f32,
    rows: usize,
    cols: usize,
}

impl EnergyField {
    /// Create a field seeded with the configured initial energy.
    #[must_use]
    pub fn new(config: &GridConfig) -> Self {
        let config = config.sanitized();
        Self {
            energy: FieldData::with_value(config.rows, config.cols, config.initial_energy),
            energy_back: FieldData::new(config.rows, config.cols),
            max_tile_energy: config.max_tile_energy,
            rows: config.rows,
            cols: config.cols,
        }
    }

    /// Grid dimensions as `(rows, cols)`.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Per-tile energy ceiling.
    #[must_use]
    pub fn max_tile_energy(&self) -> f32 {
        self.max_tile_energy
    }

    /// Energy at a tile; zero out of range.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.energy.get(row, col)
    }

    /// Store energy at a tile, clamped to `[0, max_tile_energy]`; no-op out
    /// of range or for non-finite values.
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.energy
            .set(row, col, non_negative(value).min(self.max_tile_energy));
    }

    /// Sum of the current buffer.
    #[must_use]
    pub fn total_energy(&self) -> f32 {
        self.energy.as_slice().iter().sum()
    }

    /// Borrow the current buffer as a flat row-major slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        self.energy.as_slice()
    }

    /// Harvest from a tile on behalf of an organism.
    ///
    /// The harvest rate is the organism's forage rate clamped to
    /// `[0.05, 1]`, reduced by the crowding penalty
    /// `max(0, 1 - consumption_density_penalty * clamp(density * density_effect_multiplier, 0, 1))`,
    /// then clamped to the organism's cap bounds. The harvested amount
    /// (capped by what the tile holds) is deducted from the tile and
    /// credited to the organism up to its own ceiling.
    ///
    /// Returns the amount removed from the tile; zero out of range.
    pub fn consume(
        &mut self,
        organism: &mut dyn Harvester,
        row: usize,
        col: usize,
        density: f32,
        tunables: &FieldTunables,
    ) -> f32 {
        if self.energy.index_of(row, col).is_none() {
            return 0.0;
        }
        let tunables = tunables.sanitized();

        let rate = non_negative(organism.forage_rate()).clamp(FORAGE_RATE_MIN, FORAGE_RATE_MAX);
        let cap_min = non_negative(organism.harvest_cap_min());
        let cap_max = non_negative(organism.harvest_cap_max()).max(cap_min);

        let crowding = (non_negative(density) * tunables.density_effect_multiplier).clamp(0.0, 1.0);
        let penalty = (1.0 - tunables.consumption_density_penalty * crowding).max(0.0);
        let cap = (rate * penalty).clamp(cap_min, cap_max);

        let available = self.energy.get(row, col);
        let harvested = cap.min(available);
        if harvested <= 0.0 {
            return 0.0;
        }

        self.energy.set(row, col, available - harvested);

        let headroom = (organism.max_energy() - organism.energy()).max(0.0);
        let credited = harvested.min(headroom);
        if credited > 0.0 {
            organism.credit_energy(credited);
        }

        harvested
    }

    /// One full regeneration pass over the grid.
    ///
    /// Per tile: obstacles are forced to zero on both buffers and skipped;
    /// otherwise the next value is the current energy plus diffusion toward
    /// the mean of non-obstacle cardinal neighbors plus the event-modified
    /// logistic regrowth term, clamped to `[0, max_tile_energy]`. The
    /// buffers are swapped at the end and the scratch buffer zeroed.
    ///
    /// `density` is the density field's snapshot for this tick, row-major.
    #[allow(clippy::too_many_arguments)]
    pub fn regenerate(
        &mut self,
        events: &[EnvironmentalEvent],
        tunables: &FieldTunables,
        density: &[f32],
        resolver: &mut EventModifierResolver,
        predicate: &dyn AreaPredicate,
        source: &dyn EffectSource,
        obstacles: &dyn ObstacleMask,
    ) {
        let t = tunables.sanitized();
        let max = self.max_tile_energy;
        resolver.begin_pass();

        for row in 0..self.rows {
            for col in 0..self.cols {
                if obstacles.is_obstacle(row, col) {
                    // Obstacles store nothing on either buffer
                    self.energy.set(row, col, 0.0);
                    self.energy_back.set(row, col, 0.0);
                    continue;
                }

                let current = self.energy.get(row, col);
                let mut value = current;

                // Diffusion against non-obstacle cardinal neighbors only; an
                // obstacle neighbor reduces the partner count instead of
                // contributing a zero
                if t.diffusion_rate > 0.0 {
                    let mut neighbor_sum = 0.0;
                    let mut neighbor_count = 0u32;
                    for (nr, nc) in cardinal_neighbors(row, col, self.rows, self.cols) {
                        if !obstacles.is_obstacle(nr, nc) {
                            neighbor_sum += self.energy.get(nr, nc);
                            neighbor_count += 1;
                        }
                    }
                    if neighbor_count > 0 {
                        let mean = neighbor_sum / neighbor_count as f32;
                        value += t.diffusion_rate * (mean - current);
                    }
                }

                let tile_density =
                    non_negative(density.get(row * self.cols + col).copied().unwrap_or(0.0))
                        .min(1.0);
                let fold = resolver.resolve(
                    events,
                    row,
                    col,
                    t.event_strength_multiplier,
                    predicate,
                    source,
                );

                let headroom = if max > 0.0 { (max - current) / max } else { 0.0 };
                let regen = t.regen_rate
                    * (1.0 - t.regen_density_penalty * tile_density)
                    * fold.regen_multiplier
                    * headroom
                    + fold.regen_add
                    - fold.drain_add;

                // A collaborator feeding non-finite effect data must not
                // poison the buffer; keep the last good value instead
                let next = (value + regen).clamp(0.0, max);
                self.energy_back
                    .set(row, col, if next.is_finite() { next } else { current });
            }
        }

        std::mem::swap(&mut self.energy, &mut self.energy_back);
        self.energy_back.fill(0.0);
    }

    /// Zero a tile on both buffers, e.g. when an obstacle is placed or an
    /// organism dies on it. With `preserve_current` the still-rendered
    /// current value is kept and only the scratch buffer is zeroed.
    pub fn clear_tile(&mut self, row: usize, col: usize, preserve_current: bool) {
        if !preserve_current {
            self.energy.set(row, col, 0.0);
        }
        self.energy_back.set(row, col, 0.0);
    }
}

/// In-bounds cardinal neighbors of a tile.
fn cardinal_neighbors(
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let up = row.checked_sub(1).map(|r| (r, col));
    let down = (row + 1 < rows).then_some((row + 1, col));
    let left = col.checked_sub(1).map(|c| (row, c));
    let right = (col + 1 < cols).then_some((row, col + 1));
    [up, down, left, right].into_iter().flatten()
}
