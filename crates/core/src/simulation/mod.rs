//! Per-tick environment orchestration
//!
//! [`EnvironmentEngine`] composes the energy field, the density field, and
//! the event modifier resolver into the single synchronous pass the hosting
//! simulation runs every tick: synchronize the density snapshot, resolve
//! event modifiers per tile, regenerate energy, swap buffers. Density deltas
//! keep arriving between passes as the population collaborator reports
//! births, deaths, and moves; a delta landing after this tick's sync is
//! visible next tick, never later.

use tracing::{debug, info};

use crate::core_types::{
    EnvironmentalEvent, FieldTunables, GridConfig, OccupancyGrid, StandardEffects,
};
use crate::events::{AreaPredicate, EffectSource, EventModifierResolver, RectContainment};
use crate::grid::{DensityField, EnergyField, Harvester, ObstacleMask};

/// The per-tick environmental field engine.
///
/// Constructed once per grid configuration and kept for the simulation's
/// lifetime; buffers are mutated in place each tick and only reallocated on
/// an explicit radius change or occupancy rebuild.
pub struct EnvironmentEngine {
    energy: EnergyField,
    density: DensityField,
    resolver: EventModifierResolver,
    effects: Box<dyn EffectSource>,
    predicate: Box<dyn AreaPredicate>,
    tick: u64,
}

impl EnvironmentEngine {
    /// Create an engine with the built-in effect table and rectangle
    /// containment predicate.
    #[must_use]
    pub fn new(config: &GridConfig) -> Self {
        Self::with_collaborators(config, Box::new(StandardEffects), Box::new(RectContainment))
    }

    /// Create an engine with injected event collaborators.
    #[must_use]
    pub fn with_collaborators(
        config: &GridConfig,
        effects: Box<dyn EffectSource>,
        predicate: Box<dyn AreaPredicate>,
    ) -> Self {
        let config = config.sanitized();
        info!(
            "Environment engine initialized: {}x{} grid, max tile energy {:.2}, density radius {}",
            config.rows, config.cols, config.max_tile_energy, config.density_radius
        );
        Self {
            energy: EnergyField::new(&config),
            density: DensityField::new(config.rows, config.cols, config.density_radius),
            resolver: EventModifierResolver::new(),
            effects,
            predicate,
            tick: 0,
        }
    }

    /// Run the environment pass for one tick and return the density
    /// snapshot the rest of the simulation reads until the next tick.
    ///
    /// Ordering within the tick is fixed: the density snapshot is
    /// synchronized first, then the energy regeneration pass reads it.
    /// Occupancy deltas applied after this call are visible one tick later.
    pub fn prepare_for_tick(
        &mut self,
        events: &[EnvironmentalEvent],
        tunables: &FieldTunables,
        obstacles: &dyn ObstacleMask,
    ) -> &[f32] {
        let tunables = tunables.sanitized();

        self.density.sync(false);
        self.energy.regenerate(
            events,
            &tunables,
            self.density.snapshot_slice(),
            &mut self.resolver,
            self.predicate.as_ref(),
            self.effects.as_ref(),
            obstacles,
        );
        self.tick += 1;

        debug!(
            "Environment pass complete: tick={}, active_events={}, total_energy={:.3}",
            self.tick,
            events.len(),
            self.energy.total_energy()
        );

        self.density.snapshot_slice()
    }

    /// Harvest from a tile on behalf of an organism, using the tile's
    /// synchronized density for the crowding penalty.
    pub fn consume(
        &mut self,
        organism: &mut dyn Harvester,
        row: usize,
        col: usize,
        tunables: &FieldTunables,
    ) -> f32 {
        let density = self.density.get(row, col);
        self.energy.consume(organism, row, col, density, tunables)
    }

    /// Report one occupancy change (+1 spawn, -1 death/departure).
    pub fn apply_density_delta(&mut self, row: usize, col: usize, delta: i32) {
        self.density.apply_delta(row, col, delta);
    }

    /// Rebuild the density aggregate from a presence grid, optionally with a
    /// new radius. Used at startup and when the radius tunable changes.
    pub fn recalculate_density(&mut self, occupancy: &OccupancyGrid, radius: usize) {
        info!("Density rebuild: radius={radius}");
        self.density.recalculate_from_occupancy(occupancy, radius);
    }

    /// Energy at a tile; zero out of range.
    #[must_use]
    pub fn energy_at(&self, row: usize, col: usize) -> f32 {
        self.energy.get(row, col)
    }

    /// Store energy at a tile, clamped to the ceiling; no-op out of range.
    pub fn set_energy_at(&mut self, row: usize, col: usize, value: f32) {
        self.energy.set(row, col, value);
    }

    /// Density at a tile; zero out of range.
    #[must_use]
    pub fn density_at(&self, row: usize, col: usize) -> f32 {
        self.density.get(row, col)
    }

    /// Zero a tile's energy buffers, e.g. when an obstacle is placed.
    pub fn clear_tile(&mut self, row: usize, col: usize, preserve_current: bool) {
        self.energy.clear_tile(row, col, preserve_current);
    }

    /// Grid dimensions as `(rows, cols)`.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        self.energy.dimensions()
    }

    /// Ticks completed so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Sum of all tile energy on the current buffer.
    #[must_use]
    pub fn total_energy(&self) -> f32 {
        self.energy.total_energy()
    }

    /// Direct access to the energy field.
    #[must_use]
    pub fn energy_field(&self) -> &EnergyField {
        &self.energy
    }

    /// Direct access to the density field.
    #[must_use]
    pub fn density_field(&self) -> &DensityField {
        &self.density
    }
}
