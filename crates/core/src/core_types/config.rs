//! Grid configuration and per-tick tunables
//!
//! [`GridConfig`] fixes the shape-level parameters the fields are constructed
//! with; [`FieldTunables`] carries the per-tick rates and multipliers that UI
//! sliders or scenario scripts adjust while the simulation runs. Tunables are
//! sanitized at the engine boundary: a non-finite or negative value falls
//! back to zero rather than propagating into the grid pass.

use serde::{Deserialize, Serialize};

/// Shape-level configuration for the environmental fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridConfig {
    /// Grid height in tiles.
    pub rows: usize,
    /// Grid width in tiles.
    pub cols: usize,
    /// Ceiling for stored energy per tile.
    pub max_tile_energy: f32,
    /// Energy seeded into every tile at construction.
    pub initial_energy: f32,
    /// Chebyshev neighborhood radius for the density field.
    pub density_radius: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 64,
            cols: 64,
            max_tile_energy: 5.0,
            initial_energy: 2.5,
            density_radius: 2,
        }
    }
}

impl GridConfig {
    /// Sanitized copy: finite non-negative energies, max floor of zero.
    ///
    /// Zero-sized grids are permitted; every field operation on them is a
    /// no-op rather than an error.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let max_tile_energy = non_negative(self.max_tile_energy);
        Self {
            rows: self.rows,
            cols: self.cols,
            max_tile_energy,
            initial_energy: non_negative(self.initial_energy).min(max_tile_energy),
            density_radius: self.density_radius,
        }
    }
}

/// Per-tick rates and multipliers supplied by the hosting simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldTunables {
    /// Logistic regrowth rate toward the tile energy ceiling.
    pub regen_rate: f32,
    /// Fraction of the neighbor-mean gap exchanged per tick.
    pub diffusion_rate: f32,
    /// Global scalar applied to every event's declared strength.
    pub event_strength_multiplier: f32,
    /// Scalar applied to tile density before the harvest crowding penalty.
    pub density_effect_multiplier: f32,
    /// How strongly local density suppresses regrowth.
    pub regen_density_penalty: f32,
    /// How strongly local density suppresses harvesting.
    pub consumption_density_penalty: f32,
}

impl Default for FieldTunables {
    fn default() -> Self {
        Self {
            regen_rate: 0.01,
            diffusion_rate: 0.05,
            event_strength_multiplier: 1.0,
            density_effect_multiplier: 1.0,
            regen_density_penalty: 0.5,
            consumption_density_penalty: 0.6,
        }
    }
}

impl FieldTunables {
    /// Sanitized copy with every rate forced finite and non-negative.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            regen_rate: non_negative(self.regen_rate),
            diffusion_rate: non_negative(self.diffusion_rate),
            event_strength_multiplier: non_negative(self.event_strength_multiplier),
            density_effect_multiplier: non_negative(self.density_effect_multiplier),
            regen_density_penalty: non_negative(self.regen_density_penalty),
            consumption_density_penalty: non_negative(self.consumption_density_penalty),
        }
    }
}

/// Collapse NaN, infinities, and negatives to zero.
#[inline]
pub(crate) fn non_negative(v: f32) -> f32 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}
