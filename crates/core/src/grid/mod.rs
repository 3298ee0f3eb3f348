//! Field containers and the two stateful grids
//!
//! [`FieldData`] is the flat row-major container both fields build on.
//! [`EnergyField`] owns the double-buffered tile energy grid;
//! [`DensityField`] maintains the incrementally updated local-occupancy
//! fraction that other subsystems read once per tick.

mod density_field;
mod energy_field;
mod fields;

pub use density_field::DensityField;
pub use energy_field::{EnergyField, Harvester, ObstacleMask};
pub use fields::FieldData;
