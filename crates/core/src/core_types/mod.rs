//! Core data types shared across the field engine
//!
//! Plain-data definitions with no field state: environmental events and their
//! static effect tables, per-tick tunables, grid configuration, and the
//! boolean occupancy grid used for full density rebuilds.

pub mod config;
pub mod effect;
pub mod event;
pub mod occupancy;

pub use config::{FieldTunables, GridConfig};
pub use effect::{EventEffect, RegenScale, StandardEffects};
pub use event::{AffectedArea, EnvironmentalEvent, EventKind};
pub use occupancy::OccupancyGrid;
