//! Ecosim Environmental Field Engine
//!
//! Per-tick environmental core for a cellular-automaton ecosystem: organisms
//! move, compete, and reproduce on a 2-D tile grid whose tiles carry a
//! harvestable energy resource, perturbed by transient environmental events.
//!
//! This crate owns three cooperating components:
//! - Tile energy grid with double-buffered regeneration, diffusion, and
//!   harvesting ([`EnergyField`])
//! - Incrementally maintained local population-density field ([`DensityField`])
//! - Transient-event modifier resolution with failure isolation
//!   ([`EventModifierResolver`])
//!
//! The [`EnvironmentEngine`] composes them into one synchronous full-grid
//! pass per simulation tick. Rendering, genome/neural decision logic, combat
//! and reproduction rules, and event *generation* are external collaborators.

// Plain data: events, effect tables, tunables, occupancy
pub mod core_types;

// Field containers and the two stateful grids
pub mod grid;

// Event modifier resolution and collaborator contracts
pub mod events;

// Per-tick orchestration
pub mod simulation;

// Re-export core types
pub use core_types::{AffectedArea, EnvironmentalEvent, EventKind};
pub use core_types::{EventEffect, RegenScale, StandardEffects};
pub use core_types::{FieldTunables, GridConfig, OccupancyGrid};

// Re-export field types
pub use grid::{DensityField, EnergyField, FieldData, Harvester, ObstacleMask};

// Re-export event resolution
pub use events::{
    AreaPredicate, CollaboratorError, EffectSource, EventModifierResolver, ModifierFold,
    RectContainment,
};

// Re-export orchestration
pub use simulation::EnvironmentEngine;
