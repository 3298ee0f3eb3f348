//! Static per-kind event effects
//!
//! An [`EventEffect`] describes how one event kind perturbs tile
//! regeneration: a strength-scaled multiplier on the regrowth term plus flat
//! regeneration and drain adjustments. Effects are resolved through an
//! injected source so balancing tables live outside the engine;
//! [`StandardEffects`] is the built-in table.

use serde::{Deserialize, Serialize};

use super::event::EventKind;

/// Strength-scaled multiplier applied to the regeneration term.
///
/// At strength `s` the contribution is `max(min, base + change * s)`. The
/// clamp applies per event, before multipliers from other events compose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegenScale {
    /// Multiplier at zero strength.
    pub base: f32,
    /// Slope per unit of scaled strength; negative values suppress regrowth.
    pub change: f32,
    /// Floor for this event's contribution.
    pub min: f32,
}

/// How one event kind perturbs tile regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventEffect {
    /// Multiplicative scale on the regeneration term.
    pub regen_scale: RegenScale,
    /// Flat regeneration added per tick, scaled by strength.
    pub regen_add: f32,
    /// Flat drain subtracted per tick, scaled by strength.
    pub drain_add: f32,
}

/// Built-in effect table for the four standard event kinds.
///
/// Constants are balancing data, tuned for grids with a max tile energy of a
/// few units; collaborators with their own balance sheets supply their own
/// effect source instead.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StandardEffects;

impl StandardEffects {
    /// Effect entry for `kind`.
    #[must_use]
    pub fn entry(kind: EventKind) -> EventEffect {
        match kind {
            EventKind::Flood => EventEffect {
                regen_scale: RegenScale {
                    base: 1.0,
                    change: 0.6,
                    min: 0.0,
                },
                regen_add: 0.002,
                drain_add: 0.015,
            },
            EventKind::Drought => EventEffect {
                regen_scale: RegenScale {
                    base: 1.0,
                    change: -0.8,
                    min: 0.05,
                },
                regen_add: 0.0,
                drain_add: 0.02,
            },
            EventKind::Heatwave => EventEffect {
                regen_scale: RegenScale {
                    base: 1.0,
                    change: -0.3,
                    min: 0.1,
                },
                regen_add: 0.0,
                drain_add: 0.03,
            },
            EventKind::Coldwave => EventEffect {
                regen_scale: RegenScale {
                    base: 1.0,
                    change: -0.6,
                    min: 0.05,
                },
                regen_add: 0.0,
                drain_add: 0.005,
            },
        }
    }
}
