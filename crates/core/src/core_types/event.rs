//! Transient environmental events
//!
//! Events are produced by an external generator and consumed here: the field
//! engine only reads the active list each tick to perturb regeneration.
//! Every event names a closed [`EventKind`], a declared strength in `[0, 1]`,
//! a remaining duration in ticks, and an axis-aligned affected rectangle.

use serde::{Deserialize, Serialize};

/// Closed set of environmental event types.
///
/// The effect each kind has on tile regeneration is not stored here; it is
/// resolved through an injected effect source so that balancing data can be
/// swapped without touching the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Standing water: boosts regrowth but drains stored energy.
    Flood,
    /// Extended dry spell: suppresses regrowth and drains tiles.
    Drought,
    /// Short, intense heat: drain-dominated.
    Heatwave,
    /// Cold snap: regrowth slows, little direct drain.
    Coldwave,
}

/// Axis-aligned rectangle of tiles an event applies to.
///
/// `x`/`y` are the column/row of the top-left corner and may be negative when
/// an event straddles the grid edge; containment is evaluated per tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedArea {
    /// Leftmost affected column.
    pub x: i32,
    /// Topmost affected row.
    pub y: i32,
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
}

impl AffectedArea {
    /// Rectangle containment test for a tile coordinate.
    ///
    /// Half-open on both axes: `x <= col < x + width`, `y <= row < y + height`.
    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        let (row, col) = (row as i64, col as i64);
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        col >= x
            && col < x + i64::from(self.width)
            && row >= y
            && row < y + i64::from(self.height)
    }
}

/// One active environmental event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalEvent {
    /// Which kind of event this is.
    pub kind: EventKind,
    /// Declared strength in `[0, 1]`; scaled by the global strength
    /// multiplier before effect resolution.
    pub strength: f32,
    /// Remaining lifetime in ticks. Aged by the event generator, carried
    /// here so consumers can display or reason about it.
    pub duration_ticks: u32,
    /// Tiles the event applies to.
    pub area: AffectedArea,
}

impl EnvironmentalEvent {
    /// Create an event covering the given rectangle.
    #[must_use]
    pub fn new(kind: EventKind, strength: f32, duration_ticks: u32, area: AffectedArea) -> Self {
        Self {
            kind,
            strength,
            duration_ticks,
            area,
        }
    }
}
