//! Event modifier resolution
//!
//! Translates the active-event list plus a tile coordinate into a
//! [`ModifierFold`] of regeneration and drain modifiers. Resolution is pure
//! apart from a per-pass memo cache keyed by event kind, so repeated lookups
//! across tiles of the same pass cost O(1) after the first.
//!
//! Both collaborator seams are pluggable trait objects: an [`AreaPredicate`]
//! decides whether an event touches a tile (rectangle containment by
//! default), and an [`EffectSource`] maps an [`EventKind`] to its static
//! effect entry. A failing collaborator is logged once, deduplicated by
//! message, and treated as inert for the rest of the run; one bad event must
//! never abort the grid pass it failed in.

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::warn;

use crate::core_types::{EnvironmentalEvent, EventEffect, EventKind, StandardEffects};

/// Failure raised by an event collaborator.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    /// The effect source could not produce an entry for an event kind.
    #[error("effect lookup failed for {kind:?}: {reason}")]
    EffectLookup {
        /// Kind whose lookup failed.
        kind: EventKind,
        /// Collaborator-supplied failure description.
        reason: String,
    },
    /// An area predicate failed to evaluate.
    #[error("area predicate failed: {reason}")]
    Predicate {
        /// Collaborator-supplied failure description.
        reason: String,
    },
}

/// Maps an event kind to its static effect entry.
pub trait EffectSource {
    /// Effect entry for `kind`, or `None` when the kind has no configured
    /// effect.
    ///
    /// # Errors
    ///
    /// Collaborators return [`CollaboratorError`] when their configuration is
    /// broken; the resolver logs the failure once and treats the kind as
    /// having no effect for the remainder of the run.
    fn effect_for(&self, kind: EventKind) -> Result<Option<EventEffect>, CollaboratorError>;
}

impl EffectSource for StandardEffects {
    fn effect_for(&self, kind: EventKind) -> Result<Option<EventEffect>, CollaboratorError> {
        Ok(Some(StandardEffects::entry(kind)))
    }
}

/// Decides whether an event applies to a tile.
pub trait AreaPredicate {
    /// Whether `event` affects the tile at `(row, col)`.
    ///
    /// # Errors
    ///
    /// Collaborators return [`CollaboratorError`] on evaluation failure; the
    /// resolver logs it once and skips the event without aborting the fold.
    fn is_affecting(
        &self,
        event: &EnvironmentalEvent,
        row: usize,
        col: usize,
    ) -> Result<bool, CollaboratorError>;
}

/// Default predicate: axis-aligned rectangle containment of the tile.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectContainment;

impl AreaPredicate for RectContainment {
    fn is_affecting(
        &self,
        event: &EnvironmentalEvent,
        row: usize,
        col: usize,
    ) -> Result<bool, CollaboratorError> {
        Ok(event.area.contains(row, col))
    }
}

/// Accumulated regeneration modifiers for one tile in one tick.
///
/// Simultaneously active events compose multiplicatively on the scale term
/// and additively on the two flat terms. Each event's scale contribution is
/// clamped at its own floor before multiplying; the combined product is
/// deliberately not re-clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifierFold {
    /// Multiplier on the regeneration term; starts at 1.
    pub regen_multiplier: f32,
    /// Flat regeneration added; starts at 0.
    pub regen_add: f32,
    /// Flat drain subtracted; starts at 0.
    pub drain_add: f32,
}

impl Default for ModifierFold {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl ModifierFold {
    /// Fold with no applicable events.
    pub const NEUTRAL: Self = Self {
        regen_multiplier: 1.0,
        regen_add: 0.0,
        drain_add: 0.0,
    };

    fn apply(&mut self, effect: &EventEffect, strength: f32) {
        let scale = effect.regen_scale;
        self.regen_multiplier *= (scale.base + scale.change * strength).max(scale.min);
        self.regen_add += effect.regen_add * strength;
        self.drain_add += effect.drain_add * strength;
    }
}

/// Resolves active events into per-tile modifier folds.
///
/// Owns no field state. The effect memo cache lives for one grid pass
/// ([`Self::begin_pass`] clears it) so stale effect configuration is never
/// retained across ticks; the warn-once message set persists for the run.
#[derive(Debug, Default)]
pub struct EventModifierResolver {
    cache: FxHashMap<EventKind, Option<EventEffect>>,
    logged: FxHashSet<String>,
}

impl EventModifierResolver {
    /// Create a resolver with empty cache and log state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the per-pass effect memo cache. Call once at the start of every
    /// full-grid pass.
    pub fn begin_pass(&mut self) {
        self.cache.clear();
    }

    /// Fold the modifiers of every event affecting `(row, col)`.
    ///
    /// Per event: evaluate the area predicate (a failure skips the event),
    /// scale the declared strength by `strength_multiplier` (non-finite or
    /// zero skips), resolve the kind's effect through `source` (memoized per
    /// pass; a failure is cached as no-effect), then fold the effect in.
    pub fn resolve(
        &mut self,
        events: &[EnvironmentalEvent],
        row: usize,
        col: usize,
        strength_multiplier: f32,
        predicate: &dyn AreaPredicate,
        source: &dyn EffectSource,
    ) -> ModifierFold {
        let mut fold = ModifierFold::NEUTRAL;

        for event in events {
            match predicate.is_affecting(event, row, col) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    self.warn_once(format!("skipping event {:?}: {err}", event.kind));
                    continue;
                }
            }

            let strength = event.strength * strength_multiplier;
            if !strength.is_finite() || strength == 0.0 {
                continue;
            }

            if let Some(effect) = self.cached_effect(event.kind, source) {
                fold.apply(&effect, strength);
            }
        }

        fold
    }

    /// Per-pass memoized effect lookup. A failed lookup is cached as `None`
    /// so the broken source is not retried for every tile of the pass.
    fn cached_effect(&mut self, kind: EventKind, source: &dyn EffectSource) -> Option<EventEffect> {
        if let Some(cached) = self.cache.get(&kind) {
            return *cached;
        }
        let resolved = match source.effect_for(kind) {
            Ok(effect) => effect,
            Err(err) => {
                self.warn_once(format!("treating {kind:?} as inert: {err}"));
                None
            }
        };
        self.cache.insert(kind, resolved);
        resolved
    }

    fn warn_once(&mut self, message: String) {
        if !self.logged.contains(&message) {
            warn!("{message}");
            self.logged.insert(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{AffectedArea, RegenScale};
    use std::cell::Cell;

    fn event(kind: EventKind, strength: f32) -> EnvironmentalEvent {
        EnvironmentalEvent::new(
            kind,
            strength,
            10,
            AffectedArea {
                x: 0,
                y: 0,
                width: 8,
                height: 8,
            },
        )
    }

    fn scale_only(base: f32, change: f32, min: f32) -> EventEffect {
        EventEffect {
            regen_scale: RegenScale { base, change, min },
            regen_add: 0.0,
            drain_add: 0.0,
        }
    }

    struct TableSource(Vec<(EventKind, EventEffect)>);

    impl EffectSource for TableSource {
        fn effect_for(&self, kind: EventKind) -> Result<Option<EventEffect>, CollaboratorError> {
            Ok(self.0.iter().find(|(k, _)| *k == kind).map(|(_, e)| *e))
        }
    }

    #[test]
    fn neutral_fold_when_no_events_apply() {
        let mut resolver = EventModifierResolver::new();
        let fold = resolver.resolve(&[], 0, 0, 1.0, &RectContainment, &StandardEffects);
        assert_eq!(fold, ModifierFold::NEUTRAL);
    }

    #[test]
    fn two_scales_compose_multiplicatively() {
        let source = TableSource(vec![
            (EventKind::Flood, scale_only(1.0, 0.2, 0.0)),
            (EventKind::Drought, scale_only(1.0, -0.1, 0.0)),
        ]);
        let events = [event(EventKind::Flood, 1.0), event(EventKind::Drought, 1.0)];

        let mut resolver = EventModifierResolver::new();
        resolver.begin_pass();
        let fold = resolver.resolve(&events, 2, 2, 1.0, &RectContainment, &source);

        assert!(
            (fold.regen_multiplier - 1.2 * 0.9).abs() < 1e-6,
            "expected 1.08, got {}",
            fold.regen_multiplier
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let events = [
            event(EventKind::Heatwave, 0.7),
            event(EventKind::Flood, 0.3),
        ];
        let mut resolver = EventModifierResolver::new();
        resolver.begin_pass();
        let first = resolver.resolve(&events, 1, 1, 1.0, &RectContainment, &StandardEffects);
        let second = resolver.resolve(&events, 1, 1, 1.0, &RectContainment, &StandardEffects);
        assert_eq!(first, second);
    }

    #[test]
    fn add_terms_accumulate_and_scale_with_strength() {
        let effect = EventEffect {
            regen_scale: RegenScale {
                base: 1.0,
                change: 0.0,
                min: 0.0,
            },
            regen_add: 0.01,
            drain_add: 0.04,
        };
        let source = TableSource(vec![(EventKind::Flood, effect)]);
        let events = [event(EventKind::Flood, 0.5), event(EventKind::Flood, 1.0)];

        let mut resolver = EventModifierResolver::new();
        resolver.begin_pass();
        let fold = resolver.resolve(&events, 0, 0, 1.0, &RectContainment, &source);

        assert!((fold.regen_add - 0.015).abs() < 1e-6);
        assert!((fold.drain_add - 0.06).abs() < 1e-6);
    }

    #[test]
    fn per_event_floor_applies_before_the_product() {
        // One event clamped at its floor, one boosting. Clamping the combined
        // product instead would give a different answer; the per-event order
        // is normative.
        let source = TableSource(vec![
            (EventKind::Drought, scale_only(1.0, -2.0, 0.25)),
            (EventKind::Flood, scale_only(1.0, 1.0, 0.0)),
        ]);
        let events = [event(EventKind::Drought, 1.0), event(EventKind::Flood, 1.0)];

        let mut resolver = EventModifierResolver::new();
        resolver.begin_pass();
        let fold = resolver.resolve(&events, 0, 0, 1.0, &RectContainment, &source);

        // max(0.25, 1 - 2) * (1 + 1) = 0.5
        assert!((fold.regen_multiplier - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_or_non_finite_strength_skips_the_event() {
        let mut resolver = EventModifierResolver::new();
        resolver.begin_pass();

        let zero = [event(EventKind::Flood, 0.0)];
        let fold = resolver.resolve(&zero, 0, 0, 1.0, &RectContainment, &StandardEffects);
        assert_eq!(fold, ModifierFold::NEUTRAL);

        let inf = [event(EventKind::Flood, f32::INFINITY)];
        let fold = resolver.resolve(&inf, 0, 0, 1.0, &RectContainment, &StandardEffects);
        assert_eq!(fold, ModifierFold::NEUTRAL);
    }

    #[test]
    fn tiles_outside_the_area_are_untouched() {
        let mut resolver = EventModifierResolver::new();
        resolver.begin_pass();
        let events = [event(EventKind::Drought, 1.0)];
        let fold = resolver.resolve(&events, 20, 20, 1.0, &RectContainment, &StandardEffects);
        assert_eq!(fold, ModifierFold::NEUTRAL);
    }

    struct FailFor {
        broken: EventKind,
        calls: Cell<usize>,
    }

    impl EffectSource for FailFor {
        fn effect_for(&self, kind: EventKind) -> Result<Option<EventEffect>, CollaboratorError> {
            self.calls.set(self.calls.get() + 1);
            if kind == self.broken {
                Err(CollaboratorError::EffectLookup {
                    kind,
                    reason: "table corrupted".into(),
                })
            } else {
                Ok(Some(scale_only(1.0, 0.2, 0.0)))
            }
        }
    }

    #[test]
    fn failing_kind_is_inert_while_others_still_apply() {
        let source = FailFor {
            broken: EventKind::Heatwave,
            calls: Cell::new(0),
        };
        let events = [
            event(EventKind::Heatwave, 1.0),
            event(EventKind::Flood, 1.0),
        ];

        let mut resolver = EventModifierResolver::new();
        resolver.begin_pass();
        let fold = resolver.resolve(&events, 0, 0, 1.0, &RectContainment, &source);

        // Flood's full effect applies despite the heatwave lookup failing
        assert!((fold.regen_multiplier - 1.2).abs() < 1e-6);
    }

    #[test]
    fn failed_lookup_is_cached_for_the_pass() {
        let source = FailFor {
            broken: EventKind::Heatwave,
            calls: Cell::new(0),
        };
        let events = [event(EventKind::Heatwave, 1.0)];

        let mut resolver = EventModifierResolver::new();
        resolver.begin_pass();
        for row in 0..4 {
            for col in 0..4 {
                resolver.resolve(&events, row, col, 1.0, &RectContainment, &source);
            }
        }
        assert_eq!(
            source.calls.get(),
            1,
            "broken source must not be retried per tile"
        );
    }

    struct FailingPredicate;

    impl AreaPredicate for FailingPredicate {
        fn is_affecting(
            &self,
            _event: &EnvironmentalEvent,
            _row: usize,
            _col: usize,
        ) -> Result<bool, CollaboratorError> {
            Err(CollaboratorError::Predicate {
                reason: "geometry service unavailable".into(),
            })
        }
    }

    #[test]
    fn predicate_failure_skips_without_aborting_the_fold() {
        let events = [event(EventKind::Flood, 1.0)];
        let mut resolver = EventModifierResolver::new();
        resolver.begin_pass();
        let fold = resolver.resolve(&events, 0, 0, 1.0, &FailingPredicate, &StandardEffects);
        assert_eq!(fold, ModifierFold::NEUTRAL);
    }
}
