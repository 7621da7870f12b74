//! Effects - side effects declared by the reducer
//!
//! The reducer never performs I/O. It returns effects alongside the state
//! change flag and the controller turns each effect into a spawned task.

use crate::cache::Epoch;
use crate::coordinate::{Coordinate, CoordinateKey};

/// Side effects that can be triggered by actions
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Call the prediction service for `coordinate`; the result must be
    /// reported with the same `key` and `epoch`.
    FetchPrediction {
        coordinate: Coordinate,
        key: CoordinateKey,
        epoch: Epoch,
    },
    /// Geocode `query` after the search debounce
    SearchPlaces { query: String },
    /// Drop any search still waiting or running
    CancelSearch,
}

/// Result of dispatching one action.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DispatchResult {
    /// Whether the state was modified by this action.
    pub changed: bool,
    /// Effects to be processed after dispatch.
    pub effects: Vec<Effect>,
}

impl DispatchResult {
    #[inline]
    pub fn unchanged() -> Self {
        Self::default()
    }

    #[inline]
    pub fn changed() -> Self {
        Self {
            changed: true,
            effects: vec![],
        }
    }

    /// A single effect without a state change.
    #[inline]
    pub fn effect(effect: Effect) -> Self {
        Self {
            changed: false,
            effects: vec![effect],
        }
    }

    #[inline]
    pub fn changed_with(effect: Effect) -> Self {
        Self {
            changed: true,
            effects: vec![effect],
        }
    }

    /// Append another effect.
    #[inline]
    pub fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[inline]
    pub fn mark_changed(mut self) -> Self {
        self.changed = true;
        self
    }

    #[inline]
    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_result_builders() {
        let r = DispatchResult::unchanged();
        assert!(!r.changed);
        assert!(!r.has_effects());

        let r = DispatchResult::changed();
        assert!(r.changed);
        assert!(!r.has_effects());

        let r = DispatchResult::effect(Effect::CancelSearch);
        assert!(!r.changed);
        assert_eq!(r.effects, vec![Effect::CancelSearch]);

        let r = DispatchResult::changed_with(Effect::CancelSearch);
        assert!(r.changed);
        assert!(r.has_effects());
    }

    #[test]
    fn test_mark_changed_keeps_effects() {
        let r = DispatchResult::effect(Effect::SearchPlaces {
            query: "Bandra".into(),
        })
        .mark_changed();
        assert!(r.changed);
        assert_eq!(r.effects.len(), 1);
    }
}
