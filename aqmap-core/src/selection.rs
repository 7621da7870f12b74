//! Which prediction the detail panel shows, and whether the panel is open

use serde::Serialize;

use crate::cache::PredictionCache;
use crate::coordinate::CoordinateKey;

/// Snapshot of the detail panel selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub active_key: Option<CoordinateKey>,
    pub panel_visible: bool,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            active_key: None,
            panel_visible: true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SelectionController {
    state: SelectionState,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `key` and open the panel.
    ///
    /// Only keys with a cache entry can be selected; otherwise the previous
    /// selection is kept and `false` is returned.
    pub fn activate(&mut self, key: CoordinateKey, cache: &PredictionCache) -> bool {
        if !cache.contains(&key) {
            tracing::debug!(%key, "ignoring selection of uncached key");
            return false;
        }
        self.state.active_key = Some(key);
        self.state.panel_visible = true;
        true
    }

    /// Flip panel visibility; the active key is untouched
    pub fn toggle_panel(&mut self) {
        self.state.panel_visible = !self.state.panel_visible;
    }

    /// Hide the panel; returns whether it was visible
    pub fn dismiss(&mut self) -> bool {
        std::mem::replace(&mut self.state.panel_visible, false)
    }

    /// Drop the active key, keeping panel visibility as is
    pub fn clear(&mut self) {
        self.state.active_key = None;
    }

    /// Snapshot of the selection
    pub fn current(&self) -> SelectionState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Coordinate;

    #[test]
    fn test_activate_requires_cache_entry() {
        let mut cache = PredictionCache::new();
        let mut selection = SelectionController::new();
        let known = Coordinate::new(19.1, 72.9);
        cache.lookup(known);

        assert!(selection.activate(known.key(), &cache));
        assert_eq!(selection.current().active_key, Some(known.key()));

        let unknown = Coordinate::new(1.0, 2.0).key();
        assert!(!selection.activate(unknown, &cache));
        assert_eq!(selection.current().active_key, Some(known.key()));
    }

    #[test]
    fn test_activate_opens_panel() {
        let mut cache = PredictionCache::new();
        let mut selection = SelectionController::new();
        let c = Coordinate::new(19.1, 72.9);
        cache.lookup(c);

        selection.dismiss();
        assert!(!selection.current().panel_visible);

        selection.activate(c.key(), &cache);
        assert!(selection.current().panel_visible);
    }

    #[test]
    fn test_toggle_keeps_active_key() {
        let mut cache = PredictionCache::new();
        let mut selection = SelectionController::new();
        let c = Coordinate::new(19.1, 72.9);
        cache.lookup(c);
        selection.activate(c.key(), &cache);

        selection.toggle_panel();
        assert_eq!(
            selection.current(),
            SelectionState {
                active_key: Some(c.key()),
                panel_visible: false,
            }
        );
        selection.toggle_panel();
        assert!(selection.current().panel_visible);
    }

    #[test]
    fn test_clear_preserves_visibility() {
        let mut cache = PredictionCache::new();
        let mut selection = SelectionController::new();
        let c = Coordinate::new(19.1, 72.9);
        cache.lookup(c);
        selection.activate(c.key(), &cache);
        selection.toggle_panel();

        selection.clear();
        assert_eq!(
            selection.current(),
            SelectionState {
                active_key: None,
                panel_visible: false,
            }
        );
    }

    #[test]
    fn test_dismiss_reports_previous_visibility() {
        let mut selection = SelectionController::new();
        assert!(selection.dismiss());
        assert!(!selection.dismiss());
    }
}
