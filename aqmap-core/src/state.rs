//! Dashboard state - single source of truth
//!
//! Only the reducer mutates [`DashboardState`]. Presentation reads the
//! [`ViewModel`] projection and nothing else.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::cache::PredictionCache;
use crate::client::Place;
use crate::config::DashboardConfig;
use crate::coordinate::{Coordinate, CoordinateKey, MapBounds};
use crate::markers::{Marker, MarkerStore};
use crate::prediction::{PredictionEntry, PredictionError};
use crate::selection::{SelectionController, SelectionState};

/// Location search box contents and results
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Place>,
    /// Trimmed query whose results are still expected, if any
    pub awaiting: Option<String>,
}

/// Most recent failed lookup, kept for display
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LookupFailure {
    pub key: CoordinateKey,
    pub error: PredictionError,
}

#[derive(Debug)]
pub struct DashboardState {
    pub markers: MarkerStore,
    pub cache: PredictionCache,
    pub selection: SelectionController,
    /// Keys whose settled Ready entry should become the active selection
    pub pending_activation: HashSet<CoordinateKey>,
    pub search: SearchState,
    pub map_center: Coordinate,
    pub bounds: MapBounds,
    pub last_failure: Option<LookupFailure>,
}

impl DashboardState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            markers: MarkerStore::new(),
            cache: PredictionCache::new(),
            selection: SelectionController::new(),
            pending_activation: HashSet::new(),
            search: SearchState::default(),
            map_center: config.initial_center,
            bounds: config.bounds,
            last_failure: None,
        }
    }

    /// Read-only projection for presentation
    pub fn view_model(&self) -> ViewModel {
        let markers = self
            .markers
            .list()
            .iter()
            .map(|marker| MarkerView::new(marker, self.cache.get(&marker.key())))
            .collect();

        let predictions_by_key = self
            .cache
            .entries()
            .map(|(key, entry)| (*key, entry.clone()))
            .collect();

        let selection = self.selection.current();
        let active_prediction = selection
            .active_key
            .and_then(|key| self.cache.get(&key))
            .cloned();

        ViewModel {
            markers,
            predictions_by_key,
            selection,
            active_prediction,
            search: self.search.clone(),
            map_center: self.map_center,
            bounds: self.bounds,
            last_failure: self.last_failure.clone(),
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(&DashboardConfig::default())
    }
}

/// Marker popup status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MarkerStatus {
    Loading,
    Ready,
    Unavailable,
}

impl MarkerStatus {
    /// Text shown in the marker popup
    pub fn label(self) -> &'static str {
        match self {
            MarkerStatus::Loading => "Loading...",
            MarkerStatus::Ready => "Ready",
            MarkerStatus::Unavailable => "Unavailable",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkerView {
    pub coordinate: Coordinate,
    pub key: CoordinateKey,
    pub status: MarkerStatus,
}

impl MarkerView {
    fn new(marker: &Marker, entry: Option<&PredictionEntry>) -> Self {
        // A marker whose entry was dropped is waiting on a re-draw, not loading
        let status = match entry {
            Some(PredictionEntry::Pending) => MarkerStatus::Loading,
            Some(PredictionEntry::Ready(_)) => MarkerStatus::Ready,
            Some(PredictionEntry::Failed(_)) | None => MarkerStatus::Unavailable,
        };
        Self {
            coordinate: marker.coordinate,
            key: marker.key(),
            status,
        }
    }
}

/// Everything presentation needs, detached from the live state
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewModel {
    pub markers: Vec<MarkerView>,
    pub predictions_by_key: BTreeMap<CoordinateKey, PredictionEntry>,
    pub selection: SelectionState,
    /// Entry for `selection.active_key`, when the panel has something to show
    pub active_prediction: Option<PredictionEntry>,
    pub search: SearchState,
    pub map_center: Coordinate,
    pub bounds: MapBounds,
    pub last_failure: Option<LookupFailure>,
}
