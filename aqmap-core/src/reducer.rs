//! Reducer - every state transition of the dashboard
//!
//! `fn(&mut DashboardState, Action) -> DispatchResult`: mutates state,
//! reports whether anything changed and declares the effects to run.
//! No I/O happens here.

use crate::action::Action;
use crate::cache::{Epoch, Lookup, Resolution};
use crate::coordinate::{Coordinate, CoordinateKey};
use crate::effect::{DispatchResult, Effect};
use crate::prediction::{PredictionEntry, PredictionError, PredictionRecord};
use crate::state::{DashboardState, LookupFailure};

pub fn reducer(state: &mut DashboardState, action: Action) -> DispatchResult {
    match action {
        // ===== Marker actions =====
        Action::MarkerDrawCreated(coordinate) => {
            state.markers.add(coordinate);
            request_prediction(state, coordinate).mark_changed()
        }

        Action::MarkerDrawDeleted(coordinates) => {
            // Cache entries stay; they are keyed and inert
            let removed: usize = coordinates
                .iter()
                .map(|coordinate| state.markers.remove(coordinate))
                .sum();
            if removed > 0 {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::MarkersClear => {
            let keys: Vec<CoordinateKey> = state.markers.keys().collect();
            state.markers.clear();
            let invalidated = state.cache.clear_generation(keys);
            state.pending_activation.clear();
            state.selection.clear();
            tracing::info!(
                invalidated,
                epoch = state.cache.epoch().value(),
                "cleared markers"
            );
            DispatchResult::changed()
        }

        // ===== Location actions =====
        Action::LocationSelect(coordinate) => {
            state.map_center = coordinate;
            state.search.results.clear();
            state.search.awaiting = None;
            request_prediction(state, coordinate)
                .with(Effect::CancelSearch)
                .mark_changed()
        }

        // ===== Panel actions =====
        Action::PanelToggle => {
            state.selection.toggle_panel();
            DispatchResult::changed()
        }

        Action::PanelDismiss => {
            if state.selection.dismiss() {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        // ===== Search actions =====
        Action::SearchQueryChange(query) => {
            let trimmed = query.trim().to_string();
            state.search.query = query;
            if trimmed.is_empty() {
                state.search.results.clear();
                state.search.awaiting = None;
                DispatchResult::changed_with(Effect::CancelSearch)
            } else {
                state.search.awaiting = Some(trimmed.clone());
                DispatchResult::changed_with(Effect::SearchPlaces { query: trimmed })
            }
        }

        Action::SearchDidLoad { query, places } => {
            // Results already queued when the search was superseded or a place was picked
            if state.search.awaiting.as_deref() != Some(query.as_str()) {
                tracing::debug!(%query, "dropping results for superseded search");
                return DispatchResult::unchanged();
            }
            state.search.awaiting = None;
            state.search.results = places;
            DispatchResult::changed()
        }

        // ===== Prediction results =====
        Action::PredictionDidLoad { key, epoch, record } => {
            settle_prediction(state, key, epoch, Ok(record))
        }

        Action::PredictionDidError { key, epoch, error } => {
            settle_prediction(state, key, epoch, Err(error))
        }
    }
}

/// Look up `coordinate` and arrange for it to become the selection once Ready.
fn request_prediction(state: &mut DashboardState, coordinate: Coordinate) -> DispatchResult {
    let key = coordinate.key();

    // A failed entry is never reused: re-drawing or re-selecting retries
    if state.cache.get(&key).is_some_and(PredictionEntry::is_failed) {
        tracing::debug!(%key, "retrying failed lookup");
        state.cache.invalidate(&key);
    }

    match state.cache.lookup(coordinate) {
        Lookup::Issued { epoch } => {
            state.pending_activation.insert(key);
            DispatchResult::effect(Effect::FetchPrediction {
                coordinate,
                key,
                epoch,
            })
        }
        Lookup::Joined => {
            state.pending_activation.insert(key);
            DispatchResult::unchanged()
        }
        Lookup::Cached(PredictionEntry::Ready(_)) => {
            state.selection.activate(key, &state.cache);
            DispatchResult::changed()
        }
        Lookup::Cached(_) => DispatchResult::unchanged(),
    }
}

fn settle_prediction(
    state: &mut DashboardState,
    key: CoordinateKey,
    epoch: Epoch,
    result: Result<PredictionRecord, PredictionError>,
) -> DispatchResult {
    match state.cache.resolve(&key, epoch, result) {
        Resolution::Stale => {
            tracing::debug!(%key, epoch = epoch.value(), "discarding stale prediction");
            DispatchResult::unchanged()
        }
        Resolution::Applied(PredictionEntry::Failed(error)) => {
            state.pending_activation.remove(&key);
            tracing::warn!(%key, %error, "prediction lookup failed");
            state.last_failure = Some(LookupFailure { key, error });
            DispatchResult::changed()
        }
        Resolution::Applied(_) => {
            if state.pending_activation.remove(&key) {
                state.selection.activate(key, &state.cache);
            }
            tracing::info!(%key, "prediction ready");
            DispatchResult::changed()
        }
    }
}
