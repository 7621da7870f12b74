//! Actions: every input the dashboard core accepts
//!
//! Naming follows the intent/result convention:
//! - The prefix names the category: `MarkerDrawCreated` -> `marker`
//! - `Did` marks the result of async work: `PredictionDidLoad`
//!
//! Intent actions come from the presentation layer. Result actions are only
//! produced by tasks the controller spawned.

use crate::cache::Epoch;
use crate::client::Place;
use crate::coordinate::{Coordinate, CoordinateKey};
use crate::prediction::{PredictionError, PredictionRecord};

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    // ===== Marker category =====
    /// A marker was drawn on the map
    MarkerDrawCreated(Coordinate),

    /// Markers were removed with the edit control
    MarkerDrawDeleted(Vec<Coordinate>),

    /// The "clear markers" button
    MarkersClear,

    // ===== Location category =====
    /// A search result was picked
    LocationSelect(Coordinate),

    // ===== Panel category =====
    PanelToggle,

    PanelDismiss,

    // ===== Search category =====
    /// Search box text changed
    SearchQueryChange(String),

    /// Result: geocoding finished for `query`
    SearchDidLoad { query: String, places: Vec<Place> },

    // ===== Prediction category =====
    /// Result: prediction service answered
    PredictionDidLoad {
        key: CoordinateKey,
        epoch: Epoch,
        record: PredictionRecord,
    },

    /// Result: prediction lookup failed
    PredictionDidError {
        key: CoordinateKey,
        epoch: Epoch,
        error: PredictionError,
    },
}

/// Action grouping used for log filtering
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionCategory {
    Marker,
    Location,
    Panel,
    Search,
    Prediction,
}

impl ActionCategory {
    pub fn name(self) -> &'static str {
        match self {
            ActionCategory::Marker => "marker",
            ActionCategory::Location => "location",
            ActionCategory::Panel => "panel",
            ActionCategory::Search => "search",
            ActionCategory::Prediction => "prediction",
        }
    }
}

impl Action {
    /// Variant name, for logging and filtering
    pub fn name(&self) -> &'static str {
        match self {
            Action::MarkerDrawCreated(_) => "MarkerDrawCreated",
            Action::MarkerDrawDeleted(_) => "MarkerDrawDeleted",
            Action::MarkersClear => "MarkersClear",
            Action::LocationSelect(_) => "LocationSelect",
            Action::PanelToggle => "PanelToggle",
            Action::PanelDismiss => "PanelDismiss",
            Action::SearchQueryChange(_) => "SearchQueryChange",
            Action::SearchDidLoad { .. } => "SearchDidLoad",
            Action::PredictionDidLoad { .. } => "PredictionDidLoad",
            Action::PredictionDidError { .. } => "PredictionDidError",
        }
    }

    pub fn category(&self) -> ActionCategory {
        match self {
            Action::MarkerDrawCreated(_) | Action::MarkerDrawDeleted(_) | Action::MarkersClear => {
                ActionCategory::Marker
            }
            Action::LocationSelect(_) => ActionCategory::Location,
            Action::PanelToggle | Action::PanelDismiss => ActionCategory::Panel,
            Action::SearchQueryChange(_) | Action::SearchDidLoad { .. } => ActionCategory::Search,
            Action::PredictionDidLoad { .. } | Action::PredictionDidError { .. } => {
                ActionCategory::Prediction
            }
        }
    }

    /// Whether this action carries the outcome of async work
    pub fn is_async_result(&self) -> bool {
        self.name().contains("Did")
    }

    /// Concise one-line description for the action log
    pub fn summary(&self) -> String {
        match self {
            Action::MarkerDrawDeleted(coordinates) => {
                format!("MarkerDrawDeleted({} markers)", coordinates.len())
            }
            Action::SearchDidLoad { query, places } => {
                format!("SearchDidLoad {{ query: {:?}, places: {} }}", query, places.len())
            }
            Action::PredictionDidLoad { key, epoch, record } => {
                let aqi = record
                    .aqi
                    .map(|v| format!("{:.1}", v))
                    .unwrap_or_else(|| "-".into());
                format!(
                    "PredictionDidLoad {{ key: {}, epoch: {}, aqi: {} }}",
                    key,
                    epoch.value(),
                    aqi
                )
            }
            Action::PredictionDidError { key, epoch, error } => {
                let msg = error.to_string();
                let msg = if msg.len() > 40 {
                    format!("{}...", msg.chars().take(37).collect::<String>())
                } else {
                    msg
                };
                format!(
                    "PredictionDidError {{ key: {}, epoch: {}, error: {:?} }}",
                    key,
                    epoch.value(),
                    msg
                )
            }
            _ => format!("{:?}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_follow_prefix() {
        let c = Coordinate::new(19.1, 72.9);
        assert_eq!(Action::MarkerDrawCreated(c).category(), ActionCategory::Marker);
        assert_eq!(Action::MarkersClear.category(), ActionCategory::Marker);
        assert_eq!(Action::LocationSelect(c).category(), ActionCategory::Location);
        assert_eq!(Action::PanelToggle.category().name(), "panel");
        assert_eq!(
            Action::SearchQueryChange("x".into()).category(),
            ActionCategory::Search
        );
    }

    #[test]
    fn test_did_actions_are_async_results() {
        let key = Coordinate::new(19.1, 72.9).key();
        let action = Action::PredictionDidLoad {
            key,
            epoch: Epoch::default(),
            record: PredictionRecord::default(),
        };
        assert!(action.is_async_result());
        assert!(!Action::PanelToggle.is_async_result());
    }

    #[test]
    fn test_summary_is_concise() {
        let key = Coordinate::new(19.076, 72.8777).key();
        let action = Action::PredictionDidLoad {
            key,
            epoch: Epoch::default(),
            record: PredictionRecord {
                aqi: Some(142.5),
                ..Default::default()
            },
        };
        assert_eq!(
            action.summary(),
            "PredictionDidLoad { key: 19.076000,72.877700, epoch: 0, aqi: 142.5 }"
        );

        let action = Action::PredictionDidError {
            key,
            epoch: Epoch::default(),
            error: PredictionError::Network("x".repeat(100)),
        };
        assert!(action.summary().contains("..."));
    }
}
