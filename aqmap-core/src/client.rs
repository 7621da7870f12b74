//! Boundaries to the two remote services
//!
//! Prediction failures come back as `Err` and end up as a Failed cache
//! entry. Geocoding failures come back as an empty list.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::prediction::{PredictionError, PredictionRecord};

/// Remote air-quality prediction keyed by coordinate
pub trait PredictionClient: Send + Sync + 'static {
    fn fetch(
        &self,
        coordinate: Coordinate,
    ) -> impl Future<Output = Result<PredictionRecord, PredictionError>> + Send;
}

/// Remote place-name search.
///
/// Empty input yields no results. Failures are logged by the implementation
/// and reported as an empty list.
pub trait GeocodeClient: Send + Sync + 'static {
    fn search(&self, text: &str) -> impl Future<Output = Vec<Place>> + Send;
}

/// A geocoding search result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Place {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}
