//! Dashboard configuration

use std::time::Duration;

use serde::Deserialize;

use crate::coordinate::{Coordinate, MapBounds};

pub const DEFAULT_PREDICTION_URL: &str = "http://127.0.0.1:5000/predict";
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Settings shared by the clients and the controller.
///
/// Every field has a default, so a partial document deserializes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Endpoint receiving `POST {lat, lon}`
    pub prediction_url: String,
    /// Nominatim-compatible search endpoint
    pub geocode_url: String,
    pub request_timeout_secs: u64,
    /// Sent with every request; Nominatim rejects anonymous clients
    pub user_agent: String,
    pub search_debounce_ms: u64,
    pub bounds: MapBounds,
    pub initial_center: Coordinate,
    /// Entries kept in the in-memory action log
    pub action_log_capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            prediction_url: DEFAULT_PREDICTION_URL.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            request_timeout_secs: 10,
            user_agent: concat!("aqmap/", env!("CARGO_PKG_VERSION")).to_string(),
            search_debounce_ms: 300,
            bounds: MapBounds::default(),
            initial_center: Coordinate::new(19.0760, 72.8777),
            action_log_capacity: 100,
        }
    }
}

impl DashboardConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.prediction_url, "http://127.0.0.1:5000/predict");
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
        assert!(config.bounds.contains(&config.initial_center));
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let json = r#"{"prediction_url": "http://predict.local/v1", "request_timeout_secs": 3}"#;
        let config: DashboardConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.prediction_url, "http://predict.local/v1");
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.geocode_url, DEFAULT_GEOCODE_URL);
    }
}
