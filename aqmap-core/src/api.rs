//! HTTP clients for the prediction service and Nominatim geocoding

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::{GeocodeClient, Place, PredictionClient};
use crate::config::DashboardConfig;
use crate::coordinate::Coordinate;
use crate::prediction::{PredictionError, PredictionRecord};

fn http_client(config: &DashboardConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .user_agent(config.user_agent.clone())
        .build()
}

// ============================================================================
// Prediction API
// ============================================================================

#[derive(Debug, Serialize)]
struct PredictionRequest {
    lat: f64,
    lon: f64,
}

/// Calls the prediction service with `POST {"lat": .., "lon": ..}`
#[derive(Clone, Debug)]
pub struct HttpPredictionClient {
    http: reqwest::Client,
    url: String,
}

impl HttpPredictionClient {
    pub fn new(config: &DashboardConfig) -> reqwest::Result<Self> {
        Ok(Self {
            http: http_client(config)?,
            url: config.prediction_url.clone(),
        })
    }
}

impl PredictionClient for HttpPredictionClient {
    async fn fetch(&self, coordinate: Coordinate) -> Result<PredictionRecord, PredictionError> {
        let request = PredictionRequest {
            lat: coordinate.lat,
            lon: coordinate.lon,
        };

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PredictionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredictionError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PredictionError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| PredictionError::MalformedResponse(e.to_string()))
    }
}

// ============================================================================
// Geocoding API
// ============================================================================

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("geocoding service returned HTTP {0}")]
    Status(u16),

    #[error("malformed geocoding result {display_name:?}: {reason}")]
    Malformed {
        display_name: String,
        reason: String,
    },
}

/// Nominatim sends coordinates as strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
}

impl TryFrom<NominatimPlace> for Place {
    type Error = GeocodeError;

    fn try_from(raw: NominatimPlace) -> Result<Self, Self::Error> {
        let parse = |value: &str| {
            value.trim().parse::<f64>().map_err(|e| GeocodeError::Malformed {
                display_name: raw.display_name.clone(),
                reason: format!("{value:?}: {e}"),
            })
        };
        let lat = parse(&raw.lat)?;
        let lon = parse(&raw.lon)?;
        Ok(Place {
            display_name: raw.display_name,
            lat,
            lon,
        })
    }
}

/// Searches a Nominatim-compatible endpoint with `?format=json&q=<text>`
#[derive(Clone, Debug)]
pub struct NominatimClient {
    http: reqwest::Client,
    url: String,
}

impl NominatimClient {
    pub fn new(config: &DashboardConfig) -> reqwest::Result<Self> {
        Ok(Self {
            http: http_client(config)?,
            url: config.geocode_url.clone(),
        })
    }

    /// Search without swallowing errors
    pub async fn try_search(&self, text: &str) -> Result<Vec<Place>, GeocodeError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}?format=json&q={}", self.url, urlencoding::encode(text));
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let raw: Vec<NominatimPlace> = response.json().await?;
        raw.into_iter().map(Place::try_from).collect()
    }
}

impl GeocodeClient for NominatimClient {
    async fn search(&self, text: &str) -> Vec<Place> {
        match self.try_search(text).await {
            Ok(places) => places,
            Err(e) => {
                tracing::warn!(query = %text, error = %e, "geocoding failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominatim_place_parses_string_coordinates() {
        let raw: NominatimPlace = serde_json::from_str(
            r#"{"display_name": "Bandra, Mumbai", "lat": "19.0544", "lon": "72.8406", "type": "suburb"}"#,
        )
        .unwrap();

        let place = Place::try_from(raw).unwrap();
        assert_eq!(place.display_name, "Bandra, Mumbai");
        assert_eq!(place.coordinate(), Coordinate::new(19.0544, 72.8406));
    }

    #[test]
    fn test_nominatim_place_rejects_bad_coordinates() {
        let raw = NominatimPlace {
            display_name: "Nowhere".into(),
            lat: "north".into(),
            lon: "72.0".into(),
        };
        assert!(matches!(
            Place::try_from(raw),
            Err(GeocodeError::Malformed { .. })
        ));
    }
}
