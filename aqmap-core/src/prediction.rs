//! Prediction records and the cached lookup state for a coordinate

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pollutant readings returned by the prediction service.
///
/// Every field is optional; the service omits what it cannot predict.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(rename = "AQI", default)]
    pub aqi: Option<f64>,
    #[serde(rename = "PM2.5", default)]
    pub pm2_5: Option<f64>,
    #[serde(rename = "PM10", default)]
    pub pm10: Option<f64>,
    #[serde(rename = "NO", default)]
    pub no: Option<f64>,
    #[serde(rename = "NO2", default)]
    pub no2: Option<f64>,
    #[serde(rename = "SO2", default)]
    pub so2: Option<f64>,
    #[serde(rename = "CO", default)]
    pub co: Option<f64>,
    #[serde(rename = "Ozone", default)]
    pub ozone: Option<f64>,
}

/// AQI above this is shown as a worsening trend
pub const UNHEALTHY_AQI: f64 = 100.0;

impl PredictionRecord {
    /// Label/value pairs in detail-panel order
    pub fn metrics(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("AQI", self.aqi),
            ("PM2.5", self.pm2_5),
            ("PM10", self.pm10),
            ("NO", self.no),
            ("NO2", self.no2),
            ("SO2", self.so2),
            ("CO", self.co),
            ("Ozone", self.ozone),
        ]
    }

    pub fn is_unhealthy(&self) -> bool {
        self.aqi.is_some_and(|aqi| aqi > UNHEALTHY_AQI)
    }
}

/// Format a reading with two decimals, or a placeholder when absent
pub fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "Loading...".to_string(),
    }
}

/// Why a prediction lookup failed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum PredictionError {
    #[error("prediction request failed: {0}")]
    Network(String),

    #[error("prediction service returned HTTP {0}")]
    Status(u16),

    #[error("malformed prediction response: {0}")]
    MalformedResponse(String),
}

/// Cached state of one coordinate's lookup
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "value")]
pub enum PredictionEntry {
    Pending,
    Ready(PredictionRecord),
    Failed(PredictionError),
}

impl PredictionEntry {
    pub fn is_pending(&self) -> bool {
        matches!(self, PredictionEntry::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PredictionEntry::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PredictionEntry::Failed(_))
    }

    pub fn record(&self) -> Option<&PredictionRecord> {
        match self {
            PredictionEntry::Ready(record) => Some(record),
            _ => None,
        }
    }
}

impl From<Result<PredictionRecord, PredictionError>> for PredictionEntry {
    fn from(result: Result<PredictionRecord, PredictionError>) -> Self {
        match result {
            Ok(record) => PredictionEntry::Ready(record),
            Err(error) => PredictionEntry::Failed(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_parses_service_keys() {
        let json = r#"{"AQI": 142.5, "PM2.5": 80.0, "Ozone": 12.25}"#;
        let record: PredictionRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.aqi, Some(142.5));
        assert_eq!(record.pm2_5, Some(80.0));
        assert_eq!(record.ozone, Some(12.25));
        assert_eq!(record.pm10, None);
        assert_eq!(record.co, None);
    }

    #[test]
    fn test_record_ignores_unknown_keys() {
        let json = r#"{"AQI": 50, "prediction": "Good"}"#;
        let record: PredictionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.aqi, Some(50.0));
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(Some(142.5)), "142.50");
        assert_eq!(format_metric(Some(0.123)), "0.12");
        assert_eq!(format_metric(None), "Loading...");
    }

    #[test]
    fn test_is_unhealthy() {
        let mut record = PredictionRecord::default();
        assert!(!record.is_unhealthy());

        record.aqi = Some(100.0);
        assert!(!record.is_unhealthy());

        record.aqi = Some(142.5);
        assert!(record.is_unhealthy());
    }

    #[test]
    fn test_metrics_order() {
        let record = PredictionRecord {
            aqi: Some(1.0),
            ozone: Some(8.0),
            ..Default::default()
        };
        let labels: Vec<_> = record.metrics().iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            vec!["AQI", "PM2.5", "PM10", "NO", "NO2", "SO2", "CO", "Ozone"]
        );
        assert_eq!(record.metrics()[7].1, Some(8.0));
    }

    #[test]
    fn test_entry_from_result() {
        let entry: PredictionEntry = Ok(PredictionRecord::default()).into();
        assert!(entry.is_ready());

        let entry: PredictionEntry = Err(PredictionError::Status(503)).into();
        assert!(entry.is_failed());
        assert!(entry.record().is_none());
    }
}
