//! Test utilities for driving an [`AnnotationController`] without a network
//!
//! - [`MockPredictionClient`]: counts calls per key, answers from a script,
//!   and can hold answers (all of them, or one key's) until the test
//!   releases a [`Gate`]
//! - [`MockGeocodeClient`]: fixed search results
//!
//! # Example
//!
//! ```ignore
//! use aqmap_core::testing::{MockGeocodeClient, MockPredictionClient};
//!
//! let predictions = MockPredictionClient::new().respond(c, Ok(record));
//! let calls = predictions.calls();
//! let mut controller = AnnotationController::new(&config, predictions, MockGeocodeClient::default());
//!
//! controller.on_draw_created(c);
//! controller.settle().await;
//! assert_eq!(calls.count(&c.key()), 1);
//! ```
//!
//! [`AnnotationController`]: crate::controller::AnnotationController

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use crate::client::{GeocodeClient, Place, PredictionClient};
use crate::coordinate::{Coordinate, CoordinateKey};
use crate::prediction::{PredictionError, PredictionRecord};

/// Shared record of the calls a mock received
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<CoordinateKey>>>,
}

impl CallLog {
    fn record(&self, key: CoordinateKey) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(key);
        }
    }

    /// Calls made for `key`
    pub fn count(&self, key: &CoordinateKey) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|k| *k == key).count())
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

/// Holds mock responses until permits are added
#[derive(Clone, Debug)]
pub struct Gate {
    permits: Arc<Semaphore>,
    opened: Arc<AtomicBool>,
}

impl Gate {
    fn closed() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(0)),
            opened: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Let `n` held calls complete
    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// Let every current and future call complete. Repeat calls are no-ops.
    pub fn open(&self) {
        if !self.opened.swap(true, Ordering::SeqCst) {
            self.permits.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    async fn pass(&self) -> Result<(), PredictionError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| PredictionError::Network(e.to_string()))?;
        permit.forget();
        Ok(())
    }
}

/// Scripted [`PredictionClient`].
///
/// Unscripted coordinates answer with an empty record.
#[derive(Clone, Debug, Default)]
pub struct MockPredictionClient {
    responses: HashMap<CoordinateKey, Result<PredictionRecord, PredictionError>>,
    calls: CallLog,
    gate: Option<Gate>,
    key_gates: HashMap<CoordinateKey, Gate>,
}

impl MockPredictionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `coordinate` with `response`
    pub fn respond(
        mut self,
        coordinate: Coordinate,
        response: Result<PredictionRecord, PredictionError>,
    ) -> Self {
        self.responses.insert(coordinate.key(), response);
        self
    }

    /// Hold every answer until the returned gate releases it
    pub fn gated(mut self) -> (Self, Gate) {
        let gate = Gate::closed();
        self.gate = Some(gate.clone());
        (self, gate)
    }

    /// Hold answers for `coordinate` only, so tests choose resolution order.
    ///
    /// Takes precedence over [`gated`](Self::gated) for that key.
    pub fn gated_for(mut self, coordinate: Coordinate) -> (Self, Gate) {
        let gate = Gate::closed();
        self.key_gates.insert(coordinate.key(), gate.clone());
        (self, gate)
    }

    /// Handle to the call log that outlives the client being moved
    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }
}

impl PredictionClient for MockPredictionClient {
    async fn fetch(&self, coordinate: Coordinate) -> Result<PredictionRecord, PredictionError> {
        let key = coordinate.key();
        self.calls.record(key);

        if let Some(gate) = self.key_gates.get(&key).or(self.gate.as_ref()) {
            gate.pass().await?;
        }

        self.responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(PredictionRecord::default()))
    }
}

/// [`GeocodeClient`] answering every non-empty query with the same places
#[derive(Clone, Debug, Default)]
pub struct MockGeocodeClient {
    places: Vec<Place>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockGeocodeClient {
    pub fn with_places(places: Vec<Place>) -> Self {
        Self {
            places,
            queries: Arc::default(),
        }
    }

    /// Queries received so far, shared with clones
    pub fn queries(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.queries)
    }
}

impl GeocodeClient for MockGeocodeClient {
    async fn search(&self, text: &str) -> Vec<Place> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(text.to_string());
        }
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.places.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let (client, gate) = MockPredictionClient::new().gated();
        gate.open();
        gate.open();
        gate.open();

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            client.fetch(Coordinate::new(19.0, 72.8)),
        )
        .await
        .expect("gate stayed closed");
        assert_eq!(result, Ok(PredictionRecord::default()));
    }

    #[tokio::test]
    async fn test_key_gate_holds_only_its_key() {
        let held = Coordinate::new(19.0, 72.8);
        let free = Coordinate::new(19.1, 72.9);
        let (client, gate) = MockPredictionClient::new().gated_for(held);

        let pending = tokio::time::timeout(Duration::from_millis(20), client.fetch(held)).await;
        assert!(pending.is_err());
        assert!(client.fetch(free).await.is_ok());

        gate.release(1);
        assert!(client.fetch(held).await.is_ok());
        assert_eq!(client.calls().count(&held.key()), 2);
    }
}
