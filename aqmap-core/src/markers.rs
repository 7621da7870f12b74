//! Ordered collection of user-placed markers

use serde::Serialize;

use crate::coordinate::{Coordinate, CoordinateKey};

/// A user-placed annotation; identity is its coordinate
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Marker {
    pub coordinate: Coordinate,
}

impl Marker {
    pub fn key(&self) -> CoordinateKey {
        self.coordinate.key()
    }
}

/// Markers in placement order.
///
/// Adding the same coordinate twice keeps both markers.
#[derive(Clone, Debug, Default)]
pub struct MarkerStore {
    markers: Vec<Marker>,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a marker at `coordinate`
    pub fn add(&mut self, coordinate: Coordinate) -> Marker {
        let marker = Marker { coordinate };
        self.markers.push(marker);
        marker
    }

    /// Remove every marker field-equal to `coordinate`.
    ///
    /// Returns how many were removed; zero is not an error.
    pub fn remove(&mut self, coordinate: &Coordinate) -> usize {
        let before = self.markers.len();
        self.markers.retain(|m| m.coordinate != *coordinate);
        before - self.markers.len()
    }

    /// Drop all markers. Cache and selection are reset by the caller.
    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn list(&self) -> &[Marker] {
        &self.markers
    }

    /// Keys of the current markers, in order (duplicates included)
    pub fn keys(&self) -> impl Iterator<Item = CoordinateKey> + '_ {
        self.markers.iter().map(Marker::key)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
