//! Map coordinates and the keys derived from them
//!
//! A [`Coordinate`] is compared by exact field equality. A [`CoordinateKey`]
//! quantizes both fields to [`KEY_PRECISION`] decimal places so that the
//! cache and selection can index by a hashable value that formats the same
//! way everywhere.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Decimal places kept when deriving a [`CoordinateKey`].
///
/// Six places is roughly 0.1 m at the equator, well below what a map click
/// can distinguish.
pub const KEY_PRECISION: u32 = 6;

const KEY_SCALE: f64 = 1_000_000.0;

/// A latitude/longitude pair identifying a map point
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Derive the cache key for this coordinate
    pub fn key(&self) -> CoordinateKey {
        CoordinateKey::from(*self)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// Identity of a coordinate for cache and selection indexing.
///
/// Both fields are stored as integer micro-degrees. Field-equal coordinates
/// always produce the same key (including `0.0` vs `-0.0`). Coordinates that
/// differ only past the sixth decimal place collide; that is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordinateKey {
    lat_e6: i64,
    lon_e6: i64,
}

impl CoordinateKey {
    /// Quantized latitude in micro-degrees
    pub fn lat_e6(&self) -> i64 {
        self.lat_e6
    }

    /// Quantized longitude in micro-degrees
    pub fn lon_e6(&self) -> i64 {
        self.lon_e6
    }
}

fn quantize(value: f64) -> i64 {
    // `as` saturates and maps NaN to 0
    (value * KEY_SCALE).round() as i64
}

impl From<Coordinate> for CoordinateKey {
    fn from(coordinate: Coordinate) -> Self {
        Self {
            lat_e6: quantize(coordinate.lat),
            lon_e6: quantize(coordinate.lon),
        }
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = KEY_PRECISION as usize;
        write!(
            f,
            "{:.*},{:.*}",
            precision,
            self.lat_e6 as f64 / KEY_SCALE,
            precision,
            self.lon_e6 as f64 / KEY_SCALE
        )
    }
}

impl Serialize for CoordinateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Rectangular map viewport limit
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl MapBounds {
    pub fn new(south_west: Coordinate, north_east: Coordinate) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Whether the coordinate lies inside the bounds (edges inclusive)
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&coordinate.lat)
            && (self.south_west.lon..=self.north_east.lon).contains(&coordinate.lon)
    }
}

impl Default for MapBounds {
    fn default() -> Self {
        // Greater Mumbai
        Self::new(Coordinate::new(18.89, 72.775), Coordinate::new(19.3, 73.0))
    }
}
