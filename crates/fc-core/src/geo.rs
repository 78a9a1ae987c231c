//! Planar position type.
//!
//! Topologies live on a square service area `[0, area_size]²`, so positions
//! are plain Cartesian coordinates named after the store's `lat`/`lon`
//! columns.  Distances are Euclidean in the same units.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(self, other: Position) -> f64 {
        (self.lat - other.lat).hypot(self.lon - other.lon)
    }

    /// `true` if both coordinates lie in `[0, size]`.
    #[inline]
    pub fn within_area(self, size: f64) -> bool {
        (0.0..=size).contains(&self.lat) && (0.0..=size).contains(&self.lon)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.lat, self.lon)
    }
}
