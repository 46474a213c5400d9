use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::geo;

/// A point on the globe in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Builds a coordinate if both values are finite and inside their ranges.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        geo::is_valid_coordinate(latitude, longitude).then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Builds a coordinate from two nullable columns/fields.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        latitude
            .zip(longitude)
            .and_then(|(latitude, longitude)| Self::new(latitude, longitude))
    }

    pub fn is_valid(&self) -> bool {
        geo::is_valid_coordinate(self.latitude, self.longitude)
    }

    pub fn distance_miles_to(&self, other: &Coordinate) -> f64 {
        geo::haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}
