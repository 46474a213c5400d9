use std::{error::Error, fmt};

use async_trait::async_trait;
use model::coordinate::Coordinate;

#[derive(Debug)]
pub enum GeocodingError {
    /// The service answered, but could not resolve the address.
    NoMatch(String),
    /// The service could not be reached or answered with garbage.
    Unavailable(Box<dyn Error + Send + Sync>),
}

impl GeocodingError {
    pub fn unavailable<T: Error + Send + Sync + 'static>(why: T) -> Self {
        Self::Unavailable(Box::new(why))
    }
}

impl fmt::Display for GeocodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch(address) => write!(f, "no coordinates found for '{}'", address),
            Self::Unavailable(why) => write!(f, "geocoding service unavailable: {}", why),
        }
    }
}

impl Error for GeocodingError {}

/// Converts a free-text address into coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodingError>;
}

/// A geocoder that never resolves anything. Businesses registered while it is
/// in use simply have no location.
#[derive(Debug, Clone, Default)]
pub struct DisabledGeocoder;

#[async_trait]
impl Geocoder for DisabledGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodingError> {
        Err(GeocodingError::NoMatch(address.to_owned()))
    }
}
