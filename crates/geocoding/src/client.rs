use std::env;

use async_trait::async_trait;
use discovery::geocoding::{Geocoder, GeocodingError};
use log::debug;
use model::coordinate::Coordinate;
use serde::Deserialize;

use crate::ApiError;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = "locallens/0.1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOCODER_URL.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl GeocoderConfig {
    /// Reads `GEOCODER_URL` and `GEOCODER_USER_AGENT`. Returns `None` if
    /// geocoding is switched off with `GEOCODER_URL=off`.
    pub fn from_env() -> Option<Self> {
        let defaults = Self::default();
        let base_url = env::var("GEOCODER_URL").unwrap_or(defaults.base_url);
        if base_url.eq_ignore_ascii_case("off") {
            return None;
        }
        let user_agent = env::var("GEOCODER_USER_AGENT").unwrap_or(defaults.user_agent);
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            user_agent,
        })
    }
}

/// One search hit. Nominatim sends coordinates as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    pub lat: String,
    pub lon: String,
    pub display_name: Option<String>,
}

impl Place {
    pub fn coordinate(&self) -> Result<Coordinate, ApiError> {
        let latitude = self.lat.trim().parse::<f64>();
        let longitude = self.lon.trim().parse::<f64>();
        match (latitude, longitude) {
            (Ok(latitude), Ok(longitude)) => Coordinate::new(latitude, longitude)
                .ok_or_else(|| ApiError::InvalidCoordinate(format!("{},{}", self.lat, self.lon))),
            _ => Err(ApiError::InvalidCoordinate(format!(
                "{},{}",
                self.lat, self.lon
            ))),
        }
    }
}

/// Geocoder backed by a Nominatim compatible search endpoint.
pub struct NominatimGeocoder {
    config: GeocoderConfig,
    client: reqwest::Client,
}

impl NominatimGeocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { config, client })
    }

    async fn search(&self, address: &str) -> Result<Vec<Place>, ApiError> {
        let url = format!("{}/search", self.config.base_url);
        debug!("Geocoding '{}' via {}", address, url);
        let response = self
            .client
            .get(&url)
            .query(&[("format", "json"), ("limit", "1"), ("q", address)])
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(serde_json::from_str(&response.text().await?)?),
            other => Err(ApiError::InvalidResponse {
                status_code: other,
                url,
            }),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodingError> {
        let places = self.search(address).await?;
        match places.first() {
            Some(place) => Ok(place.coordinate()?),
            None => Err(GeocodingError::NoMatch(address.to_owned())),
        }
    }
}
