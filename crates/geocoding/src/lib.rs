use std::{error, fmt, sync::Arc};

use discovery::geocoding::GeocodingError;

pub mod client;

pub use client::{GeocoderConfig, NominatimGeocoder};

#[derive(Debug, Clone)]
pub enum ApiError {
    RequestError(Arc<reqwest::Error>),
    JsonError(Arc<serde_json::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
    },
    InvalidCoordinate(String),
}

impl error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::RequestError(e) => write!(f, "HTTP request error: {}", e),
            ApiError::JsonError(e) => write!(f, "JSON parse error: {}", e),
            ApiError::InvalidResponse { status_code, url } => {
                write!(f, "Invalid Response ({}) {}", status_code, url)
            }
            ApiError::InvalidCoordinate(value) => {
                write!(f, "Geocoder returned an invalid coordinate: {}", value)
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::RequestError(Arc::new(value))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::JsonError(Arc::new(value))
    }
}

impl From<ApiError> for GeocodingError {
    fn from(value: ApiError) -> Self {
        GeocodingError::unavailable(value)
    }
}
