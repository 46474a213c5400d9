//! Turns raw query-string parameters into a validated [`QueryDescriptor`].

use model::{category::Category, coordinate::Coordinate};
use serde::Deserialize;
use utility::{geo, serde::optional_string};

use crate::{RequestError, RequestResult};

pub const DEFAULT_RADIUS_MILES: f64 = 5.0;
pub const DEFAULT_RADIUS_METERS: f64 = 5000.0;
pub const MAX_LIMIT: usize = 50;

/// Query parameters exactly as they arrive. Everything stays a string so that
/// malformed values surface as validation errors instead of extractor
/// rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuery {
    #[serde(default, deserialize_with = "optional_string::deserialize")]
    pub category: Option<String>,
    #[serde(default, alias = "latitude", deserialize_with = "optional_string::deserialize")]
    pub lat: Option<String>,
    #[serde(default, alias = "longitude", deserialize_with = "optional_string::deserialize")]
    pub lng: Option<String>,
    #[serde(default, deserialize_with = "optional_string::deserialize")]
    pub radius: Option<String>,
    #[serde(default, deserialize_with = "optional_string::deserialize")]
    pub limit: Option<String>,
    #[serde(default, deserialize_with = "optional_string::deserialize")]
    pub page: Option<String>,
    #[serde(default, deserialize_with = "optional_string::deserialize")]
    pub sort: Option<String>,
}

impl RawQuery {
    pub fn near(latitude: f64, longitude: f64) -> Self {
        Self {
            lat: Some(latitude.to_string()),
            lng: Some(longitude.to_string()),
            ..Default::default()
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius.to_string());
        self
    }

    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page.to_string());
        self
    }

    pub fn sorted_by_distance(mut self) -> Self {
        self.sort = Some("distance".to_owned());
        self
    }
}

/// Unit the `radius` parameter is given in at a particular endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadiusUnit {
    Miles,
    Meters,
}

impl RadiusUnit {
    fn default_radius(self) -> f64 {
        match self {
            RadiusUnit::Miles => DEFAULT_RADIUS_MILES,
            RadiusUnit::Meters => DEFAULT_RADIUS_METERS,
        }
    }

    fn to_miles(self, value: f64) -> f64 {
        match self {
            RadiusUnit::Miles => value,
            RadiusUnit::Meters => geo::meters_to_miles(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest first. What every listing does unless asked otherwise.
    #[default]
    Recency,
    /// Nearest first; degrades to recency when the query has no center.
    Distance,
}

/// A normalized discovery request. The radius is always in miles.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub center: Option<Coordinate>,
    pub radius_miles: f64,
    pub category: Option<Category>,
    pub limit: usize,
    pub page: usize,
    pub ordering: SortOrder,
}

impl Default for QueryDescriptor {
    fn default() -> Self {
        Self {
            center: None,
            radius_miles: DEFAULT_RADIUS_MILES,
            category: None,
            limit: MAX_LIMIT,
            page: 1,
            ordering: SortOrder::Recency,
        }
    }
}

impl QueryDescriptor {
    /// At least one item per page, even for hand-built descriptors.
    pub fn page_size(&self) -> usize {
        self.limit.max(1)
    }

    /// Pages are counted from 1; page 0 is read as the first page.
    pub fn page_number(&self) -> usize {
        self.page.max(1)
    }

    pub fn offset(&self) -> usize {
        (self.page_number() - 1).saturating_mul(self.page_size())
    }
}

pub fn normalize(raw: &RawQuery, unit: RadiusUnit) -> RequestResult<QueryDescriptor> {
    let center = normalize_center(raw.lat.as_deref(), raw.lng.as_deref())?;

    let radius = match raw.radius.as_deref() {
        Some(value) => parse_float("radius", value)?,
        None => unit.default_radius(),
    };
    if !radius.is_finite() || radius <= 0.0 {
        return Err(RequestError::validation(
            "radius must be a positive number",
        ));
    }

    let category = match raw.category.as_deref() {
        None => None,
        Some(value) if value.eq_ignore_ascii_case("all") => None,
        Some(value) => Some(
            Category::from_label(value)
                .ok_or_else(|| RequestError::UnknownCategory(value.to_owned()))?,
        ),
    };

    let limit = match raw.limit.as_deref() {
        Some(value) => parse_integer("limit", value)?.clamp(1, MAX_LIMIT as i64) as usize,
        None => MAX_LIMIT,
    };

    let page = match raw.page.as_deref() {
        Some(value) => {
            let page = parse_integer("page", value)?;
            if page < 1 {
                return Err(RequestError::validation("page must be at least 1"));
            }
            page as usize
        }
        None => 1,
    };

    let ordering = match raw.sort.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("recent") => SortOrder::Recency,
        Some("distance") => SortOrder::Distance,
        Some(other) => {
            return Err(RequestError::validation(format!(
                "unknown sort order '{}', expected 'recent' or 'distance'",
                other
            )))
        }
    };

    Ok(QueryDescriptor {
        center,
        radius_miles: unit.to_miles(radius),
        category,
        limit,
        page,
        ordering,
    })
}

fn normalize_center(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> RequestResult<Option<Coordinate>> {
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Ok(None);
    };
    let latitude = parse_float("lat", latitude)?;
    let longitude = parse_float("lng", longitude)?;
    Coordinate::new(latitude, longitude)
        .ok_or_else(|| {
            RequestError::validation(
                "coordinates out of range: lat must be within [-90, 90], lng within [-180, 180]",
            )
        })
        .map(Some)
}

fn parse_float(name: &str, value: &str) -> RequestResult<f64> {
    value
        .parse::<f64>()
        .map_err(|_| RequestError::validation(format!("{} must be a number, got '{}'", name, value)))
}

fn parse_integer(name: &str, value: &str) -> RequestResult<i64> {
    value.parse::<i64>().map_err(|_| {
        RequestError::validation(format!("{} must be an integer, got '{}'", name, value))
    })
}
