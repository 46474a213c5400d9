pub const EARTH_RADIUS_MILES: f64 = 3959.0;
pub const METERS_PER_MILE: f64 = 1609.344;

fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// Great-circle distance in miles.
///
/// The order of operations is fixed: the degree difference is converted to
/// radians (not the difference of two converted values), and the squared
/// sines are plain products. Distances computed elsewhere in the system are
/// compared against this function, so it must stay bit-for-bit stable.
pub fn haversine_distance(
    latitude_1: f64,
    longitude_1: f64,
    latitude_2: f64,
    longitude_2: f64,
) -> f64 {
    let dlat = to_radians(latitude_2 - latitude_1);
    let dlon = to_radians(longitude_2 - longitude_1);

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();
    let a = sin_dlat * sin_dlat
        + to_radians(latitude_1).cos()
            * to_radians(latitude_2).cos()
            * sin_dlon
            * sin_dlon;
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// A latitude/longitude box enclosing a search circle.
///
/// `min_longitude`/`max_longitude` are `None` when the circle reaches a pole
/// or wraps around the antimeridian; only the latitude band is usable then.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: Option<f64>,
    pub max_longitude: Option<f64>,
}

impl BoundingBox {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        let in_band = latitude >= self.min_latitude && latitude <= self.max_latitude;
        match (self.min_longitude, self.max_longitude) {
            (Some(min), Some(max)) => in_band && longitude >= min && longitude <= max,
            _ => in_band,
        }
    }
}

/// Bounding box of a circle around (`lat`, `lon`). The box is padded slightly
/// so that points exactly on the circle are never cut off by rounding.
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_miles: f64) -> BoundingBox {
    const PADDING: f64 = 1.0001;

    let angular = radius_miles * PADDING / EARTH_RADIUS_MILES;
    let lat_rad = to_radians(lat);

    let min_lat = lat_rad - angular;
    let max_lat = lat_rad + angular;
    let half_pi = std::f64::consts::FRAC_PI_2;

    let min_latitude = to_degrees(min_lat).max(-90.0);
    let max_latitude = to_degrees(max_lat).min(90.0);

    if min_lat <= -half_pi || max_lat >= half_pi {
        return BoundingBox {
            min_latitude,
            max_latitude,
            min_longitude: None,
            max_longitude: None,
        };
    }

    // longitude span widens with latitude
    let delta_lon = (angular.sin() / lat_rad.cos()).min(1.0).asin();
    let min_lon = to_degrees(to_radians(lon) - delta_lon);
    let max_lon = to_degrees(to_radians(lon) + delta_lon);

    if min_lon < -180.0 || max_lon > 180.0 {
        return BoundingBox {
            min_latitude,
            max_latitude,
            min_longitude: None,
            max_longitude: None,
        };
    }

    BoundingBox {
        min_latitude,
        max_latitude,
        min_longitude: Some(min_lon),
        max_longitude: Some(max_lon),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ithaca_to_cornell() {
        let distance = haversine_distance(42.4430, -76.5019, 42.4534, -76.4735);
        assert!((distance - 1.6165).abs() < 0.01, "got {}", distance);
    }

    #[test]
    fn zero_distance() {
        assert_eq!(haversine_distance(10.0, 20.0, 10.0, 20.0), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = haversine_distance(40.7128, -74.0060, 34.0522, -118.2437);
        let b = haversine_distance(34.0522, -118.2437, 40.7128, -74.0060);
        assert!((a - b).abs() < 1e-9);
        // new york to los angeles is roughly 2445 miles
        assert!((a - 2445.0).abs() < 10.0);
    }

    #[test]
    fn unit_conversion() {
        assert!((meters_to_miles(5000.0) - 3.106_855).abs() < 1e-6);
        assert!((miles_to_meters(1.0) - 1609.344).abs() < 1e-9);
    }

    #[test]
    fn coordinate_ranges() {
        assert!(is_valid_coordinate(90.0, -180.0));
        assert!(!is_valid_coordinate(90.5, 0.0));
        assert!(!is_valid_coordinate(0.0, 181.0));
        assert!(!is_valid_coordinate(f64::NAN, 0.0));
        assert!(!is_valid_coordinate(0.0, f64::INFINITY));
    }

    #[test]
    fn bounding_box_contains_circle() {
        let (lat, lon) = (42.4430, -76.5019);
        let bounds = calculate_bounding_box(lat, lon, 5.0);
        // points 5 miles due north, south, east and west
        let dlat = 5.0 / EARTH_RADIUS_MILES * 180.0 / std::f64::consts::PI;
        assert!(bounds.contains(lat + dlat, lon));
        assert!(bounds.contains(lat - dlat, lon));
        let east = lon + dlat / to_radians(lat).cos();
        assert!(bounds.contains(lat, east));
        assert!(!bounds.contains(lat + 2.0 * dlat, lon));
    }

    #[test]
    fn bounding_box_drops_longitude_near_antimeridian() {
        let bounds = calculate_bounding_box(0.0, 179.99, 10.0);
        assert_eq!(bounds.min_longitude, None);
        assert!(bounds.contains(0.0, -179.99));
    }

    #[test]
    fn bounding_box_drops_longitude_at_pole() {
        let bounds = calculate_bounding_box(89.99, 0.0, 10.0);
        assert_eq!(bounds.max_longitude, None);
        assert_eq!(bounds.max_latitude, 90.0);
    }
}
