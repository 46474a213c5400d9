use chrono::{DateTime, TimeZone, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::HasId;
use uuid::Uuid;

use crate::{category::Category, coordinate::Coordinate, ExampleData};

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub name: String,
    pub category: Category,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub location: Option<Coordinate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Business {
    pub fn latitude(&self) -> Option<f64> {
        self.location.as_ref().map(|location| location.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.location.as_ref().map(|location| location.longitude)
    }

    /// Location usable for proximity queries. A location with non-finite or
    /// out of range values is treated as missing.
    pub fn valid_location(&self) -> Option<&Coordinate> {
        self.location.as_ref().filter(|location| location.is_valid())
    }

    /// Distance to `center`, or `None` if the business has no usable location.
    pub fn distance_miles_to(&self, center: &Coordinate) -> Option<f64> {
        self.valid_location()
            .map(|location| center.distance_miles_to(location))
    }
}

impl HasId for Business {
    type IdType = Uuid;
}

impl ExampleData for Business {
    fn example_data() -> Self {
        let created_at = Utc
            .with_ymd_and_hms(2024, 5, 14, 9, 30, 0)
            .single()
            .unwrap_or_default();
        Business {
            name: "Collegetown Bagels".to_owned(),
            category: Category::Restaurants,
            description: Some("Bagels, coffee and sandwiches since 1976.".to_owned()),
            address: Some("415 College Ave, Ithaca, NY 14850".to_owned()),
            phone: None,
            website: None,
            location: Coordinate::new(42.4423, -76.4851),
            created_at,
            updated_at: created_at,
        }
    }
}

/// The fields an owner supplies when registering or editing a business.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDraft {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}
