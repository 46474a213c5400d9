use chrono::{DateTime, TimeZone, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};
use uuid::Uuid;

use crate::{business::Business, ExampleData};

/// A short-form video. Ownership (`business_id`) is fixed at creation.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub business_id: Id<Business>,
    pub url: String,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl HasId for Video {
    type IdType = Uuid;
}

impl ExampleData for Video {
    fn example_data() -> Self {
        Video {
            business_id: Id::new(Uuid::nil()),
            url: "https://videos.example.com/bagel-rush.mp4".to_owned(),
            title: Some("Saturday morning rush".to_owned()),
            caption: Some("Everything bagels fresh out of the oven".to_owned()),
            thumbnail_url: Some("https://videos.example.com/bagel-rush.jpg".to_owned()),
            created_at: Utc
                .with_ymd_and_hms(2024, 6, 1, 8, 0, 0)
                .single()
                .unwrap_or_default(),
        }
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoDraft {
    pub url: String,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub thumbnail_url: Option<String>,
}
