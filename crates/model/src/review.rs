use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};
use uuid::Uuid;

use crate::business::Business;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub business_id: Id<Business>,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl HasId for Review {
    type IdType = Uuid;
}

pub const MAX_COMMENT_LENGTH: usize = 1000;

/// A review as submitted. The rating is range checked before it becomes a
/// [`Review`].
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReviewDraft {
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

/// Aggregate shown next to a business.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub review_count: usize,
    pub average_rating: Option<f64>,
}

impl RatingSummary {
    pub fn of<'a, I>(reviews: I) -> Self
    where
        I: IntoIterator<Item = &'a Review>,
    {
        let (count, sum) = reviews
            .into_iter()
            .fold((0usize, 0u64), |(count, sum), review| {
                (count + 1, sum + u64::from(review.rating))
            });
        Self {
            review_count: count,
            average_rating: (count > 0).then(|| sum as f64 / count as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use utility::id::Id;

    use super::{RatingSummary, Review};

    fn review(rating: u8) -> Review {
        Review {
            business_id: Id::generate(),
            rating,
            comment: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_summary() {
        let summary = RatingSummary::of(&Vec::<Review>::new());
        assert_eq!(summary.review_count, 0);
        assert_eq!(summary.average_rating, None);
    }

    #[test]
    fn averages_ratings() {
        let reviews = vec![review(5), review(4), review(3)];
        let summary = RatingSummary::of(&reviews);
        assert_eq!(summary.review_count, 3);
        assert_eq!(summary.average_rating, Some(4.0));
    }
}
