//! Ordering, pagination and enrichment of filtered discovery results.

use std::{cmp::Ordering, collections::HashMap};

use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::debug;
use model::{
    business::Business,
    review::{RatingSummary, Review},
    video::Video,
    WithDistance, WithId,
};
use schemars::JsonSchema;
use serde::Serialize;
use utility::id::Id;
use uuid::Uuid;

use crate::query::{QueryDescriptor, SortOrder};

/// Something that can be ordered by recency with a stable tie breaker.
pub trait Ranked {
    fn created_at(&self) -> DateTime<Utc>;
    fn tie_breaker(&self) -> Uuid;
}

impl Ranked for WithId<Business> {
    fn created_at(&self) -> DateTime<Utc> {
        self.content.created_at
    }

    fn tie_breaker(&self) -> Uuid {
        self.id.raw()
    }
}

impl Ranked for WithId<Video> {
    fn created_at(&self) -> DateTime<Utc> {
        self.content.created_at
    }

    fn tie_breaker(&self) -> Uuid {
        self.id.raw()
    }
}

impl Ranked for WithId<Review> {
    fn created_at(&self) -> DateTime<Utc> {
        self.content.created_at
    }

    fn tie_breaker(&self) -> Uuid {
        self.id.raw()
    }
}

impl Ranked for VideoWithBusiness {
    fn created_at(&self) -> DateTime<Utc> {
        self.video.created_at()
    }

    fn tie_breaker(&self) -> Uuid {
        self.video.tie_breaker()
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    pub fn map_items<U, F>(self, f: F) -> Page<U>
    where
        F: FnOnce(Vec<T>) -> Vec<U>,
    {
        Page {
            items: f(self.items),
            total_items: self.total_items,
            total_pages: self.total_pages,
            current_page: self.current_page,
            page_size: self.page_size,
        }
    }
}

/// A video together with the business that published it. The distance is the
/// distance of that business.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithBusiness {
    #[serde(flatten)]
    pub video: WithId<Video>,
    pub business: WithId<Business>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSummary {
    #[serde(flatten)]
    pub business: WithDistance<WithId<Business>>,
    pub videos: Vec<WithId<Video>>,
    pub reviews: Vec<WithId<Review>>,
    #[serde(flatten)]
    pub rating: RatingSummary,
}

fn by_recency<T: Ranked>(a: &T, b: &T) -> Ordering {
    b.created_at()
        .cmp(&a.created_at())
        .then_with(|| a.tie_breaker().cmp(&b.tie_breaker()))
}

fn by_distance<T: Ranked>(a: &WithDistance<T>, b: &WithDistance<T>) -> Ordering {
    let a_distance = a.distance_miles.unwrap_or(f64::INFINITY);
    let b_distance = b.distance_miles.unwrap_or(f64::INFINITY);
    a_distance
        .total_cmp(&b_distance)
        .then_with(|| by_recency(&a.content, &b.content))
}

pub fn newest_first<T: Ranked>(items: &mut [T]) {
    items.sort_by(by_recency);
}

/// Sorts in place according to the query. Distance ordering needs a center;
/// without one it is the same as recency.
pub fn sort<T: Ranked>(items: &mut [WithDistance<T>], query: &QueryDescriptor) {
    match (query.ordering, query.center) {
        (SortOrder::Distance, Some(_)) => items.sort_by(by_distance),
        _ => items.sort_by(|a, b| by_recency(&a.content, &b.content)),
    }
}

/// Cuts one page out of an already sorted list.
pub fn paginate<T>(items: Vec<T>, query: &QueryDescriptor) -> Page<T> {
    let page_size = query.page_size();
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let items = items
        .into_iter()
        .skip(query.offset())
        .take(page_size)
        .collect();
    Page {
        items,
        total_items,
        total_pages,
        current_page: query.page_number(),
        page_size,
    }
}

/// Sorts the complete candidate set and only then takes the requested page.
pub fn rank<T: Ranked>(
    mut items: Vec<WithDistance<T>>,
    query: &QueryDescriptor,
) -> Page<WithDistance<T>> {
    sort(&mut items, query);
    paginate(items, query)
}

/// Pairs every video with its business. Videos whose business is not among
/// `businesses` are dropped.
pub fn join_videos(
    businesses: &[WithDistance<WithId<Business>>],
    videos: Vec<WithId<Video>>,
) -> Vec<WithDistance<VideoWithBusiness>> {
    let by_id: HashMap<Id<Business>, &WithDistance<WithId<Business>>> = businesses
        .iter()
        .map(|business| (business.content.id, business))
        .collect();

    videos
        .into_iter()
        .filter_map(|video| match by_id.get(&video.content.business_id) {
            Some(business) => Some(WithDistance::new(
                business.distance_miles,
                VideoWithBusiness {
                    video,
                    business: business.content.clone(),
                },
            )),
            None => {
                debug!(
                    "Dropping video {} with unresolved business {}",
                    video.id, video.content.business_id
                );
                None
            }
        })
        .collect()
}

/// Attaches videos (newest first), reviews (newest first) and the rating
/// summary to each business, keeping the order of `businesses`.
pub fn summarize(
    businesses: Vec<WithDistance<WithId<Business>>>,
    videos: Vec<WithId<Video>>,
    reviews: Vec<WithId<Review>>,
) -> Vec<BusinessSummary> {
    let mut videos_by_business = videos
        .into_iter()
        .into_group_map_by(|video| video.content.business_id);
    let mut reviews_by_business = reviews
        .into_iter()
        .into_group_map_by(|review| review.content.business_id);

    businesses
        .into_iter()
        .map(|business| {
            let mut videos = videos_by_business
                .remove(&business.content.id)
                .unwrap_or_default();
            newest_first(&mut videos);

            let mut reviews = reviews_by_business
                .remove(&business.content.id)
                .unwrap_or_default();
            newest_first(&mut reviews);

            let rating = RatingSummary::of(reviews.iter().map(|review| &review.content));
            BusinessSummary {
                business,
                videos,
                reviews,
                rating,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use model::{
        business::Business, category::Category, review::Review, video::Video, WithDistance,
        WithId,
    };
    use utility::id::Id;
    use uuid::Uuid;

    use super::{join_videos, paginate, rank, summarize};
    use crate::query::{QueryDescriptor, SortOrder};

    fn business_at(minutes: i64, distance: Option<f64>) -> WithDistance<WithId<Business>> {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + Duration::minutes(minutes);
        WithDistance::new(
            distance,
            WithId::new(
                Id::generate(),
                Business {
                    name: format!("business {}", minutes),
                    category: Category::Restaurants,
                    description: None,
                    address: None,
                    phone: None,
                    website: None,
                    location: None,
                    created_at,
                    updated_at: created_at,
                },
            ),
        )
    }

    fn video_of(business: &WithId<Business>, minutes: i64) -> WithId<Video> {
        WithId::new(
            Id::generate(),
            Video {
                business_id: business.id,
                url: format!("https://v.example/{}", minutes),
                title: None,
                caption: None,
                thumbnail_url: None,
                created_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
                    + Duration::minutes(minutes),
            },
        )
    }

    fn names(page: &[WithDistance<WithId<Business>>]) -> Vec<String> {
        page.iter().map(|b| b.content.content.name.clone()).collect()
    }

    #[test]
    fn recency_is_the_default() {
        let items = vec![
            business_at(1, Some(0.5)),
            business_at(3, Some(4.0)),
            business_at(2, Some(1.0)),
        ];
        let page = rank(items, &QueryDescriptor::default());
        assert_eq!(
            names(&page.items),
            vec!["business 3", "business 2", "business 1"]
        );
    }

    #[test]
    fn distance_ordering_is_opt_in() {
        let query = QueryDescriptor {
            center: model::coordinate::Coordinate::new(0.0, 0.0),
            ordering: SortOrder::Distance,
            ..Default::default()
        };
        let items = vec![
            business_at(1, Some(3.0)),
            business_at(3, Some(4.0)),
            business_at(2, Some(1.0)),
        ];
        let page = rank(items, &query);
        assert_eq!(
            names(&page.items),
            vec!["business 2", "business 1", "business 3"]
        );
    }

    #[test]
    fn distance_without_center_falls_back_to_recency() {
        let query = QueryDescriptor {
            ordering: SortOrder::Distance,
            ..Default::default()
        };
        let page = rank(vec![business_at(1, None), business_at(2, None)], &query);
        assert_eq!(names(&page.items), vec!["business 2", "business 1"]);
    }

    #[test]
    fn ties_are_broken_by_id() {
        let mut a = business_at(1, None);
        let mut b = business_at(1, None);
        a.content.id = Id::new(Uuid::from_u128(2));
        b.content.id = Id::new(Uuid::from_u128(1));
        let page = rank(vec![a, b], &QueryDescriptor::default());
        assert_eq!(page.items[0].content.id.raw(), Uuid::from_u128(1));
    }

    #[test]
    fn sorts_before_truncating() {
        let items: Vec<_> = (0..120).map(|minutes| business_at(minutes, None)).collect();
        let query = QueryDescriptor {
            limit: 50,
            ..Default::default()
        };
        let page = rank(items, &query);
        assert_eq!(page.items.len(), 50);
        assert_eq!(page.total_items, 120);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items[0].content.content.name, "business 119");
        assert_eq!(page.items[49].content.content.name, "business 70");
    }

    #[test]
    fn later_pages() {
        let items: Vec<_> = (0..12).map(|minutes| business_at(minutes, None)).collect();
        let query = QueryDescriptor {
            limit: 5,
            page: 3,
            ..Default::default()
        };
        let page = rank(items, &query);
        assert_eq!(names(&page.items), vec!["business 1", "business 0"]);
        assert_eq!(page.current_page, 3);

        let query = QueryDescriptor {
            limit: 5,
            page: 9,
            ..Default::default()
        };
        assert!(rank(vec![business_at(0, None)], &query).items.is_empty());
    }

    #[test]
    fn zero_limit_and_zero_page_are_clamped() {
        let empty = paginate(
            Vec::<u8>::new(),
            &QueryDescriptor {
                limit: 0,
                ..Default::default()
            },
        );
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.page_size, 1);

        let page = paginate(
            vec![1, 2, 3],
            &QueryDescriptor {
                limit: 0,
                page: 0,
                ..Default::default()
            },
        );
        assert_eq!(page.items, vec![1]);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn orphaned_videos_are_excluded() {
        let business = business_at(0, Some(2.0));
        let stranger = business_at(0, None);
        let videos = vec![
            video_of(&business.content, 1),
            video_of(&stranger.content, 2),
        ];
        let joined = join_videos(&[business.clone()], videos);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].distance_miles, Some(2.0));
        assert_eq!(joined[0].content.business.id, business.content.id);
    }

    #[test]
    fn summaries_group_by_business() {
        let first = business_at(0, None);
        let second = business_at(1, None);
        let videos = vec![
            video_of(&first.content, 1),
            video_of(&first.content, 5),
            video_of(&second.content, 3),
        ];
        let reviews = vec![WithId::new(
            Id::generate(),
            Review {
                business_id: first.content.id,
                rating: 4,
                comment: "good".to_owned(),
                created_at: Utc::now(),
            },
        )];
        let summaries = summarize(vec![first, second], videos, reviews);
        assert_eq!(summaries[0].videos.len(), 2);
        assert!(summaries[0].videos[0].content.created_at > summaries[0].videos[1].content.created_at);
        assert_eq!(summaries[0].rating.review_count, 1);
        assert_eq!(summaries[0].rating.average_rating, Some(4.0));
        assert_eq!(summaries[1].videos.len(), 1);
        assert_eq!(summaries[1].rating.review_count, 0);
    }
}
