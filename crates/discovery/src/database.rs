use std::{error, fmt, result};

use async_trait::async_trait;
use model::{
    business::Business, category::Category, owner::Owner, review::Review,
    video::Video, WithId,
};
use serde::Serialize;
use utility::{
    geo::BoundingBox,
    id::{HasId, Id},
};

#[derive(Debug)]
pub enum DatabaseError {
    NotFound,
    /// A uniqueness constraint was violated, e.g. an email is already taken.
    Conflict(String),
    Other(Box<dyn error::Error + Send + Sync>),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Conflict(message) => write!(f, "conflict: {}", message),
            Self::Other(why) => write!(f, "{}", why),
        }
    }
}

impl error::Error for DatabaseError {}

pub type Result<T> = result::Result<T, DatabaseError>;

/// What a store may use to narrow down the businesses considered by a
/// discovery query.
///
/// Implementations must return a superset of the businesses that match: the
/// exact radius test is always applied afterwards by the proximity filter, so
/// a store that ignores `bounds` (or `category`) is slower but still correct.
/// A store that does apply `bounds` drops businesses without a location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilter {
    pub category: Option<Category>,
    pub bounds: Option<BoundingBox>,
}

impl CandidateFilter {
    pub fn matches(&self, business: &Business) -> bool {
        let category_matches = self
            .category
            .as_ref()
            .map_or(true, |category| &business.category == category);
        let bounds_match = match &self.bounds {
            Some(bounds) => business
                .valid_location()
                .is_some_and(|location| bounds.contains(location.latitude, location.longitude)),
            None => true,
        };
        category_matches && bounds_match
    }
}

#[async_trait]
pub trait Repo<T: Serialize + HasId>
where
    <T as HasId>::IdType: fmt::Debug + Clone + Serialize,
{
    async fn get(&mut self, id: &Id<T>) -> Result<WithId<T>>;

    /// Stores a new element under a freshly generated id.
    async fn insert(&mut self, element: T) -> Result<WithId<T>>;
}

#[async_trait]
pub trait BusinessRepo: Repo<Business> {
    async fn find_candidates(
        &mut self,
        filter: &CandidateFilter,
    ) -> Result<Vec<WithId<Business>>>;

    async fn update_business(
        &mut self,
        business: WithId<Business>,
    ) -> Result<WithId<Business>>;
}

#[async_trait]
pub trait VideoRepo: Repo<Video> {
    /// All videos owned by any of the given businesses, in no particular order.
    async fn videos_of_businesses(
        &mut self,
        businesses: &[Id<Business>],
    ) -> Result<Vec<WithId<Video>>>;

    async fn delete_video(&mut self, id: &Id<Video>) -> Result<()>;
}

#[async_trait]
pub trait ReviewRepo: Repo<Review> {
    async fn reviews_of_businesses(
        &mut self,
        businesses: &[Id<Business>],
    ) -> Result<Vec<WithId<Review>>>;
}

#[async_trait]
pub trait OwnerRepo: Repo<Owner> {
    /// Looks up an owner by email. Emails are compared case-insensitively.
    async fn owner_by_email(&mut self, email: &str) -> Result<Option<WithId<Owner>>>;
}

#[async_trait]
pub trait DatabaseOperations: BusinessRepo + VideoRepo + ReviewRepo + OwnerRepo {}

#[async_trait]
pub trait DatabaseTransaction: DatabaseOperations {
    async fn commit(self) -> Result<()>;
}

pub trait DatabaseAutocommit: DatabaseOperations {}

/// Trait to implement a discovery store.
/// Concurrent access must be possible by cloning the database object; each
/// request works on its own autocommit handle or transaction.
#[async_trait]
pub trait Database: Clone + Send + Sync + Sized + 'static {
    type Transaction: DatabaseTransaction + Send;
    type Autocommit: DatabaseAutocommit + Send;

    async fn transaction(&self) -> Result<Self::Transaction>;

    fn auto(&self) -> Self::Autocommit;
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use model::{business::Business, category::Category, coordinate::Coordinate};
    use utility::geo;

    use super::CandidateFilter;

    fn business(category: Category, location: Option<Coordinate>) -> Business {
        Business {
            name: "test".to_owned(),
            category,
            description: None,
            address: None,
            phone: None,
            website: None,
            location,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = CandidateFilter::default();
        assert!(filter.matches(&business(Category::Art, None)));
        assert!(filter.matches(&business(
            Category::Legacy("Pet Care".to_owned()),
            Coordinate::new(1.0, 1.0)
        )));
    }

    #[test]
    fn bounds_drop_missing_locations() {
        let filter = CandidateFilter {
            category: None,
            bounds: Some(geo::calculate_bounding_box(42.0, -76.0, 5.0)),
        };
        assert!(!filter.matches(&business(Category::Art, None)));
        assert!(filter.matches(&business(Category::Art, Coordinate::new(42.0, -76.0))));
        assert!(!filter.matches(&business(Category::Art, Coordinate::new(45.0, -76.0))));
    }

    #[test]
    fn category_must_match() {
        let filter = CandidateFilter {
            category: Some(Category::Clothing),
            bounds: None,
        };
        assert!(filter.matches(&business(Category::Clothing, None)));
        assert!(!filter.matches(&business(Category::Art, None)));
    }
}
