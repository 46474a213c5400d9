use async_trait::async_trait;
use chrono::{DateTime, Utc};
use discovery::database::{Repo, Result, ReviewRepo};
use model::{business::Business, review::Review, WithId};
use sqlx::prelude::FromRow;
use utility::id::Id;
use uuid::Uuid;

use super::DatabaseRow;
use crate::{
    queries::review::{get, insert, of_businesses},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

/// Table: `reviews`
#[derive(Debug, Clone, FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub business_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl DatabaseRow for ReviewRow {
    type Model = Review;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id)
    }

    fn to_model(self) -> Self::Model {
        Review {
            business_id: Id::new(self.business_id),
            // guarded by a check constraint
            rating: self.rating.clamp(0, i16::from(u8::MAX)) as u8,
            comment: self.comment,
            created_at: self.created_at,
        }
    }

    fn from_model(id: Id<Self::Model>, review: Self::Model) -> Self {
        Self {
            id: id.raw(),
            business_id: review.business_id.raw(),
            rating: i16::from(review.rating),
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

#[async_trait]
impl Repo<Review> for PgDatabaseAutocommit {
    async fn get(&mut self, id: &Id<Review>) -> Result<WithId<Review>> {
        get(&self.pool, id).await
    }

    async fn insert(&mut self, element: Review) -> Result<WithId<Review>> {
        insert(&self.pool, element).await
    }
}

#[async_trait]
impl Repo<Review> for PgDatabaseTransaction {
    async fn get(&mut self, id: &Id<Review>) -> Result<WithId<Review>> {
        get(&mut *self.tx, id).await
    }

    async fn insert(&mut self, element: Review) -> Result<WithId<Review>> {
        insert(&mut *self.tx, element).await
    }
}

#[async_trait]
impl ReviewRepo for PgDatabaseAutocommit {
    async fn reviews_of_businesses(
        &mut self,
        businesses: &[Id<Business>],
    ) -> Result<Vec<WithId<Review>>> {
        of_businesses(&self.pool, businesses).await
    }
}

#[async_trait]
impl ReviewRepo for PgDatabaseTransaction {
    async fn reviews_of_businesses(
        &mut self,
        businesses: &[Id<Business>],
    ) -> Result<Vec<WithId<Review>>> {
        of_businesses(&mut *self.tx, businesses).await
    }
}
