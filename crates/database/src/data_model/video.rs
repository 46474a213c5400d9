use async_trait::async_trait;
use chrono::{DateTime, Utc};
use discovery::database::{Repo, Result, VideoRepo};
use model::{business::Business, video::Video, WithId};
use sqlx::prelude::FromRow;
use utility::id::Id;
use uuid::Uuid;

use super::DatabaseRow;
use crate::{
    queries::video::{delete, get, insert, of_businesses},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

/// Table: `videos`
#[derive(Debug, Clone, FromRow)]
pub struct VideoRow {
    pub id: Uuid,
    pub business_id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DatabaseRow for VideoRow {
    type Model = Video;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id)
    }

    fn to_model(self) -> Self::Model {
        Video {
            business_id: Id::new(self.business_id),
            url: self.url,
            title: self.title,
            caption: self.caption,
            thumbnail_url: self.thumbnail_url,
            created_at: self.created_at,
        }
    }

    fn from_model(id: Id<Self::Model>, video: Self::Model) -> Self {
        Self {
            id: id.raw(),
            business_id: video.business_id.raw(),
            url: video.url,
            title: video.title,
            caption: video.caption,
            thumbnail_url: video.thumbnail_url,
            created_at: video.created_at,
        }
    }
}

#[async_trait]
impl Repo<Video> for PgDatabaseAutocommit {
    async fn get(&mut self, id: &Id<Video>) -> Result<WithId<Video>> {
        get(&self.pool, id).await
    }

    async fn insert(&mut self, element: Video) -> Result<WithId<Video>> {
        insert(&self.pool, element).await
    }
}

#[async_trait]
impl Repo<Video> for PgDatabaseTransaction {
    async fn get(&mut self, id: &Id<Video>) -> Result<WithId<Video>> {
        get(&mut *self.tx, id).await
    }

    async fn insert(&mut self, element: Video) -> Result<WithId<Video>> {
        insert(&mut *self.tx, element).await
    }
}

#[async_trait]
impl VideoRepo for PgDatabaseAutocommit {
    async fn videos_of_businesses(
        &mut self,
        businesses: &[Id<Business>],
    ) -> Result<Vec<WithId<Video>>> {
        of_businesses(&self.pool, businesses).await
    }

    async fn delete_video(&mut self, id: &Id<Video>) -> Result<()> {
        delete(&self.pool, id).await
    }
}

#[async_trait]
impl VideoRepo for PgDatabaseTransaction {
    async fn videos_of_businesses(
        &mut self,
        businesses: &[Id<Business>],
    ) -> Result<Vec<WithId<Video>>> {
        of_businesses(&mut *self.tx, businesses).await
    }

    async fn delete_video(&mut self, id: &Id<Video>) -> Result<()> {
        delete(&mut *self.tx, id).await
    }
}
