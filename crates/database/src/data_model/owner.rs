use async_trait::async_trait;
use chrono::{DateTime, Utc};
use discovery::database::{OwnerRepo, Repo, Result};
use model::{owner::Owner, WithId};
use sqlx::prelude::FromRow;
use utility::id::Id;
use uuid::Uuid;

use super::DatabaseRow;
use crate::{
    queries::owner::{by_email, get, insert},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

/// Table: `owners`
#[derive(Debug, Clone, FromRow)]
pub struct OwnerRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub business_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl DatabaseRow for OwnerRow {
    type Model = Owner;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id)
    }

    fn to_model(self) -> Self::Model {
        Owner {
            email: self.email,
            password_hash: self.password_hash,
            business_id: Id::new(self.business_id),
            created_at: self.created_at,
        }
    }

    fn from_model(id: Id<Self::Model>, owner: Self::Model) -> Self {
        Self {
            id: id.raw(),
            email: owner.email,
            password_hash: owner.password_hash,
            business_id: owner.business_id.raw(),
            created_at: owner.created_at,
        }
    }
}

#[async_trait]
impl Repo<Owner> for PgDatabaseAutocommit {
    async fn get(&mut self, id: &Id<Owner>) -> Result<WithId<Owner>> {
        get(&self.pool, id).await
    }

    async fn insert(&mut self, element: Owner) -> Result<WithId<Owner>> {
        insert(&self.pool, element).await
    }
}

#[async_trait]
impl Repo<Owner> for PgDatabaseTransaction {
    async fn get(&mut self, id: &Id<Owner>) -> Result<WithId<Owner>> {
        get(&mut *self.tx, id).await
    }

    async fn insert(&mut self, element: Owner) -> Result<WithId<Owner>> {
        insert(&mut *self.tx, element).await
    }
}

#[async_trait]
impl OwnerRepo for PgDatabaseAutocommit {
    async fn owner_by_email(&mut self, email: &str) -> Result<Option<WithId<Owner>>> {
        by_email(&self.pool, email).await
    }
}

#[async_trait]
impl OwnerRepo for PgDatabaseTransaction {
    async fn owner_by_email(&mut self, email: &str) -> Result<Option<WithId<Owner>>> {
        by_email(&mut *self.tx, email).await
    }
}
