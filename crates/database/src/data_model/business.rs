use async_trait::async_trait;
use chrono::{DateTime, Utc};
use discovery::database::{BusinessRepo, CandidateFilter, Repo, Result};
use model::{business::Business, category::Category, coordinate::Coordinate, WithId};
use sqlx::prelude::FromRow;
use utility::id::Id;
use uuid::Uuid;

use super::DatabaseRow;
use crate::{
    queries::business::{find_candidates, get, insert, update},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

/// Table: `businesses`
#[derive(Debug, Clone, FromRow)]
pub struct BusinessRow {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DatabaseRow for BusinessRow {
    type Model = Business;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id)
    }

    fn to_model(self) -> Self::Model {
        Business {
            name: self.name,
            category: Category::from_stored(&self.category),
            description: self.description,
            address: self.address,
            phone: self.phone,
            website: self.website,
            location: Coordinate::from_parts(self.latitude, self.longitude),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn from_model(id: Id<Self::Model>, business: Self::Model) -> Self {
        Self {
            id: id.raw(),
            latitude: business.latitude(),
            longitude: business.longitude(),
            name: business.name,
            category: business.category.code().to_owned(),
            description: business.description,
            address: business.address,
            phone: business.phone,
            website: business.website,
            created_at: business.created_at,
            updated_at: business.updated_at,
        }
    }
}

// Repo

#[async_trait]
impl Repo<Business> for PgDatabaseAutocommit {
    async fn get(&mut self, id: &Id<Business>) -> Result<WithId<Business>> {
        get(&self.pool, id).await
    }

    async fn insert(&mut self, element: Business) -> Result<WithId<Business>> {
        insert(&self.pool, element).await
    }
}

#[async_trait]
impl Repo<Business> for PgDatabaseTransaction {
    async fn get(&mut self, id: &Id<Business>) -> Result<WithId<Business>> {
        get(&mut *self.tx, id).await
    }

    async fn insert(&mut self, element: Business) -> Result<WithId<Business>> {
        insert(&mut *self.tx, element).await
    }
}

// Business Repo

#[async_trait]
impl BusinessRepo for PgDatabaseAutocommit {
    async fn find_candidates(
        &mut self,
        filter: &CandidateFilter,
    ) -> Result<Vec<WithId<Business>>> {
        find_candidates(&self.pool, filter).await
    }

    async fn update_business(
        &mut self,
        business: WithId<Business>,
    ) -> Result<WithId<Business>> {
        update(&self.pool, business).await
    }
}

#[async_trait]
impl BusinessRepo for PgDatabaseTransaction {
    async fn find_candidates(
        &mut self,
        filter: &CandidateFilter,
    ) -> Result<Vec<WithId<Business>>> {
        find_candidates(&mut *self.tx, filter).await
    }

    async fn update_business(
        &mut self,
        business: WithId<Business>,
    ) -> Result<WithId<Business>> {
        update(&mut *self.tx, business).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use model::{business::Business, category::Category, coordinate::Coordinate};
    use utility::id::Id;

    use super::BusinessRow;
    use crate::data_model::DatabaseRow;

    fn row(category: &str, latitude: Option<f64>, longitude: Option<f64>) -> BusinessRow {
        BusinessRow {
            id: uuid::Uuid::new_v4(),
            name: "Row".to_owned(),
            category: category.to_owned(),
            description: None,
            address: None,
            phone: None,
            website: None,
            latitude,
            longitude,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn legacy_categories_are_canonicalized_on_read() {
        assert_eq!(
            row("Food & Drink", None, None).to_model().category,
            Category::Restaurants
        );
        assert_eq!(
            row("Pet Care", None, None).to_model().category,
            Category::Legacy("Pet Care".to_owned())
        );
    }

    #[test]
    fn half_a_location_is_no_location() {
        assert!(row("ART", Some(42.0), None).to_model().location.is_none());
        assert_eq!(
            row("ART", Some(42.0), Some(-76.0)).to_model().location,
            Coordinate::new(42.0, -76.0)
        );
    }

    #[test]
    fn categories_are_stored_as_codes() {
        let business = Business {
            category: Category::Entertainment,
            ..row("ART", None, None).to_model()
        };
        let stored = BusinessRow::from_model(Id::generate(), business);
        assert_eq!(stored.category, "ENTERTAINMENT");
    }
}
