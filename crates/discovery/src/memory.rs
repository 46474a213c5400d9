//! A complete in-process store. Used by tests and for running the server
//! without Postgres.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use model::{business::Business, owner::Owner, review::Review, video::Video, WithId};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock, RwLockWriteGuard};
use utility::id::Id;

use crate::database::{
    BusinessRepo, CandidateFilter, Database, DatabaseAutocommit, DatabaseError,
    DatabaseOperations, DatabaseTransaction, OwnerRepo, Repo, Result, ReviewRepo,
    VideoRepo,
};

#[derive(Debug, Clone, Default)]
pub struct Tables {
    businesses: IndexMap<Id<Business>, Business>,
    videos: IndexMap<Id<Video>, Video>,
    reviews: IndexMap<Id<Review>, Review>,
    owners: IndexMap<Id<Owner>, Owner>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MemoryAutocommit {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryAutocommit {
    async fn lock(&mut self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().await
    }
}

/// Holds the store's write lock for its whole lifetime and works on a staged
/// copy. Dropping it without `commit` discards every change.
pub struct MemoryTransaction {
    guard: OwnedRwLockWriteGuard<Tables>,
    staged: Tables,
}

impl MemoryTransaction {
    async fn lock(&mut self) -> &mut Tables {
        &mut self.staged
    }
}

macro_rules! impl_memory_repos {
    ($handle:ty) => {
        #[async_trait]
        impl Repo<Business> for $handle {
            async fn get(&mut self, id: &Id<Business>) -> Result<WithId<Business>> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                tables
                    .businesses
                    .get(id)
                    .map(|business| WithId::new(*id, business.clone()))
                    .ok_or(DatabaseError::NotFound)
            }

            async fn insert(&mut self, element: Business) -> Result<WithId<Business>> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                let id = Id::generate();
                tables.businesses.insert(id, element.clone());
                Ok(WithId::new(id, element))
            }
        }

        #[async_trait]
        impl BusinessRepo for $handle {
            async fn find_candidates(
                &mut self,
                filter: &CandidateFilter,
            ) -> Result<Vec<WithId<Business>>> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                Ok(tables
                    .businesses
                    .iter()
                    .filter(|(_, business)| filter.matches(business))
                    .map(|(id, business)| WithId::new(*id, business.clone()))
                    .collect())
            }

            async fn update_business(
                &mut self,
                business: WithId<Business>,
            ) -> Result<WithId<Business>> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                match tables.businesses.get_mut(&business.id) {
                    Some(stored) => {
                        *stored = business.content.clone();
                        Ok(business)
                    }
                    None => Err(DatabaseError::NotFound),
                }
            }
        }

        #[async_trait]
        impl Repo<Video> for $handle {
            async fn get(&mut self, id: &Id<Video>) -> Result<WithId<Video>> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                tables
                    .videos
                    .get(id)
                    .map(|video| WithId::new(*id, video.clone()))
                    .ok_or(DatabaseError::NotFound)
            }

            async fn insert(&mut self, element: Video) -> Result<WithId<Video>> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                if !tables.businesses.contains_key(&element.business_id) {
                    return Err(DatabaseError::NotFound);
                }
                let id = Id::generate();
                tables.videos.insert(id, element.clone());
                Ok(WithId::new(id, element))
            }
        }

        #[async_trait]
        impl VideoRepo for $handle {
            async fn videos_of_businesses(
                &mut self,
                businesses: &[Id<Business>],
            ) -> Result<Vec<WithId<Video>>> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                Ok(tables
                    .videos
                    .iter()
                    .filter(|(_, video)| businesses.contains(&video.business_id))
                    .map(|(id, video)| WithId::new(*id, video.clone()))
                    .collect())
            }

            async fn delete_video(&mut self, id: &Id<Video>) -> Result<()> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                tables
                    .videos
                    .shift_remove(id)
                    .map(|_| ())
                    .ok_or(DatabaseError::NotFound)
            }
        }

        #[async_trait]
        impl Repo<Review> for $handle {
            async fn get(&mut self, id: &Id<Review>) -> Result<WithId<Review>> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                tables
                    .reviews
                    .get(id)
                    .map(|review| WithId::new(*id, review.clone()))
                    .ok_or(DatabaseError::NotFound)
            }

            async fn insert(&mut self, element: Review) -> Result<WithId<Review>> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                if !tables.businesses.contains_key(&element.business_id) {
                    return Err(DatabaseError::NotFound);
                }
                let id = Id::generate();
                tables.reviews.insert(id, element.clone());
                Ok(WithId::new(id, element))
            }
        }

        #[async_trait]
        impl ReviewRepo for $handle {
            async fn reviews_of_businesses(
                &mut self,
                businesses: &[Id<Business>],
            ) -> Result<Vec<WithId<Review>>> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                Ok(tables
                    .reviews
                    .iter()
                    .filter(|(_, review)| businesses.contains(&review.business_id))
                    .map(|(id, review)| WithId::new(*id, review.clone()))
                    .collect())
            }
        }

        #[async_trait]
        impl Repo<Owner> for $handle {
            async fn get(&mut self, id: &Id<Owner>) -> Result<WithId<Owner>> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                tables
                    .owners
                    .get(id)
                    .map(|owner| WithId::new(*id, owner.clone()))
                    .ok_or(DatabaseError::NotFound)
            }

            async fn insert(&mut self, element: Owner) -> Result<WithId<Owner>> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                if tables
                    .owners
                    .values()
                    .any(|owner| owner.email.eq_ignore_ascii_case(&element.email))
                {
                    return Err(DatabaseError::Conflict(format!(
                        "email '{}' is already registered",
                        element.email
                    )));
                }
                if !tables.businesses.contains_key(&element.business_id) {
                    return Err(DatabaseError::NotFound);
                }
                let id = Id::generate();
                tables.owners.insert(id, element.clone());
                Ok(WithId::new(id, element))
            }
        }

        #[async_trait]
        impl OwnerRepo for $handle {
            async fn owner_by_email(&mut self, email: &str) -> Result<Option<WithId<Owner>>> {
                let mut guard = self.lock().await;
                let tables: &mut Tables = &mut guard;
                Ok(tables
                    .owners
                    .iter()
                    .find(|(_, owner)| owner.email.eq_ignore_ascii_case(email))
                    .map(|(id, owner)| WithId::new(*id, owner.clone())))
            }
        }

        #[async_trait]
        impl DatabaseOperations for $handle {}
    };
}

impl_memory_repos!(MemoryAutocommit);
impl_memory_repos!(MemoryTransaction);

impl DatabaseAutocommit for MemoryAutocommit {}

#[async_trait]
impl DatabaseTransaction for MemoryTransaction {
    async fn commit(self) -> Result<()> {
        let MemoryTransaction { mut guard, staged } = self;
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    type Transaction = MemoryTransaction;
    type Autocommit = MemoryAutocommit;

    async fn transaction(&self) -> Result<MemoryTransaction> {
        let guard = self.tables.clone().write_owned().await;
        let staged = guard.clone();
        Ok(MemoryTransaction { guard, staged })
    }

    fn auto(&self) -> MemoryAutocommit {
        MemoryAutocommit {
            tables: self.tables.clone(),
        }
    }
}
