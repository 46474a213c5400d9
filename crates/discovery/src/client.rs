use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use model::{
    business::{Business, BusinessDraft},
    category::Category,
    coordinate::Coordinate,
    owner::Owner,
    review::{Review, ReviewDraft, MAX_COMMENT_LENGTH, MAX_RATING, MIN_RATING},
    video::{Video, VideoDraft},
    WithDistance, WithId,
};
use serde::{Deserialize, Serialize};
use utility::{
    id::Id,
    let_also::LetAlso,
    serde::{patch_string, Patch},
};

use crate::{
    assembler::{self, BusinessSummary, Page, VideoWithBusiness},
    credentials::{Credentials, MIN_PASSWORD_LENGTH},
    database::{
        BusinessRepo, Database, DatabaseTransaction, OwnerRepo, Repo, ReviewRepo,
        VideoRepo,
    },
    geocoding::Geocoder,
    not_found_to_none, proximity,
    query::QueryDescriptor,
    RequestError, RequestResult,
};

const INVALID_LOGIN: &str = "invalid email or password";

/// Who is making an authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerIdentity {
    pub owner_id: Id<Owner>,
    pub business_id: Id<Business>,
}

impl From<&WithId<Owner>> for OwnerIdentity {
    fn from(owner: &WithId<Owner>) -> Self {
        Self {
            owner_id: owner.id,
            business_id: owner.content.business_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub business: BusinessDraft,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub owner: OwnerIdentity,
    pub business: WithId<Business>,
    pub geocoded: bool,
}

/// Partial profile edit. Absent fields stay unchanged; optional fields set to
/// `null` or `""` are cleared.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(deserialize_with = "patch_string::deserialize")]
    pub description: Patch<String>,
    #[serde(deserialize_with = "patch_string::deserialize")]
    pub address: Patch<String>,
    #[serde(deserialize_with = "patch_string::deserialize")]
    pub phone: Patch<String>,
    #[serde(deserialize_with = "patch_string::deserialize")]
    pub website: Patch<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub business: WithId<Business>,
    pub geocoded: bool,
}

#[derive(Clone)]
pub struct Client<D>
where
    D: Database,
{
    pub database: D,
    geocoder: Arc<dyn Geocoder>,
    credentials: Credentials,
}

impl<D> Client<D>
where
    D: Database,
{
    pub fn new(database: D, geocoder: Arc<dyn Geocoder>, credentials: Credentials) -> Self {
        Self {
            database,
            geocoder,
            credentials,
        }
    }

    pub fn categories(&self) -> Vec<Category> {
        Category::CANONICAL.to_vec()
    }

    /// Geocodes an address. Failures are logged and reported as `None`; they
    /// never fail the surrounding write.
    async fn locate(&self, address: Option<&str>) -> Option<Coordinate> {
        let address = address?;
        match self.geocoder.geocode(address).await {
            Ok(coordinate) => Some(coordinate),
            Err(why) => {
                warn!("Could not geocode '{}': {}", address, why);
                None
            }
        }
    }
}

/// Discovery.
impl<D> Client<D>
where
    D: Database,
{
    pub async fn find_businesses(
        &self,
        query: &QueryDescriptor,
    ) -> RequestResult<Page<BusinessSummary>> {
        let filter = proximity::compose(query);
        let mut auto = self.database.auto();
        let candidates = auto.find_candidates(&filter).await?;
        let page = proximity::filter(query, candidates).let_owned(|matched| {
            assembler::rank(matched, query)
        });

        let ids = page
            .items
            .iter()
            .map(|business| business.content.id)
            .collect::<Vec<_>>();
        let videos = auto.videos_of_businesses(&ids).await?;
        let reviews = auto.reviews_of_businesses(&ids).await?;
        Ok(page.map_items(|businesses| assembler::summarize(businesses, videos, reviews)))
    }

    pub async fn find_videos(
        &self,
        query: &QueryDescriptor,
    ) -> RequestResult<Page<WithDistance<VideoWithBusiness>>> {
        let filter = proximity::compose(query);
        let mut auto = self.database.auto();
        let candidates = auto.find_candidates(&filter).await?;
        let matched = proximity::filter(query, candidates);

        let ids = matched
            .iter()
            .map(|business| business.content.id)
            .collect::<Vec<_>>();
        let videos = auto.videos_of_businesses(&ids).await?;
        assembler::join_videos(&matched, videos)
            .let_owned(|joined| Ok(assembler::rank(joined, query)))
    }

    /// A malformed id is treated like an unknown one.
    pub async fn get_business(&self, id: &str) -> RequestResult<BusinessSummary> {
        let id = Id::<Business>::parse(id).ok_or(RequestError::NotFound)?;
        let mut auto = self.database.auto();
        let business = Repo::<Business>::get(&mut auto, &id).await?;
        let videos = auto.videos_of_businesses(&[id]).await?;
        let reviews = auto.reviews_of_businesses(&[id]).await?;
        assembler::summarize(
            vec![WithDistance::without_distance(business)],
            videos,
            reviews,
        )
        .pop()
        .ok_or(RequestError::NotFound)
    }

    pub async fn get_video(&self, id: &str) -> RequestResult<VideoWithBusiness> {
        let id = Id::<Video>::parse(id).ok_or(RequestError::NotFound)?;
        let mut auto = self.database.auto();
        let video = Repo::<Video>::get(&mut auto, &id).await?;
        let business = Repo::<Business>::get(&mut auto, &video.content.business_id)
            .await
            .map_err(RequestError::from)
            .let_owned(not_found_to_none)?;
        match business {
            Some(business) => Ok(VideoWithBusiness { video, business }),
            None => {
                debug!("Video {} points at a missing business", video.id);
                Err(RequestError::NotFound)
            }
        }
    }

    pub async fn get_reviews(&self, business_id: &str) -> RequestResult<Vec<WithId<Review>>> {
        let id = Id::<Business>::parse(business_id).ok_or(RequestError::NotFound)?;
        let mut auto = self.database.auto();
        Repo::<Business>::get(&mut auto, &id).await?;
        let mut reviews = auto.reviews_of_businesses(&[id]).await?;
        assembler::newest_first(&mut reviews);
        Ok(reviews)
    }

    pub async fn add_review(
        &self,
        business_id: &str,
        draft: ReviewDraft,
    ) -> RequestResult<WithId<Review>> {
        let id = Id::<Business>::parse(business_id).ok_or(RequestError::NotFound)?;
        if draft.rating < i64::from(MIN_RATING) || draft.rating > i64::from(MAX_RATING) {
            return Err(RequestError::validation(format!(
                "rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }
        let comment = draft.comment.trim().to_owned();
        if comment.chars().count() > MAX_COMMENT_LENGTH {
            return Err(RequestError::validation(format!(
                "comment must be at most {} characters",
                MAX_COMMENT_LENGTH
            )));
        }

        let mut auto = self.database.auto();
        Repo::<Business>::get(&mut auto, &id).await?;
        let review = Repo::<Review>::insert(
            &mut auto,
            Review {
                business_id: id,
                rating: draft.rating as u8,
                comment,
                created_at: Utc::now(),
            },
        )
        .await?;
        info!("Added review {} for business {}", review.id, id);
        Ok(review)
    }
}

/// Accounts and sessions.
impl<D> Client<D>
where
    D: Database,
{
    pub async fn register(&self, request: RegistrationRequest) -> RequestResult<Registration> {
        let email = normalize_email(&request.email)?;
        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(RequestError::validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        let draft = request.business;
        let name = required(&draft.name, "business name")?;
        let category = Category::from_label(&draft.category)
            .ok_or_else(|| RequestError::UnknownCategory(draft.category.clone()))?;
        let address = optional(draft.address.as_deref());

        let location = self.locate(address.as_deref()).await;
        let credentials = self.credentials;
        let password = request.password;
        let password_hash =
            tokio::task::spawn_blocking(move || credentials.hash_password(&password)).await?;

        let now = Utc::now();
        let mut transaction = self.database.transaction().await?;
        if transaction.owner_by_email(&email).await?.is_some() {
            return Err(RequestError::Conflict(format!(
                "email '{}' is already registered",
                email
            )));
        }
        let business = Repo::<Business>::insert(
            &mut transaction,
            Business {
                name,
                category,
                description: optional(draft.description.as_deref()),
                address,
                phone: optional(draft.phone.as_deref()),
                website: optional(draft.website.as_deref()),
                location,
                created_at: now,
                updated_at: now,
            },
        )
        .await?;
        let owner = Repo::<Owner>::insert(
            &mut transaction,
            Owner {
                email,
                password_hash,
                business_id: business.id,
                created_at: now,
            },
        )
        .await?;
        transaction.commit().await?;

        info!(
            "Registered owner {} for business {} ({}), geocoded: {}",
            owner.id,
            business.id,
            business.content.name,
            location.is_some()
        );
        Ok(Registration {
            owner: OwnerIdentity::from(&owner),
            business,
            geocoded: location.is_some(),
        })
    }

    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> RequestResult<OwnerIdentity> {
        let email = email.trim().to_lowercase();
        let owner = self.database.auto().owner_by_email(&email).await?;
        let Some(owner) = owner else {
            warn!("Failed login for unknown email '{}'", email);
            return Err(RequestError::Unauthorized(INVALID_LOGIN.to_owned()));
        };

        let credentials = self.credentials;
        let password = password.to_owned();
        let stored = owner.content.password_hash.clone();
        let verified =
            tokio::task::spawn_blocking(move || credentials.verify_password(&password, &stored))
                .await?;
        if !verified {
            warn!("Failed login for owner {}", owner.id);
            return Err(RequestError::Unauthorized(INVALID_LOGIN.to_owned()));
        }
        Ok(OwnerIdentity::from(&owner))
    }

    /// The owner behind a session. Sessions of owners that no longer exist
    /// are rejected.
    pub async fn owner(&self, identity: &OwnerIdentity) -> RequestResult<WithId<Owner>> {
        Repo::<Owner>::get(&mut self.database.auto(), &identity.owner_id)
            .await
            .map_err(RequestError::from)
            .let_owned(not_found_to_none)?
            .ok_or_else(|| RequestError::Unauthorized("unknown session owner".to_owned()))
    }
}

/// Dashboard.
impl<D> Client<D>
where
    D: Database,
{
    pub async fn profile(&self, identity: &OwnerIdentity) -> RequestResult<WithId<Business>> {
        Ok(Repo::<Business>::get(&mut self.database.auto(), &identity.business_id).await?)
    }

    /// Applies a partial edit. The address is only geocoded again when it
    /// actually changed; if that fails the old location is dropped.
    pub async fn update_profile(
        &self,
        identity: &OwnerIdentity,
        changes: ProfileChanges,
    ) -> RequestResult<ProfileUpdate> {
        let mut auto = self.database.auto();
        let mut business = Repo::<Business>::get(&mut auto, &identity.business_id).await?;
        let content = &mut business.content;

        if let Some(name) = changes.name.as_deref() {
            content.name = required(name, "business name")?;
        }
        if let Some(label) = changes.category.as_deref() {
            content.category = Category::from_label(label)
                .ok_or_else(|| RequestError::UnknownCategory(label.to_owned()))?;
        }
        content.description = changes.description.apply(content.description.take());
        content.phone = changes.phone.apply(content.phone.take());
        content.website = changes.website.apply(content.website.take());

        let address = changes.address.apply(content.address.clone());
        if address != content.address {
            content.location = self.locate(address.as_deref()).await;
            content.address = address;
        }
        content.updated_at = Utc::now();
        let geocoded = content.location.is_some();

        let business = auto.update_business(business).await?;
        info!("Updated profile of business {}", business.id);
        Ok(ProfileUpdate { business, geocoded })
    }

    pub async fn owner_videos(
        &self,
        identity: &OwnerIdentity,
    ) -> RequestResult<Vec<WithId<Video>>> {
        let mut videos = self
            .database
            .auto()
            .videos_of_businesses(&[identity.business_id])
            .await?;
        assembler::newest_first(&mut videos);
        Ok(videos)
    }

    pub async fn create_video(
        &self,
        identity: &OwnerIdentity,
        draft: VideoDraft,
    ) -> RequestResult<WithId<Video>> {
        let url = required(&draft.url, "url")?;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(RequestError::validation("url must be an http(s) address"));
        }
        let video = Repo::<Video>::insert(
            &mut self.database.auto(),
            Video {
                business_id: identity.business_id,
                url,
                title: optional(draft.title.as_deref()),
                caption: optional(draft.caption.as_deref()),
                thumbnail_url: optional(draft.thumbnail_url.as_deref()),
                created_at: Utc::now(),
            },
        )
        .await?;
        info!(
            "Business {} published video {}",
            identity.business_id, video.id
        );
        Ok(video)
    }

    /// Only the owning business may delete a video.
    pub async fn delete_video(&self, identity: &OwnerIdentity, id: &str) -> RequestResult<()> {
        let id = Id::<Video>::parse(id).ok_or(RequestError::NotFound)?;
        let mut auto = self.database.auto();
        let video = Repo::<Video>::get(&mut auto, &id).await?;
        if video.content.business_id != identity.business_id {
            warn!(
                "Business {} tried to delete video {} of business {}",
                identity.business_id, id, video.content.business_id
            );
            return Err(RequestError::Forbidden);
        }
        auto.delete_video(&id).await?;
        info!("Business {} deleted video {}", identity.business_id, id);
        Ok(())
    }
}

fn normalize_email(email: &str) -> RequestResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(RequestError::validation("a valid email address is required")),
    }
}

fn required(value: &str, name: &str) -> RequestResult<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(RequestError::validation(format!("{} is required", name)))
    } else {
        Ok(value.to_owned())
    }
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, optional, ProfileChanges};
    use utility::serde::Patch;

    #[test]
    fn emails_are_lowercased() {
        assert_eq!(
            normalize_email(" Owner@Example.COM ").unwrap(),
            "owner@example.com"
        );
        assert!(normalize_email("owner").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("owner@localhost").is_err());
    }

    #[test]
    fn blank_optionals_are_absent() {
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(Some(" x ")), Some("x".to_owned()));
        assert_eq!(optional(None), None);
    }

    #[test]
    fn profile_changes_distinguish_keep_and_clear() {
        let changes: ProfileChanges = serde_json::from_value(serde_json::json!({
            "phone": null,
            "website": "",
            "address": "1 Main St",
        }))
        .unwrap();
        assert_eq!(changes.name, None);
        assert_eq!(changes.description, Patch::Keep);
        assert_eq!(changes.phone, Patch::Clear);
        assert_eq!(changes.website, Patch::Clear);
        assert_eq!(changes.address, Patch::Set("1 Main St".to_owned()));
    }
}
