//! Routes for the signed-in owner. Every handler requires a session.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, State},
    http::{Method, StatusCode},
    routing::{delete, get, on},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use discovery::{client::ProfileChanges, database::Database};
use model::{
    business::Business,
    video::{Video, VideoDraft},
    WithId,
};
use serde::Serialize;
use utility::let_also::LetAlso;

use crate::{
    api::v1::{businesses, videos},
    common::{
        request_failed, route_not_found, HateoasResult, JsonBody, RouteResult, VecResponse,
        METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::{auth::CurrentOwner, base_url::BaseUrl},
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/dashboard{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/profile", get(get_profile::<D>).put(update_profile::<D>))
        .route("/videos", get(get_videos::<D>).post(create_video::<D>))
        .route("/videos/:id", delete(delete_video::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileUpdateDto {
    business: hateoas::Response<WithId<Business>>,
    geocoded: bool,
}

async fn get_profile<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    CurrentOwner(identity): CurrentOwner,
) -> HateoasResult<WithId<Business>> {
    client
        .profile(&identity)
        .await
        .map(|business| businesses::business_hateoas(business, base_url).json())
        .map_err(|why| request_failed(why, &Method::GET, &original_uri))
}

async fn update_profile<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    CurrentOwner(identity): CurrentOwner,
    WithRejection(Json(changes), _): JsonBody<ProfileChanges>,
) -> RouteResult<Json<ProfileUpdateDto>> {
    client
        .update_profile(&identity, changes)
        .await
        .map(|update| {
            Json(ProfileUpdateDto {
                business: businesses::business_hateoas(update.business, base_url),
                geocoded: update.geocoded,
            })
        })
        .map_err(|why| request_failed(why, &Method::PUT, &original_uri))
}

async fn get_videos<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    CurrentOwner(identity): CurrentOwner,
) -> HateoasResult<VecResponse<hateoas::Response<WithId<Video>>>> {
    client
        .owner_videos(&identity)
        .await
        .map(|own| {
            own.into_iter()
                .map(|video| videos::own_video_hateoas(video, base_url.clone()))
                .collect::<Vec<_>>()
                .let_owned(|data| VecResponse::non_paginated(data).hateoas().json())
        })
        .map_err(|why| request_failed(why, &Method::GET, &original_uri))
}

async fn create_video<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    CurrentOwner(identity): CurrentOwner,
    WithRejection(Json(draft), _): JsonBody<VideoDraft>,
) -> RouteResult<(StatusCode, Json<hateoas::Response<WithId<Video>>>)> {
    client
        .create_video(&identity, draft)
        .await
        .map(|video| (StatusCode::CREATED, videos::own_video_hateoas(video, base_url).json()))
        .map_err(|why| request_failed(why, &Method::POST, &original_uri))
}

async fn delete_video<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { client, .. }): State<WebState<D>>,
    CurrentOwner(identity): CurrentOwner,
) -> RouteResult<StatusCode> {
    client
        .delete_video(&identity, &id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|why| request_failed(why, &Method::DELETE, &original_uri))
}
