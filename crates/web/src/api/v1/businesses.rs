use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{Method, StatusCode},
    routing::{get, on},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use discovery::{
    assembler::BusinessSummary,
    database::Database,
    query::{normalize, QueryDescriptor, RadiusUnit, RawQuery},
};
use model::{
    business::Business,
    review::{Review, ReviewDraft},
    WithId,
};
use utility::let_also::LetAlso;

use crate::{
    common::{
        request_failed, route_not_found, schema, HateoasResult, JsonBody, RouteResult,
        VecResponse, METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::base_url::BaseUrl,
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/businesses{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/schema", get(schema::<Business>))
        .route("/:id", get(get_business::<D>))
        .route("/:id/reviews", get(get_reviews::<D>).post(add_review::<D>))
        .route("/", get(find_businesses::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// Radius is given in meters here.
async fn find_businesses<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client, .. }): State<WebState<D>>,
    Query(raw): Query<RawQuery>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<BusinessSummary>>> {
    let query = normalize(&raw, RadiusUnit::Meters)
        .map_err(|why| request_failed(why, &Method::GET, &original_uri))?;
    let page = client
        .find_businesses(&query)
        .await
        .map_err(|why| request_failed(why, &Method::GET, &original_uri))?;

    VecResponse::from_page(page, |summary| summary_hateoas(summary, base_url.clone()))
        .let_owned(|data| hateoas::Response::builder(data, base_url))
        .link("self", original_uri.to_string())
        .link("videos", videos_around(&query))
        .debug_info("radiusMiles", query.radius_miles)
        .build()
        .let_owned(|response| Ok(Json(response)))
}

async fn get_business<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<BusinessSummary> {
    client
        .get_business(&id)
        .await
        .map(|summary| Json(summary_hateoas(summary, base_url)))
        .map_err(|why| request_failed(why, &Method::GET, &original_uri))
}

async fn get_reviews<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<WithId<Review>>> {
    client
        .get_reviews(&id)
        .await
        .map(|reviews| {
            hateoas::Response::builder(VecResponse::non_paginated(reviews), base_url)
                .link("self", resource!("/{}/reviews", id))
                .link("business", resource!("/{}", id))
                .build()
                .let_owned(Json)
        })
        .map_err(|why| request_failed(why, &Method::GET, &original_uri))
}

async fn add_review<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    WithRejection(Json(draft), _): JsonBody<ReviewDraft>,
) -> RouteResult<(StatusCode, Json<hateoas::Response<WithId<Review>>>)> {
    client
        .add_review(&id, draft)
        .await
        .map(|review| {
            let business_id = review.content.business_id;
            hateoas::Response::builder(review, base_url)
                .link("business", resource!("/{}", business_id))
                .link("reviews", resource!("/{}/reviews", business_id))
                .build()
                .let_owned(|response| (StatusCode::CREATED, Json(response)))
        })
        .map_err(|why| request_failed(why, &Method::POST, &original_uri))
}

pub(crate) fn summary_hateoas(
    summary: BusinessSummary,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<BusinessSummary> {
    let business = &summary.business.content;
    let id = business.id;
    let nearby = business.content.valid_location().map(|location| {
        resource!("?lat={}&lng={}", location.latitude, location.longitude)
    });
    hateoas::Response::builder(summary, base_url)
        .link("self", resource!("/{}", id))
        .link("reviews", resource!("/{}/reviews", id))
        .link_option("nearby", nearby)
        .build()
}

pub(crate) fn business_hateoas(
    business: WithId<Business>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<WithId<Business>> {
    let id = business.id;
    hateoas::Response::builder(business, base_url)
        .link("self", resource!("/{}", id))
        .link("reviews", resource!("/{}/reviews", id))
        .build()
}

/// The video listing for the same area and category. That endpoint takes
/// miles.
fn videos_around(query: &QueryDescriptor) -> String {
    let mut parameters = vec![];
    if let Some(center) = &query.center {
        parameters.push(format!("lat={}", center.latitude));
        parameters.push(format!("lng={}", center.longitude));
        parameters.push(format!("radius={}", query.radius_miles));
    }
    if let Some(category) = &query.category {
        parameters.push(format!("category={}", category.code()));
    }
    if parameters.is_empty() {
        crate::api::v1::videos::resource!("")
    } else {
        crate::api::v1::videos::resource!("?{}", parameters.join("&"))
    }
}
