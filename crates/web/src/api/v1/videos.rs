use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::Method,
    routing::{get, on},
    Extension, Json, Router,
};
use discovery::{
    assembler::VideoWithBusiness,
    database::Database,
    query::{normalize, RadiusUnit, RawQuery},
};
use model::{video::Video, WithDistance, WithId};
use utility::let_also::LetAlso;

use crate::{
    api::v1::businesses,
    common::{
        request_failed, route_not_found, schema, HateoasResult, VecResponse, METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::base_url::BaseUrl,
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/videos{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/schema", get(schema::<Video>))
        .route("/:id", get(get_video::<D>))
        .route("/", get(find_videos::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// Also served as `/feed`. Radius is given in miles here.
pub(crate) async fn find_videos<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client, .. }): State<WebState<D>>,
    Query(raw): Query<RawQuery>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<WithDistance<VideoWithBusiness>>>> {
    let query = normalize(&raw, RadiusUnit::Miles)
        .map_err(|why| request_failed(why, &Method::GET, &original_uri))?;
    let page = client
        .find_videos(&query)
        .await
        .map_err(|why| request_failed(why, &Method::GET, &original_uri))?;

    VecResponse::from_page(page, |video| video_hateoas(video, base_url.clone()))
        .let_owned(|data| hateoas::Response::builder(data, base_url))
        .link("self", original_uri.to_string())
        .build()
        .let_owned(|response| Ok(Json(response)))
}

async fn get_video<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<WithDistance<VideoWithBusiness>> {
    client
        .get_video(&id)
        .await
        .map(|video| Json(video_hateoas(WithDistance::without_distance(video), base_url)))
        .map_err(|why| request_failed(why, &Method::GET, &original_uri))
}

fn video_hateoas(
    video: WithDistance<VideoWithBusiness>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<WithDistance<VideoWithBusiness>> {
    let id = video.content.video.id;
    let business_id = video.content.business.id;
    hateoas::Response::builder(video, base_url)
        .link("self", resource!("/{}", id))
        .link("business", businesses::resource!("/{}", business_id))
        .link("reviews", businesses::resource!("/{}/reviews", business_id))
        .build()
}

pub(crate) fn own_video_hateoas(
    video: WithId<Video>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<WithId<Video>> {
    let id = video.id;
    let business_id = video.content.business_id;
    hateoas::Response::builder(video, base_url)
        .link("self", resource!("/{}", id))
        .link("business", businesses::resource!("/{}", business_id))
        .build()
}
