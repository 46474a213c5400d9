use axum::{
    middleware::from_fn,
    routing::{get, on},
    Router,
};
use discovery::database::Database;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    middleware::base_url::base_url_middleware,
    WebState,
};

mod auth;
mod businesses;
mod categories;
mod dashboard;
mod videos;

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::resource!("/v1{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/feed", get(videos::find_videos::<D>))
        .nest_service("/businesses", businesses::routes(state.clone()))
        .nest_service("/videos", videos::routes(state.clone()))
        .nest_service("/categories", categories::routes(state.clone()))
        .nest_service("/auth", auth::routes(state.clone()))
        .nest_service("/dashboard", dashboard::routes(state.clone()))
        .layer(from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}
