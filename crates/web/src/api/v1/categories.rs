use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, on},
    Extension, Router,
};
use discovery::database::Database;
use model::category::Category;
use serde::Serialize;
use utility::let_also::LetAlso;

use crate::{
    api::v1::{businesses, videos},
    common::{route_not_found, HateoasResult, VecResponse, METHOD_FILTER_ALL},
    hateoas,
    middleware::base_url::BaseUrl,
    WebState,
};

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/", get(get_categories::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryDto {
    code: String,
    label: String,
}

async fn get_categories<D: Database>(
    State(WebState { client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<CategoryDto>>> {
    client
        .categories()
        .into_iter()
        .map(|category| category_hateoas(category, base_url.clone()))
        .collect::<Vec<_>>()
        .let_owned(|data| Ok(VecResponse::non_paginated(data).hateoas().json()))
}

fn category_hateoas(
    category: Category,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<CategoryDto> {
    let code = category.code().to_owned();
    hateoas::Response::builder(
        CategoryDto {
            code: code.clone(),
            label: category.display_label().to_owned(),
        },
        base_url,
    )
    .link("businesses", businesses::resource!("?category={}", code))
    .link("videos", videos::resource!("?category={}", code))
    .build()
}
