use std::sync::Arc;

use axum::{
    extract::{OriginalUri, State},
    http::{Method, StatusCode, Uri},
    routing::{get, on, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use discovery::{
    client::{OwnerIdentity, RegistrationRequest},
    database::Database,
};
use log::error;
use model::{business::Business, owner::Owner, WithId};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    api::v1::{businesses, dashboard},
    common::{
        request_failed, route_not_found, HateoasResult, JsonBody, RouteErrorResponse,
        RouteResult, METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::{
        auth::{CurrentOwner, Sessions},
        base_url::BaseUrl,
    },
    WebState,
};

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/register", post(register::<D>))
        .route("/login", post(login::<D>))
        .route("/logout", post(logout))
        .route("/me", get(me::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    token: String,
    owner: OwnerIdentity,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationDto {
    #[serde(flatten)]
    session: Session,
    business: hateoas::Response<WithId<Business>>,
    geocoded: bool,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Issues a token for `owner` and sets it as the session cookie.
fn start_session(
    sessions: &Sessions,
    cookies: &Cookies,
    owner: OwnerIdentity,
    method: &Method,
    uri: &Uri,
) -> RouteResult<Session> {
    let token = sessions.issue(&owner).map_err(|why| {
        error!("Could not issue session token: {}", why);
        RouteErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
            .with_method(method)
            .with_uri(uri.path())
            .with_default_message()
    })?;
    cookies.add(sessions.cookie(token.clone()));
    Ok(Session { token, owner })
}

async fn register<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client, sessions }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    cookies: Cookies,
    WithRejection(Json(request), _): JsonBody<RegistrationRequest>,
) -> RouteResult<(StatusCode, Json<hateoas::Response<RegistrationDto>>)> {
    let registration = client
        .register(request)
        .await
        .map_err(|why| request_failed(why, &Method::POST, &original_uri))?;
    let session = start_session(
        &sessions,
        &cookies,
        registration.owner,
        &Method::POST,
        &original_uri,
    )?;

    let dto = RegistrationDto {
        session,
        business: businesses::business_hateoas(registration.business, base_url.clone()),
        geocoded: registration.geocoded,
    };
    let response = hateoas::Response::builder(dto, base_url)
        .link("me", crate::api::v1::resource!("/auth/me"))
        .link("profile", dashboard::resource!("/profile"))
        .build();
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client, sessions }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    cookies: Cookies,
    WithRejection(Json(request), _): JsonBody<LoginRequest>,
) -> HateoasResult<Session> {
    let owner = client
        .login(&request.email, &request.password)
        .await
        .map_err(|why| request_failed(why, &Method::POST, &original_uri))?;
    let session = start_session(&sessions, &cookies, owner, &Method::POST, &original_uri)?;
    Ok(hateoas::Response::builder(session, base_url)
        .link("me", crate::api::v1::resource!("/auth/me"))
        .link("profile", dashboard::resource!("/profile"))
        .build()
        .json())
}

/// Tokens are stateless, so logging out only drops the cookie.
async fn logout(cookies: Cookies) -> StatusCode {
    cookies.remove(Sessions::expired_cookie());
    StatusCode::NO_CONTENT
}

async fn me<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    CurrentOwner(identity): CurrentOwner,
) -> HateoasResult<WithId<Owner>> {
    client
        .owner(&identity)
        .await
        .map(|owner| {
            hateoas::Response::builder(owner, base_url)
                .link("business", businesses::resource!("/{}", identity.business_id))
                .link("profile", dashboard::resource!("/profile"))
                .build()
                .json()
        })
        .map_err(|why| request_failed(why, &Method::GET, &original_uri))
}
