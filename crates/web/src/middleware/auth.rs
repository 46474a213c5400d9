//! Session tokens and the extractor that resolves them to an owner.
//!
//! A token is an HS256 JWT. Clients either send it as a bearer token or
//! carry it in the `session` cookie set on login.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use discovery::{client::OwnerIdentity, database::Database};
use headers::{authorization::Bearer, Authorization};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};
use tower_cookies::{
    cookie::{time, SameSite},
    Cookie, Cookies,
};
use utility::id::Id;

use crate::{common::RouteErrorResponse, WebState};

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    business: String,
    exp: i64,
}

#[derive(Clone)]
pub struct Sessions {
    encoding: EncodingKey,
    decoding: DecodingKey,
    duration: Duration,
}

impl Sessions {
    pub fn new(secret: &[u8], duration: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            duration,
        }
    }

    pub fn issue(&self, identity: &OwnerIdentity) -> jsonwebtoken::errors::Result<String> {
        let claims = Claims {
            sub: identity.owner_id.to_string(),
            business: identity.business_id.to_string(),
            exp: (Utc::now() + self.duration).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// `None` for tampered, expired or malformed tokens.
    pub fn verify(&self, token: &str) -> Option<OwnerIdentity> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|why| debug!("Rejected session token: {}", why))
            .ok()?
            .claims;
        Some(OwnerIdentity {
            owner_id: Id::parse(&claims.sub)?,
            business_id: Id::parse(&claims.business)?,
        })
    }

    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.duration.num_seconds()))
            .build()
    }

    pub fn expired_cookie() -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, "")).path("/").build()
    }
}

/// The owner behind the request. Rejects with 401 when no valid session is
/// presented.
#[derive(Debug, Clone, Copy)]
pub struct CurrentOwner(pub OwnerIdentity);

#[async_trait]
impl<D> FromRequestParts<WebState<D>> for CurrentOwner
where
    D: Database,
{
    type Rejection = RouteErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &WebState<D>,
    ) -> Result<Self, Self::Rejection> {
        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(authorization)| authorization.token().to_owned());
        let token = match bearer {
            Some(token) => Some(token),
            None => Cookies::from_request_parts(parts, state)
                .await
                .ok()
                .and_then(|cookies| {
                    cookies
                        .get(SESSION_COOKIE)
                        .map(|cookie| cookie.value().to_owned())
                }),
        };

        token
            .and_then(|token| state.sessions.verify(&token))
            .map(CurrentOwner)
            .ok_or_else(|| {
                RouteErrorResponse::new(StatusCode::UNAUTHORIZED)
                    .with_method(&parts.method)
                    .with_uri(parts.uri.path())
                    .with_message("A valid session is required.")
            })
    }
}
