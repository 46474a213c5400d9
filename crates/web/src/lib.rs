pub use crate::common::RouteResult;

use std::sync::Arc;

use axum::{routing::get_service, Router};
use discovery::{client::Client, database::Database};
use log::info;
use tokio::net::TcpListener;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{config::WebConfig, middleware::auth::Sessions};

pub mod api;
pub mod common;
pub mod config;
pub mod hateoas;
pub mod middleware;

pub struct WebState<D: Database> {
    pub client: Client<D>,
    pub sessions: Arc<Sessions>,
}

impl<D: Database> Clone for WebState<D> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

impl<D: Database> WebState<D> {
    pub fn new(client: Client<D>, sessions: Sessions) -> Self {
        Self {
            client,
            sessions: Arc::new(sessions),
        }
    }
}

/// The complete application: the api under `/api` and the static frontend
/// everywhere else.
pub fn app<D: Database>(state: WebState<D>, static_dir: &str) -> Router {
    Router::new()
        .nest_service("/api", api::routes(state))
        .fallback_service(static_content_router(static_dir))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
}

pub async fn start_web_server<D: Database>(
    state: WebState<D>,
    config: &WebConfig,
) -> std::io::Result<()> {
    let routes = app(state, &config.static_dir);

    let listener = TcpListener::bind(config.bind_address).await?;
    info!("Listening on {}", config.bind_address);
    axum::serve(listener, routes.into_make_service()).await?;

    Ok(())
}

fn static_content_router(static_dir: &str) -> Router {
    let static_dir = static_dir.trim_end_matches('/');
    Router::new().fallback_service(get_service(
        ServeDir::new(static_dir)
            .not_found_service(ServeFile::new(format!("{}/index.html", static_dir))),
    ))
}
