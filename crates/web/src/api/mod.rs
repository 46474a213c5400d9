use axum::{response::IntoResponse, routing::get, Json, Router};
use discovery::database::Database;
use serde_json::json;

pub mod v1;

use crate::WebState;

macro_rules! resource {
    ($($arg:tt)*) => {
        format!("/api{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

/// `/api/v1/...` is canonical. The unversioned `/api/...` paths answer the
/// same requests for older clients.
pub fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .nest_service("/v1", v1::routes(state.clone()))
        .fallback_service(v1::routes(state))
}

async fn ping() -> impl IntoResponse {
    Json(json!({
        "message": "pong!"
    }))
}
