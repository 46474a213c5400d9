use chrono::{DateTime, Utc};
use serde::Serialize;
use utility::id::{HasId, Id};
use uuid::Uuid;

use crate::business::Business;

/// A business owner account. Every owner manages exactly one business.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub business_id: Id<Business>,
    pub created_at: DateTime<Utc>,
}

impl HasId for Owner {
    type IdType = Uuid;
}
