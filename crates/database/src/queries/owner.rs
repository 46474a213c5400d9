use discovery::database::Result;
use model::{owner::Owner, WithId};
use sqlx::{Executor, Postgres};
use utility::id::Id;

use super::convert_error;
use crate::data_model::{owner::OwnerRow, with_id, DatabaseRow};

pub async fn get<'c, E>(executor: E, id: &Id<Owner>) -> Result<WithId<Owner>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, email, password_hash, business_id, created_at
        FROM
            owners
        WHERE
            id = $1;
        ",
    )
    .bind(id.raw())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: OwnerRow| with_id(row))
}

/// Fails with `Conflict` if the email is taken, ignoring case.
pub async fn insert<'c, E>(executor: E, owner: Owner) -> Result<WithId<Owner>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = OwnerRow::from_model(Id::generate(), owner);
    sqlx::query_as(
        "
        INSERT INTO owners(id, email, password_hash, business_id, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, email, password_hash, business_id, created_at;
        ",
    )
    .bind(row.id)
    .bind(row.email)
    .bind(row.password_hash)
    .bind(row.business_id)
    .bind(row.created_at)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: OwnerRow| with_id(row))
}

pub async fn by_email<'c, E>(executor: E, email: &str) -> Result<Option<WithId<Owner>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, email, password_hash, business_id, created_at
        FROM
            owners
        WHERE
            LOWER(email) = LOWER($1);
        ",
    )
    .bind(email)
    .fetch_optional(executor)
    .await
    .map_err(convert_error)
    .map(|row: Option<OwnerRow>| row.map(with_id))
}
