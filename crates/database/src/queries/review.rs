use discovery::database::Result;
use model::{business::Business, review::Review, WithId};
use sqlx::{Executor, Postgres};
use utility::{id::Id, let_also::LetAlso};
use uuid::Uuid;

use super::convert_error;
use crate::data_model::{review::ReviewRow, with_id, with_ids, DatabaseRow};

pub async fn get<'c, E>(executor: E, id: &Id<Review>) -> Result<WithId<Review>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "SELECT id, business_id, rating, comment, created_at FROM reviews WHERE id = $1;",
    )
    .bind(id.raw())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: ReviewRow| with_id(row))
}

pub async fn insert<'c, E>(executor: E, review: Review) -> Result<WithId<Review>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = ReviewRow::from_model(Id::generate(), review);
    sqlx::query_as(
        "
        INSERT INTO reviews(id, business_id, rating, comment, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, business_id, rating, comment, created_at;
        ",
    )
    .bind(row.id)
    .bind(row.business_id)
    .bind(row.rating)
    .bind(row.comment)
    .bind(row.created_at)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: ReviewRow| with_id(row))
}

pub async fn of_businesses<'c, E>(
    executor: E,
    businesses: &[Id<Business>],
) -> Result<Vec<WithId<Review>>>
where
    E: Executor<'c, Database = Postgres>,
{
    let ids = businesses.iter().map(|id| id.raw()).collect::<Vec<Uuid>>();
    sqlx::query_as(
        "
        SELECT
            id, business_id, rating, comment, created_at
        FROM
            reviews
        WHERE
            business_id = ANY($1);
        ",
    )
    .bind(ids)
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|rows: Vec<ReviewRow>| Ok(with_ids(rows)))
}
