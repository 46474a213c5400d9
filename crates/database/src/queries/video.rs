use discovery::database::{DatabaseError, Result};
use model::{business::Business, video::Video, WithId};
use sqlx::{Executor, Postgres};
use utility::{id::Id, let_also::LetAlso};
use uuid::Uuid;

use super::convert_error;
use crate::data_model::{video::VideoRow, with_id, with_ids, DatabaseRow};

pub async fn get<'c, E>(executor: E, id: &Id<Video>) -> Result<WithId<Video>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, business_id, url, title, caption, thumbnail_url, created_at
        FROM
            videos
        WHERE
            id = $1;
        ",
    )
    .bind(id.raw())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: VideoRow| with_id(row))
}

pub async fn insert<'c, E>(executor: E, video: Video) -> Result<WithId<Video>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = VideoRow::from_model(Id::generate(), video);
    sqlx::query_as(
        "
        INSERT INTO videos(
            id, business_id, url, title, caption, thumbnail_url, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING
            id, business_id, url, title, caption, thumbnail_url, created_at;
        ",
    )
    .bind(row.id)
    .bind(row.business_id)
    .bind(row.url)
    .bind(row.title)
    .bind(row.caption)
    .bind(row.thumbnail_url)
    .bind(row.created_at)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: VideoRow| with_id(row))
}

pub async fn of_businesses<'c, E>(
    executor: E,
    businesses: &[Id<Business>],
) -> Result<Vec<WithId<Video>>>
where
    E: Executor<'c, Database = Postgres>,
{
    let ids = businesses.iter().map(|id| id.raw()).collect::<Vec<Uuid>>();
    sqlx::query_as(
        "
        SELECT
            id, business_id, url, title, caption, thumbnail_url, created_at
        FROM
            videos
        WHERE
            business_id = ANY($1);
        ",
    )
    .bind(ids)
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|rows: Vec<VideoRow>| Ok(with_ids(rows)))
}

pub async fn delete<'c, E>(executor: E, id: &Id<Video>) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM videos WHERE id = $1;")
        .bind(id.raw())
        .execute(executor)
        .await
        .map_err(convert_error)?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound);
    }
    Ok(())
}
