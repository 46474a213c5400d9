use discovery::database::{CandidateFilter, Result};
use model::{business::Business, category::Category, WithId};
use sqlx::{Executor, Postgres};
use utility::{id::Id, let_also::LetAlso};

use super::convert_error;
use crate::data_model::{business::BusinessRow, with_id, with_ids, DatabaseRow};

const COLUMNS: &str = "
    id, name, category, description, address, phone, website,
    latitude, longitude, created_at, updated_at
";

pub async fn get<'c, E>(executor: E, id: &Id<Business>) -> Result<WithId<Business>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(&format!("SELECT {} FROM businesses WHERE id = $1;", COLUMNS))
        .bind(id.raw())
        .fetch_one(executor)
        .await
        .map_err(convert_error)
        .map(|row: BusinessRow| with_id(row))
}

pub async fn insert<'c, E>(executor: E, business: Business) -> Result<WithId<Business>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = BusinessRow::from_model(Id::generate(), business);
    sqlx::query_as(&format!(
        "
        INSERT INTO businesses(
            id, name, category, description, address, phone, website,
            latitude, longitude, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {};
        ",
        COLUMNS
    ))
    .bind(row.id)
    .bind(row.name)
    .bind(row.category)
    .bind(row.description)
    .bind(row.address)
    .bind(row.phone)
    .bind(row.website)
    .bind(row.latitude)
    .bind(row.longitude)
    .bind(row.created_at)
    .bind(row.updated_at)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: BusinessRow| with_id(row))
}

pub async fn update<'c, E>(
    executor: E,
    business: WithId<Business>,
) -> Result<WithId<Business>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = BusinessRow::from_model(business.id, business.content);
    sqlx::query_as(&format!(
        "
        UPDATE businesses SET
            name = $2,
            category = $3,
            description = $4,
            address = $5,
            phone = $6,
            website = $7,
            latitude = $8,
            longitude = $9,
            updated_at = $10
        WHERE id = $1
        RETURNING {};
        ",
        COLUMNS
    ))
    .bind(row.id)
    .bind(row.name)
    .bind(row.category)
    .bind(row.description)
    .bind(row.address)
    .bind(row.phone)
    .bind(row.website)
    .bind(row.latitude)
    .bind(row.longitude)
    .bind(row.updated_at)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: BusinessRow| with_id(row))
}

/// Narrows businesses down by category and bounding box.
///
/// Rows with a non-canonical category are always returned so that legacy
/// labels which map onto the requested category are not lost; the exact
/// category and radius checks happen in the proximity filter.
pub async fn find_candidates<'c, E>(
    executor: E,
    filter: &CandidateFilter,
) -> Result<Vec<WithId<Business>>>
where
    E: Executor<'c, Database = Postgres>,
{
    let canonical = Category::CANONICAL
        .iter()
        .map(|category| category.code().to_owned())
        .collect::<Vec<String>>();
    let category = filter
        .category
        .as_ref()
        .map(|category| category.code().to_owned());
    let bounds = filter.bounds.as_ref();

    sqlx::query_as(&format!(
        "
        SELECT {}
        FROM
            businesses
        WHERE
            ($1::TEXT IS NULL OR category = $1 OR NOT (category = ANY($2)))
            AND ($3::FLOAT8 IS NULL OR (
                latitude BETWEEN $3 AND $4
                AND longitude IS NOT NULL
            ))
            AND ($5::FLOAT8 IS NULL OR longitude BETWEEN $5 AND $6);
        ",
        COLUMNS
    ))
    .bind(category)
    .bind(canonical)
    .bind(bounds.map(|bounds| bounds.min_latitude))
    .bind(bounds.map(|bounds| bounds.max_latitude))
    .bind(bounds.and_then(|bounds| bounds.min_longitude))
    .bind(bounds.and_then(|bounds| bounds.max_longitude))
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|rows: Vec<BusinessRow>| Ok(with_ids(rows)))
}
