use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    schema::Ingredient,
};

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, Error> {
    let rows: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn find_ingredient(
    name: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Inserts `name`, or returns the existing row when another writer got there first.
pub async fn create_ingredient(name: &str, pool: &Pool<Postgres>) -> Result<Ingredient, Error> {
    let row: Option<Ingredient> = sqlx::query_as(
        "INSERT INTO ingredients (name) VALUES ($1) ON CONFLICT (name) DO NOTHING RETURNING *",
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    match row {
        Some(row) => {
            log::info!("> Created ingredient {} ({})", row.name, row.id);
            Ok(row)
        }
        None => find_ingredient(name, pool).await?.ok_or_else(|| {
            QueryError::new(format!("Ingredient {name} missing after conflict")).into()
        }),
    }
}
