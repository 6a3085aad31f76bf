use std::collections::HashMap;

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{Error, HtmlError, QueryError},
    schema::{NewRecipe, Recipe, RecipeDetails, RecipeId, RecipeIngredient, RecipeTag, UserId},
};

use super::tags::{insert_recipe_tags, list_recipe_tags};

pub async fn list_recipes(
    viewer: Option<UserId>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeDetails>, Error> {
    let rows: Vec<Recipe> = sqlx::query_as(
        "SELECT * FROM recipes WHERE is_public OR user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(viewer)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    with_details(rows, pool).await
}

pub async fn get_recipe(
    id: RecipeId,
    viewer: Option<UserId>,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetails, Error> {
    let row: Option<Recipe> =
        sqlx::query_as("SELECT * FROM recipes WHERE id = $1 AND (is_public OR user_id = $2)")
            .bind(id)
            .bind(viewer)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    match row {
        Some(row) => with_details(vec![row], pool)
            .await?
            .pop()
            .ok_or_else(|| HtmlError::NotFound.new("No recipe exists with specified id")),
        None => Err(HtmlError::NotFound.new("No recipe exists with specified id")),
    }
}

pub async fn list_recipe_ingredients(
    recipe_ids: &[RecipeId],
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredient>, Error> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT ri.recipe_id AS recipe_id, ri.ingredient_id AS ingredient_id,
            ri.quantity AS quantity, ri.unit AS unit, i.name AS name
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY i.name, ri.id
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

/// Attaches ingredient line items and tags, preserving the order of `rows`.
async fn with_details(
    rows: Vec<Recipe>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeDetails>, Error> {
    if rows.is_empty() {
        return Ok(vec![]);
    }

    let ids: Vec<RecipeId> = rows.iter().map(|row| row.id).collect();

    let mut ingredients: HashMap<RecipeId, Vec<RecipeIngredient>> = HashMap::new();
    list_recipe_ingredients(&ids, pool)
        .await?
        .into_iter()
        .for_each(|x| ingredients.entry(x.recipe_id).or_default().push(x));

    let mut tags: HashMap<RecipeId, Vec<RecipeTag>> = HashMap::new();
    list_recipe_tags(&ids, pool)
        .await?
        .into_iter()
        .for_each(|x| tags.entry(x.recipe_id).or_default().push(x));

    Ok(rows
        .into_iter()
        .map(|recipe| RecipeDetails {
            ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
            tags: tags.remove(&recipe.id).unwrap_or_default(),
            recipe,
        })
        .collect())
}

/// Writes the recipe row, its ingredient rows and its tag rows in one
/// transaction. Nothing is persisted unless every step succeeds.
pub async fn create_recipe(
    owner: UserId,
    recipe: &NewRecipe,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetails, Error> {
    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let row: Recipe = sqlx::query_as(
        "
        INSERT INTO recipes (
            title, servings, instructions, image_url,
            user_id, is_public, preparation_time, difficulty
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
    ",
    )
    .bind(&recipe.title)
    .bind(recipe.servings)
    .bind(&recipe.instructions)
    .bind(&recipe.image_url)
    .bind(owner)
    .bind(recipe.is_public)
    .bind(&recipe.preparation_time)
    .bind(recipe.difficulty)
    .fetch_one(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    if !recipe.ingredients.is_empty() {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, unit) ",
        );
        query.push_values(recipe.ingredients.iter(), |mut b, ingredient| {
            b.push_bind(row.id)
                .push_bind(ingredient.ingredient_id)
                .push_bind(ingredient.quantity)
                .push_bind(ingredient.unit);
        });
        query
            .build()
            .execute(&mut *tx)
            .await
            .map_err(QueryError::from)?;
    }

    insert_recipe_tags(&recipe.tag_rows(row.id), &mut *tx).await?;

    tx.commit().await.map_err(QueryError::from)?;
    log::info!("> Created recipe {} for {}", row.id, owner);

    with_details(vec![row], pool)
        .await?
        .pop()
        .ok_or_else(|| HtmlError::InternalServerError.new("Created recipe vanished"))
}

/// Only the owner's row can change; zero affected rows is reported as an error.
pub async fn update_recipe_visibility(
    id: RecipeId,
    owner: UserId,
    is_public: bool,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let query = sqlx::query(
        "UPDATE recipes SET is_public = $1, updated_at = now() WHERE id = $2 AND user_id = $3",
    )
    .bind(is_public)
    .bind(id)
    .bind(owner)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        log::warn!("> Visibility change of recipe {id} by {owner} matched no row");
        return Err(not_owned());
    }

    Ok(())
}

/// Flips `is_public` in a single statement and returns the new value.
pub async fn toggle_recipe_visibility(
    id: RecipeId,
    owner: UserId,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let is_public: Option<bool> = sqlx::query_scalar(
        "
        UPDATE recipes SET is_public = NOT is_public, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING is_public
    ",
    )
    .bind(id)
    .bind(owner)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    is_public.ok_or_else(|| {
        log::warn!("> Visibility toggle of recipe {id} by {owner} matched no row");
        not_owned()
    })
}

pub async fn update_recipe_image(
    id: RecipeId,
    owner: UserId,
    image_url: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let query = sqlx::query(
        "UPDATE recipes SET image_url = $1, updated_at = now() WHERE id = $2 AND user_id = $3",
    )
    .bind(image_url)
    .bind(id)
    .bind(owner)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(not_owned());
    }

    Ok(())
}

fn not_owned() -> Error {
    HtmlError::Unauthorized.new("Recipe not found or not owned by the current user")
}
