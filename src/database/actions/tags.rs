use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    error::{Error, QueryError},
    schema::{RecipeId, RecipeTag},
};

pub async fn list_recipe_tags(
    recipe_ids: &[RecipeId],
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeTag>, Error> {
    let list: Vec<RecipeTag> = sqlx::query_as(
        "
        SELECT recipe_id, category, value, label FROM recipe_tags
        WHERE recipe_id = ANY($1)
        ORDER BY category, value
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(list)
}

pub async fn insert_recipe_tags(
    tags: &[RecipeTag],
    conn: &mut PgConnection,
) -> Result<(), Error> {
    if tags.is_empty() {
        return Ok(());
    }

    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, category, value, label) ");
    query.push_values(tags.iter(), |mut b, tag| {
        b.push_bind(tag.recipe_id)
            .push_bind(tag.category)
            .push_bind(&tag.value)
            .push_bind(&tag.label);
    });
    query.push(" ON CONFLICT DO NOTHING");

    query
        .build()
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}
