use std::collections::HashSet;

use crate::{
    error::{Error, QueryError},
    schema::{Id, Ingredient, NewIngredient, RecipeIngredientRow},
};

use sqlx::{Pool, Postgres};

pub async fn create_ingredient(
    ingredient: &NewIngredient,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, Error> {
    let ingredient: Ingredient = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        RETURNING id, name, measurement_unit
    ",
    )
    .bind(&ingredient.name)
    .bind(&ingredient.measurement_unit)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    log::info!("Created ingredient {} ({})", ingredient.id, ingredient.name);

    Ok(ingredient)
}

pub async fn get_ingredient(id: Id, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> =
        sqlx::query_as("SELECT id, name, measurement_unit FROM ingredients WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(row)
}

/// Lists ingredients ordered by name, optionally narrowed to a case-insensitive name prefix.
pub async fn list_ingredients(
    prefix: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    let rows: Vec<Ingredient> = match prefix {
        Some(prefix) => sqlx::query_as(
            "
            SELECT id, name, measurement_unit FROM ingredients
            WHERE starts_with(LOWER(name), LOWER($1))
            ORDER BY name, id
        ",
        )
        .bind(prefix)
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?,
        None => sqlx::query_as("SELECT id, name, measurement_unit FROM ingredients ORDER BY name, id")
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?,
    };

    Ok(rows)
}

/// Returns the subset of `ids` that reference existing ingredients.
pub async fn existing_ingredient_ids(
    ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<HashSet<Id>, Error> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }

    let rows: Vec<(Id,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}

pub async fn list_recipe_ingredients(
    recipe_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredientRow>, Error> {
    if recipe_ids.is_empty() {
        return Ok(vec![]);
    }

    let rows: Vec<RecipeIngredientRow> = sqlx::query_as("
        SELECT ri.recipe_id AS recipe_id, i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY ri.id
    ")
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}
