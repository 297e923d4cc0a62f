use std::collections::HashSet;

use crate::{
    error::{Error, QueryError},
    schema::{Id, NewTag, RecipeTagRow, Tag},
};

use sqlx::{Pool, Postgres};

pub async fn create_tag(tag: &NewTag, pool: &Pool<Postgres>) -> Result<Tag, Error> {
    let tag: Tag = sqlx::query_as(
        "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) RETURNING id, name, color, slug",
    )
    .bind(&tag.name)
    .bind(&tag.color)
    .bind(&tag.slug)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    log::info!("Created tag {} ({})", tag.id, tag.slug);

    Ok(tag)
}

pub async fn get_tag(id: Id, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT id, name, color, slug FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT id, name, color, slug FROM tags ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(list)
}

/// Returns the subset of `ids` that reference existing tags.
pub async fn existing_tag_ids(ids: &[Id], pool: &Pool<Postgres>) -> Result<HashSet<Id>, Error> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }

    let rows: Vec<(Id,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}

pub async fn list_recipe_tags(
    recipe_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeTagRow>, Error> {
    if recipe_ids.is_empty() {
        return Ok(vec![]);
    }

    let list: Vec<RecipeTagRow> = sqlx::query_as(
        "
        SELECT rt.recipe_id AS recipe_id, t.id AS id, t.name AS name, t.color AS color, t.slug AS slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY t.id
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(list)
}
