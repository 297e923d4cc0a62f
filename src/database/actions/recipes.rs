use std::collections::HashMap;

use crate::{
    error::{Error, HttpError, QueryError},
    filters::RecipeFilter,
    pagination::{PageContext, PageRequest},
    schema::{Id, NewRecipe, RecipeImage, RecipeRelations, RecipeRow, RecipeShortRow, RecipeUpdate},
};

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

/// Pushes the annotated recipe projection. Favorite and cart flags are false when `viewer` is `None`.
fn push_recipe_select(builder: &mut QueryBuilder<'_, Postgres>, viewer: Option<Id>) {
    builder.push(
        "
        SELECT r.id, r.author_id, r.name, r.text, r.cooking_time,
            r.image IS NOT NULL AS has_image, r.created_at,
            EXISTS (SELECT 1 FROM favorite_recipes f WHERE f.recipe_id = r.id AND f.user_id = ",
    );
    builder.push_bind(viewer);
    builder.push(
        ") AS is_favorited,
            EXISTS (SELECT 1 FROM shopping_carts c WHERE c.recipe_id = r.id AND c.user_id = ",
    );
    builder.push_bind(viewer);
    builder.push(") AS is_in_shopping_cart FROM recipes r");
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    page: PageRequest,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, Error> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM (");
    push_recipe_select(&mut builder, viewer);
    builder.push(") r WHERE TRUE");
    filter.push_conditions(&mut builder);
    builder.push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ");
    builder.push_bind(page.limit);
    builder.push(" OFFSET ");
    builder.push_bind(page.offset());

    let rows: Vec<RecipeRow> = builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    PageContext::from_rows(rows, total_count, page)
}

pub async fn get_recipe(
    id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeRow>, Error> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("");
    push_recipe_select(&mut builder, viewer);
    builder.push(" WHERE r.id = ");
    builder.push_bind(id);

    let row: Option<RecipeRow> = builder
        .build_query_as()
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_recipe_author(id: Id, pool: &Pool<Postgres>) -> Result<Option<Id>, Error> {
    let row: Option<(Id,)> = sqlx::query_as("SELECT author_id FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row.map(|r| r.0))
}

pub async fn get_recipe_short(
    id: Id,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeShortRow>, Error> {
    let row: Option<RecipeShortRow> = sqlx::query_as(
        "
        SELECT id, author_id, name, cooking_time, image IS NOT NULL AS has_image
        FROM recipes WHERE id = $1
    ",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_recipe_image(
    id: Id,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeImage>, Error> {
    let row: Option<RecipeImage> =
        sqlx::query_as("SELECT image, image_type FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(row)
}

async fn attach_relations(
    recipe_id: Id,
    relations: &RecipeRelations,
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    if !relations.tags.is_empty() {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");

        query_builder.push_values(relations.tags.iter(), |mut b, tag_id| {
            b.push_bind(recipe_id).push_bind(*tag_id);
        });
        query_builder.push(" ON CONFLICT DO NOTHING");

        query_builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(QueryError::from)?;
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");

    query_builder.push_values(relations.ingredients.iter(), |mut b, ingredient| {
        b.push_bind(recipe_id)
            .push_bind(ingredient.id)
            .push_bind(ingredient.amount);
    });

    query_builder
        .build()
        .execute(&mut **tx)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

/// Inserts the recipe, its tags and its ingredient amounts in one transaction.
pub async fn create_recipe(
    author_id: Id,
    recipe: &NewRecipe,
    pool: &Pool<Postgres>,
) -> Result<Id, Error> {
    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let id: (Id,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, cooking_time, image, image_type)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&recipe.name)
    .bind(&recipe.text)
    .bind(recipe.cooking_time)
    .bind(&recipe.image.bytes)
    .bind(&recipe.image.mime_type)
    .fetch_one(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    attach_relations(id.0, &recipe.relations, &mut tx).await?;

    tx.commit().await.map_err(QueryError::from)?;

    log::info!("User {author_id} created recipe {}", id.0);

    Ok(id.0)
}

/// Updates scalar fields and replaces all tag and ingredient associations in one transaction.
pub async fn update_recipe(
    id: Id,
    update: &RecipeUpdate,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let result = sqlx::query(
        "
        UPDATE recipes SET
        name = COALESCE($1, name),
        text = COALESCE($2, text),
        cooking_time = COALESCE($3, cooking_time),
        image = COALESCE($4, image),
        image_type = COALESCE($5, image_type)
        WHERE id = $6
    ",
    )
    .bind(update.name.as_deref())
    .bind(update.text.as_deref())
    .bind(update.cooking_time)
    .bind(update.image.as_ref().map(|image| image.bytes.as_slice()))
    .bind(update.image.as_ref().map(|image| image.mime_type.as_str()))
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HttpError::NotFound.new("No recipe exists with specified id"));
    }

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(QueryError::from)?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(QueryError::from)?;

    attach_relations(id, &update.relations, &mut tx).await?;

    tx.commit().await.map_err(QueryError::from)?;

    log::info!("Updated recipe {id}");

    Ok(())
}

/// Join rows, favorites and cart entries go with the recipe through `ON DELETE CASCADE`.
pub async fn delete_recipe(id: Id, pool: &Pool<Postgres>) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HttpError::NotFound.new("No recipe exists with specified id"));
    }

    log::info!("Deleted recipe {id}");

    Ok(())
}

/// Lists the newest recipes of each author, at most `limit` per author when given.
pub async fn list_author_recipes(
    author_ids: &[Id],
    limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeShortRow>, Error> {
    if author_ids.is_empty() {
        return Ok(vec![]);
    }

    let rows: Vec<RecipeShortRow> = sqlx::query_as(
        "
        SELECT id, author_id, name, cooking_time, has_image FROM (
            SELECT r.id, r.author_id, r.name, r.cooking_time, r.created_at,
                r.image IS NOT NULL AS has_image,
                ROW_NUMBER() OVER (PARTITION BY r.author_id ORDER BY r.created_at DESC, r.id DESC) AS position
            FROM recipes r
            WHERE r.author_id = ANY($1)
        ) ranked
        WHERE $2::BIGINT IS NULL OR position <= $2
        ORDER BY author_id, created_at DESC, id DESC
    ",
    )
    .bind(author_ids)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn count_author_recipes(
    author_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<HashMap<Id, i64>, Error> {
    if author_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Id, i64)> = sqlx::query_as(
        "SELECT author_id, COUNT(*) FROM recipes WHERE author_id = ANY($1) GROUP BY author_id",
    )
    .bind(author_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows.into_iter().collect())
}
