use crate::{
    error::{Error, QueryError},
    pagination::{PageContext, PageRequest},
    schema::{Id, User, UserRow},
};

use sqlx::{Pool, Postgres};

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Id) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as(
        "SELECT id, email, username, first_name, last_name, role FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row)
}

/// A user annotated with whether `viewer` follows them.
pub async fn get_user_row(
    pool: &Pool<Postgres>,
    user_id: Id,
    viewer: Option<Id>,
) -> Result<Option<UserRow>, Error> {
    let row: Option<UserRow> = sqlx::query_as(
        "
        SELECT u.email, u.id, u.username, u.first_name, u.last_name,
            EXISTS (SELECT 1 FROM follows f WHERE f.author_id = u.id AND f.user_id = $2) AS is_subscribed
        FROM users u
        WHERE u.id = $1
    ",
    )
    .bind(user_id)
    .bind(viewer)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn list_user_rows(
    pool: &Pool<Postgres>,
    user_ids: &[Id],
    viewer: Option<Id>,
) -> Result<Vec<UserRow>, Error> {
    if user_ids.is_empty() {
        return Ok(vec![]);
    }

    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.email, u.id, u.username, u.first_name, u.last_name,
            EXISTS (SELECT 1 FROM follows f WHERE f.author_id = u.id AND f.user_id = $2) AS is_subscribed
        FROM users u
        WHERE u.id = ANY($1)
    ",
    )
    .bind(user_ids)
    .bind(viewer)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn fetch_users(
    pool: &Pool<Postgres>,
    page: PageRequest,
    viewer: Option<Id>,
) -> Result<PageContext<UserRow>, Error> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.email, u.id, u.username, u.first_name, u.last_name,
            EXISTS (SELECT 1 FROM follows f WHERE f.author_id = u.id AND f.user_id = $1) AS is_subscribed,
            COUNT(*) OVER() AS count
        FROM users u
        ORDER BY u.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(viewer)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|u| u.count).unwrap_or(0);
    PageContext::from_rows(rows, total_count, page)
}
