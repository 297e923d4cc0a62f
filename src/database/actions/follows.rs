use crate::{
    error::{Error, HttpError, QueryError},
    pagination::{PageContext, PageRequest},
    schema::{Id, UserRow},
};

use sqlx::{Pool, Postgres};

pub async fn follow_author(user_id: Id, author_id: Id, pool: &Pool<Postgres>) -> Result<(), Error> {
    if user_id == author_id {
        return Err(HttpError::InvalidRequest.new("You cannot subscribe to yourself"));
    }

    let result = sqlx::query(
        "INSERT INTO follows (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HttpError::InvalidRequest.new("You are already subscribed to this author"));
    }

    log::info!("User {user_id} subscribed to {author_id}");

    Ok(())
}

pub async fn unfollow_author(
    user_id: Id,
    author_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    if user_id == author_id {
        return Err(HttpError::InvalidRequest.new("You cannot unsubscribe from yourself"));
    }

    let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HttpError::InvalidRequest.new("You are not subscribed to this author"));
    }

    log::info!("User {user_id} unsubscribed from {author_id}");

    Ok(())
}

/// Authors followed by `user_id`, in subscription order.
pub async fn fetch_subscriptions(
    user_id: Id,
    page: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserRow>, Error> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.email, u.id, u.username, u.first_name, u.last_name,
            TRUE AS is_subscribed, COUNT(*) OVER() AS count
        FROM follows f
        INNER JOIN users u ON u.id = f.author_id
        WHERE f.user_id = $1
        ORDER BY f.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|u| u.count).unwrap_or(0);
    PageContext::from_rows(rows, total_count, page)
}
