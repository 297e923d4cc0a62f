use crate::{
    error::{Error, QueryError},
    schema::{Id, ShoppingListRow},
};

use sqlx::{Pool, Postgres};

/// Every ingredient amount of every recipe in the user's cart, one row per join row.
pub async fn list_shopping_cart_items(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListRow>, Error> {
    let rows: Vec<ShoppingListRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_carts c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}
