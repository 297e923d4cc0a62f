use crate::{
    error::{Error, HttpError, QueryError},
    schema::Id,
};

use sqlx::{Pool, Postgres};

/// A per-user set of recipes backed by a `(user_id, recipe_id)` unique table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Favorite,
    ShoppingCart,
}

impl Membership {
    fn table(&self) -> &'static str {
        match self {
            Membership::Favorite => "favorite_recipes",
            Membership::ShoppingCart => "shopping_carts",
        }
    }

    pub fn duplicate_message(&self) -> &'static str {
        match self {
            Membership::Favorite => "Recipe is already in favorites",
            Membership::ShoppingCart => "Recipe is already in the shopping cart",
        }
    }

    pub fn missing_message(&self) -> &'static str {
        match self {
            Membership::Favorite => "Recipe is not in favorites",
            Membership::ShoppingCart => "Recipe is not in the shopping cart",
        }
    }
}

/// The conflict check and the insert are one statement, so concurrent duplicates still get a 400.
pub async fn add_membership(
    membership: Membership,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        membership.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HttpError::InvalidRequest.new(membership.duplicate_message()));
    }

    log::info!("User {user_id} added recipe {recipe_id} to {:?}", membership);

    Ok(())
}

pub async fn remove_membership(
    membership: Membership,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        membership.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HttpError::InvalidRequest.new(membership.missing_message()));
    }

    log::info!("User {user_id} removed recipe {recipe_id} from {:?}", membership);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memberships_use_separate_tables_and_messages() {
        assert_ne!(Membership::Favorite.table(), Membership::ShoppingCart.table());
        assert_ne!(
            Membership::Favorite.duplicate_message(),
            Membership::ShoppingCart.duplicate_message()
        );
        assert!(Membership::ShoppingCart.missing_message().contains("shopping cart"));
    }
}
