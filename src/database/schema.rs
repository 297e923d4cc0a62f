use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Id = i32;

#[derive(Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

/// A user as seen by the requester.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct UserRow {
    pub email: String,
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,

    #[serde(skip)]
    #[sqlx(default)]
    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeTagRow {
    pub recipe_id: Id,
    #[sqlx(flatten)]
    pub tag: Tag,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
}

/// An ingredient joined with its amount in one recipe.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeIngredientRow {
    pub recipe_id: Id,
    #[sqlx(flatten)]
    pub ingredient: IngredientAmount,
}

/// A recipe annotated with the requester's favorite and cart flags.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRow {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub has_image: bool,
    pub created_at: DateTime<Utc>,

    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,

    #[sqlx(default)]
    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeShortRow {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub cooking_time: i32,
    pub has_image: bool,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeImage {
    pub image: Option<Vec<u8>>,
    pub image_type: Option<String>,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientWrite {
    pub id: Id,
    pub amount: i32,
}

/// Tag and ingredient associations, always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeRelations {
    pub tags: Vec<Id>,
    pub ingredients: Vec<IngredientWrite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: ImageData,
    pub relations: RecipeRelations,
}

/// Absent scalar fields keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<ImageData>,
    pub relations: RecipeRelations,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub measurement_unit: String,
}
