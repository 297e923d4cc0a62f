use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::TypeError,
    schema::{
        Id, ImageData, IngredientAmount, RecipeIngredientRow, RecipeRow, RecipeShortRow,
        RecipeTagRow, Tag, UserRow,
    },
};

#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: Id,
    pub tags: Vec<Tag>,
    pub author: Option<UserRow>,
    pub ingredients: Vec<IngredientAmount>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
}

/// Compact recipe used by favorite/cart responses and follow listings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipeShort {
    pub id: Id,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl From<RecipeShortRow> for RecipeShort {
    fn from(value: RecipeShortRow) -> Self {
        Self {
            image: image_url(value.id, value.has_image),
            id: value.id,
            name: value.name,
            cooking_time: value.cooking_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowView {
    #[serde(flatten)]
    pub author: UserRow,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: i64,
}

pub fn image_url(recipe_id: Id, has_image: bool) -> Option<String> {
    has_image.then(|| format!("/recipes/{recipe_id}/image/"))
}

fn group_by_recipe<T, U>(rows: Vec<T>, split: impl Fn(T) -> (Id, U)) -> HashMap<Id, Vec<U>> {
    let mut map: HashMap<Id, Vec<U>> = HashMap::new();
    for row in rows {
        let (recipe_id, value) = split(row);
        map.entry(recipe_id).or_default().push(value);
    }
    map
}

/// Joins recipe rows with their tags, ingredient amounts and authors, keeping the row order.
pub fn assemble_recipes(
    rows: Vec<RecipeRow>,
    tags: Vec<RecipeTagRow>,
    ingredients: Vec<RecipeIngredientRow>,
    authors: Vec<UserRow>,
) -> Vec<RecipeView> {
    let mut tags = group_by_recipe(tags, |row| (row.recipe_id, row.tag));
    let mut ingredients = group_by_recipe(ingredients, |row| (row.recipe_id, row.ingredient));
    let authors: HashMap<Id, UserRow> = authors.into_iter().map(|a| (a.id, a)).collect();

    rows.into_iter()
        .map(|row| RecipeView {
            tags: tags.remove(&row.id).unwrap_or_default(),
            ingredients: ingredients.remove(&row.id).unwrap_or_default(),
            author: authors.get(&row.author_id).cloned(),
            image: image_url(row.id, row.has_image),
            id: row.id,
            is_favorited: row.is_favorited,
            is_in_shopping_cart: row.is_in_shopping_cart,
            name: row.name,
            text: row.text,
            cooking_time: row.cooking_time,
            created_at: row.created_at,
        })
        .collect()
}

/// Builds follow views in author order. `recipes` must already be capped per author.
pub fn assemble_follows(
    authors: Vec<UserRow>,
    recipes: Vec<RecipeShortRow>,
    counts: &HashMap<Id, i64>,
) -> Vec<FollowView> {
    let mut recipes = group_by_recipe(recipes, |row| (row.author_id, RecipeShort::from(row)));

    authors
        .into_iter()
        .map(|author| FollowView {
            recipes: recipes.remove(&author.id).unwrap_or_default(),
            recipes_count: counts.get(&author.id).copied().unwrap_or(0),
            author,
        })
        .collect()
}

/// Decodes `data:<mime>;base64,<payload>` or bare base64 (stored as `application/octet-stream`).
pub fn decode_base64_image(value: &str) -> Result<ImageData, TypeError> {
    let value = value.trim();
    let (mime_type, payload) = match value.strip_prefix("data:") {
        Some(uri) => {
            let (header, payload) = uri
                .split_once(',')
                .ok_or_else(|| TypeError::new("Invalid image; Malformed data URI"))?;
            let mime_type = header
                .strip_suffix(";base64")
                .ok_or_else(|| TypeError::new("Invalid image; Data URI must be base64 encoded"))?;
            if !mime_type.starts_with("image/") {
                return Err(TypeError::new("Invalid image; Unsupported media type"));
            }
            (mime_type.to_string(), payload)
        }
        None => (String::from("application/octet-stream"), value),
    };

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| TypeError::new("Invalid image; Malformed base64"))?;
    if bytes.is_empty() {
        return Err(TypeError::new("Invalid image; Empty image"));
    }

    Ok(ImageData { bytes, mime_type })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_row(id: Id, author_id: Id) -> RecipeRow {
        RecipeRow {
            id,
            author_id,
            name: format!("recipe {id}"),
            text: String::from("mix"),
            cooking_time: 5,
            has_image: id % 2 == 0,
            created_at: Utc::now(),
            is_favorited: false,
            is_in_shopping_cart: true,
            count: 0,
        }
    }

    fn author(id: Id) -> UserRow {
        UserRow {
            email: format!("{id}@example.com"),
            id,
            username: format!("user{id}"),
            first_name: String::from("A"),
            last_name: String::from("B"),
            is_subscribed: false,
            count: 0,
        }
    }

    fn amount(recipe_id: Id, id: Id, amount: i32) -> RecipeIngredientRow {
        RecipeIngredientRow {
            recipe_id,
            ingredient: IngredientAmount {
                id,
                name: format!("ingredient {id}"),
                measurement_unit: String::from("g"),
                amount,
            },
        }
    }

    #[test]
    fn recipes_are_joined_with_their_relations() {
        let tag = Tag {
            id: 1,
            name: String::from("Lunch"),
            color: String::from("#00FF00"),
            slug: String::from("lunch"),
        };
        let views = assemble_recipes(
            vec![recipe_row(2, 10), recipe_row(1, 11)],
            vec![RecipeTagRow { recipe_id: 1, tag: tag.clone() }],
            vec![amount(2, 7, 100), amount(1, 8, 3), amount(2, 9, 1)],
            vec![author(10), author(11)],
        );

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, 2);
        assert!(views[0].tags.is_empty());
        assert_eq!(
            views[0].ingredients.iter().map(|i| (i.id, i.amount)).collect::<Vec<_>>(),
            vec![(7, 100), (9, 1)]
        );
        assert_eq!(views[0].image.as_deref(), Some("/recipes/2/image/"));
        assert_eq!(views[0].author.as_ref().map(|a| a.id), Some(10));

        assert_eq!(views[1].tags, vec![tag]);
        assert_eq!(views[1].image, None);
        assert!(views[1].is_in_shopping_cart);
    }

    #[test]
    fn follow_views_carry_recipes_and_totals() {
        let short = |id, author_id| RecipeShortRow {
            id,
            author_id,
            name: format!("recipe {id}"),
            cooking_time: 10,
            has_image: false,
        };
        let counts = HashMap::from([(10, 5)]);
        let views = assemble_follows(
            vec![author(10), author(11)],
            vec![short(3, 10), short(2, 10)],
            &counts,
        );

        assert_eq!(views[0].recipes.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(views[0].recipes_count, 5);
        assert!(views[1].recipes.is_empty());
        assert_eq!(views[1].recipes_count, 0);

        let json = serde_json::to_value(&views[0]).unwrap();
        assert_eq!(json["username"], "user10");
        assert_eq!(json["recipes_count"], 5);
        assert!(json.get("count").is_none());
    }

    #[test]
    fn data_uri_images_keep_their_mime_type() {
        let image = decode_base64_image("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, b"hello");
    }

    #[test]
    fn bare_base64_is_accepted() {
        let image = decode_base64_image("aGVsbG8=").unwrap();
        assert_eq!(image.mime_type, "application/octet-stream");
    }

    #[test]
    fn malformed_images_are_rejected() {
        assert!(decode_base64_image("data:image/png;base64,@@@").is_err());
        assert!(decode_base64_image("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(decode_base64_image("data:image/png,aGVsbG8=").is_err());
        assert!(decode_base64_image("").is_err());
    }
}
